//! taskplan - A dependency-aware task planning and scheduling engine
//!
//! Tasks form a directed acyclic graph: each task records the tasks it
//! depends on, the graph guards every edge mutation against cycles, and a
//! scheduling layer turns static attributes (priority, effort, deadlines,
//! fan-out) into a dynamic execution order and a resource-constrained
//! schedule.

pub mod cli;
pub mod domain;
pub mod sched;
pub mod storage;

pub use domain::{GraphError, GraphSnapshot, Priority, Task, TaskGraph, TaskId, TaskStatus};
pub use sched::{Bottleneck, PriorityWeights, Schedule, ScheduledSlot, TaskScheduler};
