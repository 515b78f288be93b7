//! Domain models for taskplan
//!
//! Contains the task graph and its algorithms without any I/O concerns.

mod cpm;
mod graph;
mod id;
mod snapshot;
mod task;

pub use graph::{GraphError, TaskGraph};
pub use id::{IdError, TaskId};
pub use snapshot::GraphSnapshot;
pub use task::{Priority, Task, TaskMeta, TaskStatus};
