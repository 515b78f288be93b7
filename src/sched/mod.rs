//! Scheduling layer: priorities, schedules, and graph insights
//!
//! [`TaskScheduler`] borrows a [`TaskGraph`](crate::domain::TaskGraph) and
//! computes over it without mutating tasks. All wall-clock input arrives as
//! explicit `DateTime<Utc>` arguments, which keeps every operation
//! deterministic and testable with fixed instants.

mod insights;
mod priority;
mod schedule;
mod weights;

pub use insights::Bottleneck;
pub use priority::TaskScheduler;
pub use schedule::{Schedule, ScheduledSlot};
pub use weights::PriorityWeights;
