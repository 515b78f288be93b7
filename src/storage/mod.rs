//! Persistence for task graphs
//!
//! A single JSON file holds the graph snapshot. File locking guards
//! concurrent CLI invocations and writes go through a temp file plus
//! atomic rename.

mod graph_store;

pub use graph_store::GraphStore;
