//! Critical path analysis over the task graph
//!
//! Implements the forward/backward passes of the critical path method on
//! top of [`TaskGraph::topological_sort`]. Times are expressed in effort
//! hours from an implicit project start at 0.0; no wall-clock time enters
//! these calculations.
//!
//! Slack comparisons use an epsilon of 1e-6 to absorb float accumulation
//! across long chains.

use std::collections::HashMap;

use tracing::warn;

use super::graph::TaskGraph;
use super::id::TaskId;

const SLACK_EPSILON: f64 = 1e-6;

impl TaskGraph {
    /// Earliest start time of each task: the latest finish among its
    /// dependencies, or 0.0 for roots.
    ///
    /// Returns an empty map (with a warning) if the graph is cyclic; the
    /// insertion guard should make that unreachable outside corrupt
    /// snapshots.
    pub fn earliest_start_times(&self) -> HashMap<TaskId, f64> {
        let order = match self.topological_sort() {
            Ok(order) => order,
            Err(_) => {
                warn!("cycle detected; earliest start times unavailable");
                return HashMap::new();
            }
        };

        let mut earliest: HashMap<TaskId, f64> = HashMap::with_capacity(order.len());
        for task_id in &order {
            let start = self
                .get_dependencies(task_id)
                .iter()
                .map(|dep_id| {
                    let dep_finish = earliest.get(dep_id).copied().unwrap_or(0.0)
                        + self.get(dep_id).map(|t| t.estimated_effort).unwrap_or(0.0);
                    dep_finish
                })
                .fold(0.0, f64::max);
            earliest.insert(task_id.clone(), start);
        }
        earliest
    }

    /// Latest start time of each task without delaying project completion.
    ///
    /// Computed by a backward pass: a leaf may start as late as the project
    /// finish minus its own effort; any other task must start early enough
    /// for every dependent to meet its own latest start.
    pub fn latest_start_times(&self) -> HashMap<TaskId, f64> {
        let order = match self.topological_sort() {
            Ok(order) => order,
            Err(_) => {
                warn!("cycle detected; latest start times unavailable");
                return HashMap::new();
            }
        };

        let earliest = self.earliest_start_times();
        let completion = order
            .iter()
            .map(|id| {
                earliest.get(id).copied().unwrap_or(0.0)
                    + self.get(id).map(|t| t.estimated_effort).unwrap_or(0.0)
            })
            .fold(0.0, f64::max);

        let mut latest: HashMap<TaskId, f64> = HashMap::with_capacity(order.len());
        for task_id in order.iter().rev() {
            let effort = self.get(task_id).map(|t| t.estimated_effort).unwrap_or(0.0);
            let dependents = self.get_dependents(task_id);
            let latest_finish = if dependents.is_empty() {
                completion
            } else {
                dependents
                    .iter()
                    .map(|dep_id| latest.get(dep_id).copied().unwrap_or(completion))
                    .fold(f64::INFINITY, f64::min)
            };
            latest.insert(task_id.clone(), latest_finish - effort);
        }
        latest
    }

    /// Total project duration in effort hours: the latest finish across all
    /// tasks, or 0.0 for an empty or cyclic graph.
    pub fn completion_time(&self) -> f64 {
        self.earliest_start_times()
            .iter()
            .map(|(id, start)| {
                start + self.get(id).map(|t| t.estimated_effort).unwrap_or(0.0)
            })
            .fold(0.0, f64::max)
    }

    /// Tasks with zero slack, in topological order.
    ///
    /// Delaying any of these delays project completion. Empty for an empty
    /// or cyclic graph.
    pub fn calculate_critical_path(&self) -> Vec<TaskId> {
        let order = match self.topological_sort() {
            Ok(order) => order,
            Err(_) => {
                warn!("cycle detected; critical path unavailable");
                return Vec::new();
            }
        };

        let earliest = self.earliest_start_times();
        let latest = self.latest_start_times();

        order
            .into_iter()
            .filter(|id| {
                let es = earliest.get(id).copied().unwrap_or(0.0);
                let ls = latest.get(id).copied().unwrap_or(0.0);
                (ls - es).abs() < SLACK_EPSILON
            })
            .collect()
    }
}
