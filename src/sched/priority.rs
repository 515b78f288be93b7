//! Effective priority calculation
//!
//! The effective priority of a task combines its intrinsic level with what
//! the graph knows about it: how much work it unblocks, how deep it sits,
//! how large it is, and how close its deadline is. The calculation is pure;
//! callers that want the cached `effective_priority` on tasks updated write
//! the returned map back themselves.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::{Task, TaskGraph, TaskId};

use super::weights::PriorityWeights;

/// Score boost for tasks on the critical path, applied after all weighted
/// terms are summed.
const CRITICAL_PATH_MULTIPLIER: f64 = 1.5;

/// Computes priorities, schedules, and insights over a borrowed graph.
///
/// Never mutates the graph. Wall-clock time always arrives as an explicit
/// argument.
#[derive(Debug)]
pub struct TaskScheduler<'a> {
    pub(crate) graph: &'a TaskGraph,
    pub(crate) weights: PriorityWeights,
}

impl<'a> TaskScheduler<'a> {
    /// Creates a scheduler with default weights.
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self {
            graph,
            weights: PriorityWeights::default(),
        }
    }

    /// Creates a scheduler with custom weights.
    pub fn with_weights(graph: &'a TaskGraph, weights: PriorityWeights) -> Self {
        Self { graph, weights }
    }

    /// Computes the effective priority of every task.
    ///
    /// Terminal tasks score 0.0. For the rest, each weighted term is summed
    /// and the critical-path multiplier applied last:
    ///
    /// - intrinsic priority ordinal
    /// - direct dependency count
    /// - transitive dependent count
    /// - longest root-to-task depth
    /// - estimated effort in hours
    /// - deadline urgency relative to `now`
    ///
    /// `weights` overrides the scheduler's configured weights for this call
    /// only.
    pub fn calculate_effective_priorities(
        &self,
        now: DateTime<Utc>,
        weights: Option<&PriorityWeights>,
    ) -> HashMap<TaskId, f64> {
        let w = weights.copied().unwrap_or(self.weights);
        let critical: HashSet<TaskId> = self.graph.calculate_critical_path().into_iter().collect();
        let depths = self.path_depths();

        let mut scores = HashMap::with_capacity(self.graph.len());
        for (task_id, task) in self.graph.iter() {
            if task.status.is_terminal() {
                scores.insert(task_id.clone(), 0.0);
                continue;
            }

            let dep_count = self.graph.get_dependencies(task_id).len() as f64;
            let dependent_count = self.graph.get_all_dependents(task_id).len() as f64;
            let depth = depths.get(task_id).copied().unwrap_or(0) as f64;

            let mut score = w.base * f64::from(task.priority.ordinal())
                + w.dep_count * dep_count
                + w.dependent_count * dependent_count
                + w.path_depth * depth
                + w.effort * task.estimated_effort
                + w.urgency * urgency_factor(task, now);

            if critical.contains(task_id) {
                score *= CRITICAL_PATH_MULTIPLIER;
            }
            scores.insert(task_id.clone(), score);
        }
        scores
    }

    /// All non-terminal tasks with their scores, highest first. Score ties
    /// break by ascending ID so the order is deterministic.
    pub fn get_prioritized_tasks(&self, now: DateTime<Utc>) -> Vec<(TaskId, f64)> {
        let scores = self.calculate_effective_priorities(now, None);
        let mut ranked: Vec<(TaskId, f64)> = self
            .graph
            .iter()
            .filter(|(_, task)| !task.status.is_terminal())
            .map(|(id, _)| (id.clone(), scores.get(id).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// The top `limit` tasks that could start right now: non-terminal, with
    /// every dependency either satisfied or absent from the graph.
    pub fn get_next_tasks(&self, now: DateTime<Utc>, limit: usize) -> Vec<(TaskId, f64)> {
        let mut ready = self.get_prioritized_tasks(now);
        ready.retain(|(id, _)| self.is_ready(id));
        ready.truncate(limit);
        ready
    }

    pub(crate) fn is_ready(&self, task_id: &TaskId) -> bool {
        let Some(task) = self.graph.get(task_id) else {
            return false;
        };
        if task.status.is_terminal() {
            return false;
        }
        task.dependencies.iter().all(|dep_id| {
            self.graph
                .get(dep_id)
                .map(|dep| dep.status.is_terminal())
                .unwrap_or(true)
        })
    }

    /// Longest root-to-task depth for each task (roots are 0). Empty for a
    /// cyclic graph.
    pub(crate) fn path_depths(&self) -> HashMap<TaskId, usize> {
        let Ok(order) = self.graph.topological_sort() else {
            return HashMap::new();
        };

        let mut depths: HashMap<TaskId, usize> = HashMap::with_capacity(order.len());
        for task_id in order {
            let depth = self
                .graph
                .get_dependencies(&task_id)
                .iter()
                .map(|dep_id| depths.get(dep_id).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            depths.insert(task_id, depth);
        }
        depths
    }
}

/// Deadline urgency step: 5.0 when due or overdue, stepping down to 1.0 for
/// deadlines more than a week out. Missing or unparseable deadlines
/// contribute nothing.
pub(crate) fn urgency_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = task.deadline().and_then(parse_deadline) else {
        return 0.0;
    };

    let days = (deadline - now).num_days();
    if days <= 0 {
        5.0
    } else if days <= 1 {
        3.0
    } else if days <= 3 {
        2.0
    } else if days <= 7 {
        1.5
    } else {
        1.0
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DDTHH:MM:SS` timestamp read as UTC.
fn parse_deadline(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    s.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}
