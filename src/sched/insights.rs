//! Graph insights: bottlenecks, dependency paths, and slack
//!
//! Read-only diagnostics layered on the critical path analysis. All of
//! these degrade gracefully on a corrupt (cyclic) graph: empty critical
//! path, no paths, `None` slack.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::domain::{TaskId, TaskStatus};

use super::priority::TaskScheduler;

/// A task likely to delay the project, with the reasons it qualified.
#[derive(Debug, Clone, Serialize)]
pub struct Bottleneck {
    pub task_id: TaskId,
    /// Transitive dependent count.
    pub dependent_count: usize,
    pub reasons: Vec<String>,
}

impl<'a> TaskScheduler<'a> {
    /// Finds tasks that may delay the project.
    ///
    /// A non-completed task qualifies when any of these hold:
    /// - it transitively blocks at least `threshold` tasks
    /// - it is on the critical path
    /// - it is currently blocked and has dependents
    ///
    /// Results are sorted by dependent count descending, then ID.
    pub fn identify_bottlenecks(&self, threshold: usize) -> Vec<Bottleneck> {
        let critical: HashSet<TaskId> = self.graph.calculate_critical_path().into_iter().collect();

        let mut bottlenecks: Vec<Bottleneck> = Vec::new();
        for (task_id, task) in self.graph.iter() {
            if task.status == TaskStatus::Completed {
                continue;
            }

            let dependent_count = self.graph.get_all_dependents(task_id).len();
            let mut reasons = Vec::new();

            if dependent_count >= threshold {
                reasons.push(format!("Blocks {} other tasks", dependent_count));
            }
            if critical.contains(task_id) {
                reasons.push("On the critical path".to_string());
            }
            if task.status == TaskStatus::Blocked && dependent_count > 0 {
                reasons.push(format!(
                    "Currently blocked and has {} dependent tasks",
                    dependent_count
                ));
            }

            if !reasons.is_empty() {
                bottlenecks.push(Bottleneck {
                    task_id: task_id.clone(),
                    dependent_count,
                    reasons,
                });
            }
        }

        bottlenecks.sort_by(|a, b| {
            b.dependent_count
                .cmp(&a.dependent_count)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        bottlenecks
    }

    /// Enumerates every dependency path from a root task to `task_id`,
    /// each ordered root first.
    ///
    /// `max_paths` caps the result on graphs with heavy diamond fan-in;
    /// hitting the cap logs a warning and returns the paths found so far.
    /// Unknown IDs yield no paths.
    pub fn get_paths_to_completion(
        &self,
        task_id: &TaskId,
        max_paths: Option<usize>,
    ) -> Vec<Vec<TaskId>> {
        if !self.graph.contains(task_id) {
            return Vec::new();
        }

        let mut paths = Vec::new();
        let truncated = self.collect_paths(task_id, &mut Vec::new(), &mut paths, max_paths);
        if truncated {
            warn!(task = %task_id, limit = max_paths.unwrap_or(0), "path enumeration truncated");
        }
        paths
    }

    /// Depth-first walk from `task_id` back through dependencies. Returns
    /// true if the cap cut the enumeration short.
    fn collect_paths(
        &self,
        task_id: &TaskId,
        suffix: &mut Vec<TaskId>,
        paths: &mut Vec<Vec<TaskId>>,
        max_paths: Option<usize>,
    ) -> bool {
        if max_paths.is_some_and(|cap| paths.len() >= cap) {
            return true;
        }
        // The DAG invariant rules out revisiting; a corrupt edge would
        // still terminate here.
        if suffix.contains(task_id) {
            return false;
        }

        suffix.push(task_id.clone());

        let mut deps: Vec<TaskId> = self.graph.get_dependencies(task_id).into_iter().collect();
        let mut truncated = false;
        if deps.is_empty() {
            let mut path: Vec<TaskId> = suffix.clone();
            path.reverse();
            paths.push(path);
        } else {
            deps.sort();
            for dep_id in deps {
                if self.collect_paths(&dep_id, suffix, paths, max_paths) {
                    truncated = true;
                    break;
                }
            }
        }

        suffix.pop();
        truncated
    }

    /// Hours `task_id` can slip without delaying project completion, or
    /// `None` for unknown IDs and cyclic graphs.
    pub fn calculate_slack_time(&self, task_id: &TaskId) -> Option<f64> {
        if !self.graph.contains(task_id) {
            return None;
        }
        let earliest = self.graph.earliest_start_times();
        let latest = self.graph.latest_start_times();
        match (earliest.get(task_id), latest.get(task_id)) {
            (Some(es), Some(ls)) => Some(ls - es),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Task, TaskGraph};

    fn id(name: &str) -> TaskId {
        TaskId::new(name).unwrap()
    }

    fn task(name: &str, effort: f64) -> Task {
        let mut task = Task::new(id(name), name);
        task.set_estimated_effort(effort);
        task
    }

    #[test]
    fn fanout_root_is_the_single_bottleneck() {
        // The four dependents are completed, so they drop out of the
        // candidate set and only the fanout root remains.
        let mut graph = TaskGraph::new();
        graph.add_task(task("root", 1.0)).unwrap();
        for name in ["w1", "w2", "w3", "w4"] {
            graph.add_task(task(name, 1.0)).unwrap();
            graph.add_dependency(&id(name), &id("root")).unwrap();
            graph.set_status(&id(name), TaskStatus::Completed).unwrap();
        }

        let bottlenecks = TaskScheduler::new(&graph).identify_bottlenecks(3);
        assert_eq!(bottlenecks.len(), 1);
        assert_eq!(bottlenecks[0].task_id, id("root"));
        assert_eq!(bottlenecks[0].dependent_count, 4);
        assert!(bottlenecks[0]
            .reasons
            .iter()
            .any(|r| r.contains("Blocks 4 other tasks")));
    }

    #[test]
    fn blocked_task_with_dependents_qualifies() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("a", 1.0)).unwrap();
        graph.add_task(task("b", 1.0)).unwrap();
        graph.add_task(task("c", 1.0)).unwrap();
        graph.add_dependency(&id("b"), &id("a")).unwrap();
        graph.add_dependency(&id("c"), &id("b")).unwrap();

        // b is blocked on a and blocks c.
        let bottlenecks = TaskScheduler::new(&graph).identify_bottlenecks(10);
        let b = bottlenecks.iter().find(|x| x.task_id == id("b")).unwrap();
        assert!(b.reasons.iter().any(|r| r.contains("Currently blocked")));
    }

    #[test]
    fn bottlenecks_sorted_by_fanout_then_id() {
        let mut graph = TaskGraph::new();
        for name in ["a", "b", "x", "y"] {
            graph.add_task(task(name, 1.0)).unwrap();
        }
        // a blocks x and y; b blocks y.
        graph.add_dependency(&id("x"), &id("a")).unwrap();
        graph.add_dependency(&id("y"), &id("a")).unwrap();
        graph.add_dependency(&id("y"), &id("b")).unwrap();

        let bottlenecks = TaskScheduler::new(&graph).identify_bottlenecks(1);
        let order: Vec<&str> = bottlenecks
            .iter()
            .map(|b| b.task_id.as_str())
            .take(2)
            .collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn diamond_has_two_paths() {
        let mut graph = TaskGraph::new();
        for name in ["a", "b", "c", "d"] {
            graph.add_task(task(name, 1.0)).unwrap();
        }
        graph.add_dependency(&id("b"), &id("a")).unwrap();
        graph.add_dependency(&id("c"), &id("a")).unwrap();
        graph.add_dependency(&id("d"), &id("b")).unwrap();
        graph.add_dependency(&id("d"), &id("c")).unwrap();

        let paths = TaskScheduler::new(&graph).get_paths_to_completion(&id("d"), None);
        assert_eq!(
            paths,
            vec![
                vec![id("a"), id("b"), id("d")],
                vec![id("a"), id("c"), id("d")],
            ]
        );
    }

    #[test]
    fn root_task_has_one_trivial_path() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("solo", 1.0)).unwrap();

        let paths = TaskScheduler::new(&graph).get_paths_to_completion(&id("solo"), None);
        assert_eq!(paths, vec![vec![id("solo")]]);
    }

    #[test]
    fn unknown_target_has_no_paths() {
        let graph = TaskGraph::new();
        let paths = TaskScheduler::new(&graph).get_paths_to_completion(&id("ghost"), None);
        assert!(paths.is_empty());
    }

    #[test]
    fn path_cap_truncates() {
        let mut graph = TaskGraph::new();
        for name in ["a", "b", "c", "d"] {
            graph.add_task(task(name, 1.0)).unwrap();
        }
        graph.add_dependency(&id("b"), &id("a")).unwrap();
        graph.add_dependency(&id("c"), &id("a")).unwrap();
        graph.add_dependency(&id("d"), &id("b")).unwrap();
        graph.add_dependency(&id("d"), &id("c")).unwrap();

        let paths = TaskScheduler::new(&graph).get_paths_to_completion(&id("d"), Some(1));
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn slack_on_diamond() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("a", 1.0)).unwrap();
        graph.add_task(task("b", 2.0)).unwrap();
        graph.add_task(task("c", 3.0)).unwrap();
        graph.add_task(task("d", 1.0)).unwrap();
        graph.add_dependency(&id("b"), &id("a")).unwrap();
        graph.add_dependency(&id("c"), &id("a")).unwrap();
        graph.add_dependency(&id("d"), &id("b")).unwrap();
        graph.add_dependency(&id("d"), &id("c")).unwrap();

        let scheduler = TaskScheduler::new(&graph);
        assert_eq!(scheduler.calculate_slack_time(&id("c")), Some(0.0));
        assert_eq!(scheduler.calculate_slack_time(&id("b")), Some(1.0));
        assert_eq!(scheduler.calculate_slack_time(&id("ghost")), None);
    }
}
