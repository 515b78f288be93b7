//! Serializable snapshot of a task graph
//!
//! The adjacency maps are derived state, so the snapshot stores each task
//! plus one sorted dependency row per task that has any. Rebuilding replays
//! the rows through the normal guarded mutations, which makes loading
//! best-effort: an edge that no longer resolves (or would close a cycle) is
//! dropped with a warning instead of poisoning the whole graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::graph::TaskGraph;
use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub tasks: HashMap<TaskId, Task>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependencies: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskGraph {
    /// Captures the graph as a snapshot.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut tasks = HashMap::with_capacity(self.len());
        let mut dependencies = HashMap::new();

        for (task_id, task) in self.iter() {
            tasks.insert(task_id.clone(), task.clone());
            let deps = self.get_dependencies(task_id);
            if !deps.is_empty() {
                let mut row: Vec<TaskId> = deps.into_iter().collect();
                row.sort();
                dependencies.insert(task_id.clone(), row);
            }
        }

        GraphSnapshot { tasks, dependencies }
    }

    /// Rebuilds a graph from a snapshot.
    ///
    /// Tasks are inserted with their edge sets cleared, then every recorded
    /// dependency row is replayed through [`TaskGraph::add_dependency`].
    /// Rows that fail to replay are dropped with a warning.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = TaskGraph::new();

        let mut ids: Vec<TaskId> = snapshot.tasks.keys().cloned().collect();
        ids.sort();

        for task_id in &ids {
            let mut task = snapshot.tasks[task_id].clone();
            task.dependencies.clear();
            task.dependents.clear();
            if let Err(e) = graph.add_task(task) {
                warn!(task = %task_id, error = %e, "skipping task from snapshot");
            }
        }

        let mut edge_rows: Vec<(&TaskId, &Vec<TaskId>)> = snapshot.dependencies.iter().collect();
        edge_rows.sort_by_key(|(task_id, _)| *task_id);

        for (task_id, deps) in edge_rows {
            for dep_id in deps {
                if let Err(e) = graph.add_dependency(task_id, dep_id) {
                    warn!(task = %task_id, dependency = %dep_id, error = %e, "dropping edge from snapshot");
                }
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskStatus};

    fn id(name: &str) -> TaskId {
        TaskId::new(name).unwrap()
    }

    #[test]
    fn roundtrip_preserves_tasks_and_edges() {
        let mut graph = TaskGraph::new();
        let mut a = Task::new(id("a"), "a");
        a.priority = Priority::High;
        a.set_estimated_effort(2.0);
        a.set_deadline("2026-09-01T00:00:00Z");
        graph.add_task(a).unwrap();
        graph.add_task(Task::new(id("b"), "b")).unwrap();
        graph.add_task(Task::new(id("c"), "c")).unwrap();
        graph.add_dependency(&id("b"), &id("a")).unwrap();
        graph.add_dependency(&id("c"), &id("b")).unwrap();
        graph.set_status(&id("a"), TaskStatus::InProgress).unwrap();

        let json = serde_json::to_string(&graph.to_snapshot()).unwrap();
        let restored = TaskGraph::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.len(), 3);
        let a = restored.get(&id("a")).unwrap();
        assert_eq!(a.priority, Priority::High);
        assert_eq!(a.estimated_effort, 2.0);
        assert_eq!(a.deadline(), Some("2026-09-01T00:00:00Z"));
        assert_eq!(a.status, TaskStatus::InProgress);

        assert_eq!(restored.get_dependencies(&id("b")), [id("a")].into());
        assert_eq!(restored.get_dependencies(&id("c")), [id("b")].into());
        assert_eq!(restored.get_dependents(&id("a")), [id("b")].into());
    }

    #[test]
    fn unknown_edge_target_is_dropped() {
        let mut snapshot = GraphSnapshot::default();
        let task = Task::new(id("a"), "a");
        snapshot.tasks.insert(id("a"), task);
        snapshot.dependencies.insert(id("a"), vec![id("ghost")]);

        let graph = TaskGraph::from_snapshot(snapshot);
        assert_eq!(graph.len(), 1);
        assert!(graph.get_dependencies(&id("a")).is_empty());
    }

    #[test]
    fn cyclic_snapshot_edges_are_dropped() {
        let mut snapshot = GraphSnapshot::default();
        snapshot.tasks.insert(id("a"), Task::new(id("a"), "a"));
        snapshot.tasks.insert(id("b"), Task::new(id("b"), "b"));
        snapshot.dependencies.insert(id("a"), vec![id("b")]);
        snapshot.dependencies.insert(id("b"), vec![id("a")]);

        let graph = TaskGraph::from_snapshot(snapshot);
        // One direction replays; the closing edge is rejected.
        let edge_count = graph.get_dependencies(&id("a")).len()
            + graph.get_dependencies(&id("b")).len();
        assert_eq!(edge_count, 1);
        assert!(graph.topological_sort().is_ok());
    }

    #[test]
    fn stale_task_edge_sets_are_rebuilt_from_rows() {
        // A snapshot whose task carries dependency IDs with no matching row
        // rebuilds only from the rows.
        let mut snapshot = GraphSnapshot::default();
        let mut task = Task::new(id("a"), "a");
        task.add_dependency(id("stale"));
        snapshot.tasks.insert(id("a"), task);

        let graph = TaskGraph::from_snapshot(snapshot);
        assert!(graph.get(&id("a")).unwrap().dependencies.is_empty());
    }
}
