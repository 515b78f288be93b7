//! Task domain model
//!
//! Tasks are the atomic units of work in the graph. A task carries its
//! intrinsic priority, an effort estimate in hours, and the IDs of the tasks
//! it depends on. The `dependents` set is the mirror image of other tasks'
//! dependencies and is maintained by [`TaskGraph`](super::TaskGraph), never
//! by callers directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::id::TaskId;

/// Status of a task in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Returns true for statuses that take a task out of scheduling
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Returns a display label for the status
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Intrinsic priority level, independent of dependencies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Ordinal value used as the base term of effective priority
    pub fn ordinal(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }

    /// Returns a display label for the priority
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Metadata for a task - extensible key-value pairs
///
/// Every key is opaque to the engine except `deadline`, an RFC 3339 / ISO
/// 8601 timestamp read by the urgency factor of the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta(HashMap<String, serde_json::Value>);

impl TaskMeta {
    /// Creates empty metadata
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Sets a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a value
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key-value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

/// A unit of work with dependencies and prioritization attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Intrinsic priority level
    #[serde(default)]
    pub priority: Priority,

    /// Estimated effort in hours (non-negative)
    #[serde(default = "default_effort")]
    pub estimated_effort: f64,

    /// IDs of tasks that must be completed before this one
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub dependencies: HashSet<TaskId>,

    /// IDs of tasks that depend on this one (maintained by the graph)
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub dependents: HashSet<TaskId>,

    /// Tags for categorization (no scheduling semantics)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Extensible metadata; only `deadline` carries scheduling meaning
    #[serde(default, skip_serializing_if = "TaskMeta::is_empty")]
    pub metadata: TaskMeta,

    /// Cached effective priority from the last scheduler pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_priority: Option<f64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

fn default_effort() -> f64 {
    1.0
}

impl Task {
    /// Creates a new task with the given ID and title
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            estimated_effort: 1.0,
            dependencies: HashSet::new(),
            dependents: HashSet::new(),
            tags: Vec::new(),
            metadata: TaskMeta::new(),
            effective_priority: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the status unconditionally and touches `updated_at`.
    ///
    /// Transition legality is the graph's concern, not the task's.
    pub fn update_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Records a dependency on another task. Self-references are ignored.
    pub fn add_dependency(&mut self, task_id: TaskId) {
        if task_id != self.id && self.dependencies.insert(task_id) {
            self.updated_at = Utc::now();
        }
    }

    /// Drops a dependency if present.
    pub fn remove_dependency(&mut self, task_id: &TaskId) {
        if self.dependencies.remove(task_id) {
            self.updated_at = Utc::now();
        }
    }

    /// Records a dependent task. Self-references are ignored.
    pub fn add_dependent(&mut self, task_id: TaskId) {
        if task_id != self.id && self.dependents.insert(task_id) {
            self.updated_at = Utc::now();
        }
    }

    /// Sets the effort estimate, clamping negatives to zero.
    pub fn set_estimated_effort(&mut self, hours: f64) {
        self.estimated_effort = hours.max(0.0);
        self.updated_at = Utc::now();
    }

    /// Caches an effective priority computed by a scheduler pass.
    ///
    /// The engine never writes this cache itself: scheduler passes return
    /// their score map and leave tasks untouched. Callers that want scores
    /// persisted copy the map in through this method before saving.
    pub fn set_effective_priority(&mut self, value: f64) {
        self.effective_priority = Some(value);
    }

    /// The effective priority: cached value if a scheduler pass set one,
    /// otherwise the ordinal value of the intrinsic priority.
    pub fn effective_priority(&self) -> f64 {
        self.effective_priority
            .unwrap_or_else(|| f64::from(self.priority.ordinal()))
    }

    /// Returns the deadline metadata string, if any.
    pub fn deadline(&self) -> Option<&str> {
        self.metadata.get("deadline").and_then(|v| v.as_str())
    }

    /// Sets the deadline metadata key.
    pub fn set_deadline(&mut self, deadline: impl Into<String>) {
        self.metadata.set("deadline", deadline.into());
        self.updated_at = Utc::now();
    }
}
