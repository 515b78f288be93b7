//! Task identifiers
//!
//! A task ID is an arbitrary caller-chosen string (non-empty, no
//! whitespace). When the caller does not care, [`TaskId::generate`] mints a
//! `t-{7-char-hash}` ID from the task title and creation timestamp, so the
//! same title at different times produces different IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("task id must not be empty")]
    Empty,

    #[error("task id must not contain whitespace: '{0}'")]
    Whitespace(String),
}

/// Unique string identity of a task. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task ID from a caller-supplied string.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(id));
        }
        Ok(Self(id))
    }

    /// Mints a `t-{7-char-hash}` ID from title and timestamp.
    pub fn generate(title: &str, timestamp: DateTime<Utc>) -> Self {
        let input = format!("{}{}", title, timestamp.timestamp_nanos_opt().unwrap_or(0));
        let hash = blake3::hash(input.as_bytes());
        let hex = hash.to_hex();
        Self(format!("t-{}", &hex[..7]))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
