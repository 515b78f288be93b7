//! JSON file storage for the task graph
//!
//! The whole graph is stored as one pretty-printed snapshot. Uses file
//! locking for concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use crate::domain::{GraphSnapshot, TaskGraph};

/// Store for a task graph snapshot in a JSON file
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    /// Creates a store backed by the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the graph. A missing file yields an empty graph.
    pub fn load(&self) -> Result<TaskGraph> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no graph file; starting empty");
            return Ok(TaskGraph::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open graph file: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on graph file")?;

        let reader = BufReader::new(&file);
        let snapshot: GraphSnapshot = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse graph file: {}", self.path.display()))?;

        // Lock is released when file is dropped
        Ok(TaskGraph::from_snapshot(snapshot))
    }

    /// Writes the graph (full rewrite)
    pub fn save(&self, graph: &TaskGraph) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        // Exclusive lock on the destination for the whole write, so a
        // concurrent load sees either the old snapshot or the new one.
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open graph file: {}", self.path.display()))?;
        lock_file
            .lock_exclusive()
            .context("Failed to acquire write lock on graph file")?;

        // Write to temp file first
        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, &graph.to_snapshot())
                .context("Failed to serialize graph")?;
            writer.flush().context("Failed to flush graph file")?;
        }

        // Atomic rename; the lock on the old inode is released when
        // lock_file drops.
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
