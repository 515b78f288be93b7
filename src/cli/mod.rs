//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Task | Work item management | `task add`, `task start`, `task done` |
//! | Dep | Dependency edges | `dep add`, `dep rm` |
//! | Plan | Scheduling queries | `next`, `order`, `critical-path`, `schedule` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod logging;
mod output;
mod plan_cmd;
mod task_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
