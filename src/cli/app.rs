//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{logging, plan_cmd, task_cmd};
use crate::storage::GraphStore;

#[derive(Parser)]
#[command(name = "taskplan")]
#[command(author, version, about = "Dependency-aware task planning and scheduling")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to the graph file
    #[arg(long, global = true, env = "TASKPLAN_FILE", default_value = "taskplan.json")]
    pub file: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tasks
    #[command(subcommand)]
    Task(task_cmd::TaskCommands),

    /// Manage dependency edges
    #[command(subcommand)]
    Dep(task_cmd::DepCommands),

    /// Show the highest-priority tasks that are ready to start
    Next {
        /// Maximum number of tasks to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show all tasks in dependency order
    Order,

    /// Show the critical path and total project duration
    CriticalPath,

    /// Show tasks likely to delay the project
    Bottlenecks {
        /// Minimum dependent count to qualify on fan-out alone
        #[arg(long, default_value = "3")]
        threshold: usize,
    },

    /// Show every dependency path leading to a task
    Paths {
        /// Target task ID
        id: String,

        /// Stop after this many paths
        #[arg(long)]
        max_paths: Option<usize>,
    },

    /// Show how long a task can slip without delaying the project
    Slack {
        /// Task ID
        id: String,
    },

    /// Generate a resource-constrained schedule
    Schedule {
        /// Number of parallel workers
        #[arg(long, default_value = "1")]
        resources: usize,

        /// Schedule start as an RFC 3339 timestamp (defaults to now)
        #[arg(long)]
        start: Option<String>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let output = Output::new(cli.format);
    let store = GraphStore::new(&cli.file);

    match cli.command {
        Commands::Task(cmd) => task_cmd::run(cmd, &output, &store)?,
        Commands::Dep(cmd) => task_cmd::run_dep(cmd, &output, &store)?,
        Commands::Next { limit } => plan_cmd::next(&output, &store, limit)?,
        Commands::Order => plan_cmd::order(&output, &store)?,
        Commands::CriticalPath => plan_cmd::critical_path(&output, &store)?,
        Commands::Bottlenecks { threshold } => plan_cmd::bottlenecks(&output, &store, threshold)?,
        Commands::Paths { id, max_paths } => plan_cmd::paths(&output, &store, &id, max_paths)?,
        Commands::Slack { id } => plan_cmd::slack(&output, &store, &id)?,
        Commands::Schedule { resources, start } => {
            plan_cmd::schedule(&output, &store, resources, start.as_deref())?
        }
    }

    Ok(())
}
