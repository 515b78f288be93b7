//! Task and dependency CLI commands

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Priority, Task, TaskId, TaskStatus};
use crate::storage::GraphStore;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Explicit task ID (generated from the title when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Intrinsic priority (low, medium, high, critical)
        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,

        /// Estimated effort in hours
        #[arg(long, default_value = "1.0")]
        effort: f64,

        /// IDs of tasks this one depends on (repeatable)
        #[arg(long = "dep")]
        deps: Vec<String>,

        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Deadline as an RFC 3339 timestamp
        #[arg(long)]
        deadline: Option<String>,

        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },

    /// List tasks
    List {
        /// Filter by status (not_started, in_progress, blocked, completed, cancelled)
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Mark task as completed
    Done {
        /// Task ID
        id: String,
    },

    /// Mark task as cancelled
    Cancel {
        /// Task ID
        id: String,
    },

    /// Return a finished or cancelled task to the backlog
    Reopen {
        /// Task ID
        id: String,
    },

    /// Remove a task and every edge referencing it
    Rm {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a dependency between tasks
    Add {
        /// Task that will be blocked
        task: String,

        /// Task that must be completed first
        depends_on: String,
    },

    /// Remove a dependency
    Rm {
        /// Task to unblock
        task: String,

        /// Dependency to remove
        depends_on: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output, store: &GraphStore) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            id,
            priority,
            effort,
            deps,
            tags,
            deadline,
            description,
        } => add_task(
            output,
            store,
            &title,
            id.as_deref(),
            priority,
            effort,
            &deps,
            tags,
            deadline,
            description,
        ),
        TaskCommands::List { status } => list_tasks(output, store, status),
        TaskCommands::Show { id } => show_task(output, store, &id),
        TaskCommands::Start { id } => set_status(output, store, &id, TaskStatus::InProgress),
        TaskCommands::Done { id } => set_status(output, store, &id, TaskStatus::Completed),
        TaskCommands::Cancel { id } => set_status(output, store, &id, TaskStatus::Cancelled),
        TaskCommands::Reopen { id } => set_status(output, store, &id, TaskStatus::NotStarted),
        TaskCommands::Rm { id } => remove_task(output, store, &id),
    }
}

pub fn run_dep(cmd: DepCommands, output: &Output, store: &GraphStore) -> Result<()> {
    match cmd {
        DepCommands::Add { task, depends_on } => add_dependency(output, store, &task, &depends_on),
        DepCommands::Rm { task, depends_on } => {
            remove_dependency(output, store, &task, &depends_on)
        }
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    match s.trim().to_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(format!("unknown priority: {}", other)),
    }
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    match s.trim().to_lowercase().as_str() {
        "not_started" => Ok(TaskStatus::NotStarted),
        "in_progress" => Ok(TaskStatus::InProgress),
        "blocked" => Ok(TaskStatus::Blocked),
        "completed" => Ok(TaskStatus::Completed),
        "cancelled" => Ok(TaskStatus::Cancelled),
        other => Err(format!("unknown status: {}", other)),
    }
}

#[allow(clippy::too_many_arguments)]
fn add_task(
    output: &Output,
    store: &GraphStore,
    title: &str,
    id_str: Option<&str>,
    priority: Priority,
    effort: f64,
    deps: &[String],
    tags: Vec<String>,
    deadline: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let mut graph = store.load()?;

    let task_id = match id_str {
        Some(s) => s.parse::<TaskId>()?,
        None => TaskId::generate(title, Utc::now()),
    };

    let mut task = Task::new(task_id.clone(), title);
    task.priority = priority;
    task.set_estimated_effort(effort);
    task.tags = tags;
    task.description = description;
    if let Some(deadline) = deadline {
        task.set_deadline(deadline);
    }

    // Edges are added explicitly after insertion so an unknown or cyclic
    // dependency aborts before anything is saved.
    graph.add_task(task)?;
    for dep_str in deps {
        let dep_id: TaskId = dep_str.parse()?;
        if !graph.contains(&dep_id) {
            bail!("Dependency not found: {}", dep_id);
        }
        graph.add_dependency(&task_id, &dep_id)?;
    }

    store.save(&graph)?;

    let task = graph.get(&task_id).context("task just added is missing")?;
    if output.is_json() {
        output.data(task);
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.title));
    }
    Ok(())
}

fn list_tasks(output: &Output, store: &GraphStore, status: Option<TaskStatus>) -> Result<()> {
    let graph = store.load()?;

    let mut tasks: Vec<&Task> = graph
        .iter()
        .map(|(_, task)| task)
        .filter(|task| status.map(|s| task.status == s).unwrap_or(true))
        .collect();
    tasks.sort_by(|a, b| a.id.cmp(&b.id));

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        println!("{:<16} {:<12} {:<9} {:>6}  TITLE", "ID", "STATUS", "PRIORITY", "EFFORT");
        println!("{}", "-".repeat(70));
        for task in tasks {
            println!(
                "{:<16} {:<12} {:<9} {:>6.1}  {}",
                task.id,
                task.status.label(),
                task.priority.label(),
                task.estimated_effort,
                task.title
            );
        }
    }
    Ok(())
}

fn show_task(output: &Output, store: &GraphStore, id_str: &str) -> Result<()> {
    let graph = store.load()?;
    let task_id: TaskId = id_str.parse()?;
    let Some(task) = graph.get(&task_id) else {
        bail!("Task not found: {}", task_id);
    };

    if output.is_json() {
        output.data(task);
        return Ok(());
    }

    println!("{} - {}", task.id, task.title);
    if let Some(description) = &task.description {
        println!("  {}", description);
    }
    println!("  status:   {}", task.status.label());
    println!("  priority: {}", task.priority.label());
    println!("  effort:   {:.1}h", task.estimated_effort);
    if let Some(deadline) = task.deadline() {
        println!("  deadline: {}", deadline);
    }
    if !task.tags.is_empty() {
        println!("  tags:     {}", task.tags.join(", "));
    }

    let mut deps: Vec<TaskId> = graph.get_dependencies(&task_id).into_iter().collect();
    deps.sort();
    if !deps.is_empty() {
        println!(
            "  depends on: {}",
            deps.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        );
    }
    let mut dependents: Vec<TaskId> = graph.get_dependents(&task_id).into_iter().collect();
    dependents.sort();
    if !dependents.is_empty() {
        println!(
            "  blocks:     {}",
            dependents.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        );
    }
    Ok(())
}

fn set_status(output: &Output, store: &GraphStore, id_str: &str, status: TaskStatus) -> Result<()> {
    let mut graph = store.load()?;
    let task_id: TaskId = id_str.parse()?;

    graph.set_status(&task_id, status)?;
    // A reopened task may itself still be waiting on dependencies.
    if status == TaskStatus::NotStarted {
        graph.refresh_blocked_status(&task_id);
    }
    store.save(&graph)?;

    let task = graph.get(&task_id).context("task just updated is missing")?;
    if output.is_json() {
        output.data(task);
    } else {
        output.success(&format!("{} is now {}", task.id, task.status.label()));
    }
    Ok(())
}

fn remove_task(output: &Output, store: &GraphStore, id_str: &str) -> Result<()> {
    let mut graph = store.load()?;
    let task_id: TaskId = id_str.parse()?;

    let Some(task) = graph.remove_task(&task_id) else {
        bail!("Task not found: {}", task_id);
    };
    store.save(&graph)?;

    output.success(&format!("Removed task: {} - {}", task.id, task.title));
    Ok(())
}

fn add_dependency(output: &Output, store: &GraphStore, task: &str, depends_on: &str) -> Result<()> {
    let mut graph = store.load()?;
    let task_id: TaskId = task.parse()?;
    let dep_id: TaskId = depends_on.parse()?;

    if graph.add_dependency(&task_id, &dep_id)? {
        store.save(&graph)?;
        output.success(&format!("{} now depends on {}", task_id, dep_id));
    } else {
        output.success(&format!("Ignored self-dependency on {}", task_id));
    }
    Ok(())
}

fn remove_dependency(
    output: &Output,
    store: &GraphStore,
    task: &str,
    depends_on: &str,
) -> Result<()> {
    let mut graph = store.load()?;
    let task_id: TaskId = task.parse()?;
    let dep_id: TaskId = depends_on.parse()?;

    if !graph.remove_dependency(&task_id, &dep_id) {
        bail!("{} does not depend on {}", task_id, dep_id);
    }
    store.save(&graph)?;
    output.success(&format!("{} no longer depends on {}", task_id, dep_id));
    Ok(())
}
