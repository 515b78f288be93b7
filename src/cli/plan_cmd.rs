//! Scheduling and analysis CLI commands

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use super::output::Output;
use crate::domain::TaskId;
use crate::sched::TaskScheduler;
use crate::storage::GraphStore;

pub fn next(output: &Output, store: &GraphStore, limit: usize) -> Result<()> {
    let graph = store.load()?;
    let scheduler = TaskScheduler::new(&graph);
    let ranked = scheduler.get_next_tasks(Utc::now(), limit);

    if output.is_json() {
        let items: Vec<_> = ranked
            .iter()
            .map(|(id, score)| {
                serde_json::json!({
                    "id": id,
                    "score": score,
                    "title": graph.get(id).map(|t| t.title.clone()),
                })
            })
            .collect();
        output.data(&items);
    } else if ranked.is_empty() {
        println!("Nothing is ready to start");
    } else {
        println!("{:<16} {:>8}  TITLE", "ID", "SCORE");
        println!("{}", "-".repeat(50));
        for (id, score) in &ranked {
            let title = graph.get(id).map(|t| t.title.as_str()).unwrap_or("");
            println!("{:<16} {:>8.2}  {}", id, score, title);
        }
    }
    Ok(())
}

pub fn order(output: &Output, store: &GraphStore) -> Result<()> {
    let graph = store.load()?;
    let order = graph.topological_sort()?;

    if output.is_json() {
        output.data(&order);
    } else if order.is_empty() {
        println!("No tasks");
    } else {
        for (i, id) in order.iter().enumerate() {
            let title = graph.get(id).map(|t| t.title.as_str()).unwrap_or("");
            println!("{:>3}. {:<16} {}", i + 1, id, title);
        }
    }
    Ok(())
}

pub fn critical_path(output: &Output, store: &GraphStore) -> Result<()> {
    let graph = store.load()?;
    let path = graph.calculate_critical_path();
    let total = graph.completion_time();

    if output.is_json() {
        output.data(&serde_json::json!({
            "critical_path": path,
            "completion_time_hours": total,
        }));
    } else if path.is_empty() {
        println!("No critical path (empty graph)");
    } else {
        println!("Critical path ({:.1}h total):", total);
        for id in &path {
            let title = graph.get(id).map(|t| t.title.as_str()).unwrap_or("");
            let effort = graph.get(id).map(|t| t.estimated_effort).unwrap_or(0.0);
            println!("  {:<16} {:>5.1}h  {}", id, effort, title);
        }
    }
    Ok(())
}

pub fn bottlenecks(output: &Output, store: &GraphStore, threshold: usize) -> Result<()> {
    let graph = store.load()?;
    let scheduler = TaskScheduler::new(&graph);
    let bottlenecks = scheduler.identify_bottlenecks(threshold);

    if output.is_json() {
        output.data(&bottlenecks);
    } else if bottlenecks.is_empty() {
        println!("No bottlenecks");
    } else {
        for b in &bottlenecks {
            let title = graph.get(&b.task_id).map(|t| t.title.as_str()).unwrap_or("");
            println!("{} ({} dependents) {}", b.task_id, b.dependent_count, title);
            for reason in &b.reasons {
                println!("  - {}", reason);
            }
        }
    }
    Ok(())
}

pub fn paths(
    output: &Output,
    store: &GraphStore,
    id_str: &str,
    max_paths: Option<usize>,
) -> Result<()> {
    let graph = store.load()?;
    let task_id: TaskId = id_str.parse()?;
    if !graph.contains(&task_id) {
        bail!("Task not found: {}", task_id);
    }

    let scheduler = TaskScheduler::new(&graph);
    let paths = scheduler.get_paths_to_completion(&task_id, max_paths);

    if output.is_json() {
        output.data(&paths);
    } else {
        println!("{} path(s) to {}:", paths.len(), task_id);
        for path in &paths {
            let rendered: Vec<String> = path.iter().map(|id| id.to_string()).collect();
            println!("  {}", rendered.join(" -> "));
        }
    }
    Ok(())
}

pub fn slack(output: &Output, store: &GraphStore, id_str: &str) -> Result<()> {
    let graph = store.load()?;
    let task_id: TaskId = id_str.parse()?;

    let scheduler = TaskScheduler::new(&graph);
    let Some(slack) = scheduler.calculate_slack_time(&task_id) else {
        bail!("Slack not calculable for {}", task_id);
    };

    if output.is_json() {
        output.data(&serde_json::json!({ "id": task_id, "slack_hours": slack }));
    } else {
        println!("{} can slip {:.1}h without delaying the project", task_id, slack);
    }
    Ok(())
}

pub fn schedule(
    output: &Output,
    store: &GraphStore,
    resources: usize,
    start: Option<&str>,
) -> Result<()> {
    let graph = store.load()?;
    let start = match start {
        Some(s) => s
            .parse::<DateTime<Utc>>()
            .with_context(|| format!("Invalid start timestamp: {}", s))?,
        None => Utc::now(),
    };

    let scheduler = TaskScheduler::new(&graph);
    let schedule = scheduler.generate_schedule(start, resources);

    if output.is_json() {
        output.data(&schedule);
        return Ok(());
    }

    if schedule.slots.is_empty() {
        println!("Nothing to schedule");
        return Ok(());
    }

    println!(
        "Schedule: {} worker(s), {:.1}h total, done {}",
        schedule.resources_used,
        schedule.project_duration_hours,
        schedule.project_end.format("%Y-%m-%d %H:%M"),
    );
    output.blank();
    println!("{:<16} {:>3}  {:<16} {:<16}  TITLE", "ID", "RES", "START", "END");
    println!("{}", "-".repeat(75));
    for slot in &schedule.slots {
        let title = graph.get(&slot.task_id).map(|t| t.title.as_str()).unwrap_or("");
        println!(
            "{:<16} {:>3}  {:<16} {:<16}  {}",
            slot.task_id,
            slot.resource,
            slot.start.format("%Y-%m-%d %H:%M"),
            slot.end.format("%Y-%m-%d %H:%M"),
            title
        );
    }
    if schedule.unscheduled_count > 0 {
        output.blank();
        println!("{} task(s) could not be scheduled", schedule.unscheduled_count);
    }
    Ok(())
}
