//! Status command
//!
//! Shows deployments, task sets, tasks and recent events of every configured
//! service, followed by the cluster summary.

use anyhow::{Context, Result};
use colored::Colorize;
use console::Term;

use super::Session;
use crate::cli::CommonArgs;
use crate::domain::format::{arn_to_name, format_deployment, format_event, format_task, format_task_set, DEFAULT_WIDTH};
use crate::services::{ServiceStatus, StatusReport, StatusService};

pub async fn execute(common: CommonArgs, events: usize) -> Result<()> {
    let session = Session::open(&common)?;
    let report = StatusService::new(session.client.clone())
        .status(&session.defs)
        .await
        .context("Failed to read status")?;

    print_report(&report, events, terminal_width());
    Ok(())
}

fn terminal_width() -> usize {
    let term = Term::stdout();
    if term.is_term() {
        term.size().1 as usize
    } else {
        DEFAULT_WIDTH
    }
}

fn print_report(report: &StatusReport, events: usize, width: usize) {
    for status in &report.services {
        print_service(status, events, width);
    }
    for name in &report.missing {
        println!("{} {}", "Service:".bold(), name.cyan());
        println!("  {}", "not found".red());
        println!();
    }

    if let Some(cluster) = &report.cluster {
        println!("{} {}", "Cluster:".bold(), cluster.cluster_name.cyan());
        println!("  Status:        {}", cluster.status);
        println!("  Running tasks: {}", cluster.running_tasks_count);
    }
}

fn print_service(status: &ServiceStatus, events: usize, width: usize) {
    let svc = &status.service;
    println!("{} {}", "Service:".bold(), svc.name().cyan());
    println!(
        "  Task definition: {}",
        svc.task_definition.as_deref().map(arn_to_name).unwrap_or("-")
    );
    println!("  Status:          {}", svc.status.as_deref().unwrap_or("-"));

    println!("  {}", "Deployments:".bold());
    for deployment in &svc.deployments {
        println!("  {}", format_deployment(deployment));
    }

    if !svc.task_sets.is_empty() {
        println!("  {}", "Task sets:".bold());
        for task_set in &svc.task_sets {
            println!("  {}", format_task_set(task_set));
        }
    }

    println!("  {}", "Tasks:".bold());
    for task in &status.tasks {
        println!("  {}", format_task(task));
    }

    println!("  {}", "Events:".bold());
    for event in svc.events.iter().take(events) {
        for line in format_event(event, width) {
            println!("  {}", line.dimmed());
        }
    }
    println!();
}
