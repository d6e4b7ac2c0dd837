use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use super::Session;
use crate::cli::CommonArgs;
use crate::domain::format::format_task;
use crate::services::{RunOptions, RunService, TermOutput, Timings};
use crate::ui;

pub async fn execute(common: CommonArgs, service_name: String, options: RunOptions) -> Result<()> {
    let session = Session::open(&common)?;
    ui::print_header(&format!("Run task for {}", service_name));

    let service = RunService::new(
        session.client.clone(),
        Timings::default(),
        Arc::new(TermOutput::stdout()),
    );
    let tasks = service
        .run(&session.defs, &service_name, &options, &session.cancel)
        .await
        .with_context(|| format!("Run failed for service {}", service_name))?;

    println!();
    println!("{}", "Tasks:".bold());
    for task in &tasks {
        println!("{}", format_task(task));
    }
    println!();

    if options.no_wait {
        ui::print_info(&format!("Started {} task(s)", tasks.len()));
    } else {
        ui::print_success(&format!("{} task(s) finished", tasks.len()));
    }
    Ok(())
}
