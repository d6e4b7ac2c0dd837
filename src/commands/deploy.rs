use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use super::Session;
use crate::cli::CommonArgs;
use crate::services::{DeployOptions, DeployService, TermOutput, Timings};
use crate::ui;

pub async fn execute(common: CommonArgs, options: DeployOptions) -> Result<()> {
    let session = Session::open(&common)?;
    let settings = &session.defs.settings;

    ui::print_header(&format!("Deploy to {}", settings.cluster));
    info!("🎯 Cluster: {} ({})", settings.cluster, settings.region);
    info!(
        "📦 Task definitions: {}",
        session.defs.task_definitions.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    info!("🚀 Services: {}", session.defs.service_names().join(", "));
    if options.dry_run {
        println!("{}", "DRY RUN: no changes will be made".yellow().bold());
    }
    println!();

    let service = DeployService::new(
        session.client.clone(),
        Timings::default(),
        Arc::new(TermOutput::stdout()),
    );
    let report = service
        .deploy(&session.defs, &options, &session.cancel)
        .await
        .context("Deploy failed")?;

    ui::print_report(&report);
    if !report.dry_run {
        ui::print_success("Deploy completed");
    }
    Ok(())
}
