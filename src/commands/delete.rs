use anyhow::{Context, Result};
use std::sync::Arc;

use super::Session;
use crate::cli::CommonArgs;
use crate::services::{DeleteOptions, DeployService, TermOutput, Timings};
use crate::ui;

pub async fn execute(common: CommonArgs, options: DeleteOptions) -> Result<()> {
    let session = Session::open(&common)?;
    ui::print_header(&format!("Delete services in {}", session.defs.settings.cluster));

    let service = DeployService::new(
        session.client.clone(),
        Timings::default(),
        Arc::new(TermOutput::stdout()),
    );
    let report = service
        .delete(&session.defs, &options)
        .await
        .context("Delete failed")?;

    ui::print_report(&report);
    if !report.dry_run && !report.is_empty() {
        ui::print_success(&format!("Deleted {} service(s)", report.changes.len()));
    }
    Ok(())
}
