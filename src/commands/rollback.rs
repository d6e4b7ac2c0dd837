//! Rollback command.
//!
//! Points every configured service at the revision registered just before
//! its current one. With `--deregister` the abandoned revision is removed
//! once the services are stable again.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::Session;
use crate::cli::CommonArgs;
use crate::services::{RollbackOptions, RollbackService, TermOutput, Timings};
use crate::ui;

pub async fn execute(common: CommonArgs, options: RollbackOptions) -> Result<()> {
    let session = Session::open(&common)?;
    ui::print_header(&format!("Rollback in {}", session.defs.settings.cluster));

    let service = RollbackService::new(
        session.client.clone(),
        Timings::default(),
        Arc::new(TermOutput::stdout()),
    );
    let report = service
        .rollback(&session.defs, &options, &session.cancel)
        .await
        .context("Rollback failed")?;

    ui::print_report(&report);
    if !report.dry_run && !report.is_empty() {
        ui::print_success("Rollback completed");
    }
    Ok(())
}
