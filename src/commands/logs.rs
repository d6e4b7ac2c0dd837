use anyhow::{Context, Result};
use std::sync::Arc;

use super::Session;
use crate::cli::CommonArgs;
use crate::services::{LogsOptions, LogsService, TermOutput, Timings};

pub async fn execute(common: CommonArgs, service_name: String, options: LogsOptions) -> Result<()> {
    let session = Session::open(&common)?;

    let service = LogsService::new(
        session.client.clone(),
        Timings::default(),
        Arc::new(TermOutput::stdout()),
    );
    service
        .logs(&session.defs, &service_name, &options, &session.cancel)
        .await
        .with_context(|| format!("Failed to read logs of {}", service_name))
}
