//! Command implementations
//!
//! Each subcommand resolves the config stack, opens a control plane client
//! and hands off to a service. Printing happens here and nowhere below.

pub mod delete;
pub mod deploy;
pub mod logs;
pub mod rollback;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::CommonArgs;
use crate::config::{load_config_stack, params_from_pairs};
use crate::domain::resolve::{resolve, ResolvedDefinitions};
use crate::infrastructure::{HttpControlPlane, HttpControlPlaneConfig};

/// Resolved definitions plus everything needed to act on them
pub struct Session {
    pub defs: ResolvedDefinitions,
    pub client: Arc<HttpControlPlane>,
    pub cancel: CancellationToken,
}

impl Session {
    /// Load and resolve the config stack, then connect to its cluster.
    ///
    /// The returned token is cancelled on Ctrl-C or when `--timeout` elapses.
    pub fn open(common: &CommonArgs) -> Result<Self> {
        let stack = load_config_stack(&common.config)
            .with_context(|| format!("Failed to load config stack from {}", common.config.display()))?;
        let additional = params_from_pairs(common.params.iter().cloned());
        let defs = resolve(&stack, &additional).context("Failed to resolve definitions")?;
        debug!(
            "Resolved {} task definitions and {} services for cluster {}",
            defs.task_definitions.len(),
            defs.services.len(),
            defs.settings.cluster
        );

        let config = HttpControlPlaneConfig::for_region(
            &defs.settings.region,
            common.endpoint_url.clone(),
            common.logs_endpoint_url.clone(),
        );
        debug!("Control plane endpoint: {}", config.ecs_endpoint);
        let client = HttpControlPlane::new(config).context("Failed to build control plane client")?;

        Ok(Self {
            defs,
            client: Arc::new(client),
            cancel: cancel_on_signal(common.timeout),
        })
    }
}

/// Token cancelled by Ctrl-C or after `deadline`
fn cancel_on_signal(deadline: Option<std::time::Duration>) -> CancellationToken {
    let token = CancellationToken::new();

    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            on_interrupt.cancel();
        }
    });

    if let Some(deadline) = deadline {
        let on_deadline = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = on_deadline.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    warn!("Deadline of {} reached, stopping", humantime::format_duration(deadline));
                    on_deadline.cancel();
                }
            }
        });
    }

    token
}
