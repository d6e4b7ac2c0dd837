//! Rollback service - re-points services at their previous revision
//!
//! A rollback is a pure task definition pointer change: no attribute
//! updates and no forced deployment. The revision being rolled away from
//! can be deregistered, but only after the services are confirmed stable.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::lookup;
use super::watch::{sleep_or_cancel, wait_services_stable, Output, Timings};
use crate::domain::format::arn_to_name;
use crate::domain::plan::{ChangeReport, ChangeSymbol, PlannedChange, ResourceKind};
use crate::domain::resolve::ResolvedDefinitions;
use crate::error::{ClientError, DeployError};
use crate::infrastructure::control_plane::{ControlPlane, UpdateServiceRequest};

#[derive(Debug, Clone, Default)]
pub struct RollbackOptions {
    pub no_wait: bool,
    /// Deregister the revision rolled away from once stable
    pub deregister: bool,
    pub dry_run: bool,
}

/// One service's rollback step
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    service: String,
    current: String,
    target: String,
}

pub struct RollbackService<C: ControlPlane + 'static> {
    client: Arc<C>,
    timings: Timings,
    out: Arc<dyn Output>,
}

impl<C: ControlPlane + 'static> RollbackService<C> {
    pub fn new(client: Arc<C>, timings: Timings, out: Arc<dyn Output>) -> Self {
        Self { client, timings, out }
    }

    pub async fn rollback(
        &self,
        defs: &ResolvedDefinitions,
        opts: &RollbackOptions,
        cancel: &CancellationToken,
    ) -> Result<ChangeReport, DeployError> {
        let mut report = ChangeReport::new(opts.dry_run);
        let cluster = defs.settings.cluster.as_str();

        // Every target is found before the first service is touched
        let steps = self.plan(defs).await?;

        for step in &steps {
            if !opts.dry_run {
                let mut request = UpdateServiceRequest::new(cluster, &step.service);
                request.task_definition = Some(step.target.clone());
                request.force_new_deployment = Some(false);
                self.client
                    .update_service(&request)
                    .await
                    .map_err(DeployError::control_plane("UpdateService", &step.service))?;
                sleep_or_cancel(self.timings.settle, cancel, "UpdateService").await?;
                info!(
                    "Rolled back service {} from {} to {}",
                    step.service,
                    arn_to_name(&step.current),
                    arn_to_name(&step.target)
                );
            }
            report.push(
                PlannedChange::new(ChangeSymbol::Modify, ResourceKind::Service, &step.service).with_detail(
                    format!(
                        "task definition: {} -> {}",
                        arn_to_name(&step.current),
                        arn_to_name(&step.target)
                    ),
                ),
            );
        }

        if steps.is_empty() || opts.dry_run {
            if opts.deregister {
                for step in &steps {
                    report.push(PlannedChange::new(
                        ChangeSymbol::Remove,
                        ResourceKind::TaskDefinition,
                        arn_to_name(&step.current),
                    ));
                }
            }
            return Ok(report);
        }

        if opts.no_wait {
            if opts.deregister {
                warn!("Skipping deregistration: it requires waiting for the services to become stable");
            }
            return Ok(report);
        }

        let names: Vec<String> = steps.iter().map(|s| s.service.clone()).collect();
        info!("Waiting for services to become stable");
        wait_services_stable(
            self.client.clone(),
            cluster,
            &names,
            Utc::now(),
            self.timings,
            self.out.clone(),
            cancel,
        )
        .await?;
        info!("Services are stable");

        if opts.deregister {
            for step in &steps {
                self.client
                    .deregister_task_definition(&step.current)
                    .await
                    .map_err(DeployError::control_plane("DeregisterTaskDefinition", &step.current))?;
                info!("Deregistered task definition {}", arn_to_name(&step.current));
                report.push(PlannedChange::new(
                    ChangeSymbol::Remove,
                    ResourceKind::TaskDefinition,
                    arn_to_name(&step.current),
                ));
            }
        }

        Ok(report)
    }

    async fn plan(&self, defs: &ResolvedDefinitions) -> Result<Vec<Step>, DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let mut steps = Vec::new();
        let described = lookup::describe_services(self.client.as_ref(), cluster, &defs.service_names()).await?;

        for svc in defs.services.values() {
            let Some(live) = described.find(&svc.full_name).cloned() else {
                warn!("Service {} does not exist, nothing to roll back", svc.full_name);
                continue;
            };
            if live.is_inactive() {
                warn!("Service {} is INACTIVE, nothing to roll back", svc.full_name);
                continue;
            }

            let current = live.task_definition.ok_or_else(|| DeployError::ControlPlane {
                operation: "DescribeServices",
                target: svc.full_name.clone(),
                source: ClientError::Decode {
                    message: "service carries no taskDefinition".to_string(),
                },
            })?;
            let target = lookup::find_rollback_target(self.client.as_ref(), &current).await?;

            steps.push(Step {
                service: svc.full_name.clone(),
                current,
                target,
            });
        }

        Ok(steps)
    }
}
