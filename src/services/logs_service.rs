//! Logs service - prints or tails the log streams of a service's running tasks

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::lookup;
use super::watch::{tail_log, Output, Timings};
use crate::domain::format::{arn_to_name, format_log_event};
use crate::domain::resolve::ResolvedDefinitions;
use crate::domain::task::LogLocation;
use crate::error::{ClientError, DeployError};
use crate::infrastructure::control_plane::ControlPlane;

#[derive(Debug, Clone, Default)]
pub struct LogsOptions {
    pub container: Option<String>,
    /// How far back from now to start; `None` starts now
    pub start_time: Option<Duration>,
    /// Keep following the streams until cancelled
    pub tail: bool,
}

pub struct LogsService<C: ControlPlane + 'static> {
    client: Arc<C>,
    timings: Timings,
    out: Arc<dyn Output>,
}

impl<C: ControlPlane + 'static> LogsService<C> {
    pub fn new(client: Arc<C>, timings: Timings, out: Arc<dyn Output>) -> Self {
        Self { client, timings, out }
    }

    pub async fn logs(
        &self,
        defs: &ResolvedDefinitions,
        service_name: &str,
        opts: &LogsOptions,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let locations = self.locations(defs, service_name, opts.container.as_deref()).await?;
        let since = since_millis(opts.start_time);

        if !opts.tail {
            let width = self.out.width();
            for location in &locations {
                let events = self
                    .client
                    .all_log_events(&location.group, &location.stream, since)
                    .await
                    .map_err(DeployError::control_plane("GetLogEvents", &location.stream))?;
                let prefix = format!("[{}] ", location.task_id());
                for event in &events {
                    self.out.print(&format_log_event(event, &prefix, width));
                }
            }
            return Ok(());
        }

        let token = cancel.child_token();
        let handles: Vec<_> = locations
            .into_iter()
            .map(|location| {
                let prefix = format!("[{}] ", location.task_id());
                tokio::spawn(tail_log(
                    self.client.clone(),
                    location,
                    since,
                    prefix,
                    self.timings.log_poll,
                    self.out.clone(),
                    token.clone(),
                ))
            })
            .collect();

        token.cancelled().await;
        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Log stream of the selected container for every running task of the service
    async fn locations(
        &self,
        defs: &ResolvedDefinitions,
        service_name: &str,
        container: Option<&str>,
    ) -> Result<Vec<LogLocation>, DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let svc = defs
            .find_service(service_name)
            .ok_or_else(|| DeployError::UndefinedService {
                name: service_name.to_string(),
            })?;

        let live = lookup::describe_service(self.client.as_ref(), cluster, &svc.full_name).await?;
        let arn = live.task_definition.ok_or_else(|| DeployError::ControlPlane {
            operation: "DescribeServices",
            target: svc.full_name.clone(),
            source: ClientError::Decode {
                message: "service carries no taskDefinition".to_string(),
            },
        })?;
        let td = lookup::describe_task_definition(self.client.as_ref(), &arn).await?;
        let definition = td
            .container(container)
            .ok_or_else(|| DeployError::ContainerNotFound {
                container: container.unwrap_or_default().to_string(),
                task_definition: arn_to_name(&arn).to_string(),
            })?;

        let tasks = self
            .client
            .list_service_tasks(cluster, &svc.full_name)
            .await
            .map_err(DeployError::control_plane("ListTasks", &svc.full_name))?;

        if definition.awslogs().is_none() {
            warn!(
                "Container {} does not log through awslogs with a stream prefix",
                definition.name
            );
        }
        let locations: Vec<LogLocation> = tasks
            .iter()
            .filter_map(|task| LogLocation::for_task(task, definition))
            .collect();
        info!("Reading {} log streams of {}", locations.len(), svc.full_name);
        Ok(locations)
    }
}

/// Epoch milliseconds `back` before now
fn since_millis(back: Option<Duration>) -> i64 {
    let now = Utc::now().timestamp_millis();
    let back = back.map(|d| d.as_millis() as i64).unwrap_or(0);
    now - back
}
