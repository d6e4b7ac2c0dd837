//! Run service - starts one-off tasks with a service's placement settings
//!
//! The selected container's log stream is tailed while the task-stopped
//! wait runs; the tail stops as soon as the wait returns.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lookup;
use super::watch::{tail_log, wait_or_cancel, Output, Timings};
use crate::domain::definition::TaskDefinition;
use crate::domain::format::arn_to_name;
use crate::domain::resolve::{ResolvedDefinitions, ResolvedService};
use crate::domain::task::{LogLocation, Task, TaskOverride};
use crate::domain::template;
use crate::error::{ClientError, DeployError};
use crate::infrastructure::control_plane::{ControlPlane, RunTaskRequest};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Task definition template to register and run instead of the service's revision
    pub task_definition: Option<PathBuf>,
    pub container: Option<String>,
    /// Raw overrides JSON
    pub overrides: Option<String>,
    pub command: Option<Vec<String>>,
    pub count: i64,
    pub no_wait: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            task_definition: None,
            container: None,
            overrides: None,
            command: None,
            count: 1,
            no_wait: false,
        }
    }
}

pub struct RunService<C: ControlPlane + 'static> {
    client: Arc<C>,
    timings: Timings,
    out: Arc<dyn Output>,
}

impl<C: ControlPlane + 'static> RunService<C> {
    pub fn new(client: Arc<C>, timings: Timings, out: Arc<dyn Output>) -> Self {
        Self { client, timings, out }
    }

    /// Start tasks for `service_name` and, unless `no_wait`, wait for them to stop.
    ///
    /// Returns the started tasks, described again after the wait.
    pub async fn run(
        &self,
        defs: &ResolvedDefinitions,
        service_name: &str,
        opts: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Task>, DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let svc = defs
            .find_service(service_name)
            .ok_or_else(|| DeployError::UndefinedService {
                name: service_name.to_string(),
            })?;

        let live = lookup::describe_service(self.client.as_ref(), cluster, &svc.full_name).await?;
        let (arn, td) = match &opts.task_definition {
            Some(path) => self.register_template(defs, svc, path).await?,
            None => {
                let arn = live.task_definition.clone().ok_or_else(|| DeployError::ControlPlane {
                    operation: "DescribeServices",
                    target: svc.full_name.clone(),
                    source: ClientError::Decode {
                        message: "service carries no taskDefinition".to_string(),
                    },
                })?;
                let td = lookup::describe_task_definition(self.client.as_ref(), &arn).await?;
                (arn, td)
            }
        };

        let container = td
            .container(opts.container.as_deref())
            .ok_or_else(|| DeployError::ContainerNotFound {
                container: opts.container.clone().unwrap_or_default(),
                task_definition: arn_to_name(&arn).to_string(),
            })?;

        let overrides = TaskOverride::build(opts.overrides.as_deref(), &container.name, opts.command.clone())?;
        let request = RunTaskRequest::for_service(cluster, &live, &arn, opts.count.max(1), overrides);
        debug!("Run task request for {}: {:?}", svc.full_name, request);

        let started_at = Utc::now().timestamp_millis();
        let out = self
            .client
            .run_task(&request)
            .await
            .map_err(DeployError::control_plane("RunTask", arn_to_name(&arn)))?;

        if let Some(failure) = out.failures.into_iter().next() {
            return Err(DeployError::ControlPlane {
                operation: "RunTask",
                target: arn_to_name(&arn).to_string(),
                source: failure.into_error(),
            });
        }
        if out.tasks.is_empty() {
            return Err(DeployError::ControlPlane {
                operation: "RunTask",
                target: arn_to_name(&arn).to_string(),
                source: ClientError::Decode {
                    message: "no task was started".to_string(),
                },
            });
        }

        let arns: Vec<String> = out.tasks.iter().map(|t| t.task_arn.clone()).collect();
        for task in &out.tasks {
            info!("Task {} started with {}", task.id(), arn_to_name(&arn));
        }

        if opts.no_wait {
            return Ok(out.tasks);
        }

        let tail = cancel.child_token();
        let handles: Vec<_> = out
            .tasks
            .iter()
            .filter_map(|task| LogLocation::for_task(task, container))
            .map(|location| {
                let prefix = format!("[{}] ", location.task_id());
                tokio::spawn(tail_log(
                    self.client.clone(),
                    location,
                    started_at,
                    prefix,
                    self.timings.log_poll,
                    self.out.clone(),
                    tail.clone(),
                ))
            })
            .collect();

        info!("Waiting for tasks to stop");
        let result = wait_or_cancel(
            self.client.wait_until_tasks_stopped(cluster, &arns),
            cancel,
            "WaitUntilTasksStopped",
            arns.join(","),
        )
        .await;

        tail.cancel();
        for handle in handles {
            let _ = handle.await;
        }
        result?;

        let stopped = self
            .client
            .describe_tasks(cluster, &arns)
            .await
            .map_err(DeployError::control_plane("DescribeTasks", arns.join(",")))?;
        for task in &stopped.tasks {
            task.check_exit(&container.name)?;
            info!("Task {} finished", task.id());
        }

        Ok(stopped.tasks)
    }

    /// Render `path` with the resolved parameters and register it
    async fn register_template(
        &self,
        defs: &ResolvedDefinitions,
        svc: &ResolvedService,
        path: &Path,
    ) -> Result<(String, TaskDefinition), DeployError> {
        let mut body: TaskDefinition = template::render_as(path, &defs.params)?;
        if body.family.as_deref().map(str::is_empty).unwrap_or(true) {
            body.family = Some(defs.referenced_task_definition(svc)?.family.clone());
        }
        let family = body.family.clone().unwrap_or_default();

        let registered = self
            .client
            .register_task_definition(&body.registration_input())
            .await
            .map_err(DeployError::control_plane("RegisterTaskDefinition", &family))?;
        let arn = registered
            .task_definition_arn
            .clone()
            .ok_or_else(|| DeployError::ControlPlane {
                operation: "RegisterTaskDefinition",
                target: family,
                source: ClientError::Decode {
                    message: "response carries no taskDefinitionArn".to_string(),
                },
            })?;

        info!("Registered task definition {}", arn_to_name(&arn));
        Ok((arn, registered))
    }
}
