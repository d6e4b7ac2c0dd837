//! HTTP control plane client
//!
//! Speaks the JSON 1.1 protocol (`POST /` with an `X-Amz-Target` header) to a
//! container service endpoint and a log service endpoint.
//!
//! ## Configuration
//!
//! Endpoints default to the regional public endpoints and can be pointed at a
//! signing proxy or a local emulator:
//! ```bash
//! export ECSFORGE_ENDPOINT_URL=http://localhost:4566
//! export ECSFORGE_LOGS_ENDPOINT_URL=http://localhost:4566
//! ```
//!
//! Requests are sent unsigned; credentials are the endpoint's concern.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::control_plane::{
    create_service_input, ControlPlane, DescribeServicesOutput, LogEventsPage, Page, RunTaskRequest,
    TasksOutput, UpdateServiceRequest,
};
use super::waiter::{self, WaiterConfig};
use crate::domain::definition::{Cluster, LogGroup, RegisterTaskDefinitionInput, Service, TaskDefinition};
use crate::error::ClientError;

const ECS_TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";
const LOGS_TARGET_PREFIX: &str = "Logs_20140328";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Services accepted by one describe call
const DESCRIBE_SERVICES_BATCH: usize = 10;
/// Tasks accepted by one describe call
const DESCRIBE_TASKS_BATCH: usize = 100;

/// Endpoints and waiter timing for [`HttpControlPlane`]
#[derive(Debug, Clone)]
pub struct HttpControlPlaneConfig {
    pub ecs_endpoint: String,
    pub logs_endpoint: String,
    pub request_timeout: Duration,
    pub services_waiter: WaiterConfig,
    pub tasks_waiter: WaiterConfig,
}

impl HttpControlPlaneConfig {
    /// Regional public endpoints unless overridden
    pub fn for_region(region: &str, ecs_endpoint: Option<String>, logs_endpoint: Option<String>) -> Self {
        Self {
            ecs_endpoint: ecs_endpoint.unwrap_or_else(|| format!("https://ecs.{}.amazonaws.com", region)),
            logs_endpoint: logs_endpoint
                .unwrap_or_else(|| format!("https://logs.{}.amazonaws.com", region)),
            request_timeout: Duration::from_secs(30),
            services_waiter: WaiterConfig::SERVICES_STABLE,
            tasks_waiter: WaiterConfig::TASKS_STOPPED,
        }
    }
}

/// Control plane client over HTTP
pub struct HttpControlPlane {
    client: Client,
    config: HttpControlPlaneConfig,
}

/// Error body of a JSON 1.1 response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDefinitionEnvelope {
    task_definition: TaskDefinition,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceEnvelope {
    service: Service,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionsOutput {
    #[serde(default)]
    task_definition_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksOutput {
    #[serde(default)]
    task_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct DescribeClustersOutput {
    #[serde(default)]
    clusters: Vec<Cluster>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogGroupsOutput {
    #[serde(default)]
    log_groups: Vec<LogGroup>,
}

impl HttpControlPlane {
    pub fn new(config: HttpControlPlaneConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    async fn call<I, O>(&self, endpoint: &str, target: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        debug!("POST {} {}", endpoint, target);

        let response = self
            .client
            .post(endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", target)
            .json(input)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ClientError::Decode {
            message: format!("{}: {}", target, e),
        })
    }

    async fn ecs<I, O>(&self, operation: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        let target = format!("{}.{}", ECS_TARGET_PREFIX, operation);
        self.call(&self.config.ecs_endpoint, &target, input).await
    }

    async fn logs<I, O>(&self, operation: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize + ?Sized + Sync,
        O: DeserializeOwned,
    {
        let target = format!("{}.{}", LOGS_TARGET_PREFIX, operation);
        self.call(&self.config.logs_endpoint, &target, input).await
    }
}

/// Decode a JSON 1.1 error body; the code is the part after `#` in `__type`
fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.error_type.is_empty() => ClientError::Api {
            code: err
                .error_type
                .rsplit('#')
                .next()
                .unwrap_or(&err.error_type)
                .to_string(),
            message: err.message,
        },
        _ => ClientError::Api {
            code: format!("HTTP {}", status),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn register_task_definition(
        &self,
        input: &RegisterTaskDefinitionInput,
    ) -> Result<TaskDefinition, ClientError> {
        let out: TaskDefinitionEnvelope = self.ecs("RegisterTaskDefinition", input).await?;
        Ok(out.task_definition)
    }

    async fn describe_task_definition(&self, identifier: &str) -> Result<TaskDefinition, ClientError> {
        let out: TaskDefinitionEnvelope = self
            .ecs("DescribeTaskDefinition", &json!({ "taskDefinition": identifier }))
            .await?;
        Ok(out.task_definition)
    }

    async fn deregister_task_definition(&self, identifier: &str) -> Result<(), ClientError> {
        let _: Value = self
            .ecs("DeregisterTaskDefinition", &json!({ "taskDefinition": identifier }))
            .await?;
        Ok(())
    }

    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let out: ListTaskDefinitionsOutput = self
            .ecs(
                "ListTaskDefinitions",
                &json!({
                    "familyPrefix": family,
                    "sort": "DESC",
                    "maxResults": 100,
                    "nextToken": next_token,
                }),
            )
            .await?;
        Ok(Page {
            items: out.task_definition_arns,
            next_token: out.next_token,
        })
    }

    async fn create_service(
        &self,
        cluster: &str,
        task_definition: &str,
        service: &Service,
    ) -> Result<Service, ClientError> {
        let input = create_service_input(cluster, task_definition, service);
        let out: ServiceEnvelope = self.ecs("CreateService", &input).await?;
        Ok(out.service)
    }

    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<Service, ClientError> {
        let out: ServiceEnvelope = self.ecs("UpdateService", request).await?;
        Ok(out.service)
    }

    async fn delete_service(&self, cluster: &str, name: &str, force: bool) -> Result<Service, ClientError> {
        let out: ServiceEnvelope = self
            .ecs(
                "DeleteService",
                &json!({ "cluster": cluster, "service": name, "force": force }),
            )
            .await?;
        Ok(out.service)
    }

    async fn describe_services(
        &self,
        cluster: &str,
        names: &[String],
    ) -> Result<DescribeServicesOutput, ClientError> {
        let mut merged = DescribeServicesOutput::default();
        for batch in names.chunks(DESCRIBE_SERVICES_BATCH) {
            let out: DescribeServicesOutput = self
                .ecs(
                    "DescribeServices",
                    &json!({ "cluster": cluster, "services": batch }),
                )
                .await?;
            merged.services.extend(out.services);
            merged.failures.extend(out.failures);
        }
        Ok(merged)
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TasksOutput, ClientError> {
        self.ecs("RunTask", request).await
    }

    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<TasksOutput, ClientError> {
        let mut merged = TasksOutput::default();
        for batch in tasks.chunks(DESCRIBE_TASKS_BATCH) {
            let out: TasksOutput = self
                .ecs("DescribeTasks", &json!({ "cluster": cluster, "tasks": batch }))
                .await?;
            merged.tasks.extend(out.tasks);
            merged.failures.extend(out.failures);
        }
        Ok(merged)
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        service: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let out: ListTasksOutput = self
            .ecs(
                "ListTasks",
                &json!({ "cluster": cluster, "serviceName": service, "nextToken": next_token }),
            )
            .await?;
        Ok(Page {
            items: out.task_arns,
            next_token: out.next_token,
        })
    }

    async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>, ClientError> {
        let out: DescribeClustersOutput = self
            .ecs("DescribeClusters", &json!({ "clusters": [cluster] }))
            .await?;
        Ok(out.clusters.into_iter().next())
    }

    async fn wait_until_services_stable(&self, cluster: &str, names: &[String]) -> Result<(), ClientError> {
        let client = self;
        waiter::poll(waiter::SERVICES_STABLE, self.config.services_waiter, move || async move {
            let out = client.describe_services(cluster, names).await?;
            Ok(waiter::services_state(&out, names))
        })
        .await
    }

    async fn wait_until_tasks_stopped(&self, cluster: &str, tasks: &[String]) -> Result<(), ClientError> {
        let client = self;
        waiter::poll(waiter::TASKS_STOPPED, self.config.tasks_waiter, move || async move {
            let out = client.describe_tasks(cluster, tasks).await?;
            Ok(waiter::tasks_state(&out))
        })
        .await
    }

    async fn get_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: i64,
        next_token: Option<String>,
    ) -> Result<LogEventsPage, ClientError> {
        self.logs(
            "GetLogEvents",
            &json!({
                "logGroupName": group,
                "logStreamName": stream,
                "startTime": start_time,
                "startFromHead": true,
                "nextToken": next_token,
            }),
        )
        .await
    }

    async fn describe_log_groups(&self, prefix: &str) -> Result<Vec<LogGroup>, ClientError> {
        let out: DescribeLogGroupsOutput = self
            .logs(
                "DescribeLogGroups",
                &json!({ "logGroupNamePrefix": prefix, "limit": 50 }),
            )
            .await?;
        Ok(out.log_groups)
    }

    async fn create_log_group(&self, name: &str) -> Result<(), ClientError> {
        let _: Value = self
            .logs("CreateLogGroup", &json!({ "logGroupName": name }))
            .await?;
        Ok(())
    }
}
