//! Cluster control plane collaborator
//!
//! The reconciler talks to the cluster only through [`ControlPlane`]. The
//! request and response types mirror the control plane's JSON shapes so that
//! the HTTP implementation can pass them through unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::definition::{
    Cluster, LogGroup, NetworkConfiguration, RegisterTaskDefinitionInput, Service,
    ServiceAttributes, TaskDefinition,
};
use crate::domain::task::{LogEvent, Task, TaskOverride};
use crate::error::ClientError;

/// Failure reason the control plane reports for an unknown resource
pub const REASON_MISSING: &str = "MISSING";

/// Resource-level failure entry of a describe or run call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default)]
    pub arn: String,
    #[serde(default)]
    pub reason: String,
}

impl Failure {
    pub fn into_error(self) -> ClientError {
        ClientError::Failure {
            arn: self.arn,
            reason: self.reason,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesOutput {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

impl DescribeServicesOutput {
    /// Live service with the given full name
    pub fn find(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name() == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksOutput {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

/// Re-point and/or reconfigure an existing service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub cluster: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_new_deployment: Option<bool>,
    #[serde(flatten)]
    pub attributes: Option<ServiceAttributes>,
}

impl UpdateServiceRequest {
    pub fn new(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskRequest {
    pub cluster: String,
    pub task_definition: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfiguration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capacity_provider_strategy: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub placement_constraints: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub placement_strategy: Vec<Value>,
    pub overrides: TaskOverride,
}

impl RunTaskRequest {
    /// Run `task_definition` with the placement and network settings of `service`
    pub fn for_service(
        cluster: impl Into<String>,
        service: &Service,
        task_definition: impl Into<String>,
        count: i64,
        overrides: TaskOverride,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            task_definition: task_definition.into(),
            count,
            launch_type: service.launch_type.clone(),
            platform_version: service.platform_version.clone(),
            network_configuration: service.network_configuration.clone(),
            capacity_provider_strategy: service.capacity_provider_strategy.clone(),
            placement_constraints: service.placement_constraints.clone(),
            placement_strategy: service.placement_strategy.clone(),
            overrides,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventsPage {
    #[serde(default)]
    pub events: Vec<LogEvent>,
    #[serde(default)]
    pub next_forward_token: Option<String>,
}

/// Fields of a described service that a create call does not accept
const DESCRIBE_ONLY_SERVICE_FIELDS: &[&str] = &[
    "clusterArn",
    "serviceArn",
    "status",
    "runningCount",
    "pendingCount",
    "deployments",
    "taskSets",
    "events",
    "createdAt",
    "createdBy",
    "roleArn",
];

/// Create-call body: the desired service pointed at `task_definition`
pub fn create_service_input(cluster: &str, task_definition: &str, service: &Service) -> Value {
    let mut body = serde_json::to_value(service).unwrap_or_else(|_| Value::Object(Default::default()));
    if let Value::Object(map) = &mut body {
        for field in DESCRIBE_ONLY_SERVICE_FIELDS {
            map.remove(*field);
        }
        map.insert("cluster".to_string(), Value::String(cluster.to_string()));
        map.insert(
            "taskDefinition".to_string(),
            Value::String(task_definition.to_string()),
        );
    }
    body
}

/// Calls the reconciler makes against one cluster and its log service
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Register a new revision; returns it with its ARN filled in
    async fn register_task_definition(
        &self,
        input: &RegisterTaskDefinitionInput,
    ) -> Result<TaskDefinition, ClientError>;

    async fn describe_task_definition(&self, identifier: &str) -> Result<TaskDefinition, ClientError>;

    async fn deregister_task_definition(&self, identifier: &str) -> Result<(), ClientError>;

    /// Revision ARNs of `family`, newest first
    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError>;

    async fn create_service(
        &self,
        cluster: &str,
        task_definition: &str,
        service: &Service,
    ) -> Result<Service, ClientError>;

    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<Service, ClientError>;

    async fn delete_service(&self, cluster: &str, name: &str, force: bool) -> Result<Service, ClientError>;

    async fn describe_services(
        &self,
        cluster: &str,
        names: &[String],
    ) -> Result<DescribeServicesOutput, ClientError>;

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TasksOutput, ClientError>;

    async fn describe_tasks(&self, cluster: &str, tasks: &[String]) -> Result<TasksOutput, ClientError>;

    /// Task ARNs currently belonging to a service
    async fn list_tasks(
        &self,
        cluster: &str,
        service: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError>;

    async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>, ClientError>;

    /// Block until every named service has a single settled deployment
    async fn wait_until_services_stable(&self, cluster: &str, names: &[String]) -> Result<(), ClientError>;

    /// Block until every task has stopped
    async fn wait_until_tasks_stopped(&self, cluster: &str, tasks: &[String]) -> Result<(), ClientError>;

    /// Events at or after `start_time` (epoch milliseconds)
    async fn get_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: i64,
        next_token: Option<String>,
    ) -> Result<LogEventsPage, ClientError>;

    async fn describe_log_groups(&self, prefix: &str) -> Result<Vec<LogGroup>, ClientError>;

    async fn create_log_group(&self, name: &str) -> Result<(), ClientError>;

    /// Newest revision of `family`, if any
    async fn latest_task_definition(&self, family: &str) -> Result<Option<String>, ClientError> {
        let page = self.list_task_definitions(family, None).await?;
        Ok(page.items.into_iter().next())
    }

    /// Every task of a service, described
    async fn list_service_tasks(&self, cluster: &str, service: &str) -> Result<Vec<Task>, ClientError> {
        let mut arns = Vec::new();
        let mut token = None;
        loop {
            let page = self.list_tasks(cluster, service, token).await?;
            arns.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        if arns.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.describe_tasks(cluster, &arns).await?.tasks)
    }

    /// Every event of a stream from `start_time`, following forward tokens
    async fn all_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: i64,
    ) -> Result<Vec<LogEvent>, ClientError> {
        let mut events = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.get_log_events(group, stream, start_time, token.clone()).await?;
            let exhausted = page.events.is_empty() || page.next_forward_token == token;
            events.extend(page.events);
            if exhausted || page.next_forward_token.is_none() {
                break;
            }
            token = page.next_forward_token;
        }
        Ok(events)
    }
}
