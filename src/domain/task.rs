//! One-off tasks: overrides, exit checks and log locations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::definition::ContainerDefinition;
use super::format::arn_to_name;
use crate::error::DeployError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Overrides passed to a task run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverride {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_overrides: Vec<ContainerOverride>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskOverride {
    /// Parse raw overrides JSON, then apply a command for `container`.
    ///
    /// The command lands on the existing override for that container when
    /// there is one, otherwise a new override is appended.
    pub fn build(
        raw: Option<&str>,
        container: &str,
        command: Option<Vec<String>>,
    ) -> Result<Self, DeployError> {
        let mut overrides: TaskOverride = match raw.filter(|r| !r.trim().is_empty()) {
            Some(raw) => serde_json::from_str(raw).map_err(|e| DeployError::InvalidOverrides {
                message: e.to_string(),
            })?,
            None => TaskOverride::default(),
        };

        if let Some(command) = command {
            match overrides
                .container_overrides
                .iter_mut()
                .find(|o| o.name.as_deref() == Some(container))
            {
                Some(existing) => existing.command = Some(command),
                None => overrides.container_overrides.push(ContainerOverride {
                    name: Some(container.to_string()),
                    command: Some(command),
                    ..Default::default()
                }),
            }
        }

        Ok(overrides)
    }
}

/// Container state inside a described task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub task_arn: String,
    #[serde(default)]
    pub task_definition_arn: String,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Task {
    /// Last segment of the task ARN
    pub fn id(&self) -> &str {
        arn_to_name(&self.task_arn)
    }

    /// Container by name, falling back to the first one
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.containers.first())
    }

    /// Fail when the watched container exited non-zero or reported a reason
    pub fn check_exit(&self, container: &str) -> Result<(), DeployError> {
        let c = self
            .container(container)
            .ok_or_else(|| DeployError::ContainerNotFound {
                container: container.to_string(),
                task_definition: arn_to_name(&self.task_definition_arn).to_string(),
            })?;

        let failed_exit = c.exit_code.filter(|code| *code != 0);
        if failed_exit.is_some() || c.reason.is_some() {
            return Err(DeployError::TaskFailure {
                container: c.name.clone(),
                exit_code: failed_exit,
                reason: c.reason.clone(),
            });
        }
        Ok(())
    }
}

/// Where one container of one task writes its logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLocation {
    pub group: String,
    pub stream: String,
}

impl LogLocation {
    /// `<awslogs-stream-prefix>/<container>/<task id>` in the container's group.
    ///
    /// `None` when the container does not log through `awslogs` with a prefix.
    pub fn for_task(task: &Task, container: &ContainerDefinition) -> Option<Self> {
        let (group, prefix) = container.awslogs()?;
        Some(Self {
            group: group.to_string(),
            stream: format!("{}/{}/{}", prefix, container.name, task.id()),
        })
    }

    /// Task id at the end of the stream name
    pub fn task_id(&self) -> &str {
        arn_to_name(&self.stream)
    }
}

/// One log event; `timestamp` is epoch milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message: String,
}
