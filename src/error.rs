//! Centralized error types for ecsforge
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for resolution and reconciliation
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to load config {}: {message}", .path.display())]
    ConfigLoad { path: PathBuf, message: String },

    #[error("Config base chain starting at {} did not terminate within {hops} hops", .start.display())]
    ConfigCycle { start: PathBuf, hops: usize },

    #[error("Template error in {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },

    #[error("Failed to decode definition {}: {message}", .path.display())]
    DefinitionParse { path: PathBuf, message: String },

    #[error("Service {service} references undefined task definition {task_definition}")]
    Reference {
        service: String,
        task_definition: String,
    },

    #[error("{operation} failed for {target}: {source}")]
    ControlPlane {
        operation: &'static str,
        target: String,
        #[source]
        source: ClientError,
    },

    #[error("No rollback target older than {current}")]
    RollbackTargetNotFound { current: String },

    #[error("Task failed: container {container}{}{}",
        .exit_code.map(|c| format!(", exit code {}", c)).unwrap_or_default(),
        .reason.as_ref().map(|r| format!(", reason: {}", r)).unwrap_or_default())]
    TaskFailure {
        container: String,
        exit_code: Option<i64>,
        reason: Option<String>,
    },

    #[error("Service {name} is not defined in the config stack")]
    UndefinedService { name: String },

    #[error("Container {container} not found in task definition {task_definition}")]
    ContainerNotFound {
        container: String,
        task_definition: String,
    },

    #[error("Invalid task overrides: {message}")]
    InvalidOverrides { message: String },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },
}

impl DeployError {
    /// Adapter for `map_err` that wraps a transport failure with its call site
    pub fn control_plane(
        operation: &'static str,
        target: impl Into<String>,
    ) -> impl FnOnce(ClientError) -> Self {
        let target = target.into();
        move |source| Self::ControlPlane {
            operation,
            target,
            source,
        }
    }
}

/// Control plane transport errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("Unexpected response: {message}")]
    Decode { message: String },

    #[error("{reason}")]
    Failure { arn: String, reason: String },

    #[error("Waiter {waiter} gave up after {attempts} attempts")]
    WaiterExhausted { waiter: &'static str, attempts: u32 },

    #[error("Waiter {waiter} reached a failure state: {state}")]
    WaiterFailed { waiter: &'static str, state: String },
}
