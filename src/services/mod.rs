//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and the control plane.
//! Every service is generic over the `ControlPlane` trait so it can run
//! against the HTTP client or the in-memory fake used in tests.

pub mod deploy_service;
pub mod logs_service;
pub mod lookup;
pub mod rollback_service;
pub mod run_service;
pub mod status_service;
pub mod watch;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use deploy_service::{DeleteOptions, DeployOptions, DeployService};
pub use logs_service::{LogsOptions, LogsService};
pub use rollback_service::{RollbackOptions, RollbackService};
pub use run_service::{RunOptions, RunService};
pub use status_service::{ServiceStatus, StatusReport, StatusService};
pub use watch::{TermOutput, Timings};
