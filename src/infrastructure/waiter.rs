//! Polling waiters for the HTTP control plane
//!
//! Each waiter re-reads state at a fixed delay until an acceptor matches:
//! success ends the wait, a failure state aborts it, and running out of
//! attempts is [`ClientError::WaiterExhausted`].

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::control_plane::{DescribeServicesOutput, TasksOutput, REASON_MISSING};
use crate::domain::plan::{is_service_stable, is_terminal_status};
use crate::error::ClientError;

pub const SERVICES_STABLE: &str = "ServicesStable";
pub const TASKS_STOPPED: &str = "TasksStopped";

const STATUS_STOPPED: &str = "STOPPED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl WaiterConfig {
    pub const SERVICES_STABLE: Self = Self {
        delay: Duration::from_secs(15),
        max_attempts: 40,
    };

    pub const TASKS_STOPPED: Self = Self {
        delay: Duration::from_secs(6),
        max_attempts: 100,
    };
}

/// Outcome of one waiter check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    Done,
    Retry,
    Failed(String),
}

/// Run `check` until it reports [`WaitState::Done`]
pub async fn poll<F, Fut>(waiter: &'static str, config: WaiterConfig, mut check: F) -> Result<(), ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<WaitState, ClientError>>,
{
    for attempt in 1..=config.max_attempts {
        match check().await? {
            WaitState::Done => return Ok(()),
            WaitState::Failed(state) => return Err(ClientError::WaiterFailed { waiter, state }),
            WaitState::Retry => {
                debug!("{} attempt {}/{} not satisfied", waiter, attempt, config.max_attempts);
                if attempt < config.max_attempts {
                    tokio::time::sleep(config.delay).await;
                }
            }
        }
    }

    Err(ClientError::WaiterExhausted {
        waiter,
        attempts: config.max_attempts,
    })
}

/// Services are stable once every one has a single settled deployment
pub fn services_state(out: &DescribeServicesOutput, names: &[String]) -> WaitState {
    if let Some(f) = out.failures.iter().find(|f| f.reason == REASON_MISSING) {
        return WaitState::Failed(format!("{} {}", REASON_MISSING, f.arn));
    }
    if let Some(svc) = out.services.iter().find(|s| is_terminal_status(s.status.as_deref())) {
        return WaitState::Failed(format!(
            "{} {}",
            svc.status.as_deref().unwrap_or_default(),
            svc.name()
        ));
    }

    let all_stable = names
        .iter()
        .all(|name| out.find(name).map(is_service_stable).unwrap_or(false));
    if all_stable {
        WaitState::Done
    } else {
        WaitState::Retry
    }
}

/// Tasks are stopped once every described task reports STOPPED
pub fn tasks_state(out: &TasksOutput) -> WaitState {
    if let Some(f) = out.failures.iter().find(|f| f.reason == REASON_MISSING) {
        return WaitState::Failed(format!("{} {}", REASON_MISSING, f.arn));
    }
    if !out.tasks.is_empty()
        && out
            .tasks
            .iter()
            .all(|t| t.last_status.as_deref() == Some(STATUS_STOPPED))
    {
        WaitState::Done
    } else {
        WaitState::Retry
    }
}
