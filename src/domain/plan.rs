//! Reconciliation plan types
//!
//! Pure decisions of the reconciler: which action a service takes given its
//! live state, what a change looks like when reported, when a service counts
//! as stable, and which revision a rollback lands on.

use super::definition::{Service, STATUS_DRAINING, STATUS_INACTIVE};
use crate::error::DeployError;

/// Action taken for one service, chosen from one live read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// No live service: create it
    Create,
    /// Live service is INACTIVE: force-delete, then create
    Recreate,
    /// Live service in any other state: re-point in place
    Update,
}

impl ServiceAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Recreate => "recreate",
            Self::Update => "update",
        }
    }
}

/// Pick the action for a service from its live description
pub fn select_action(live: Option<&Service>) -> ServiceAction {
    match live {
        None => ServiceAction::Create,
        Some(svc) if svc.is_inactive() => ServiceAction::Recreate,
        Some(_) => ServiceAction::Update,
    }
}

/// Kind of change in a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSymbol {
    Add,
    Modify,
    Remove,
}

impl ChangeSymbol {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Modify => "~",
            Self::Remove => "-",
        }
    }
}

/// Resource a change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    TaskDefinition,
    Service,
    ServiceAttributes,
    LogGroup,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TaskDefinition => "task definition",
            Self::Service => "service",
            Self::ServiceAttributes => "service attributes",
            Self::LogGroup => "log group",
        }
    }
}

/// One line of a deploy, delete or rollback report
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub symbol: ChangeSymbol,
    pub kind: ResourceKind,
    /// Full resource name
    pub name: String,
    /// Body, diff or pointer change shown under the headline
    pub detail: Option<String>,
}

impl PlannedChange {
    pub fn new(symbol: ChangeSymbol, kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            symbol,
            kind,
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = (!detail.is_empty()).then_some(detail);
        self
    }

    /// `"+ service: dev-api"`
    pub fn headline(&self) -> String {
        format!("{} {}: {}", self.symbol.symbol(), self.kind.label(), self.name)
    }
}

/// Changes made (or previewed, in dry-run) by one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeReport {
    pub dry_run: bool,
    pub changes: Vec<PlannedChange>,
}

impl ChangeReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            changes: Vec::new(),
        }
    }

    pub fn push(&mut self, change: PlannedChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Single deployment whose running count reached the desired count
pub fn is_service_stable(svc: &Service) -> bool {
    match svc.deployments.as_slice() {
        [only] => only.running_count == only.desired_count,
        _ => false,
    }
}

/// Status from which a service never becomes stable
pub fn is_terminal_status(status: Option<&str>) -> bool {
    matches!(status, Some(STATUS_INACTIVE) | Some(STATUS_DRAINING))
}

/// Family of a revision identifier (`arn:...:task-definition/api:3` is `api`)
pub fn family_of(task_definition: &str) -> &str {
    let name = task_definition.rsplit('/').next().unwrap_or(task_definition);
    name.split(':').next().unwrap_or(name)
}

/// Walks revision pages, newest first, looking for the one after `current`
#[derive(Debug, Clone)]
pub struct RollbackSearch {
    current: String,
    found: bool,
}

impl RollbackSearch {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            found: false,
        }
    }

    /// Feed one page; returns the target once it has been seen
    pub fn feed(&mut self, page: &[String]) -> Option<String> {
        for arn in page {
            if self.found {
                return Some(arn.clone());
            }
            if *arn == self.current {
                self.found = true;
            }
        }
        None
    }

    /// Error for a listing that ended without a target
    pub fn not_found(&self) -> DeployError {
        DeployError::RollbackTargetNotFound {
            current: self.current.clone(),
        }
    }
}
