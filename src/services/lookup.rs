//! Live-state reads shared by the services, with errors tagged by call site

use crate::domain::definition::{Service, TaskDefinition};
use crate::domain::plan::{family_of, RollbackSearch};
use crate::error::{ClientError, DeployError};
use crate::infrastructure::control_plane::{ControlPlane, DescribeServicesOutput};

/// Describe `names`; an empty name list is answered without a call
pub async fn describe_services<C>(
    client: &C,
    cluster: &str,
    names: &[String],
) -> Result<DescribeServicesOutput, DeployError>
where
    C: ControlPlane + ?Sized,
{
    if names.is_empty() {
        return Ok(DescribeServicesOutput::default());
    }
    client
        .describe_services(cluster, names)
        .await
        .map_err(DeployError::control_plane("DescribeServices", names.join(",")))
}

/// Describe one service that must exist
pub async fn describe_service<C>(client: &C, cluster: &str, name: &str) -> Result<Service, DeployError>
where
    C: ControlPlane + ?Sized,
{
    let out = describe_services(client, cluster, &[name.to_string()]).await?;
    if let Some(svc) = out.find(name) {
        return Ok(svc.clone());
    }

    let source = match out.failures.into_iter().next() {
        Some(failure) => failure.into_error(),
        None => ClientError::Failure {
            arn: name.to_string(),
            reason: "service not returned".to_string(),
        },
    };
    Err(DeployError::ControlPlane {
        operation: "DescribeServices",
        target: name.to_string(),
        source,
    })
}

pub async fn describe_task_definition<C>(client: &C, identifier: &str) -> Result<TaskDefinition, DeployError>
where
    C: ControlPlane + ?Sized,
{
    client
        .describe_task_definition(identifier)
        .await
        .map_err(DeployError::control_plane("DescribeTaskDefinition", identifier))
}

/// Revision listed right after `current`, paging through the family newest-first
pub async fn find_rollback_target<C>(client: &C, current: &str) -> Result<String, DeployError>
where
    C: ControlPlane + ?Sized,
{
    let family = family_of(current);
    let mut search = RollbackSearch::new(current);
    let mut token = None;

    loop {
        let page = client
            .list_task_definitions(family, token)
            .await
            .map_err(DeployError::control_plane("ListTaskDefinitions", family))?;

        if page.items.is_empty() {
            return Err(search.not_found());
        }
        if let Some(target) = search.feed(&page.items) {
            return Ok(target);
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Err(search.not_found()),
        }
    }
}
