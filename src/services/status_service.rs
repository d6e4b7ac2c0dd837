//! Status service - live state of every configured service and the cluster

use std::sync::Arc;

use super::lookup;
use crate::domain::definition::{Cluster, Service};
use crate::domain::resolve::ResolvedDefinitions;
use crate::domain::task::Task;
use crate::error::DeployError;
use crate::infrastructure::control_plane::ControlPlane;

/// A described service with its tasks
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub service: Service,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub services: Vec<ServiceStatus>,
    /// Configured services the control plane does not know
    pub missing: Vec<String>,
    pub cluster: Option<Cluster>,
}

pub struct StatusService<C: ControlPlane> {
    client: Arc<C>,
}

impl<C: ControlPlane> StatusService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn status(&self, defs: &ResolvedDefinitions) -> Result<StatusReport, DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let names = defs.service_names();
        let live = lookup::describe_services(self.client.as_ref(), cluster, &names).await?;

        let mut report = StatusReport::default();
        for name in &names {
            let Some(service) = live.find(name) else {
                report.missing.push(name.clone());
                continue;
            };

            let tasks = self
                .client
                .list_service_tasks(cluster, name)
                .await
                .map_err(DeployError::control_plane("ListTasks", name))?;
            report.services.push(ServiceStatus {
                service: service.clone(),
                tasks,
            });
        }

        report.cluster = self
            .client
            .describe_cluster(cluster)
            .await
            .map_err(DeployError::control_plane("DescribeClusters", cluster))?;

        Ok(report)
    }
}
