//! Deploy service - reconciles resolved definitions against the cluster
//!
//! Task definitions are always registered as new revisions. Each service then
//! takes exactly one path, chosen from a single live read:
//! create when absent, delete-then-create when INACTIVE, update otherwise.
//! Dry-run performs the same reads and reports the same changes without
//! issuing a single mutating call.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::lookup;
use super::watch::{sleep_or_cancel, wait_services_stable, Output, Timings};
use crate::domain::definition::Service;
use crate::domain::differ::{addition, diff_services, diff_task_definitions, to_pretty_json};
use crate::domain::format::arn_to_name;
use crate::domain::plan::{
    select_action, ChangeReport, ChangeSymbol, PlannedChange, ResourceKind, ServiceAction,
};
use crate::domain::resolve::{ResolvedDefinitions, ResolvedService};
use crate::error::{ClientError, DeployError};
use crate::infrastructure::control_plane::{create_service_input, ControlPlane, UpdateServiceRequest};

/// Polls while waiting for a deleted service to be reported MISSING
const MAX_DELETE_POLLS: u32 = 40;

#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Push the full set of mutable attributes on update
    pub update_service: bool,
    pub force_new_deployment: bool,
    /// Create missing `awslogs` groups before touching services
    pub auto_log_group: bool,
    pub no_wait: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub force: bool,
    pub dry_run: bool,
}

/// Registered revision ARN per logical task definition name
type Revisions = BTreeMap<String, String>;

/// Service for deploying and deleting services
pub struct DeployService<C: ControlPlane + 'static> {
    client: Arc<C>,
    timings: Timings,
    out: Arc<dyn Output>,
}

impl<C: ControlPlane + 'static> DeployService<C> {
    pub fn new(client: Arc<C>, timings: Timings, out: Arc<dyn Output>) -> Self {
        Self { client, timings, out }
    }

    /// Register every task definition, then create, recreate or update every service
    pub async fn deploy(
        &self,
        defs: &ResolvedDefinitions,
        opts: &DeployOptions,
        cancel: &CancellationToken,
    ) -> Result<ChangeReport, DeployError> {
        let mut report = ChangeReport::new(opts.dry_run);

        for svc in defs.services.values() {
            defs.referenced_task_definition(svc)?;
        }

        let revisions = self.register_task_definitions(defs, opts, &mut report).await?;

        if opts.auto_log_group {
            self.ensure_log_groups(defs, opts, &mut report).await?;
        }

        if defs.services.is_empty() {
            return Ok(report);
        }

        let cluster = defs.settings.cluster.as_str();
        let names = defs.service_names();
        let live = lookup::describe_services(self.client.as_ref(), cluster, &names).await?;

        for svc in defs.services.values() {
            let current = live.find(&svc.full_name);
            let action = select_action(current);
            debug!("Service {} takes the {} path", svc.full_name, action.name());

            match action {
                ServiceAction::Create => {
                    self.create_service(defs, svc, &revisions, opts, &mut report, cancel)
                        .await?
                }
                ServiceAction::Recreate => {
                    self.recreate_service(defs, svc, &revisions, opts, &mut report, cancel)
                        .await?
                }
                ServiceAction::Update => {
                    self.update_service(defs, svc, current, &revisions, opts, &mut report, cancel)
                        .await?
                }
            }
        }

        if !opts.no_wait && !opts.dry_run {
            info!("Waiting for services to become stable (this can take a few minutes)");
            wait_services_stable(
                self.client.clone(),
                cluster,
                &names,
                Utc::now(),
                self.timings,
                self.out.clone(),
                cancel,
            )
            .await?;
            info!("Services are stable");
        }

        Ok(report)
    }

    /// Delete every configured service that exists
    pub async fn delete(
        &self,
        defs: &ResolvedDefinitions,
        opts: &DeleteOptions,
    ) -> Result<ChangeReport, DeployError> {
        let mut report = ChangeReport::new(opts.dry_run);
        let cluster = defs.settings.cluster.as_str();
        let live = lookup::describe_services(self.client.as_ref(), cluster, &defs.service_names()).await?;

        for svc in live.services.iter().filter(|s| !s.is_inactive()) {
            if !opts.dry_run {
                self.client
                    .delete_service(cluster, svc.name(), opts.force)
                    .await
                    .map_err(DeployError::control_plane("DeleteService", svc.name()))?;
                info!("Deleted service {}", svc.name());
            }
            report.push(PlannedChange::new(
                ChangeSymbol::Remove,
                ResourceKind::Service,
                svc.name(),
            ));
        }

        Ok(report)
    }

    async fn register_task_definitions(
        &self,
        defs: &ResolvedDefinitions,
        opts: &DeployOptions,
        report: &mut ChangeReport,
    ) -> Result<Revisions, DeployError> {
        let mut revisions = Revisions::new();

        for td in defs.task_definitions.values() {
            if opts.dry_run {
                let latest = self
                    .client
                    .latest_task_definition(&td.family)
                    .await
                    .map_err(DeployError::control_plane("ListTaskDefinitions", &td.family))?;

                let change = match latest {
                    None => PlannedChange::new(ChangeSymbol::Add, ResourceKind::TaskDefinition, &td.family)
                        .with_detail(addition(&to_pretty_json(&td.body.registration_input()))),
                    Some(arn) => {
                        let previous = lookup::describe_task_definition(self.client.as_ref(), &arn).await?;
                        PlannedChange::new(ChangeSymbol::Modify, ResourceKind::TaskDefinition, &td.family)
                            .with_detail(diff_task_definitions(&previous, &td.body))
                    }
                };
                report.push(change);
                continue;
            }

            let registered = self
                .client
                .register_task_definition(&td.body.registration_input())
                .await
                .map_err(DeployError::control_plane("RegisterTaskDefinition", &td.family))?;

            let arn = registered.task_definition_arn.ok_or_else(|| DeployError::ControlPlane {
                operation: "RegisterTaskDefinition",
                target: td.family.clone(),
                source: ClientError::Decode {
                    message: "response carries no taskDefinitionArn".to_string(),
                },
            })?;

            info!("Registered task definition {}", arn_to_name(&arn));
            report.push(PlannedChange::new(
                ChangeSymbol::Add,
                ResourceKind::TaskDefinition,
                arn_to_name(&arn),
            ));
            revisions.insert(td.name.clone(), arn);
        }

        Ok(revisions)
    }

    async fn ensure_log_groups(
        &self,
        defs: &ResolvedDefinitions,
        opts: &DeployOptions,
        report: &mut ChangeReport,
    ) -> Result<(), DeployError> {
        for group in awslogs_groups(defs) {
            let existing = self
                .client
                .describe_log_groups(&group)
                .await
                .map_err(DeployError::control_plane("DescribeLogGroups", &group))?;
            if existing.iter().any(|g| g.log_group_name == group) {
                continue;
            }

            if !opts.dry_run {
                self.client
                    .create_log_group(&group)
                    .await
                    .map_err(DeployError::control_plane("CreateLogGroup", &group))?;
                info!("Created log group {}", group);
            }
            report.push(PlannedChange::new(ChangeSymbol::Add, ResourceKind::LogGroup, group));
        }
        Ok(())
    }

    /// Revision a service should point at; the bare family in dry-run
    fn target_revision(
        &self,
        defs: &ResolvedDefinitions,
        svc: &ResolvedService,
        revisions: &Revisions,
    ) -> Result<String, DeployError> {
        let td = defs.referenced_task_definition(svc)?;
        Ok(revisions.get(&td.name).cloned().unwrap_or_else(|| td.family.clone()))
    }

    async fn create_service(
        &self,
        defs: &ResolvedDefinitions,
        svc: &ResolvedService,
        revisions: &Revisions,
        opts: &DeployOptions,
        report: &mut ChangeReport,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let revision = self.target_revision(defs, svc, revisions)?;
        let body = create_service_input(cluster, &revision, &svc.body);

        if !opts.dry_run {
            info!("Creating service {}", svc.full_name);
            self.client
                .create_service(cluster, &revision, &svc.body)
                .await
                .map_err(DeployError::control_plane("CreateService", &svc.full_name))?;
            sleep_or_cancel(self.timings.settle, cancel, "CreateService").await?;
            info!("Created service {}", svc.full_name);
        }

        report.push(
            PlannedChange::new(ChangeSymbol::Add, ResourceKind::Service, &svc.full_name)
                .with_detail(addition(&to_pretty_json(&body))),
        );
        Ok(())
    }

    async fn recreate_service(
        &self,
        defs: &ResolvedDefinitions,
        svc: &ResolvedService,
        revisions: &Revisions,
        opts: &DeployOptions,
        report: &mut ChangeReport,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let cluster = defs.settings.cluster.as_str();

        if !opts.dry_run {
            info!("Service {} is INACTIVE, deleting before re-creating", svc.full_name);
            self.client
                .delete_service(cluster, &svc.full_name, true)
                .await
                .map_err(DeployError::control_plane("DeleteService", &svc.full_name))?;
            self.wait_until_deleted(cluster, &svc.full_name, cancel).await?;
        }

        report.push(PlannedChange::new(
            ChangeSymbol::Remove,
            ResourceKind::Service,
            &svc.full_name,
        ));
        self.create_service(defs, svc, revisions, opts, report, cancel).await
    }

    /// Poll until the deleted service is reported MISSING.
    ///
    /// A service still listed as INACTIVE once the polls run out is accepted,
    /// since a create under an INACTIVE name succeeds. Anything still ACTIVE
    /// or DRAINING at that point is an error.
    async fn wait_until_deleted(
        &self,
        cluster: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let names = [name.to_string()];
        let mut inactive = false;
        for _ in 0..MAX_DELETE_POLLS {
            let out = lookup::describe_services(self.client.as_ref(), cluster, &names).await?;
            let Some(live) = out.find(name) else {
                debug!("Service {} is gone", name);
                return Ok(());
            };
            inactive = live.is_inactive();
            debug!(
                "Service {} is still listed as {}",
                name,
                live.status.as_deref().unwrap_or("-")
            );
            sleep_or_cancel(self.timings.settle, cancel, "DeleteService").await?;
        }

        if inactive {
            warn!("Service {} is still listed as INACTIVE, creating it anyway", name);
            return Ok(());
        }

        Err(DeployError::ControlPlane {
            operation: "DeleteService",
            target: name.to_string(),
            source: ClientError::WaiterExhausted {
                waiter: "ServicesInactive",
                attempts: MAX_DELETE_POLLS,
            },
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn update_service(
        &self,
        defs: &ResolvedDefinitions,
        svc: &ResolvedService,
        live: Option<&Service>,
        revisions: &Revisions,
        opts: &DeployOptions,
        report: &mut ChangeReport,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let cluster = defs.settings.cluster.as_str();
        let revision = self.target_revision(defs, svc, revisions)?;
        let current = live
            .and_then(|s| s.task_definition.as_deref())
            .map(arn_to_name)
            .unwrap_or("-");

        if !opts.dry_run {
            let mut request = UpdateServiceRequest::new(cluster, &svc.full_name);
            request.task_definition = Some(revision.clone());
            request.force_new_deployment = Some(opts.force_new_deployment);
            self.client
                .update_service(&request)
                .await
                .map_err(DeployError::control_plane("UpdateService", &svc.full_name))?;
            sleep_or_cancel(self.timings.settle, cancel, "UpdateService").await?;
            info!("Updated service {} to {}", svc.full_name, arn_to_name(&revision));
        }

        report.push(
            PlannedChange::new(ChangeSymbol::Modify, ResourceKind::Service, &svc.full_name)
                .with_detail(format!("task definition: {} -> {}", current, arn_to_name(&revision))),
        );

        if !opts.update_service {
            return Ok(());
        }

        let diff = live
            .map(|l| diff_services(l, &svc.body))
            .unwrap_or_default();

        if !opts.dry_run {
            let mut request = UpdateServiceRequest::new(cluster, &svc.full_name);
            request.attributes = Some(svc.body.updatable_attributes());
            request.force_new_deployment = Some(opts.force_new_deployment);
            self.client
                .update_service(&request)
                .await
                .map_err(DeployError::control_plane("UpdateService", &svc.full_name))?;
            sleep_or_cancel(self.timings.settle, cancel, "UpdateService").await?;
            info!("Updated attributes of service {}", svc.full_name);
        }

        report.push(
            PlannedChange::new(ChangeSymbol::Modify, ResourceKind::ServiceAttributes, &svc.full_name)
                .with_detail(diff),
        );
        Ok(())
    }
}

/// `awslogs-group` of every container logging through `awslogs`
fn awslogs_groups(defs: &ResolvedDefinitions) -> BTreeSet<String> {
    defs.task_definitions
        .values()
        .flat_map(|td| td.body.container_definitions.iter())
        .filter_map(|c| c.log_configuration.as_ref())
        .filter(|lc| lc.log_driver == "awslogs")
        .filter_map(|lc| lc.options.get("awslogs-group").cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake::{revision_arn, FakeControlPlane};
    use crate::services::fixtures::{api_task_definition, definitions, harness, timings};

    fn service(fake: &Arc<FakeControlPlane>, out: Arc<crate::services::watch::testing::CapturedOutput>) -> DeployService<FakeControlPlane> {
        DeployService::new(fake.clone(), timings(), out)
    }

    #[tokio::test]
    async fn test_absent_service_is_created() {
        let (fake, out) = harness();
        let report = service(&fake, out)
            .deploy(&definitions(), &DeployOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            fake.mutations(),
            vec!["RegisterTaskDefinition dev-API", "CreateService dev-api"]
        );
        assert_eq!(fake.calls_of("WaitUntilServicesStable").len(), 1);
        assert_eq!(
            fake.service("dev-api").unwrap().task_definition,
            Some(revision_arn("dev-API", 1))
        );
        assert_eq!(report.changes[0].headline(), "+ task definition: dev-API:1");
        assert_eq!(report.changes[1].headline(), "+ service: dev-api");
    }

    #[tokio::test]
    async fn test_active_service_is_updated_in_place() {
        let (fake, out) = harness();
        fake.seed_revisions("dev-API", 1, api_task_definition());
        fake.seed_service("dev-api", "ACTIVE", &revision_arn("dev-API", 1));

        service(&fake, out)
            .deploy(&definitions(), &DeployOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            fake.mutations(),
            vec!["RegisterTaskDefinition dev-API", "UpdateService dev-api"]
        );
        let update = &fake.updates()[0];
        assert_eq!(update.task_definition, Some(revision_arn("dev-API", 2)));
        assert_eq!(update.force_new_deployment, Some(false));
        assert!(update.attributes.is_none());
    }

    #[tokio::test]
    async fn test_inactive_service_is_deleted_then_created() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "INACTIVE", &revision_arn("dev-API", 1));

        let report = service(&fake, out)
            .deploy(&definitions(), &DeployOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            fake.mutations(),
            vec![
                "RegisterTaskDefinition dev-API",
                "DeleteService dev-api force=true",
                "CreateService dev-api"
            ]
        );
        assert_eq!(report.count(ResourceKind::Service), 2);
        assert_eq!(fake.service("dev-api").unwrap().status.as_deref(), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn test_recreate_waits_until_deleted_service_is_missing() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "INACTIVE", &revision_arn("dev-API", 1));
        fake.linger_after_delete("dev-api", &["DRAINING", "INACTIVE"]);

        service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions { no_wait: true, ..Default::default() },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        // initial read, DRAINING, INACTIVE, then MISSING
        assert_eq!(fake.calls_of("DescribeServices").len(), 4);
        assert_eq!(
            fake.mutations(),
            vec![
                "RegisterTaskDefinition dev-API",
                "DeleteService dev-api force=true",
                "CreateService dev-api"
            ]
        );
    }

    #[tokio::test]
    async fn test_recreate_accepts_service_left_inactive() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "INACTIVE", &revision_arn("dev-API", 1));
        fake.linger_after_delete("dev-api", &["INACTIVE"; 50]);

        service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions { no_wait: true, ..Default::default() },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            fake.calls_of("DescribeServices").len(),
            1 + MAX_DELETE_POLLS as usize
        );
        assert_eq!(fake.calls_of("CreateService"), vec!["CreateService dev-api"]);
    }

    #[tokio::test]
    async fn test_recreate_fails_when_service_keeps_draining() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "INACTIVE", &revision_arn("dev-API", 1));
        fake.linger_after_delete("dev-api", &["DRAINING"; 50]);

        let err = service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions { no_wait: true, ..Default::default() },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            DeployError::ControlPlane { operation, target, .. } => {
                assert_eq!(operation, "DeleteService");
                assert_eq!(target, "dev-api");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.calls_of("CreateService").is_empty());
    }

    #[tokio::test]
    async fn test_attribute_update_and_force_flag() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "ACTIVE", &revision_arn("dev-API", 1));
        let opts = DeployOptions {
            update_service: true,
            force_new_deployment: true,
            ..Default::default()
        };

        let report = service(&fake, out)
            .deploy(&definitions(), &opts, &CancellationToken::new())
            .await
            .unwrap();

        let updates = fake.updates();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|u| u.force_new_deployment == Some(true)));
        let attrs = updates[1].attributes.as_ref().unwrap();
        assert!(attrs.network_configuration.is_some());

        let attr_change = report
            .changes
            .iter()
            .find(|c| c.kind == ResourceKind::ServiceAttributes)
            .unwrap();
        assert!(attr_change.detail.as_deref().unwrap().contains("subnet-a"));
    }

    #[tokio::test]
    async fn test_dry_run_reads_but_never_mutates() {
        let (fake, out) = harness();
        let mut previous = api_task_definition();
        previous.container_definitions[0].image = Some("my-image:old".into());
        fake.seed_revisions("dev-API", 1, previous);
        fake.seed_service("dev-api", "ACTIVE", &revision_arn("dev-API", 1));

        let opts = DeployOptions {
            dry_run: true,
            update_service: true,
            auto_log_group: true,
            ..Default::default()
        };
        let report = service(&fake, out)
            .deploy(&definitions(), &opts, &CancellationToken::new())
            .await
            .unwrap();

        assert!(fake.mutations().is_empty());
        assert_eq!(fake.calls_of("DescribeServices").len(), 1);
        assert!(fake.calls_of("WaitUntilServicesStable").is_empty());

        let headlines: Vec<String> = report.changes.iter().map(|c| c.headline()).collect();
        assert_eq!(
            headlines,
            vec![
                "~ task definition: dev-API",
                "+ log group: /ecs/dev-api",
                "~ service: dev-api",
                "~ service attributes: dev-api",
            ]
        );
        let td_diff = report.changes[0].detail.as_deref().unwrap();
        assert!(td_diff.contains("-      \"image\": \"my-image:old\""));
        assert!(td_diff.contains("+      \"image\": \"my-image:latest\""));
    }

    #[tokio::test]
    async fn test_dry_run_new_family_previews_full_body() {
        let (fake, out) = harness();
        let report = service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions { dry_run: true, ..Default::default() },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(fake.mutations().is_empty());
        assert_eq!(report.changes[0].headline(), "+ task definition: dev-API");
        assert!(report.changes[0].detail.as_deref().unwrap().contains("+  \"family\": \"dev-API\""));
        assert_eq!(report.changes[1].headline(), "+ service: dev-api");
        assert!(report.changes[1].detail.as_deref().unwrap().contains("\"taskDefinition\": \"dev-API\""));
    }

    #[tokio::test]
    async fn test_dangling_reference_fails_before_mutation() {
        let (fake, out) = harness();
        let mut defs = definitions();
        defs.services.get_mut("api").unwrap().task_definition = "NOPE".into();

        let err = service(&fake, out)
            .deploy(&defs, &DeployOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Reference { .. }));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_work() {
        let (fake, out) = harness();
        fake.fail_on("CreateService");

        let err = service(&fake, out)
            .deploy(&definitions(), &DeployOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            DeployError::ControlPlane { operation, target, .. } => {
                assert_eq!(operation, "CreateService");
                assert_eq!(target, "dev-api");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.calls_of("WaitUntilServicesStable").is_empty());
    }

    #[tokio::test]
    async fn test_no_wait_skips_stability_wait() {
        let (fake, out) = harness();
        service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions { no_wait: true, ..Default::default() },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(fake.calls_of("WaitUntilServicesStable").is_empty());
    }

    #[tokio::test]
    async fn test_auto_log_group_creates_only_missing_groups() {
        let (fake, out) = harness();
        let opts = DeployOptions {
            auto_log_group: true,
            no_wait: true,
            ..Default::default()
        };
        let svc = service(&fake, out);

        svc.deploy(&definitions(), &opts, &CancellationToken::new()).await.unwrap();
        assert_eq!(fake.calls_of("CreateLogGroup"), vec!["CreateLogGroup /ecs/dev-api"]);

        svc.deploy(&definitions(), &opts, &CancellationToken::new()).await.unwrap();
        assert_eq!(fake.calls_of("CreateLogGroup").len(), 1);
    }

    #[tokio::test]
    async fn test_auto_log_group_keeps_existing_group() {
        let (fake, out) = harness();
        fake.seed_log_group("/ecs/dev-api");

        service(&fake, out)
            .deploy(
                &definitions(),
                &DeployOptions {
                    auto_log_group: true,
                    no_wait: true,
                    ..Default::default()
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(fake.calls_of("CreateLogGroup").is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_services() {
        let (fake, out) = harness();
        fake.seed_service("dev-api", "ACTIVE", &revision_arn("dev-API", 1));
        let svc = service(&fake, out);

        let dry = svc
            .delete(&definitions(), &DeleteOptions { force: false, dry_run: true })
            .await
            .unwrap();
        assert!(fake.mutations().is_empty());
        assert_eq!(dry.changes[0].headline(), "- service: dev-api");

        svc.delete(&definitions(), &DeleteOptions::default()).await.unwrap();
        assert_eq!(fake.mutations(), vec!["DeleteService dev-api force=false"]);
        assert!(fake.service("dev-api").is_none());
    }

    #[tokio::test]
    async fn test_delete_skips_absent_services() {
        let (fake, out) = harness();
        let report = service(&fake, out)
            .delete(&definitions(), &DeleteOptions::default())
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(fake.mutations().is_empty());
    }
}
