//! In-memory control plane for service tests
//!
//! Keeps task definition revisions, services, tasks and log streams in a
//! mutex-guarded state and records every call as `"<Operation> <target>"`.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::control_plane::{
    ControlPlane, DescribeServicesOutput, Failure, LogEventsPage, Page, RunTaskRequest, TasksOutput,
    UpdateServiceRequest, REASON_MISSING,
};
use crate::domain::definition::{
    Cluster, Deployment, LogGroup, RegisterTaskDefinitionInput, Service, TaskDefinition, STATUS_ACTIVE,
    STATUS_INACTIVE,
};
use crate::domain::plan::family_of;
use crate::domain::task::{Container, LogEvent, Task};
use crate::error::ClientError;

const ACCOUNT_PREFIX: &str = "arn:aws:ecs:us-east-1:123456789012";

#[derive(Default)]
struct State {
    revisions: BTreeMap<String, Vec<TaskDefinition>>,
    deregistered: BTreeSet<String>,
    services: BTreeMap<String, Service>,
    delete_lingers: HashMap<String, VecDeque<String>>,
    draining: HashMap<String, VecDeque<String>>,
    service_tasks: HashMap<String, Vec<Task>>,
    tasks: BTreeMap<String, Task>,
    log_groups: BTreeSet<String>,
    log_events: HashMap<(String, String), Vec<LogEvent>>,
    log_starts: Vec<i64>,
    updates: Vec<UpdateServiceRequest>,
    runs: Vec<RunTaskRequest>,
    calls: Vec<String>,
    fail_on: Option<&'static str>,
    task_exit_code: Option<i64>,
    wait_delay: Duration,
    fail_waits: bool,
    page_size: usize,
    task_counter: usize,
}

pub struct FakeControlPlane {
    state: Mutex<State>,
}

impl Default for FakeControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

pub fn revision_arn(family: &str, revision: usize) -> String {
    format!("{}:task-definition/{}:{}", ACCOUNT_PREFIX, family, revision)
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                page_size: 100,
                task_exit_code: Some(0),
                ..Default::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn record(&self, op: &'static str, target: impl AsRef<str>) -> Result<(), ClientError> {
        self.with(|s| {
            s.calls.push(format!("{} {}", op, target.as_ref()));
            if s.fail_on == Some(op) {
                return Err(ClientError::Api {
                    code: "InjectedFailure".to_string(),
                    message: format!("{} failed", op),
                });
            }
            Ok(())
        })
    }

    /// Make every call of `operation` fail
    pub fn fail_on(&self, operation: &'static str) {
        self.with(|s| s.fail_on = Some(operation));
    }

    pub fn set_page_size(&self, size: usize) {
        self.with(|s| s.page_size = size);
    }

    pub fn set_task_exit_code(&self, code: Option<i64>) {
        self.with(|s| s.task_exit_code = code);
    }

    /// Delay every waiter by `delay`
    pub fn set_wait_delay(&self, delay: Duration) {
        self.with(|s| s.wait_delay = delay);
    }

    pub fn fail_waits(&self) {
        self.with(|s| s.fail_waits = true);
    }

    /// Seed `count` revisions of `family`
    pub fn seed_revisions(&self, family: &str, count: usize, body: TaskDefinition) {
        self.with(|s| {
            let revs = s.revisions.entry(family.to_string()).or_default();
            for _ in 0..count {
                let mut td = body.clone();
                td.family = Some(family.to_string());
                td.task_definition_arn = Some(revision_arn(family, revs.len() + 1));
                revs.push(td);
            }
        });
    }

    /// Seed a live service pointing at `task_definition`
    pub fn seed_service(&self, name: &str, status: &str, task_definition: &str) {
        let svc = Service {
            service_name: Some(name.to_string()),
            status: Some(status.to_string()),
            task_definition: Some(task_definition.to_string()),
            desired_count: Some(1),
            deployments: vec![settled_deployment(task_definition, 1)],
            ..Default::default()
        };
        self.with(|s| s.services.insert(name.to_string(), svc));
    }

    pub fn seed_service_task(&self, service: &str, task: Task) {
        self.with(|s| {
            s.tasks.insert(task.task_arn.clone(), task.clone());
            s.service_tasks.entry(service.to_string()).or_default().push(task);
        });
    }

    /// After `name` is deleted, report it with each of `statuses` in turn
    /// (one per describe) before it goes MISSING
    pub fn linger_after_delete(&self, name: &str, statuses: &[&str]) {
        self.with(|s| {
            s.delete_lingers
                .insert(name.to_string(), statuses.iter().map(|st| st.to_string()).collect())
        });
    }

    pub fn seed_log_group(&self, name: &str) {
        self.with(|s| s.log_groups.insert(name.to_string()));
    }

    pub fn push_log_events(&self, group: &str, stream: &str, events: Vec<LogEvent>) {
        self.with(|s| {
            s.log_events
                .entry((group.to_string(), stream.to_string()))
                .or_default()
                .extend(events)
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    /// Recorded calls of one operation
    pub fn calls_of(&self, op: &str) -> Vec<String> {
        let prefix = format!("{} ", op);
        self.calls().into_iter().filter(|c| c.starts_with(&prefix)).collect()
    }

    /// Calls that change cluster state
    pub fn mutations(&self) -> Vec<String> {
        const MUTATING: &[&str] = &[
            "RegisterTaskDefinition",
            "DeregisterTaskDefinition",
            "CreateService",
            "UpdateService",
            "DeleteService",
            "RunTask",
            "CreateLogGroup",
        ];
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|op| c.starts_with(&format!("{} ", op))))
            .collect()
    }

    pub fn updates(&self) -> Vec<UpdateServiceRequest> {
        self.with(|s| s.updates.clone())
    }

    pub fn runs(&self) -> Vec<RunTaskRequest> {
        self.with(|s| s.runs.clone())
    }

    pub fn service(&self, name: &str) -> Option<Service> {
        self.with(|s| s.services.get(name).cloned())
    }

    pub fn revision_count(&self, family: &str) -> usize {
        self.with(|s| s.revisions.get(family).map(Vec::len).unwrap_or(0))
    }

    pub fn is_deregistered(&self, arn: &str) -> bool {
        self.with(|s| s.deregistered.contains(arn))
    }

    pub fn log_starts(&self) -> Vec<i64> {
        self.with(|s| s.log_starts.clone())
    }

    fn find_revision(&self, identifier: &str) -> Option<TaskDefinition> {
        self.with(|s| {
            let revs = s.revisions.get(family_of(identifier))?;
            if identifier.contains(':') {
                let tail = identifier.rsplit('/').next().unwrap_or(identifier);
                revs.iter()
                    .find(|td| {
                        td.task_definition_arn
                            .as_deref()
                            .map(|arn| arn == identifier || arn.ends_with(&format!("/{}", tail)))
                            .unwrap_or(false)
                    })
                    .cloned()
            } else {
                revs.last().cloned()
            }
        })
    }

    async fn wait(&self) -> Result<(), ClientError> {
        let (delay, fail) = self.with(|s| (s.wait_delay, s.fail_waits));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ClientError::WaiterExhausted {
                waiter: "Fake",
                attempts: 1,
            });
        }
        Ok(())
    }
}

fn settled_deployment(task_definition: &str, count: i64) -> Deployment {
    Deployment {
        status: "PRIMARY".to_string(),
        task_definition: task_definition.to_string(),
        desired_count: count,
        pending_count: 0,
        running_count: count,
    }
}

fn not_found(code: &str, target: &str) -> ClientError {
    ClientError::Api {
        code: code.to_string(),
        message: format!("{} not found", target),
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn register_task_definition(
        &self,
        input: &RegisterTaskDefinitionInput,
    ) -> Result<TaskDefinition, ClientError> {
        let family = input.family.clone().unwrap_or_default();
        self.record("RegisterTaskDefinition", &family)?;

        let body = serde_json::to_value(input)
            .and_then(serde_json::from_value::<TaskDefinition>)
            .map_err(|e| ClientError::Decode {
                message: e.to_string(),
            })?;

        Ok(self.with(|s| {
            let revs = s.revisions.entry(family.clone()).or_default();
            let mut td = body;
            td.task_definition_arn = Some(revision_arn(&family, revs.len() + 1));
            revs.push(td.clone());
            td
        }))
    }

    async fn describe_task_definition(&self, identifier: &str) -> Result<TaskDefinition, ClientError> {
        self.record("DescribeTaskDefinition", identifier)?;
        self.find_revision(identifier)
            .ok_or_else(|| not_found("ClientException", identifier))
    }

    async fn deregister_task_definition(&self, identifier: &str) -> Result<(), ClientError> {
        self.record("DeregisterTaskDefinition", identifier)?;
        self.with(|s| s.deregistered.insert(identifier.to_string()));
        Ok(())
    }

    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        self.record("ListTaskDefinitions", family)?;
        Ok(self.with(|s| {
            let arns: Vec<String> = s
                .revisions
                .get(family)
                .map(|revs| {
                    revs.iter()
                        .rev()
                        .filter_map(|td| td.task_definition_arn.clone())
                        .filter(|arn| !s.deregistered.contains(arn))
                        .collect()
                })
                .unwrap_or_default();

            let offset: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
            let end = (offset + s.page_size).min(arns.len());
            Page {
                items: arns.get(offset..end).map(<[String]>::to_vec).unwrap_or_default(),
                next_token: (end < arns.len()).then(|| end.to_string()),
            }
        }))
    }

    async fn create_service(
        &self,
        _cluster: &str,
        task_definition: &str,
        service: &Service,
    ) -> Result<Service, ClientError> {
        self.record("CreateService", service.name())?;
        let desired = service.desired_count.unwrap_or(0);
        let mut live = service.clone();
        live.status = Some(STATUS_ACTIVE.to_string());
        live.task_definition = Some(task_definition.to_string());
        live.deployments = vec![settled_deployment(task_definition, desired)];
        self.with(|s| {
            s.draining.remove(live.name());
            s.services.insert(live.name().to_string(), live.clone())
        });
        Ok(live)
    }

    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<Service, ClientError> {
        self.record("UpdateService", &request.service)?;
        self.with(|s| {
            s.updates.push(request.clone());
            let svc = s
                .services
                .get_mut(&request.service)
                .ok_or_else(|| not_found("ServiceNotFoundException", &request.service))?;
            if let Some(td) = &request.task_definition {
                svc.task_definition = Some(td.clone());
                let desired = svc.desired_count.unwrap_or(0);
                svc.deployments = vec![settled_deployment(td, desired)];
            }
            Ok(svc.clone())
        })
    }

    async fn delete_service(&self, _cluster: &str, name: &str, force: bool) -> Result<Service, ClientError> {
        self.record("DeleteService", format!("{} force={}", name, force))?;
        self.with(|s| match s.delete_lingers.remove(name) {
            Some(statuses) => {
                let svc = s
                    .services
                    .get(name)
                    .cloned()
                    .ok_or_else(|| not_found("ServiceNotFoundException", name))?;
                s.draining.insert(name.to_string(), statuses);
                Ok(svc)
            }
            None => s
                .services
                .remove(name)
                .ok_or_else(|| not_found("ServiceNotFoundException", name)),
        })
    }

    async fn describe_services(
        &self,
        cluster: &str,
        names: &[String],
    ) -> Result<DescribeServicesOutput, ClientError> {
        self.record("DescribeServices", names.join(","))?;
        Ok(self.with(|s| {
            let mut out = DescribeServicesOutput::default();
            for name in names {
                if let Some(statuses) = s.draining.get_mut(name) {
                    match statuses.pop_front() {
                        Some(status) => {
                            if let Some(svc) = s.services.get_mut(name) {
                                svc.status = Some(status);
                            }
                        }
                        None => {
                            s.draining.remove(name);
                            s.services.remove(name);
                        }
                    }
                }
                match s.services.get(name) {
                    Some(svc) => out.services.push(svc.clone()),
                    None => out.failures.push(Failure {
                        arn: format!("{}:service/{}/{}", ACCOUNT_PREFIX, cluster, name),
                        reason: REASON_MISSING.to_string(),
                    }),
                }
            }
            out
        }))
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TasksOutput, ClientError> {
        self.record("RunTask", &request.task_definition)?;
        let td = self
            .find_revision(&request.task_definition)
            .ok_or_else(|| not_found("ClientException", &request.task_definition))?;

        Ok(self.with(|s| {
            s.runs.push(request.clone());
            let mut out = TasksOutput::default();
            for _ in 0..request.count.max(1) {
                s.task_counter += 1;
                let task = Task {
                    task_arn: format!("{}:task/{}/task{:04}", ACCOUNT_PREFIX, request.cluster, s.task_counter),
                    task_definition_arn: td.task_definition_arn.clone().unwrap_or_default(),
                    last_status: Some("STOPPED".to_string()),
                    launch_type: request.launch_type.clone(),
                    containers: td
                        .container_definitions
                        .iter()
                        .map(|c| Container {
                            name: c.name.clone(),
                            last_status: Some("STOPPED".to_string()),
                            exit_code: s.task_exit_code,
                            reason: None,
                        })
                        .collect(),
                };
                s.tasks.insert(task.task_arn.clone(), task.clone());
                out.tasks.push(task);
            }
            out
        }))
    }

    async fn describe_tasks(&self, _cluster: &str, tasks: &[String]) -> Result<TasksOutput, ClientError> {
        self.record("DescribeTasks", tasks.join(","))?;
        Ok(self.with(|s| {
            let mut out = TasksOutput::default();
            for arn in tasks {
                match s.tasks.get(arn) {
                    Some(task) => out.tasks.push(task.clone()),
                    None => out.failures.push(Failure {
                        arn: arn.clone(),
                        reason: REASON_MISSING.to_string(),
                    }),
                }
            }
            out
        }))
    }

    async fn list_tasks(
        &self,
        _cluster: &str,
        service: &str,
        _next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        self.record("ListTasks", service)?;
        Ok(self.with(|s| Page {
            items: s
                .service_tasks
                .get(service)
                .map(|tasks| tasks.iter().map(|t| t.task_arn.clone()).collect())
                .unwrap_or_default(),
            next_token: None,
        }))
    }

    async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>, ClientError> {
        self.record("DescribeClusters", cluster)?;
        Ok(self.with(|s| {
            Some(Cluster {
                cluster_name: cluster.to_string(),
                status: STATUS_ACTIVE.to_string(),
                running_tasks_count: s
                    .services
                    .values()
                    .filter(|svc| svc.status.as_deref() != Some(STATUS_INACTIVE))
                    .map(|svc| svc.desired_count.unwrap_or(0))
                    .sum(),
            })
        }))
    }

    async fn wait_until_services_stable(&self, _cluster: &str, names: &[String]) -> Result<(), ClientError> {
        self.record("WaitUntilServicesStable", names.join(","))?;
        self.wait().await
    }

    async fn wait_until_tasks_stopped(&self, _cluster: &str, tasks: &[String]) -> Result<(), ClientError> {
        self.record("WaitUntilTasksStopped", tasks.join(","))?;
        self.wait().await
    }

    async fn get_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: i64,
        _next_token: Option<String>,
    ) -> Result<LogEventsPage, ClientError> {
        self.record("GetLogEvents", format!("{} {}", group, stream))?;
        Ok(self.with(|s| {
            s.log_starts.push(start_time);
            let events = s
                .log_events
                .get(&(group.to_string(), stream.to_string()))
                .map(|evs| evs.iter().filter(|e| e.timestamp >= start_time).cloned().collect())
                .unwrap_or_default();
            LogEventsPage {
                events,
                next_forward_token: None,
            }
        }))
    }

    async fn describe_log_groups(&self, prefix: &str) -> Result<Vec<LogGroup>, ClientError> {
        self.record("DescribeLogGroups", prefix)?;
        Ok(self.with(|s| {
            s.log_groups
                .iter()
                .filter(|g| g.starts_with(prefix))
                .map(|g| LogGroup {
                    log_group_name: g.clone(),
                })
                .collect()
        }))
    }

    async fn create_log_group(&self, name: &str) -> Result<(), ClientError> {
        self.record("CreateLogGroup", name)?;
        self.with(|s| s.log_groups.insert(name.to_string()));
        Ok(())
    }
}
