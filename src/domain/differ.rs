//! Definition Differ
//!
//! Normalizes definitions before comparing them so that list ordering and
//! implicit control plane defaults never show up as changes, then renders a
//! unified line diff of the pretty-printed JSON.
//!
//! Normalization is table-driven: every order-insensitive list is named in a
//! rule table for its resource type, and all lists are sorted by the same
//! canonical key (the string itself, or the element's compact JSON text).

use serde::Serialize;
use similar::TextDiff;

use super::definition::{
    AwsVpcConfiguration, ContainerDefinition, DeploymentConfiguration, Service, TaskDefinition,
    ASSIGN_PUBLIC_IP_DISABLED, LAUNCH_TYPE_FARGATE, SCHEDULING_STRATEGY_DAEMON,
};

/// A named normalization step for one resource type
type SortRule<T> = (&'static str, fn(&mut T));

const CONTAINER_RULES: &[SortRule<ContainerDefinition>] = &[
    ("environment", |c: &mut ContainerDefinition| sort_canonical(&mut c.environment)),
    ("mountPoints", |c: &mut ContainerDefinition| sort_canonical(&mut c.mount_points)),
    ("portMappings", |c: &mut ContainerDefinition| sort_canonical(&mut c.port_mappings)),
    ("volumesFrom", |c: &mut ContainerDefinition| sort_canonical(&mut c.volumes_from)),
    ("secrets", |c: &mut ContainerDefinition| sort_canonical(&mut c.secrets)),
];

const TASK_DEFINITION_RULES: &[SortRule<TaskDefinition>] = &[
    ("containerDefinitions", |td: &mut TaskDefinition| sort_canonical(&mut td.container_definitions)),
    ("placementConstraints", |td: &mut TaskDefinition| sort_canonical(&mut td.placement_constraints)),
    ("requiresCompatibilities", |td: &mut TaskDefinition| sort_canonical(&mut td.requires_compatibilities)),
    ("volumes", |td: &mut TaskDefinition| sort_canonical(&mut td.volumes)),
];

const SERVICE_RULES: &[SortRule<Service>] = &[
    ("placementConstraints", |s: &mut Service| sort_canonical(&mut s.placement_constraints)),
    ("placementStrategy", |s: &mut Service| sort_canonical(&mut s.placement_strategy)),
];

const AWSVPC_RULES: &[SortRule<AwsVpcConfiguration>] = &[
    ("securityGroups", |a: &mut AwsVpcConfiguration| sort_canonical(&mut a.security_groups)),
    ("subnets", |a: &mut AwsVpcConfiguration| sort_canonical(&mut a.subnets)),
];

fn apply_rules<T>(target: &mut T, rules: &[SortRule<T>]) {
    for (_field, rule) in rules {
        rule(target);
    }
}

/// Sort key: the value itself for strings, compact JSON otherwise
pub fn canonical_key<T: Serialize>(item: &T) -> String {
    match serde_json::to_value(item) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

fn sort_canonical<T: Serialize>(items: &mut Vec<T>) {
    items.sort_by_cached_key(canonical_key);
}

/// Convert human CPU units ("0.25 vCPU") to CPU units ("256")
pub fn normalize_cpu(cpu: &str) -> String {
    scale_unit(cpu, &cpu.to_ascii_lowercase(), "vcpu")
}

/// Convert human memory units ("2GB") to MiB ("2048")
pub fn normalize_memory(memory: &str) -> String {
    scale_unit(memory, memory, "GB")
}

// `haystack` must have the same byte layout as `original`
fn scale_unit(original: &str, haystack: &str, unit: &str) -> String {
    let number = match haystack.find(unit) {
        Some(i) if i > 0 => original.get(..i),
        _ => None,
    };
    match number.map(|n| n.trim().parse::<f64>()) {
        Some(Ok(n)) => format!("{}", (n * 1024.0) as i64),
        _ => original.to_string(),
    }
}

/// Normalize a task definition in place
pub fn normalize_task_definition(td: &mut TaskDefinition) {
    for container in &mut td.container_definitions {
        if container.cpu.is_none() {
            container.cpu = Some(0);
        }
        apply_rules(container, CONTAINER_RULES);
    }
    apply_rules(td, TASK_DEFINITION_RULES);

    if let Some(cpu) = td.cpu.as_deref() {
        td.cpu = Some(normalize_cpu(cpu));
    }
    if let Some(memory) = td.memory.as_deref() {
        td.memory = Some(normalize_memory(memory));
    }
}

/// Normalize a service in place, filling the control plane's implicit defaults
pub fn normalize_service(svc: &mut Service) {
    apply_rules(svc, SERVICE_RULES);

    if svc.launch_type.as_deref() == Some(LAUNCH_TYPE_FARGATE) && svc.platform_version.is_none() {
        svc.platform_version = Some("LATEST".to_string());
    }

    if svc.deployment_configuration.is_none() {
        let (maximum, minimum) = match svc.scheduling_strategy.as_deref() {
            Some(SCHEDULING_STRATEGY_DAEMON) => (100, 0),
            _ => (200, 100),
        };
        svc.deployment_configuration = Some(DeploymentConfiguration {
            maximum_percent: Some(maximum),
            minimum_healthy_percent: Some(minimum),
            ..Default::default()
        });
    }

    if !svc.load_balancers.is_empty() && svc.health_check_grace_period_seconds.is_none() {
        svc.health_check_grace_period_seconds = Some(0);
    }

    if let Some(vpc) = svc
        .network_configuration
        .as_mut()
        .and_then(|nc| nc.awsvpc_configuration.as_mut())
    {
        if vpc.assign_public_ip.is_none() {
            vpc.assign_public_ip = Some(ASSIGN_PUBLIC_IP_DISABLED.to_string());
        }
        apply_rules(vpc, AWSVPC_RULES);
    }
}

/// Pretty JSON with a trailing newline, as compared by the differ
pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(mut s) => {
            s.push('\n');
            s
        }
        Err(e) => format!("<unserializable: {}>\n", e),
    }
}

/// Unified diff of two texts; empty when they are equal
pub fn unified_diff(previous: &str, desired: &str) -> String {
    if previous == desired {
        return String::new();
    }
    TextDiff::from_lines(previous, desired)
        .unified_diff()
        .context_radius(3)
        .header("live", "desired")
        .to_string()
}

/// Diff of the registration fields of two task definitions
pub fn diff_task_definitions(previous: &TaskDefinition, desired: &TaskDefinition) -> String {
    let mut previous = previous.clone();
    let mut desired = desired.clone();
    normalize_task_definition(&mut previous);
    normalize_task_definition(&mut desired);

    unified_diff(
        &to_pretty_json(&previous.registration_input()),
        &to_pretty_json(&desired.registration_input()),
    )
}

/// Diff of the updatable attributes of two services
pub fn diff_services(live: &Service, desired: &Service) -> String {
    let mut live = live.clone();
    let mut desired = desired.clone();
    normalize_service(&mut live);
    normalize_service(&mut desired);

    unified_diff(
        &to_pretty_json(&live.updatable_attributes()),
        &to_pretty_json(&desired.updatable_attributes()),
    )
}

/// Every line of `text` marked as an addition
pub fn addition(text: &str) -> String {
    text.lines().map(|line| format!("+{}\n", line)).collect()
}
