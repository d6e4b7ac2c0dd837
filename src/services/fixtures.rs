//! Resolved definitions used across service tests

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::watch::testing::CapturedOutput;
use super::watch::Timings;
use crate::config::ClusterSettings;
use crate::domain::definition::{Service, TaskDefinition};
use crate::domain::resolve::{ResolvedDefinitions, ResolvedService, ResolvedTaskDefinition};
use crate::infrastructure::fake::FakeControlPlane;

pub const CLUSTER: &str = "my-cluster";

pub fn timings() -> Timings {
    Timings {
        settle: Duration::ZERO,
        progress: Duration::from_millis(10),
        log_poll: Duration::from_millis(10),
    }
}

pub fn api_task_definition() -> TaskDefinition {
    serde_json::from_value(json!({
        "family": "dev-API",
        "containerDefinitions": [{
            "name": "app",
            "image": "my-image:latest",
            "environment": [{"name": "PORT", "value": "8080"}],
            "logConfiguration": {
                "logDriver": "awslogs",
                "options": {
                    "awslogs-group": "/ecs/dev-api",
                    "awslogs-region": "us-east-1",
                    "awslogs-stream-prefix": "ecs"
                }
            }
        }],
        "cpu": "256",
        "memory": "512",
        "networkMode": "awsvpc",
        "requiresCompatibilities": ["FARGATE"]
    }))
    .unwrap()
}

pub fn api_service() -> Service {
    serde_json::from_value(json!({
        "serviceName": "dev-api",
        "desiredCount": 1,
        "launchType": "FARGATE",
        "networkConfiguration": {"awsvpcConfiguration": {
            "subnets": ["subnet-a"],
            "securityGroups": ["sg-1"]
        }}
    }))
    .unwrap()
}

/// One task definition `API` (family `dev-API`) and one service `api` (`dev-api`)
pub fn definitions() -> ResolvedDefinitions {
    let mut defs = ResolvedDefinitions {
        settings: ClusterSettings {
            region: "us-east-1".into(),
            cluster: CLUSTER.into(),
            name_prefix: "dev-".into(),
            name_suffix: String::new(),
        },
        ..Default::default()
    };
    defs.task_definitions.insert(
        "API".into(),
        ResolvedTaskDefinition {
            name: "API".into(),
            family: "dev-API".into(),
            body: api_task_definition(),
        },
    );
    defs.services.insert(
        "api".into(),
        ResolvedService {
            name: "api".into(),
            full_name: "dev-api".into(),
            task_definition: "API".into(),
            body: api_service(),
        },
    );
    defs
}

pub fn harness() -> (Arc<FakeControlPlane>, Arc<CapturedOutput>) {
    (
        Arc::new(FakeControlPlane::new()),
        Arc::new(CapturedOutput::default()),
    )
}
