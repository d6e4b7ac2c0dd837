//! Resolution of a config stack into concrete definitions.
//!
//! Declarations are merged by logical name (a later layer replaces the whole
//! declaration of an earlier one), then every surviving declaration is
//! rendered once with the final parameter set. The result is an immutable
//! value handed to the reconciler.

use std::collections::BTreeMap;
use tracing::debug;

use super::definition::{Service, TaskDefinition};
use super::environment;
use super::template;
use crate::config::{ClusterSettings, ConfigLayer, ConfigStack, Params, ServiceDecl, TaskDefinitionDecl};
use crate::error::DeployError;

/// Rendered task definition with its family name applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTaskDefinition {
    pub name: String,
    pub family: String,
    pub body: TaskDefinition,
}

/// Rendered service with its full name applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedService {
    pub name: String,
    pub full_name: String,
    /// Logical name of the referenced task definition
    pub task_definition: String,
    pub body: Service,
}

/// Everything one invocation deploys, keyed by logical name
#[derive(Debug, Clone, Default)]
pub struct ResolvedDefinitions {
    pub settings: ClusterSettings,
    pub params: Params,
    pub task_definitions: BTreeMap<String, ResolvedTaskDefinition>,
    pub services: BTreeMap<String, ResolvedService>,
}

impl ResolvedDefinitions {
    /// Service lookup by logical or full name
    pub fn find_service(&self, name: &str) -> Option<&ResolvedService> {
        self.services
            .get(name)
            .or_else(|| self.services.get(self.settings.logical_name(name)))
    }

    /// Full names of every declared service
    pub fn service_names(&self) -> Vec<String> {
        self.services.values().map(|s| s.full_name.clone()).collect()
    }

    /// Task definition a service points at
    pub fn referenced_task_definition(
        &self,
        service: &ResolvedService,
    ) -> Result<&ResolvedTaskDefinition, DeployError> {
        self.task_definitions
            .get(&service.task_definition)
            .ok_or_else(|| DeployError::Reference {
                service: service.name.clone(),
                task_definition: service.task_definition.clone(),
            })
    }
}

/// Resolve a stack with caller-supplied parameters on top
pub fn resolve(stack: &ConfigStack, additional: &Params) -> Result<ResolvedDefinitions, DeployError> {
    let settings = stack.settings();
    let params = stack.params(additional);

    let mut td_decls: BTreeMap<&str, (&TaskDefinitionDecl, &ConfigLayer)> = BTreeMap::new();
    let mut service_decls: BTreeMap<&str, (&ServiceDecl, &ConfigLayer)> = BTreeMap::new();
    for layer in stack.layers() {
        for decl in &layer.task_definitions {
            td_decls.insert(decl.name.as_str(), (decl, layer));
        }
        for decl in &layer.services {
            service_decls.insert(decl.name.as_str(), (decl, layer));
        }
    }

    let mut task_definitions = BTreeMap::new();
    for (name, (decl, layer)) in td_decls {
        let family = settings.full_name(name);
        let mut body = render_task_definition(decl, layer, &params)?;
        body.family = Some(family.clone());
        debug!("Resolved task definition {} as family {}", name, family);

        task_definitions.insert(
            name.to_string(),
            ResolvedTaskDefinition {
                name: name.to_string(),
                family,
                body,
            },
        );
    }

    let mut services = BTreeMap::new();
    for (name, (decl, layer)) in service_decls {
        let full_name = settings.full_name(name);
        let mut body: Service = template::render_as(&layer.resolve_path(&decl.file), &params)?;
        body.service_name = Some(full_name.clone());
        debug!("Resolved service {} as {}", name, full_name);

        services.insert(
            name.to_string(),
            ResolvedService {
                name: name.to_string(),
                full_name,
                task_definition: decl.task_definition.clone(),
                body,
            },
        );
    }

    Ok(ResolvedDefinitions {
        settings,
        params,
        task_definitions,
        services,
    })
}

fn render_task_definition(
    decl: &TaskDefinitionDecl,
    layer: &ConfigLayer,
    params: &Params,
) -> Result<TaskDefinition, DeployError> {
    let base_file = decl.base_file.as_deref().filter(|f| !f.is_empty());
    let overlay_file = decl.file.as_deref().filter(|f| !f.is_empty());

    let base: Option<TaskDefinition> = base_file
        .map(|f| template::render_as(&layer.resolve_path(f), params))
        .transpose()?;

    match (base, overlay_file) {
        (base, Some(file)) => {
            let mut body: TaskDefinition = template::render_as(&layer.resolve_path(file), params)?;
            if let Some(base) = base {
                environment::apply_snapshot(&mut body, &environment::snapshot(&base));
            }
            Ok(body)
        }
        (Some(base), None) => Ok(base),
        (None, None) => Err(DeployError::DefinitionParse {
            path: layer.dir.clone(),
            message: format!(
                "task definition {} declares neither base_file nor file",
                decl.name
            ),
        }),
    }
}
