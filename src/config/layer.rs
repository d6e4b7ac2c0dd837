//! One configuration file of a stack.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Task definition declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinitionDecl {
    /// Logical name (e.g., "API")
    pub name: String,

    /// Template rendered first; its container environments are kept as the merge base
    #[serde(default)]
    pub base_file: Option<String>,

    /// Overlay template that replaces the base render
    #[serde(default)]
    pub file: Option<String>,
}

/// Service declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDecl {
    /// Logical name (e.g., "api")
    pub name: String,

    /// Service definition template
    pub file: String,

    /// Logical name of the task definition this service runs
    pub task_definition: String,
}

/// Parsed content of a single config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigLayer {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub cluster: Option<String>,

    /// Prepended to every logical name to build family and service names
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// Appended to every logical name to build family and service names
    #[serde(default)]
    pub name_suffix: Option<String>,

    /// Template parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(default)]
    pub task_definitions: Vec<TaskDefinitionDecl>,

    #[serde(default)]
    pub services: Vec<ServiceDecl>,

    /// Parent config file, relative to this file's directory
    #[serde(default)]
    pub base: Option<String>,

    /// Directory of the file this layer was read from
    #[serde(skip)]
    pub dir: PathBuf,
}

impl ConfigLayer {
    /// Resolve a path declared in this layer against the layer's directory
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Parent layer path, if this layer declares one
    pub fn base_path(&self) -> Option<PathBuf> {
        self.base
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| self.resolve_path(b))
    }
}
