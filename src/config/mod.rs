//! # Deployment Configuration System
//!
//! Layered configuration loading: each config file may name a `base` file,
//! and the chain is followed up to the root.
//!
//! ## Configuration Files
//!
//! 1. **Root** (e.g. `base/config.yml`)
//!    - Cluster, region, shared parameters and declarations
//!
//! 2. **Overlays** (e.g. `overlays/develop/config.yml` with `base: ../../base/config.yml`)
//!    - Environment-specific parameters and replacement declarations
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let stack = load_config_stack(Path::new("overlays/develop/config.yml"))?;
//! println!("Cluster: {}", stack.settings().cluster);
//! ```

mod layer;
mod params;

pub use layer::{ConfigLayer, ServiceDecl, TaskDefinitionDecl};
pub use params::{params_from_pairs, parse_param, Params};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DeployError;

/// Upper bound on `base` hops before the chain is treated as a cycle
pub const MAX_BASE_HOPS: usize = 64;

/// Cluster-wide scalar settings merged across the stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSettings {
    pub region: String,
    pub cluster: String,
    pub name_prefix: String,
    pub name_suffix: String,
}

impl ClusterSettings {
    /// Family or service name for a logical name
    pub fn full_name(&self, logical: &str) -> String {
        format!("{}{}{}", self.name_prefix, logical, self.name_suffix)
    }

    /// Logical name for a family or service name
    pub fn logical_name<'a>(&self, full: &'a str) -> &'a str {
        let name = full.strip_prefix(self.name_prefix.as_str()).unwrap_or(full);
        name.strip_suffix(self.name_suffix.as_str()).unwrap_or(name)
    }
}

/// Config layers ordered root-first, overlay-last
#[derive(Debug, Clone, Default)]
pub struct ConfigStack {
    layers: Vec<ConfigLayer>,
}

impl ConfigStack {
    pub fn new(layers: Vec<ConfigLayer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Scalar settings; the last layer setting a non-empty value wins
    pub fn settings(&self) -> ClusterSettings {
        let mut settings = ClusterSettings::default();
        for layer in &self.layers {
            overwrite(&mut settings.region, &layer.region);
            overwrite(&mut settings.cluster, &layer.cluster);
            overwrite(&mut settings.name_prefix, &layer.name_prefix);
            overwrite(&mut settings.name_suffix, &layer.name_suffix);
        }
        settings
    }

    /// Parameters applied in stack order, then `additional` on top
    pub fn params(&self, additional: &Params) -> Params {
        let mut params = Params::new();
        for layer in &self.layers {
            for (key, value) in &layer.params {
                params.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in additional {
            params.insert(key.clone(), value.clone());
        }
        params
    }
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        *target = v.to_string();
    }
}

/// Parse one config file
pub fn load_layer(path: &Path) -> Result<ConfigLayer, DeployError> {
    let content = std::fs::read_to_string(path).map_err(|e| DeployError::ConfigLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut layer: ConfigLayer =
        serde_yaml::from_str(&content).map_err(|e| DeployError::ConfigLoad {
            path: path.to_path_buf(),
            message: format!("invalid YAML: {}", e),
        })?;

    layer.dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(layer)
}

/// Follow `base` references from `path` up to the root layer.
///
/// Returns the layers root-first. Revisiting a file, or exceeding
/// [`MAX_BASE_HOPS`], is reported as [`DeployError::ConfigCycle`].
pub fn load_config_stack(path: &Path) -> Result<ConfigStack, DeployError> {
    let mut layers = Vec::new();
    let mut visited = HashSet::new();
    let mut current = path.to_path_buf();

    loop {
        if layers.len() >= MAX_BASE_HOPS {
            return Err(DeployError::ConfigCycle {
                start: path.to_path_buf(),
                hops: MAX_BASE_HOPS,
            });
        }

        let layer = load_layer(&current)?;
        let canonical = current.canonicalize().unwrap_or_else(|_| current.clone());
        if !visited.insert(canonical) {
            return Err(DeployError::ConfigCycle {
                start: path.to_path_buf(),
                hops: layers.len(),
            });
        }
        debug!("Loaded config layer {}", current.display());

        let base = layer.base_path();
        layers.push(layer);

        match base {
            Some(next) => current = next,
            None => break,
        }
    }

    layers.reverse();
    Ok(ConfigStack::new(layers))
}
