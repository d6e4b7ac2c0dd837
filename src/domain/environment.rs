//! Container environment merge between a base render and an overlay render.

use std::collections::HashMap;

use super::definition::{KeyValuePair, TaskDefinition};

/// Environment lists of a base render, keyed by container name
pub type EnvironmentSnapshot = HashMap<String, Vec<KeyValuePair>>;

/// Merge `overlay` onto `base` by variable name.
///
/// Existing names are overwritten in place, new names are appended and
/// base-only names are kept. Names compare byte-for-byte.
pub fn merge_environment(base: &[KeyValuePair], overlay: &[KeyValuePair]) -> Vec<KeyValuePair> {
    let mut merged = base.to_vec();
    for entry in overlay {
        match merged.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => existing.value = entry.value.clone(),
            None => merged.push(entry.clone()),
        }
    }
    merged
}

/// Capture every container's environment from a base render
pub fn snapshot(td: &TaskDefinition) -> EnvironmentSnapshot {
    td.container_definitions
        .iter()
        .map(|c| (c.name.clone(), c.environment.clone()))
        .collect()
}

/// Re-merge an overlay render's environments against a base snapshot.
///
/// Containers without a base entry keep only their overlay environment.
pub fn apply_snapshot(td: &mut TaskDefinition, base: &EnvironmentSnapshot) {
    for container in &mut td.container_definitions {
        if let Some(base_env) = base.get(&container.name) {
            container.environment = merge_environment(base_env, &container.environment);
        }
    }
}
