//! Template parameters.

use std::collections::BTreeMap;

/// Flat parameter map handed to the template binder
pub type Params = BTreeMap<String, String>;

/// Parse a `key=value` command-line parameter.
///
/// The value is everything after the first `=`, so values may contain `=`.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Bad param format {} (expected KEY=VALUE)", raw)),
    }
}

/// Collect parsed parameters, later entries overwriting earlier ones
pub fn params_from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Params {
    pairs.into_iter().collect()
}
