//! Template binder
//!
//! Renders `{{name}}` placeholders (the `{{ .name }}` spelling is accepted too)
//! against a flat parameter map and decodes the result as JSON.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::Params;
use crate::error::DeployError;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_\-]*)\s*\}\}").expect("placeholder pattern")
    })
}

/// Substitute placeholders in `source`.
///
/// Undefined keys and unterminated or malformed `{{` actions are errors, never
/// blanks. A `}}` outside an action is plain text.
pub fn render_str(source: &str, params: &Params) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in placeholder().captures_iter(source) {
        let whole = caps.get(0).expect("match");
        check_literal(&source[last..whole.start()])?;

        let key = &caps[1];
        let value = params
            .get(key)
            .ok_or_else(|| format!("map has no entry for key \"{}\"", key))?;

        out.push_str(&source[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    check_literal(&source[last..])?;
    out.push_str(&source[last..]);
    Ok(out)
}

fn check_literal(segment: &str) -> Result<(), String> {
    if let Some(pos) = segment.find("{{") {
        let snippet: String = segment[pos..].chars().take(24).collect();
        return Err(format!("malformed action near \"{}\"", snippet));
    }
    Ok(())
}

/// Load and render the template at `path`
pub fn render(path: &Path, params: &Params) -> Result<String, DeployError> {
    let source = std::fs::read_to_string(path).map_err(|e| DeployError::Template {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    render_str(&source, params).map_err(|message| DeployError::Template {
        path: path.to_path_buf(),
        message,
    })
}

/// Render the template at `path` and decode it into `T`
pub fn render_as<T: DeserializeOwned>(path: &Path, params: &Params) -> Result<T, DeployError> {
    let text = render(path, params)?;
    serde_json::from_str(&text).map_err(|e| DeployError::DefinitionParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::definition::TaskDefinition;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_both_spellings() {
        let p = params(&[("IMAGE", "nginx:1.25"), ("ENV", "dev")]);
        let out = render_str(r#"{"image": "{{IMAGE}}", "env": "{{ .ENV }}"}"#, &p).unwrap();
        assert_eq!(out, r#"{"image": "nginx:1.25", "env": "dev"}"#);
    }

    #[test]
    fn test_undefined_key_is_error() {
        let err = render_str("{{ MISSING }}", &Params::new()).unwrap_err();
        assert!(err.contains("MISSING"));
    }

    #[test]
    fn test_unterminated_action_is_error() {
        let p = params(&[("A", "1")]);
        assert!(render_str("{{A}} and {{ B", &p).is_err());
        assert!(render_str("{{ not valid! }}", &p).is_err());
    }

    #[test]
    fn test_closing_braces_outside_actions_are_text() {
        let p = params(&[("SUBNET", "subnet-1")]);
        let out = render_str(
            r#"{"networkConfiguration": {"awsvpcConfiguration": {"subnets": ["{{SUBNET}}"]}}}"#,
            &p,
        )
        .unwrap();
        assert_eq!(
            out,
            r#"{"networkConfiguration": {"awsvpcConfiguration": {"subnets": ["subnet-1"]}}}"#
        );
        assert_eq!(render_str(r#"{"a": {"b": 1}}"#, &Params::new()).unwrap(), r#"{"a": {"b": 1}}"#);
    }

    #[test]
    fn test_values_are_not_re_rendered() {
        let p = params(&[("A", "{{B}}")]);
        assert_eq!(render_str("x{{A}}y", &p).unwrap(), "x{{B}}y");
    }

    #[test]
    fn test_render_as_reports_decode_errors_with_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("td.json");
        std::fs::write(&path, r#"{"family": "{{F}}", "containerDefinitions": 5}"#).unwrap();

        let err = render_as::<TaskDefinition>(&path, &params(&[("F", "api")])).unwrap_err();
        match err {
            DeployError::DefinitionParse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_as_missing_file_is_template_error() {
        let err = render_as::<TaskDefinition>(Path::new("/nonexistent/td.json"), &Params::new())
            .unwrap_err();
        assert!(matches!(err, DeployError::Template { .. }));
    }
}
