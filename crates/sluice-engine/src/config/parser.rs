//! Configuration document parsing with environment variable substitution.
//!
//! The document is a YAML mapping of sections to key/value scalars; every
//! scalar is stored as a string in the [`ConfigStore`] the core consumes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sluice_core::{ConfigError, ConfigStore};

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

/// Substitute `${VAR_NAME}` patterns with environment variable values.
///
/// # Errors
///
/// Returns an error naming every referenced environment variable that is
/// not set.
pub fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in ENV_VAR_RE.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                missing.push(var_name.to_string());
            }
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars {
            names: missing.join(", "),
        });
    }

    Ok(result)
}

/// Parse a configuration document string (after env var substitution).
///
/// # Errors
///
/// Returns an error if env var substitution fails, the YAML is invalid, or
/// any value is not a scalar.
pub fn parse_config_str(text: &str) -> Result<ConfigStore, ConfigError> {
    let substituted = substitute_env_vars(text)?;
    let sections: BTreeMap<String, BTreeMap<String, serde_yaml::Value>> =
        serde_yaml::from_str(&substituted).map_err(|e| ConfigError::Document(e.to_string()))?;

    let mut store = ConfigStore::new();
    for (section, keys) in sections {
        for (key, value) in keys {
            store.insert(&section, &key, scalar_to_string(&section, &key, value)?);
        }
    }
    Ok(store)
}

/// Parse a configuration document file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is invalid.
pub fn parse_config(path: &Path) -> Result<ConfigStore, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config_str(&content)
}

fn scalar_to_string(
    section: &str,
    key: &str,
    value: serde_yaml::Value,
) -> Result<String, ConfigError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::Document(format!(
            "value for {section}.{key} must be a scalar, got {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SLUICE_TEST_DIR", "/data/incoming");
        let input = "path: ${SLUICE_TEST_DIR}\ndepth: 2";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("/data/incoming"));
        assert!(!result.contains("${SLUICE_TEST_DIR}"));
        std::env::remove_var("SLUICE_TEST_DIR");
    }

    #[test]
    fn test_multiple_env_vars() {
        std::env::set_var("SLUICE_TEST_A", "alpha");
        std::env::set_var("SLUICE_TEST_B", "beta");
        let result = substitute_env_vars("${SLUICE_TEST_A} and ${SLUICE_TEST_B}").unwrap();
        assert_eq!(result, "alpha and beta");
        std::env::remove_var("SLUICE_TEST_A");
        std::env::remove_var("SLUICE_TEST_B");
    }

    #[test]
    fn test_no_env_vars_passthrough() {
        let input = "path: /tmp\ndepth: 2";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_multiple_missing_env_vars_all_reported() {
        let result = substitute_env_vars("${SLUICE_MISSING_X} and ${SLUICE_MISSING_Y}");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("SLUICE_MISSING_X"));
        assert!(err.contains("SLUICE_MISSING_Y"));
    }

    #[test]
    fn test_parse_sections_and_scalars() {
        let yaml = r#"
etl:
  chains: input_lines|output_std

input_lines:
  class: line_file_input
  file_path: words.txt
  trim: true
  buffer_size: 4096
"#;
        let store = parse_config_str(yaml).unwrap();
        assert_eq!(store.get("etl", "chains"), Some("input_lines|output_std"));
        assert_eq!(store.get("input_lines", "class"), Some("line_file_input"));
        // Scalars of any YAML type come back as strings.
        assert_eq!(store.get("input_lines", "trim"), Some("true"));
        assert_eq!(store.get("input_lines", "buffer_size"), Some("4096"));
    }

    #[test]
    fn test_env_var_inside_document() {
        std::env::set_var("SLUICE_TEST_FILE", "words.txt");
        let yaml = "input_lines:\n  file_path: ${SLUICE_TEST_FILE}\n";
        let store = parse_config_str(yaml).unwrap();
        assert_eq!(store.get("input_lines", "file_path"), Some("words.txt"));
        std::env::remove_var("SLUICE_TEST_FILE");
    }

    #[test]
    fn test_non_scalar_value_errors() {
        let yaml = "input_lines:\n  file_path:\n    - a.txt\n    - b.txt\n";
        let err = parse_config_str(yaml).unwrap_err().to_string();
        assert!(err.contains("input_lines.file_path"), "got: {err}");
        assert!(err.contains("sequence"), "got: {err}");
    }

    #[test]
    fn test_parse_invalid_yaml_errors() {
        let result = parse_config_str("this is not: [valid: yaml: {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_file_not_found() {
        let result = parse_config(Path::new("/nonexistent/sluice.yaml"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("/nonexistent/sluice.yaml"));
    }
}
