//! Environment variable substitution and deployment overrides.
//!
//! String values may contain `${VAR_NAME}` (uppercase `[A-Z_][A-Z0-9_]*`),
//! resolved at load time. `$${VAR}` is an escape for a literal `${VAR}`.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{EngineConfig, IntakeConfig, ServerConfig};

/// `${VAR}`, optionally preceded by the `$` escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const PORT_VAR: &str = "DOCINTAKE_PORT";
pub const BIND_VAR: &str = "DOCINTAKE_BIND";
pub const ENGINE_URL_VAR: &str = "DOCINTAKE_ENGINE_URL";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Only string leaves are processed. A referenced variable that is unset
/// or empty is an error.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Collect all env var names referenced in a config value tree.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in ENV_VAR_PATTERN.captures_iter(s) {
                if caps[1].is_empty() {
                    out.push(caps[2].to_string());
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

/// Apply `DOCINTAKE_PORT`, `DOCINTAKE_BIND` and `DOCINTAKE_ENGINE_URL`.
pub fn apply_env_overrides(config: IntakeConfig) -> Result<IntakeConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

pub fn apply_env_overrides_with(
    mut config: IntakeConfig,
    env: &HashMap<String, String>,
) -> Result<IntakeConfig> {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(port) = get(PORT_VAR) {
        let port: u16 = match port.parse() {
            Ok(p) => p,
            Err(_) => bail!("{PORT_VAR} must be a port number, got '{port}'"),
        };
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(bind) = get(BIND_VAR) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.to_string());
    }
    if let Some(url) = get(ENGINE_URL_VAR) {
        config.engine.get_or_insert_with(EngineConfig::default).url = Some(url.to_string());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"engine": {"apiKey": "${OCR_API_KEY}"}});
        let result = resolve_env_vars_with(&v, &env(&[("OCR_API_KEY", "k-123")])).unwrap();
        assert_eq!(result["engine"]["apiKey"], "k-123");
    }

    #[test]
    fn error_on_missing_var_names_path() {
        let v = json!({"engine": {"url": "${OCR_URL}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("OCR_URL"));
        assert!(err.contains("engine.url"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"a": "$${KEEP_ME}", "b": "x-${SET}-y"});
        let result = resolve_env_vars_with(&v, &env(&[("SET", "1")])).unwrap();
        assert_eq!(result["a"], "${KEEP_ME}");
        assert_eq!(result["b"], "x-1-y");
        assert_eq!(collect_referenced_vars(&v), vec!["SET".to_string()]);
    }

    #[test]
    fn overrides_port_bind_and_engine_url() {
        let cfg = apply_env_overrides_with(
            IntakeConfig::default(),
            &env(&[
                (PORT_VAR, "8081"),
                (BIND_VAR, "127.0.0.1"),
                (ENGINE_URL_VAR, "http://ocr:9000/extract"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port(), 8081);
        assert_eq!(cfg.bind(), "127.0.0.1");
        assert_eq!(
            cfg.engine.unwrap().url.as_deref(),
            Some("http://ocr:9000/extract")
        );
    }

    #[test]
    fn bad_port_override_is_error() {
        let result = apply_env_overrides_with(IntakeConfig::default(), &env(&[(PORT_VAR, "http")]));
        assert!(result.is_err());
    }
}
