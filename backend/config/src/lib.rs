//! `docintake-config`: intake service configuration.
//!
//! Provides:
//! - Typed config schema (server, upload, engine, pipeline, logging)
//! - YAML loading with a default location
//! - `${ENV_VAR}` substitution and deployment env overrides
//! - Default value application
//! - Validation with path-tagged errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, collect_referenced_vars, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config, parse_config};
pub use schema::{EngineKind, IntakeConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Warnings
/// are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<IntakeConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config, resolve_env_vars, apply_env_overrides)
}

/// Like [`load_and_prepare`] but without the validation gate.
///
/// For callers that only read a few values (a port, say) and must work
/// before the engine is configured.
pub async fn load_resolved(path: &Path) -> Result<IntakeConfig> {
    let raw_config = load_config(path).await?;
    resolve(raw_config, resolve_env_vars, apply_env_overrides)
}

fn resolve(
    raw_config: IntakeConfig,
    substitute: impl Fn(&Value) -> Result<Value>,
    overrides: impl Fn(IntakeConfig) -> Result<IntakeConfig>,
) -> Result<IntakeConfig> {
    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;

    let referenced = collect_referenced_vars(&value);
    if !referenced.is_empty() {
        tracing::debug!(vars = ?referenced, "Substituting env vars in config");
    }
    let value = substitute(&value).context("Failed to resolve env vars in config")?;

    let config: IntakeConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    Ok(apply_all_defaults(overrides(config)?))
}

fn prepare(
    raw_config: IntakeConfig,
    substitute: impl Fn(&Value) -> Result<Value>,
    overrides: impl Fn(IntakeConfig) -> Result<IntakeConfig>,
) -> Result<IntakeConfig> {
    let config = resolve(raw_config, substitute, overrides)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        let summary: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration: {}", summary.join("; "));
    }

    Ok(config)
}
