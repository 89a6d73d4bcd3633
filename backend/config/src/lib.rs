//! `picscribe-config`: Picscribe runtime configuration management.
//!
//! Provides:
//! - Typed config schema (server, vision model, sessions, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Default values and normalization
//! - Validation with field paths
//! - Redaction for safe display
//! - API key resolution

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod secret;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config_value, write_config};
pub use redact::redact;
pub use schema::{LoggingConfig, PicscribeConfig, ServerConfig, SessionsConfig, VisionConfig};
pub use secret::{resolve_api_key, MissingSecretError, API_KEY_ENV};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, apply env substitution, apply defaults to, and validate a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<PicscribeConfig> {
    let value = load_config_value(path).await?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    prepare(value)
}

/// Typed, defaulted and validated config from an already substituted value.
pub fn prepare(value: serde_json::Value) -> Result<PicscribeConfig> {
    let config: PicscribeConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", messages.join("\n  "));
    }

    Ok(config)
}
