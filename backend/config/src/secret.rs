//! Resolution of the vision API key.

use std::collections::HashMap;

use crate::schema::PicscribeConfig;

/// Environment variable consulted when the config carries no key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, thiserror::Error)]
#[error("No API key configured: set vision.apiKey in the config file or the {var_name} environment variable")]
pub struct MissingSecretError {
    pub var_name: String,
}

/// The key from `vision.apiKey`, else from `OPENAI_API_KEY`.
pub fn resolve_api_key(config: &PicscribeConfig) -> Result<String, MissingSecretError> {
    resolve_api_key_with(config, &std::env::vars().collect())
}

pub fn resolve_api_key_with(
    config: &PicscribeConfig,
    env: &HashMap<String, String>,
) -> Result<String, MissingSecretError> {
    config
        .vision
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| env.get(API_KEY_ENV).map(|k| k.trim()).filter(|k| !k.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| MissingSecretError {
            var_name: API_KEY_ENV.to_string(),
        })
}
