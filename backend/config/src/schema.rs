//! Picscribe runtime configuration schema.
//!
//! Every section and field is optional in the YAML file; missing values fall
//! back to the `Default` impls in [`crate::defaults`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for Picscribe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PicscribeConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Vision model endpoint and request settings
    pub vision: VisionConfig,

    /// Session lifetime settings
    pub sessions: SessionsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Upper bound on one multipart upload request body.
    pub max_upload_bytes: usize,
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisionConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Usually `${OPENAI_API_KEY}`. Falls back to that env var when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Default prompt for new sessions.
    pub prompt: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionsConfig {
    pub idle_ttl_secs: u64,
    pub reap_interval_secs: u64,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `picscribe_gateway=debug`
    pub level: String,
    /// Directory for the rolling NDJSON log files
    pub dir: String,
    /// Emit JSON on the console as well
    pub json: bool,
}
