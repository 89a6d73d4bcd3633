//! Config defaults and normalization of user-supplied values.

pub use picscribe_core::defaults::{
    DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_TOKENS, DEFAULT_MAX_UPLOAD_BYTES,
};

use crate::schema::{LoggingConfig, PicscribeConfig, ServerConfig, SessionsConfig, VisionConfig};

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8501;

pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const DEFAULT_PROMPT: &str = "Describe this image in one short sentence.";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_IDLE_TTL_SECS: u64 = 3600;

pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
            prompt: DEFAULT_PROMPT.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: DEFAULT_IDLE_TTL_SECS,
            reap_interval_secs: DEFAULT_REAP_INTERVAL_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: DEFAULT_LOG_DIR.to_string(),
            json: false,
        }
    }
}

/// Apply all normalizations to a freshly loaded config.
pub fn apply_all_defaults(config: PicscribeConfig) -> PicscribeConfig {
    let config = apply_vision_defaults(config);
    apply_logging_defaults(config)
}

/// Blank strings mean "use the default"; an empty key means "not configured".
fn apply_vision_defaults(mut config: PicscribeConfig) -> PicscribeConfig {
    let vision = &mut config.vision;
    if vision.base_url.trim().is_empty() {
        vision.base_url = DEFAULT_BASE_URL.to_string();
    }
    vision.base_url = vision.base_url.trim_end_matches('/').to_string();
    if vision.prompt.trim().is_empty() {
        vision.prompt = DEFAULT_PROMPT.to_string();
    }
    if vision.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
        vision.api_key = None;
    }
    config
}

fn apply_logging_defaults(mut config: PicscribeConfig) -> PicscribeConfig {
    if config.logging.level.trim().is_empty() {
        config.logging.level = DEFAULT_LOG_LEVEL.to_string();
    }
    if config.logging.dir.trim().is_empty() {
        config.logging.dir = DEFAULT_LOG_DIR.to_string();
    }
    config
}
