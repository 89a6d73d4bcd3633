//! Defaults shared by the runtime crates and the config layer.

/// OpenAI-compatible API root used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Descriptions are meant to be short captions.
pub const DEFAULT_MAX_TOKENS: u32 = 50;

/// Vision requests in flight at once per describe call.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// 20 MiB per upload request.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
