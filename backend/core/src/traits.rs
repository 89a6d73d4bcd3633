use async_trait::async_trait;

use crate::error::Result;

/// Trait for vision-capable model backends that turn an image into text.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send one image plus prompt and return the generated text.
    async fn describe(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision provider: one prompt, one inline image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub prompt: String,
    /// `data:` URI of the image.
    pub image_url: String,
    pub max_tokens: u32,
}

/// Response from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
