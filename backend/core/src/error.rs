use thiserror::Error;

use crate::types::{ImageId, SessionId};

/// Top-level error type for the Picscribe runtime.
#[derive(Debug, Error)]
pub enum PicscribeError {
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("duplicate image id in upload set: {0}")]
    DuplicateImageId(ImageId),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("row not found: {0}")]
    RowNotFound(ImageId),

    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("vision provider error ({provider}): {message}")]
    Vision { provider: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PicscribeError {
    pub fn vision(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vision {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = PicscribeError> = std::result::Result<T, E>;
