//! Picscribe Gateway HTTP API Server
//!
//! Provides the session REST API, image uploads, the describe endpoint and
//! the embedded browser page.

pub mod attachments;
pub mod control_ui;
pub mod describe;
pub mod error;
pub mod extract;
pub mod health_api;
pub mod reaper;
pub mod server;
pub mod sessions;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiPath};
pub use reaper::spawn_session_reaper;
pub use server::{build_router, start_server, GatewayState};
