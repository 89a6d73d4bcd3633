//! Structured logging for Picscribe.
//!
//! Console output plus daily-rotated NDJSON files, with redaction of API keys
//! and inline image payloads.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
