//! Config validation: field checks with user-friendly error messages.

use crate::schema::PicscribeConfig;
use thiserror::Error;

/// Upper bound for session timings: one year.
pub const MAX_SESSION_SECS: u64 = 365 * 24 * 60 * 60;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PicscribeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_vision(config, &mut report);
    validate_sessions(config, &mut report);
    report
}

fn validate_server(config: &PicscribeConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "port must be > 0");
    } else if server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            "server.port",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                server.port
            ),
        );
    }
    if server.bind.trim().is_empty() {
        report.error("server.bind", "bind address cannot be empty");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
}

fn validate_vision(config: &PicscribeConfig, report: &mut ValidationReport) {
    let vision = &config.vision;
    if vision.model.trim().is_empty() {
        report.error("vision.model", "model cannot be empty");
    }
    if !vision.base_url.starts_with("http://") && !vision.base_url.starts_with("https://") {
        report.error(
            "vision.baseUrl",
            format!("'{}' is not an http(s) URL", vision.base_url),
        );
    } else if vision.base_url.starts_with("http://")
        && !vision.base_url.contains("localhost")
        && !vision.base_url.contains("127.0.0.1")
    {
        report.warn("vision.baseUrl", "API key will be sent over plain HTTP");
    }
    if vision.max_tokens == 0 {
        report.error("vision.maxTokens", "maxTokens must be >= 1");
    }
    if vision.max_concurrent == 0 {
        report.error("vision.maxConcurrent", "maxConcurrent must be >= 1");
    }
    if vision.timeout_secs == 0 {
        report.error("vision.timeoutSecs", "timeoutSecs must be >= 1");
    }
}

fn validate_sessions(config: &PicscribeConfig, report: &mut ValidationReport) {
    let sessions = &config.sessions;
    if sessions.idle_ttl_secs == 0 {
        report.error("sessions.idleTtlSecs", "idleTtlSecs must be >= 1");
    } else if sessions.idle_ttl_secs > MAX_SESSION_SECS {
        report.error(
            "sessions.idleTtlSecs",
            format!("idleTtlSecs must be <= {MAX_SESSION_SECS}"),
        );
    }
    if sessions.reap_interval_secs == 0 {
        report.error("sessions.reapIntervalSecs", "reapIntervalSecs must be >= 1");
    } else if sessions.reap_interval_secs > MAX_SESSION_SECS {
        report.error(
            "sessions.reapIntervalSecs",
            format!("reapIntervalSecs must be <= {MAX_SESSION_SECS}"),
        );
    } else if sessions.reap_interval_secs > sessions.idle_ttl_secs {
        report.warn(
            "sessions.reapIntervalSecs",
            "reap interval is longer than the idle TTL; sessions will outlive their TTL",
        );
    }
}
