//! Gateway Health API
//!
//! Exposes a public endpoint reporting process liveness and the configured
//! vision backend.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub service: &'static str,
    pub version: &'static str,
    pub sessions: usize,
    pub model: String,
    pub provider: String,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let now = Utc::now();
    Json(HealthReport {
        status: "ok".into(),
        service: "picscribe",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.len().await,
        model: state.describer.model().to_string(),
        provider: state.describer.provider_name().to_string(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now,
    })
}
