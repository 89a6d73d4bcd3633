//! Describe endpoint.
//!
//! The session lock is released while inference runs; outcomes are applied
//! afterwards and rows removed in between are skipped.

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use logging::redact_sensitive_data;
use picscribe_core::{DescribeOutcome, DescribeScope, DescribeStatus, SessionId, SessionView};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiPath;
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
pub struct DescribeRequest {
    #[serde(default)]
    pub scope: DescribeScope,
}

#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub outcomes: Vec<DescribeOutcome>,
    pub described: usize,
    pub failed: usize,
    pub session: SessionView,
}

impl DescribeRequest {
    /// An empty body describes every row. Anything else must be a valid request.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("Invalid describe request: {e}")))
    }
}

/// Handler for `POST /api/sessions/:session_id/describe`
pub async fn describe_session(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
    body: Bytes,
) -> ApiResult<Json<DescribeResponse>> {
    let session_id = SessionId::from(session_id);
    let scope = DescribeRequest::from_body(&body)?.scope;

    let (targets, prompt) = state
        .sessions
        .with_session_mut(session_id, |s| {
            Ok((s.describe_targets(scope), s.prompt().to_string()))
        })
        .await?;

    info!(
        session_id = %session_id,
        ?scope,
        images = targets.len(),
        model = state.describer.model(),
        "Describing images"
    );
    let outcomes = state.describer.describe_rows(targets, &prompt).await;

    for outcome in &outcomes {
        if let DescribeStatus::Failed { error } = &outcome.status {
            warn!(
                session_id = %session_id,
                image_id = %outcome.image_id,
                error = %redact_sensitive_data(error),
                "Description not applied"
            );
        }
    }

    let (described, session) = state
        .sessions
        .with_session_mut(session_id, |s| {
            let described = s.apply_descriptions(&outcomes);
            Ok((described, s.view()))
        })
        .await?;
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();

    Ok(Json(DescribeResponse {
        outcomes,
        described,
        failed,
        session,
    }))
}
