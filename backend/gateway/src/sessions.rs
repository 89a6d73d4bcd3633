//! Session lifecycle and table editing endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use picscribe_core::{ImageId, ImageRow, SessionId, SessionView};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct EditRowRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRowsRequest {
    #[serde(default)]
    pub image_ids: Vec<ImageId>,
}

#[derive(Debug, Deserialize)]
pub struct SetPromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct RowsResponse {
    pub rows: Vec<ImageRow>,
}

/// Handler for `POST /api/sessions`
pub async fn create_session(
    State(state): State<GatewayState>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let id = state.sessions.create(state.default_prompt.clone()).await;
    let view = state.sessions.with_session(id, |s| s.view()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Handler for `GET /api/sessions/:session_id`
pub async fn get_session(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let view = state
        .sessions
        .with_session(SessionId::from(session_id), |s| s.view())
        .await?;
    Ok(Json(view))
}

/// Handler for `DELETE /api/sessions/:session_id`
pub async fn end_session(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.sessions.remove(SessionId::from(session_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `PATCH /api/sessions/:session_id/rows/:image_id`
pub async fn edit_row(
    State(state): State<GatewayState>,
    ApiPath((session_id, image_id)): ApiPath<(Uuid, String)>,
    ApiJson(req): ApiJson<EditRowRequest>,
) -> ApiResult<Json<ImageRow>> {
    let image_id = ImageId::new(image_id);
    let row = state
        .sessions
        .with_session_mut(SessionId::from(session_id), |s| {
            s.edit_description(&image_id, req.description).cloned()
        })
        .await?;
    Ok(Json(row))
}

/// Handler for `PUT /api/sessions/:session_id/selection`
pub async fn select_rows(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SelectRowsRequest>,
) -> ApiResult<Json<RowsResponse>> {
    let rows = state
        .sessions
        .with_session_mut(SessionId::from(session_id), |s| {
            s.select_rows(req.image_ids)?;
            Ok(s.selected_rows().into_iter().cloned().collect::<Vec<_>>())
        })
        .await?;
    Ok(Json(RowsResponse { rows }))
}

/// Handler for `GET /api/sessions/:session_id/selected`
pub async fn selected_rows(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<RowsResponse>> {
    let rows = state
        .sessions
        .with_session(SessionId::from(session_id), |s| {
            s.selected_rows().into_iter().cloned().collect::<Vec<_>>()
        })
        .await?;
    Ok(Json(RowsResponse { rows }))
}

/// Handler for `GET /api/sessions/:session_id/edited`
pub async fn edited_rows(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<RowsResponse>> {
    let rows = state
        .sessions
        .with_session(SessionId::from(session_id), |s| {
            s.edited_rows().into_iter().cloned().collect::<Vec<_>>()
        })
        .await?;
    Ok(Json(RowsResponse { rows }))
}

/// Handler for `PUT /api/sessions/:session_id/prompt`
pub async fn set_prompt(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SetPromptRequest>,
) -> ApiResult<Json<SessionView>> {
    let view = state
        .sessions
        .with_session_mut(SessionId::from(session_id), |s| {
            s.set_prompt(req.prompt)?;
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}
