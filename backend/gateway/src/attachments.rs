//! Image Upload Endpoints
//!
//! Receives multipart uploads into a session and serves stored images back
//! as raw bytes for thumbnails.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use picscribe_core::{
    data_uri_mime, decode_data_uri, ImageId, PicscribeError, SessionId, SessionView, UploadedImage,
};

use crate::error::ApiResult;
use crate::extract::ApiPath;
use crate::server::GatewayState;

/// Multipart field carrying image files.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub added: Vec<ImageId>,
    pub session: SessionView,
}

/// Handler for `POST /api/sessions/:session_id/images`
///
/// Every `files` part becomes one upload with a fresh id. Other fields are
/// ignored.
pub async fn upload_images(
    State(state): State<GatewayState>,
    ApiPath(session_id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let session_id = SessionId::from(session_id);
    let mut multipart = multipart?;
    // Fail fast before reading the body.
    state.sessions.with_session(session_id, |_| ()).await?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let image_id = ImageId::generate();
        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{image_id}.png"));
        let data = field.bytes().await?;
        uploads.push(UploadedImage::new(image_id, name, data));
    }

    let total_bytes: usize = uploads.iter().map(|u| u.size).sum();
    let count = uploads.len();
    let (added, session) = state
        .sessions
        .with_session_mut(session_id, |s| {
            let added = s.add_uploads(uploads)?;
            Ok((added, s.view()))
        })
        .await?;

    info!(session_id = %session_id, count, total_bytes, "Images uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { added, session })))
}

/// Handler for `GET /api/sessions/:session_id/images/:image_id`
pub async fn get_image(
    State(state): State<GatewayState>,
    ApiPath((session_id, image_id)): ApiPath<(Uuid, String)>,
) -> ApiResult<impl IntoResponse> {
    let image_id = ImageId::new(image_id);
    let data_uri = state
        .sessions
        .with_session(SessionId::from(session_id), |s| {
            s.table().get(&image_id).map(|row| row.image.clone())
        })
        .await?
        .ok_or_else(|| PicscribeError::RowNotFound(image_id.clone()))?;

    let bytes = decode_data_uri(&data_uri)?;
    let content_type = data_uri_mime(&data_uri)
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Handler for `DELETE /api/sessions/:session_id/images/:image_id`
pub async fn remove_image(
    State(state): State<GatewayState>,
    ApiPath((session_id, image_id)): ApiPath<(Uuid, String)>,
) -> ApiResult<Json<SessionView>> {
    let image_id = ImageId::new(image_id);
    let view = state
        .sessions
        .with_session_mut(SessionId::from(session_id), |s| {
            s.remove_upload(&image_id)?;
            Ok(s.view())
        })
        .await?;
    info!(session_id = %session_id, image_id = %image_id, "Image removed");
    Ok(Json(view))
}
