//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use picscribe_core::defaults::DEFAULT_MAX_UPLOAD_BYTES;
use picscribe_core::SessionStore;
use picscribe_understanding::Describer;

use crate::{attachments, control_ui, describe, health_api, sessions};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: SessionStore,
    pub describer: Arc<Describer>,
    /// Prompt new sessions start with.
    pub default_prompt: String,
    pub max_upload_bytes: usize,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(describer: Describer, default_prompt: impl Into<String>) -> Self {
        Self {
            sessions: SessionStore::new(),
            describer: Arc::new(describer),
            default_prompt: default_prompt.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            started_at: Utc::now(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: GatewayState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(control_ui::index))
        .route("/api/health", get(health_api::get_health))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:session_id",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route(
            "/api/sessions/:session_id/images",
            post(attachments::upload_images).layer(upload_limit),
        )
        .route(
            "/api/sessions/:session_id/images/:image_id",
            get(attachments::get_image).delete(attachments::remove_image),
        )
        .route(
            "/api/sessions/:session_id/selected",
            get(sessions::selected_rows),
        )
        .route(
            "/api/sessions/:session_id/edited",
            get(sessions::edited_rows),
        )
        .route(
            "/api/sessions/:session_id/rows/:image_id",
            patch(sessions::edit_row),
        )
        .route(
            "/api/sessions/:session_id/selection",
            put(sessions::select_rows),
        )
        .route("/api/sessions/:session_id/prompt", put(sessions::set_prompt))
        .route(
            "/api/sessions/:session_id/describe",
            post(describe::describe_session),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Starts the HTTP server and serves until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use picscribe_core::encode_bytes;
    use picscribe_understanding::MockVisionProvider;
    use reqwest::multipart::{Form, Part};
    use serde_json::{json, Value};

    struct TestServer {
        base: String,
        client: reqwest::Client,
    }

    impl TestServer {
        async fn start(provider: MockVisionProvider) -> Self {
            Self::start_with(GatewayState::new(
                Describer::new(Arc::new(provider), "mock-model"),
                "Describe this image.",
            ))
            .await
        }

        async fn start_with(state: GatewayState) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let app = build_router(state);
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            Self {
                base: format!("http://{addr}"),
                client: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn create_session(&self) -> String {
            let res = self.client.post(self.url("/api/sessions")).send().await.unwrap();
            assert_eq!(res.status(), 201);
            let body: Value = res.json().await.unwrap();
            body["session_id"].as_str().unwrap().to_string()
        }

        async fn upload(&self, session: &str, files: &[(&str, &[u8])]) -> reqwest::Response {
            let mut form = Form::new();
            for (name, data) in files {
                form = form.part("files", Part::bytes(data.to_vec()).file_name(name.to_string()));
            }
            self.client
                .post(self.url(&format!("/api/sessions/{session}/images")))
                .multipart(form)
                .send()
                .await
                .unwrap()
        }
    }

    fn row_ids(view: &Value) -> Vec<String> {
        view["table"]["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["image_id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn serves_ui_and_health() {
        let server = TestServer::start(MockVisionProvider::new("mock")).await;

        let page = server.client.get(server.url("/")).send().await.unwrap();
        assert_eq!(page.status(), 200);
        assert!(page.text().await.unwrap().contains("AI Image Description Generator"));

        server.create_session().await;
        let health: Value = server
            .client
            .get(server.url("/api/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["service"], "picscribe");
        assert_eq!(health["sessions"], 1);
        assert_eq!(health["model"], "mock-model");
        assert_eq!(health["provider"], "mock");
    }

    #[tokio::test]
    async fn new_session_has_empty_table_with_columns() {
        let server = TestServer::start(MockVisionProvider::new("mock")).await;
        let res = server.client.post(server.url("/api/sessions")).send().await.unwrap();
        let view: Value = res.json().await.unwrap();

        assert_eq!(view["prompt"], "Describe this image.");
        assert_eq!(
            view["table"]["columns"],
            json!(["image_id", "image", "name", "description"])
        );
        assert_eq!(view["table"]["rows"], json!([]));
    }

    #[tokio::test]
    async fn upload_describe_and_edit_flow() {
        let provider = MockVisionProvider::new("mock").with_response("a cat");
        let server = TestServer::start(provider).await;
        let session = server.create_session().await;

        let res = server
            .upload(&session, &[("a.png", b"first"), ("b.png", b"second")])
            .await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["added"].as_array().unwrap().len(), 2);
        let rows = body["session"]["table"]["rows"].as_array().unwrap().clone();
        assert_eq!(rows[0]["name"], "a.png");
        assert_eq!(rows[0]["description"], "");
        assert!(rows[0]["image"].as_str().unwrap().starts_with("data:image/png;base64,"));

        let described: Value = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(described["described"], 2);
        assert_eq!(described["failed"], 0);
        for row in described["session"]["table"]["rows"].as_array().unwrap() {
            assert_eq!(row["description"], "a cat");
        }

        let first = rows[0]["image_id"].as_str().unwrap();
        let edited = server
            .client
            .patch(server.url(&format!("/api/sessions/{session}/rows/{first}")))
            .json(&json!({ "description": "a tabby cat" }))
            .send()
            .await
            .unwrap();
        assert_eq!(edited.status(), 200);

        let edited_rows: Value = server
            .client
            .get(server.url(&format!("/api/sessions/{session}/edited")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(edited_rows["rows"].as_array().unwrap().len(), 1);
        assert_eq!(edited_rows["rows"][0]["description"], "a tabby cat");
    }

    #[tokio::test]
    async fn removing_an_image_keeps_other_descriptions() {
        let provider = MockVisionProvider::new("mock").with_response("a cat");
        let server = TestServer::start(provider).await;
        let session = server.create_session().await;
        let body: Value = server
            .upload(&session, &[("101.png", b"one"), ("102.png", b"two")])
            .await
            .json()
            .await
            .unwrap();
        let ids: Vec<String> = body["added"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();

        server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .send()
            .await
            .unwrap();

        let view: Value = server
            .client
            .delete(server.url(&format!("/api/sessions/{session}/images/{}", ids[1])))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(row_ids(&view), vec![ids[0].clone()]);
        assert_eq!(view["table"]["rows"][0]["description"], "a cat");

        let thumb = server
            .client
            .get(server.url(&format!("/api/sessions/{session}/images/{}", ids[0])))
            .send()
            .await
            .unwrap();
        assert_eq!(thumb.status(), 200);
        assert_eq!(thumb.headers()["content-type"], "image/png");
        assert_eq!(&thumb.bytes().await.unwrap()[..], b"one");

        let gone = server
            .client
            .get(server.url(&format!("/api/sessions/{session}/images/{}", ids[1])))
            .send()
            .await
            .unwrap();
        assert_eq!(gone.status(), 404);
    }

    #[tokio::test]
    async fn describe_selected_scope_and_failure_isolation() {
        let ok = encode_bytes(b"good");
        let bad = encode_bytes(b"bad");
        let provider = MockVisionProvider::new("mock")
            .with_response("described")
            .failing_on(bad.clone());
        let server = TestServer::start(provider).await;
        let session = server.create_session().await;
        let body: Value = server
            .upload(&session, &[("good.png", b"good"), ("bad.png", b"bad")])
            .await
            .json()
            .await
            .unwrap();
        let rows = body["session"]["table"]["rows"].as_array().unwrap().clone();
        assert_eq!(rows[0]["image"], ok);
        let good_id = rows[0]["image_id"].as_str().unwrap().to_string();
        let bad_id = rows[1]["image_id"].as_str().unwrap().to_string();

        let selected: Value = server
            .client
            .put(server.url(&format!("/api/sessions/{session}/selection")))
            .json(&json!({ "image_ids": [good_id] }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(selected["rows"].as_array().unwrap().len(), 1);

        let only_selected: Value = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .json(&json!({ "scope": "selected" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(only_selected["outcomes"].as_array().unwrap().len(), 1);
        assert_eq!(only_selected["described"], 1);

        let all: Value = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .json(&json!({ "scope": "empty" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all["outcomes"].as_array().unwrap().len(), 1);
        assert_eq!(all["outcomes"][0]["image_id"], bad_id.as_str());
        assert_eq!(all["outcomes"][0]["status"], "failed");
        assert_eq!(all["failed"], 1);

        let table = &all["session"]["table"]["rows"];
        assert_eq!(table[0]["description"], "described");
        assert_eq!(table[1]["description"], "");
    }

    #[tokio::test]
    async fn error_responses() {
        let server = TestServer::start(MockVisionProvider::new("mock")).await;
        let session = server.create_session().await;

        let missing = server
            .client
            .get(server.url(&format!("/api/sessions/{}", uuid::Uuid::new_v4())))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
        let body: Value = missing.json().await.unwrap();
        assert_eq!(body["error"], "session_not_found");

        let unknown_row = server
            .client
            .patch(server.url(&format!("/api/sessions/{session}/rows/nope")))
            .json(&json!({ "description": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown_row.status(), 404);

        let empty_prompt = server
            .client
            .put(server.url(&format!("/api/sessions/{session}/prompt")))
            .json(&json!({ "prompt": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(empty_prompt.status(), 400);
        let body: Value = empty_prompt.json().await.unwrap();
        assert_eq!(body["error"], "invalid_prompt");

        let ended = server
            .client
            .delete(server.url(&format!("/api/sessions/{session}")))
            .send()
            .await
            .unwrap();
        assert_eq!(ended.status(), 204);
        let after = server
            .client
            .get(server.url(&format!("/api/sessions/{session}")))
            .send()
            .await
            .unwrap();
        assert_eq!(after.status(), 404);
    }

    #[tokio::test]
    async fn mistyped_scope_leaves_edits_alone() {
        let provider = Arc::new(MockVisionProvider::new("mock").with_response("model text"));
        let server = TestServer::start_with(GatewayState::new(
            Describer::new(provider.clone(), "mock-model"),
            "Describe this image.",
        ))
        .await;
        let session = server.create_session().await;
        let body: Value = server
            .upload(&session, &[("a.png", b"one"), ("b.png", b"two")])
            .await
            .json()
            .await
            .unwrap();
        let first = body["added"][0].as_str().unwrap().to_string();
        server
            .client
            .patch(server.url(&format!("/api/sessions/{session}/rows/{first}")))
            .json(&json!({ "description": "my careful edit" }))
            .send()
            .await
            .unwrap();

        let res = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .json(&json!({ "scope": "selcted" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid_request");
        assert_eq!(provider.calls(), 0);

        let view: Value = server
            .client
            .get(server.url(&format!("/api/sessions/{session}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["table"]["rows"][0]["description"], "my careful edit");
        assert_eq!(view["table"]["rows"][1]["description"], "");
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let server = TestServer::start(MockVisionProvider::new("mock")).await;
        let session = server.create_session().await;
        let body: Value = server
            .upload(&session, &[("a.png", b"one")])
            .await
            .json()
            .await
            .unwrap();
        let first = body["added"][0].as_str().unwrap().to_string();

        let wrong_field = server
            .client
            .patch(server.url(&format!("/api/sessions/{session}/rows/{first}")))
            .json(&json!({ "desc": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong_field.status(), 400);
        let err: Value = wrong_field.json().await.unwrap();
        assert_eq!(err["error"], "invalid_request");
        assert!(err["message"].as_str().unwrap().contains("description"));

        let not_json = server
            .client
            .put(server.url(&format!("/api/sessions/{session}/prompt")))
            .body("prompt=hi")
            .send()
            .await
            .unwrap();
        assert_eq!(not_json.status(), 400);
        let err: Value = not_json.json().await.unwrap();
        assert_eq!(err["error"], "invalid_request");

        let bad_id = server
            .client
            .get(server.url("/api/sessions/not-a-uuid"))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_id.status(), 400);
        let err: Value = bad_id.json().await.unwrap();
        assert_eq!(err["error"], "invalid_path");

        let not_multipart = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/images")))
            .body("raw bytes")
            .send()
            .await
            .unwrap();
        assert_eq!(not_multipart.status(), 400);
        let err: Value = not_multipart.json().await.unwrap();
        assert_eq!(err["error"], "invalid_upload");
    }

    #[tokio::test]
    async fn rejects_oversized_uploads() {
        let state = GatewayState::new(
            Describer::new(Arc::new(MockVisionProvider::new("mock")), "mock-model"),
            "Describe this image.",
        )
        .with_max_upload_bytes(1024);
        let server = TestServer::start_with(state).await;
        let session = server.create_session().await;

        let big = vec![7u8; 4096];
        let res = server.upload(&session, &[("big.png", big.as_slice())]).await;
        assert_eq!(res.status(), 413);

        let view: Value = server
            .client
            .get(server.url(&format!("/api/sessions/{session}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["table"]["rows"], json!([]));
    }

    #[tokio::test]
    async fn prompt_update_is_sent_with_describe() {
        let provider = Arc::new(MockVisionProvider::new("mock"));
        let server = TestServer::start_with(GatewayState::new(
            Describer::new(provider.clone(), "mock-model"),
            "Describe this image.",
        ))
        .await;
        let session = server.create_session().await;
        server.upload(&session, &[("dog.png", b"woof")]).await;

        let view: Value = server
            .client
            .put(server.url(&format!("/api/sessions/{session}/prompt")))
            .json(&json!({ "prompt": "Name the animal." }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["prompt"], "Name the animal.");

        let res = server
            .client
            .post(server.url(&format!("/api/sessions/{session}/describe")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.last_prompt().as_deref(), Some("Name the animal."));
    }
}
