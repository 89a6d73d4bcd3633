//! Browser UI.
//!
//! A single page compiled into the binary; it talks to the JSON API only.

use axum::response::Html;

static INDEX_HTML: &str = include_str!("../ui/index.html");

/// Handler for `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
