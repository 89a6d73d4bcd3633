//! CLI Status Command
//!
//! Queries a running server's `/api/health` endpoint.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use picscribe_config::PicscribeConfig;

use crate::config_cmd;
use crate::terminal_output::{note_success, note_warn};

/// Base URL a local client should use to reach the configured server.
pub fn local_base_url(config: &PicscribeConfig) -> String {
    let host = match config.server.bind.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!("http://{host}:{}", config.server.port)
}

pub async fn run(config_path: &Path, url: Option<String>) -> Result<()> {
    let base = match url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => local_base_url(&config_cmd::load(config_path).await?),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client.get(format!("{base}/api/health")).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: Value = resp.json().await?;
            note_success(&format!("Picscribe is running at {base}"));
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Ok(resp) => {
            note_warn(&format!("{base}/api/health answered {}", resp.status()));
        }
        Err(_) => {
            note_warn(&format!("Picscribe is not running at {base}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_bind_maps_to_loopback() {
        let mut config = PicscribeConfig::default();
        config.server.port = 8501;
        assert_eq!(local_base_url(&config), "http://127.0.0.1:8501");

        config.server.bind = "192.168.1.20".into();
        assert_eq!(local_base_url(&config), "http://192.168.1.20:8501");
    }
}
