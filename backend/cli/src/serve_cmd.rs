//! `picscribe serve`

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use picscribe_config::{resolve_api_key, PicscribeConfig};
use picscribe_gateway::{spawn_session_reaper, start_server, GatewayState};
use picscribe_understanding::{Describer, OpenAiVisionProvider};

use crate::config_cmd;

/// Describer backed by the configured OpenAI-compatible endpoint.
pub fn build_describer(config: &PicscribeConfig) -> Result<Describer> {
    let api_key = resolve_api_key(config)?;
    let provider = OpenAiVisionProvider::new(api_key)
        .with_base_url(config.vision.base_url.clone())
        .with_timeout(Duration::from_secs(config.vision.timeout_secs));

    Ok(Describer::new(Arc::new(provider), config.vision.model.clone())
        .with_max_tokens(config.vision.max_tokens)
        .with_max_concurrent(config.vision.max_concurrent))
}

pub fn bind_addr(config: &PicscribeConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind, config.server.port
            )
        })
}

pub async fn run(config_path: &Path, port: Option<u16>, bind: Option<String>) -> Result<()> {
    let mut config = config_cmd::load(config_path).await?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    logging::init_logger(
        &config.logging.dir,
        &config.logging.level,
        config.logging.json,
    );

    let addr = bind_addr(&config)?;
    let describer = build_describer(&config)?;

    info!(
        addr = %addr,
        model = %config.vision.model,
        base_url = %config.vision.base_url,
        max_concurrent = config.vision.max_concurrent,
        "Starting Picscribe"
    );

    let state = GatewayState::new(describer, config.vision.prompt.clone())
        .with_max_upload_bytes(config.server.max_upload_bytes);
    let reaper = spawn_session_reaper(
        state.sessions.clone(),
        Duration::from_secs(config.sessions.idle_ttl_secs),
        Duration::from_secs(config.sessions.reap_interval_secs),
    );

    let result = start_server(addr, state).await;
    reaper.abort();
    result
}
