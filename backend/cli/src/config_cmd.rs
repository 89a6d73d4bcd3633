//! Config loading shared by all commands, plus `config show` / `config init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use picscribe_config::{
    config_dir, config_file_path, load_and_prepare, load_config_value, prepare, redact,
    write_config, PicscribeConfig, API_KEY_ENV,
};

use crate::terminal_output::{note_info, note_success};

pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Effective config with `${VAR}` references resolved.
pub async fn load(path: &Path) -> Result<PicscribeConfig> {
    load_and_prepare(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Config written by `config init`: defaults, with the key read from the environment.
pub fn initial_config() -> PicscribeConfig {
    let mut config = PicscribeConfig::default();
    config.vision.api_key = Some(format!("${{{API_KEY_ENV}}}"));
    config
}

pub async fn show(path: &Path) -> Result<()> {
    // Placeholders are kept so the output shows where secrets come from.
    let value = load_config_value(path).await?;
    let config = prepare(value)?;
    let display = redact(&serde_json::to_value(&config)?);

    note_info(&format!("Config file: {}", path.display()));
    print!("{}", serde_yaml::to_string(&display)?);
    Ok(())
}

pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    write_config(&initial_config(), path).await?;
    note_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/srv/picscribe.yaml");
        assert_eq!(resolve_path(Some(path.clone())), path);
    }

    #[test]
    fn initial_config_references_env_key() {
        let config = initial_config();
        assert_eq!(config.vision.api_key.as_deref(), Some("${OPENAI_API_KEY}"));
        assert_eq!(config.server.port, PicscribeConfig::default().server.port);
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        init(&path, false).await.unwrap();
        assert!(path.exists());
        assert!(init(&path, false).await.is_err());
        init(&path, true).await.unwrap();
    }

    #[tokio::test]
    async fn written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        init(&path, false).await.unwrap();

        let value = load_config_value(&path).await.unwrap();
        let config = prepare(value).unwrap();
        assert_eq!(config.vision.model, PicscribeConfig::default().vision.model);
        assert_eq!(config.vision.api_key.as_deref(), Some("${OPENAI_API_KEY}"));
    }
}
