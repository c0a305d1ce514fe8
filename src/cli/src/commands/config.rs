//! Configuration management commands.
//!
//! Stores the server URL and bearer token in `<config dir>/kinetic/config.toml`.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the stored configuration
    Show,

    /// Set the API server URL
    SetUrl {
        url: String,
    },

    /// Set the bearer token sent with every request
    SetToken {
        token: String,
    },
}

/// Persistent CLI configuration stored on disk.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,
}

/// `<config dir>/kinetic/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("kinetic").join("config.toml"))
}

/// Missing file means defaults.
pub fn load_from(path: &Path) -> Result<CliConfig> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn save_to(path: &Path, cfg: &CliConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load() -> Result<CliConfig> {
    load_from(&config_path()?)
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}…", visible)
}

pub async fn execute(cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    let path = config_path()?;

    match cmd {
        ConfigCommands::Show => {
            let cfg = load_from(&path)?;
            match format {
                OutputFormat::Table => {
                    output::print_header("Configuration");
                    output::print_detail("File", &path.display().to_string());
                    output::print_detail("API URL", &output::or_dash(cfg.api_url.as_deref()));
                    output::print_detail(
                        "Token",
                        &output::or_dash(cfg.token.as_deref().map(mask)),
                    );
                    Ok(())
                }
                _ => output::print_item(
                    &serde_json::json!({
                        "api_url": cfg.api_url,
                        "token": cfg.token.as_deref().map(mask),
                    }),
                    format,
                ),
            }
        }

        ConfigCommands::SetUrl { url } => {
            let mut cfg = load_from(&path)?;
            cfg.api_url = Some(url.trim_end_matches('/').to_string());
            save_to(&path, &cfg)?;
            output::print_success(&format!("api_url = {}", url));
            Ok(())
        }

        ConfigCommands::SetToken { token } => {
            let mut cfg = load_from(&path)?;
            cfg.token = Some(token);
            save_to(&path, &cfg)?;
            output::print_success("Token saved");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, CliConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinetic").join("config.toml");
        let cfg = CliConfig {
            api_url: Some("http://localhost:4000".into()),
            token: Some("secret-token".into()),
        };

        save_to(&path, &cfg).unwrap();
        assert_eq!(load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn test_mask_hides_token() {
        assert_eq!(mask("secret-token"), "secr…");
    }
}
