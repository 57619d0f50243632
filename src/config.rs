//! TOML configuration parsing and validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit key override; normally the key comes from the environment
    /// (`GEMINI_API_KEY`, falling back to `API_KEY`).
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_model() -> String {
    // Fast, large context window: a good fit for stuff-everything-in-context.
    "gemini-2.5-flash".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.gateway.model.trim().is_empty() {
        anyhow::bail!("gateway.model must not be empty");
    }
    if config.gateway.timeout_secs == 0 {
        anyhow::bail!("gateway.timeout_secs must be > 0");
    }
    if config.gateway.base_url.trim().is_empty() {
        anyhow::bail!("gateway.base_url must not be empty");
    }

    Ok(config)
}
