// vocalize configuration management

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use speech_client::config::{DEFAULT_PATH, DEFAULT_TIMEOUT_SECS};
use speech_client::{ClientConfig, Voice};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const ENDPOINT_ENV: &str = "VOCALIZE_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocalizeConfig {
    /// API gateway root URL (e.g. https://abc123.execute-api.us-east-2.amazonaws.com/dev)
    #[serde(default)]
    pub endpoint: String,

    /// Resource path of the speech endpoint
    #[serde(default = "default_path")]
    pub path: String,

    /// Default voice
    #[serde(default)]
    pub voice: Voice,

    /// Environment variable holding an API key, sent as x-api-key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Player command (None auto-detects afplay, ffplay or mpv)
    #[serde(default)]
    pub player: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for VocalizeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            path: default_path(),
            voice: Voice::default(),
            api_key_env: None,
            player: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl VocalizeConfig {
    /// Get the config directory path.
    ///
    /// Can be overridden via the `VOCALIZE_CONFIG_DIR` environment variable.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(override_dir) = std::env::var("VOCALIZE_CONFIG_DIR") {
            return Ok(PathBuf::from(override_dir));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cli-programs"))
    }

    /// Get the config file path: ~/.config/cli-programs/vocalize.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("vocalize.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: VocalizeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Client settings, with `VOCALIZE_ENDPOINT` taking precedence over the file
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.build_client_config(std::env::var(ENDPOINT_ENV).ok(), |name| {
            std::env::var(name).ok()
        })
    }

    fn build_client_config(
        &self,
        endpoint_override: Option<String>,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig> {
        let endpoint = endpoint_override
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| self.endpoint.clone());

        if endpoint.trim().is_empty() {
            bail!(
                "API endpoint is not configured\nRun 'vocalize config set-endpoint <url>' or set {}",
                ENDPOINT_ENV
            );
        }

        let api_key = match self.api_key_env.as_deref().filter(|v| !v.is_empty()) {
            Some(var) => Some(
                lookup_env(var)
                    .with_context(|| format!("API key environment variable {} is not set", var))?,
            ),
            None => None,
        };

        let mut config = ClientConfig::new(&endpoint);
        config.path = self.path.clone();
        config.api_key = api_key;
        config.timeout = Duration::from_secs(self.timeout_secs.max(1));
        Ok(config)
    }
}
