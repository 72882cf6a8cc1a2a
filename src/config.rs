use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FieldkitConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub bot: BotConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BotConfig {
    /// Identity of this bot installation; consulted by settings migrations.
    pub installation_id: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub www_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_fieldkit_dir()
            .join("settings.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.inaturalist.org".into(),
            www_base_url: "https://www.inaturalist.org".into(),
            timeout_secs: 10,
        }
    }
}

/// Returns `~/.fieldkit/`, or `./.fieldkit/` when there is no home directory.
pub fn default_fieldkit_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fieldkit")
}

/// Returns the default config file path: `~/.fieldkit/config.toml`
pub fn default_config_path() -> PathBuf {
    default_fieldkit_dir().join("config.toml")
}

impl FieldkitConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            FieldkitConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides (FIELDKIT_DB, FIELDKIT_LOG_LEVEL,
    /// FIELDKIT_INSTALLATION_ID, FIELDKIT_API_URL).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("FIELDKIT_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("FIELDKIT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("FIELDKIT_INSTALLATION_ID") {
            let id = val
                .parse()
                .with_context(|| format!("FIELDKIT_INSTALLATION_ID is not an id: {val}"))?;
            self.bot.installation_id = Some(id);
        }
        if let Ok(val) = std::env::var("FIELDKIT_API_URL") {
            self.api.base_url = val;
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
