//! Client config load/save for `~/.med-qa/config.yaml`.
//! Sections: `api.*` (RAG service endpoint and models) and `chat.*`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query_type::QueryType;

pub const DEFAULT_BASE_URL: &str = "http://10.5.29.170:8000";
pub const DEFAULT_LLM_MODEL: &str = "baichuan2-13b-chat";
pub const DEFAULT_EMBEDDING_MODEL: &str = "corom-chinese-medical";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Env var overriding the config path.
pub const CONFIG_ENV: &str = "MED_QA_CONFIG";

/// API section (base_url, llm_model, embedding_model, timeout_secs).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Chat section (mode preselected when a session starts).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ChatSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<QueryType>,
}

/// Full config file.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub chat: ChatSection,
}

/// Endpoint settings with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagSettings {
    pub base_url: String,
    pub llm_model: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

impl Default for RagSettings {
    fn default() -> Self {
        Config::default().resolved()
    }
}

impl Config {
    pub fn resolved(&self) -> RagSettings {
        RagSettings {
            base_url: self
                .api
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            llm_model: self
                .api
                .llm_model
                .clone()
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            embedding_model: self
                .api
                .embedding_model
                .clone()
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into()),
            timeout: Duration::from_secs(self.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }

    pub fn default_mode(&self) -> QueryType {
        self.chat.default_mode.unwrap_or_default()
    }
}

/// Returns the default config file path: `~/.med-qa/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.yaml"))
}

/// `~/.med-qa`, also used for the TUI log file.
pub fn config_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".med-qa"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Resolve config path from an explicit override, `MED_QA_CONFIG`, or the default.
pub fn resolve_config_path(override_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(p) = override_path {
        return Ok(p.to_path_buf());
    }
    if let Some(val) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(val));
    }
    default_config_path().ok_or(ConfigError::NoConfigPath)
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`load`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let contents = serde_yaml::to_string(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, contents).map_err(io_err)
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unable to determine config path (set --config or MED_QA_CONFIG)")]
    NoConfigPath,
}
