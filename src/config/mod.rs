mod file_config;

pub use file_config::{AgentsConfig, FileConfig};

use crate::agent::AgentSettings;
use crate::elastic::{decode_cloud_id, CloudIdError};
use crate::ingest::{LoaderSettings, DEFAULT_BATCH_SIZE};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INDEX: &str = "oilfield-incidents";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Either ELASTIC_CLOUD_ID or ELASTICSEARCH_URL must be set")]
    MissingEndpoint,

    #[error("KIBANA_URL must be set when ELASTIC_CLOUD_ID does not carry a Kibana host")]
    MissingAgentHost,

    #[error("Invalid ELASTIC_CLOUD_ID: {0}")]
    CloudId(#[from] CloudIdError),

    #[error("Config file {path:?}: {message}")]
    File { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Settings read from the process environment (and `.env`).
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub cloud_id: Option<String>,
    pub elasticsearch_url: Option<String>,
    pub api_key: Option<String>,
    pub index: Option<String>,
    pub kibana_url: Option<String>,
    pub agent_api_key: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            cloud_id: get("ELASTIC_CLOUD_ID"),
            elasticsearch_url: get("ELASTICSEARCH_URL"),
            api_key: get("ELASTICSEARCH_API_KEY"),
            index: get("INCIDENT_INDEX"),
            kibana_url: get("KIBANA_URL"),
            agent_api_key: get("ELASTIC_AGENT_API_KEY"),
        }
    }
}

/// Settings that need no credentials: index, batching, timeouts and agent
/// ids. Shared by every binary, including those that never connect.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub index: String,
    pub batch_size: usize,
    pub request_timeout: Duration,
    pub agent_timeout: Duration,
    pub semantic_search: bool,
    pub triage_agent_id: String,
    pub analytics_agent_id: String,
}

impl LocalConfig {
    /// TOML values override environment values, which override defaults.
    pub fn resolve(env: &EnvConfig, file_config: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file_config.unwrap_or_default();

        let index = file
            .index
            .or_else(|| env.index.clone())
            .unwrap_or_else(|| DEFAULT_INDEX.to_string());
        if index.is_empty()
            || index != index.to_lowercase()
            || index.starts_with(['-', '_', '+'])
            || index.contains([' ', ',', '/', '\\', '*', '?', '"', '<', '>', '|', '#', ':'])
        {
            return Err(ConfigError::Invalid {
                field: "index",
                message: format!("\"{}\" is not a valid index name", index),
            });
        }

        let batch_size = file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                message: "must be at least 1".to_string(),
            });
        }

        let agents = file.agents.unwrap_or_default();
        let defaults = AgentSettings::default();

        Ok(Self {
            index,
            batch_size,
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            agent_timeout: Duration::from_secs(
                agents.timeout_secs.unwrap_or(DEFAULT_AGENT_TIMEOUT_SECS),
            ),
            semantic_search: file.semantic_search.unwrap_or(true),
            triage_agent_id: agents.triage_agent_id.unwrap_or(defaults.triage_agent_id),
            analytics_agent_id: agents
                .analytics_agent_id
                .unwrap_or(defaults.analytics_agent_id),
        })
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            batch_size: self.batch_size,
            semantic_search: self.semantic_search,
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            index: self.index.clone(),
            triage_agent_id: self.triage_agent_id.clone(),
            analytics_agent_id: self.analytics_agent_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub elasticsearch_url: String,
    pub api_key: String,
    /// Agent host URL, if known.
    pub kibana_url: Option<String>,
    pub agent_api_key: String,
    pub local: LocalConfig,
}

impl AppConfig {
    /// Resolve configuration from the environment and an optional TOML file.
    /// Credentials and endpoints only come from the environment; everything
    /// else resolves as in [`LocalConfig::resolve`].
    pub fn resolve(env: &EnvConfig, file_config: Option<FileConfig>) -> Result<Self, ConfigError> {
        // An explicit URL wins over the one derived from the cloud id.
        let cloud = env.cloud_id.as_deref().map(decode_cloud_id).transpose()?;
        let elasticsearch_url = env
            .elasticsearch_url
            .clone()
            .or_else(|| cloud.as_ref().map(|c| c.elasticsearch_url.clone()))
            .ok_or(ConfigError::MissingEndpoint)?;
        let kibana_url = env
            .kibana_url
            .clone()
            .or_else(|| cloud.as_ref().and_then(|c| c.kibana_url.clone()));

        let api_key = env
            .api_key
            .clone()
            .ok_or(ConfigError::MissingVar("ELASTICSEARCH_API_KEY"))?;
        let agent_api_key = env.agent_api_key.clone().unwrap_or_else(|| api_key.clone());

        Ok(Self {
            elasticsearch_url,
            api_key,
            kibana_url,
            agent_api_key,
            local: LocalConfig::resolve(env, file_config)?,
        })
    }

    /// Agent host URL, required by the console and agent provisioning.
    pub fn agent_url(&self) -> Result<&str, ConfigError> {
        self.kibana_url
            .as_deref()
            .ok_or(ConfigError::MissingAgentHost)
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        self.local.loader_settings()
    }

    pub fn agent_settings(&self) -> AgentSettings {
        self.local.agent_settings()
    }
}
