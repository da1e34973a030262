use super::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Optional TOML settings. Credentials are never read from here.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub index: Option<String>,
    pub batch_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub semantic_search: Option<bool>,

    pub agents: Option<AgentsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct AgentsConfig {
    pub triage_agent_id: Option<String>,
    pub analytics_agent_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
