use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CheckOnError;
use crate::fetcher::RetryPolicy;

const CONFIG_DIR_NAME: &str = "checkon";
const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 10;
pub const DEFAULT_USER_ID: u64 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_s: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub user_id: u64,
    pub auth_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let retry_policy = RetryPolicy::default();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_s: DEFAULT_REQUEST_TIMEOUT_S,
            max_retries: retry_policy.max_retries,
            initial_backoff_ms: retry_policy.initial_backoff.as_millis() as u64,
            user_id: DEFAULT_USER_ID,
            auth_token: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, CheckOnError> {
        Ok(dirs::config_dir()
            .ok_or(CheckOnError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the config from the platform config directory, if one was saved.
    pub fn from_local_file() -> Result<Option<Self>, CheckOnError> {
        Self::from_file(&Self::config_path()?)
    }

    pub fn from_file(config_path: &Path) -> Result<Option<Self>, CheckOnError> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| CheckOnError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| CheckOnError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), CheckOnError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), CheckOnError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CheckOnError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| CheckOnError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| CheckOnError::ConfigSerializeError { source: e })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }
}
