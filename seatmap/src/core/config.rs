//! Application configuration
//!
//! Loaded from `<data_dir>/config.json` (defaults when absent), then
//! overridden by environment variables. CLI flags override both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared::geo::TravelMode;
use seatmap_client::routing::DEFAULT_OSRM_URL;

use super::error::AppError;

pub const ENV_API_URL: &str = "SEATMAP_API_URL";
pub const ENV_ROUTING_URL: &str = "SEATMAP_ROUTING_URL";
pub const ENV_DATA_DIR: &str = "SEATMAP_DATA_DIR";

const CONFIG_FILE: &str = "config.json";

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_routing_url() -> String {
    DEFAULT_OSRM_URL.to_string()
}

fn default_routing_profile() -> String {
    "driving".to_string()
}

fn default_timeout() -> u64 {
    15
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Places backend base URL
    #[serde(default = "default_api_url")]
    pub api_base_url: String,
    /// OSRM-compatible routing service
    #[serde(default = "default_routing_url")]
    pub routing_url: String,
    /// OSRM profile; paths are mode-agnostic so one profile serves both modes
    #[serde(default = "default_routing_profile")]
    pub routing_profile: String,
    /// HTTP timeout in seconds (backend and routing)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Travel mode used for ETA labels until the user toggles it
    #[serde(default)]
    pub default_travel_mode: TravelMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_url(),
            routing_url: default_routing_url(),
            routing_profile: default_routing_profile(),
            request_timeout_secs: default_timeout(),
            default_travel_mode: TravelMode::default(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load `<data_dir>/config.json` and apply environment overrides
    pub fn load_from_dir(data_dir: &Path) -> Result<Self, AppError> {
        let mut config = Self::load(&data_dir.join(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(url = %url, "API URL overridden from environment");
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_ROUTING_URL).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(url = %url, "Routing URL overridden from environment");
            self.routing_url = url;
        }
    }
}

/// Resolve the data directory: explicit flag, then environment, then `./.seatmap`
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(ENV_DATA_DIR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".seatmap"))
}
