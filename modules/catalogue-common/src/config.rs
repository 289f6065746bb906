use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

/// Per-connector configuration, loaded from env or a source config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub default_params: HashMap<String, String>,
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Top-level pipeline configuration. Loaded once at process start via
/// [`Config::from_env`]; individual binaries (the extraction runner, the
/// quarantine retry CLI, the finalizer) all share this one struct rather
/// than maintaining their own ad-hoc env readers.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub raw_data_root: String,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub connectors: HashMap<String, ConnectorConfig>,
    pub trust_levels: HashMap<String, i32>,
    pub unknown_source_trust: i32,
    pub default_max_retries: u32,
}

impl Config {
    /// Load configuration for the extraction runner / quarantine retry /
    /// finalizer binaries. Panics with a clear message if a required
    /// variable is absent, rather than deferring to a runtime `Option`
    /// check.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            raw_data_root: env::var("CATALOGUE_RAW_DATA_ROOT")
                .unwrap_or_else(|_| "data/raw".to_string()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            connectors: HashMap::new(),
            trust_levels: default_trust_levels(),
            unknown_source_trust: env::var("CATALOGUE_UNKNOWN_SOURCE_TRUST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            default_max_retries: env::var("CATALOGUE_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Log which config values are present without ever logging secret
    /// values themselves — only presence and length.
    pub fn log_redacted(&self) {
        tracing::info!(
            database_url_set = true,
            anthropic_api_key_set = self.anthropic_api_key.is_some(),
            anthropic_api_key_len = self.anthropic_api_key.as_ref().map(|v| v.len()),
            openai_api_key_set = self.openai_api_key.is_some(),
            openai_api_key_len = self.openai_api_key.as_ref().map(|v| v.len()),
            connectors = self.connectors.len(),
            "catalogue config loaded"
        );
    }
}

fn default_trust_levels() -> HashMap<String, i32> {
    let mut levels = HashMap::new();
    levels.insert("manual_override".to_string(), 100);
    levels.insert("edinburgh_council".to_string(), 90);
    levels.insert("sport_scotland".to_string(), 85);
    levels.insert("google_places".to_string(), 70);
    levels.insert("overture_maps".to_string(), 65);
    levels.insert("open_charge_map".to_string(), 60);
    levels.insert("serper".to_string(), 50);
    levels.insert("openstreetmap".to_string(), 40);
    levels
}

/// Read a required environment variable, panicking with the variable name
/// if it is missing.
pub fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("missing required environment variable: {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trust_levels_include_unknown_fallback_separately() {
        let levels = default_trust_levels();
        assert!(!levels.contains_key("unknown_source"));
        assert_eq!(levels.get("google_places"), Some(&70));
    }
}
