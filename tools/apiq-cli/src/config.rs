//! CLI configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use apiq_cache::{QueryClientConfig, RetryPolicy};
use apiq_observability::LogConfig;
use serde::{Deserialize, Serialize};

/// File names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["apiq.toml", ".apiq.toml", "apiq.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Which API definition to load.
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP client overrides.
    #[serde(default)]
    pub client: ClientConfig,

    /// Query cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Cache defaults for every query the CLI builds.
    pub fn query_client_config(&self) -> QueryClientConfig {
        QueryClientConfig::new()
            .with_stale_time(Duration::from_secs(self.cache.stale_seconds))
            .with_retry(RetryPolicy::new(self.cache.retries))
    }
}

/// API definition location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Path to the TOML or JSON definition, relative to the config file.
    #[serde(default = "default_definition")]
    pub definition: String,
}

fn default_definition() -> String {
    "api.toml".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            definition: default_definition(),
        }
    }
}

/// HTTP client overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Replaces the definition's `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sent with every request, on top of the definition's headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Query cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds fetched data stays fresh.
    #[serde(default)]
    pub stale_seconds: u64,

    /// Retries after a failed fetch.
    #[serde(default)]
    pub retries: u32,
}

/// Generate a default apiq.toml config file.
pub fn generate_default_config(definition: &str) -> String {
    format!(
        r#"# apiq configuration

[api]
definition = "{definition}"

[client]
# base_url = "http://localhost:8080"

[client.headers]
# Authorization = "Bearer ..."

[cache]
stale_seconds = 0
retries = 0

[logging]
level = "warn"
format = "human"
"#,
        definition = definition
    )
}
