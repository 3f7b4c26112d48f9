//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use apiq_cache::QueryClient;
use apiq_core::{ApiDefinition, DefinitionFormat};
use apiq_hooks::ApiHooks;
use apiq_http::FetchClient;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Directory relative paths in the config resolve against.
    pub config_dir: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_dir) = if let Some(path) = config_path {
            let dir = Path::new(path)
                .parent()
                .map(|p| cwd.join(p))
                .unwrap_or_else(|| cwd.clone());
            (CliConfig::load(path)?, dir)
        } else {
            Self::find_config(&cwd).unwrap_or_else(|| (CliConfig::default(), cwd.clone()))
        };

        Ok(Self {
            config,
            output,
            cwd,
            config_dir,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, current));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Path of the API definition file.
    pub fn definition_path(&self) -> PathBuf {
        self.resolve_path(&self.config.api.definition)
    }

    /// Read and parse the API definition.
    pub fn load_definition(&self) -> Result<ApiDefinition> {
        let path = self.definition_path();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read API definition: {}", display))?;
        ApiDefinition::parse(&content, DefinitionFormat::from_path(&display))
            .with_context(|| format!("Invalid API definition: {}", display))
    }

    /// Bind the API definition to an HTTP client and a fresh query cache.
    pub fn hooks(&self) -> Result<ApiHooks> {
        let definition = self.load_definition()?;
        let registry = definition
            .registry()
            .with_context(|| format!("Invalid endpoints in API '{}'", definition.name))?;

        let mut http = FetchClient::new();
        if let Some(base_url) = self
            .config
            .client
            .base_url
            .as_ref()
            .or(definition.base_url.as_ref())
        {
            http = http.with_base_url(base_url.clone());
        }
        for (name, value) in definition.headers.iter().chain(&self.config.client.headers) {
            http = http.with_default_header(name.clone(), value.clone());
        }

        let client = QueryClient::new(self.config.query_client_config());
        Ok(ApiHooks::new(
            definition.name,
            Arc::new(registry),
            Arc::new(http),
            client,
        ))
    }

    /// Resolve a path relative to the config directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.config_dir.join(path)
        }
    }
}
