//! CLI command implementations.

pub mod call;
pub mod config;
pub mod endpoints;
pub mod key;

use anyhow::{bail, Context as _, Result};
use apiq_core::{Method, RequestConfig};
use clap::{Args, Subcommand};
use serde_json::Value;

/// Arguments for the endpoints command.
#[derive(Args)]
pub struct EndpointsArgs {
    /// Only show endpoints with an alias.
    #[arg(long)]
    pub aliased: bool,

    /// Only show endpoints using this method.
    #[arg(short, long)]
    pub method: Option<Method>,
}

/// Runtime configuration shared by `key` and `call`.
#[derive(Args, Clone, Default)]
pub struct RequestArgs {
    /// Path parameter, `name=value`. Repeatable.
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Query parameter, `name=value`. Repeatable.
    #[arg(short, long = "query", value_name = "NAME=VALUE")]
    pub queries: Vec<String>,
}

impl RequestArgs {
    /// Build a configuration, or `None` when nothing was given.
    pub fn to_config(&self) -> Result<Option<RequestConfig>> {
        if self.params.is_empty() && self.queries.is_empty() {
            return Ok(None);
        }
        let mut config = RequestConfig::new();
        for pair in &self.params {
            let (name, value) = parse_pair(pair)?;
            config = config.param(name, value);
        }
        for pair in &self.queries {
            let (name, value) = parse_pair(pair)?;
            config = config.query(name, value);
        }
        Ok(Some(config))
    }
}

/// Arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    /// Endpoint alias.
    #[arg(short, long, conflicts_with_all = ["method", "path"])]
    pub alias: Option<String>,

    /// Endpoint method (with --path).
    #[arg(short, long, requires = "path")]
    pub method: Option<Method>,

    /// Endpoint path template.
    #[arg(long)]
    pub path: Option<String>,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the call command.
#[derive(Args)]
pub struct CallArgs {
    /// Alias or synthesized operation name (`getUser` or `createGetUser`).
    pub operation: String,

    #[command(flatten)]
    pub request: RequestArgs,

    /// Request header, `name=value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE")]
    pub headers: Vec<String>,

    /// JSON request body.
    #[arg(short, long)]
    pub body: Option<String>,

    /// Number of pages to load.
    #[arg(long, default_value = "1")]
    pub pages: usize,

    /// Field carrying the page cursor in the request.
    #[arg(long, requires = "next_field")]
    pub page_key: Option<String>,

    /// Field of each response holding the next cursor.
    #[arg(long, requires = "page_key")]
    pub next_field: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// API definition path to reference.
        #[arg(short, long, default_value = "api.toml")]
        definition: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file and the API definition.
    Validate,
}

/// Split `name=value`; the value is read as JSON when it parses, else as a string.
pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = pair.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{}'", pair);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing name in '{}'", pair);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Parse a JSON argument.
pub fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("id=1").unwrap(), ("id".to_string(), json!(1)));
        assert_eq!(
            parse_pair("name=John").unwrap(),
            ("name".to_string(), json!("John"))
        );
        assert_eq!(
            parse_pair("filter=a=b").unwrap(),
            ("filter".to_string(), json!("a=b"))
        );
        assert_eq!(parse_pair("flag=true").unwrap().1, json!(true));
    }

    #[test]
    fn test_parse_pair_rejects_malformed() {
        assert!(parse_pair("id").is_err());
        assert!(parse_pair("=1").is_err());
    }

    #[test]
    fn test_request_args_to_config() {
        let args = RequestArgs::default();
        assert!(args.to_config().unwrap().is_none());

        let args = RequestArgs {
            params: vec!["id=1".to_string()],
            queries: vec!["page=2".to_string()],
        };
        let config = args.to_config().unwrap().unwrap();
        assert_eq!(config, RequestConfig::new().param("id", 1).query("page", 2));
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(parse_json(r#"{"name":"John"}"#).unwrap(), json!({"name": "John"}));
        assert!(parse_json("{name").is_err());
    }
}
