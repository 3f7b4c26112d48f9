//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use apiq_hooks::AliasTable;

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { definition, force } => init_config(&definition, force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");

    ctx.output.info("[api]");
    ctx.output.kv("definition", &ctx.definition_path().display().to_string());

    ctx.output.info("[client]");
    ctx.output.kv(
        "base_url",
        ctx.config.client.base_url.as_deref().unwrap_or("(from definition)"),
    );
    for (name, value) in &ctx.config.client.headers {
        ctx.output.kv(&format!("header {}", name), value);
    }

    ctx.output.info("[cache]");
    ctx.output.kv("stale_seconds", &ctx.config.cache.stale_seconds.to_string());
    ctx.output.kv("retries", &ctx.config.cache.retries.to_string());

    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level.to_string());
    ctx.output.kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());

    Ok(())
}

async fn init_config(definition: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("apiq.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config(definition))?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    if !ctx.cwd.join(definition).exists() {
        ctx.output.warn(&format!("API definition {} does not exist yet", definition));
    }

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(ref url) = ctx.config.client.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(format!("client.base_url '{}' must be an http(s) URL", url));
        }
    }

    match ctx.load_definition() {
        Err(e) => errors.push(format!("{:#}", e)),
        Ok(definition) => match definition.registry() {
            Err(e) => errors.push(e.to_string()),
            Ok(registry) => {
                if definition.base_url.is_none() && ctx.config.client.base_url.is_none() {
                    warnings.push("No base_url in the definition or in client.base_url".to_string());
                }
                let aliased = registry.iter().filter(|e| e.alias().is_some()).count();
                let operations = AliasTable::build(&registry).len();
                if operations < aliased {
                    warnings.push(format!(
                        "{} alias(es) are declared more than once; the last declaration wins",
                        aliased - operations
                    ));
                }
                ctx.output.kv("api", &definition.name);
                ctx.output.kv("endpoints", &registry.len().to_string());
                ctx.output.kv("operations", &operations.to_string());
            }
        },
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
