//! Run an aliased operation against the API.

use std::sync::Arc;

use anyhow::{bail, Result};
use apiq_cache::{InfiniteQueryState, MutationOptions, QueryOptions};
use apiq_core::{NotFoundError, PageFragment, RequestConfig};
use apiq_hooks::{AliasKind, ApiHooks, PagingKeys};
use apiq_http::FetchError;
use serde_json::Value;

use super::{parse_json, parse_pair, CallArgs};
use crate::context::Context;

/// Where the cursor goes in the next request.
#[derive(Clone, Copy)]
enum CursorTarget {
    Query,
    Body,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let hooks = ctx.hooks()?;
    let op = hooks
        .operations()
        .get(&args.operation)
        .cloned()
        .ok_or_else(|| NotFoundError::Alias(args.operation.clone()))?;

    ctx.output.debug(&format!(
        "{} ({} {}, {})",
        op.name,
        op.method(),
        op.path(),
        op.kind
    ));

    let config = request_config(&args)?;
    let body = args.body.as_deref().map(parse_json).transpose()?;
    let cursor = match (&args.page_key, &args.next_field) {
        (Some(page_key), Some(next_field)) => Some((page_key.clone(), next_field.clone())),
        _ if args.pages > 1 => bail!("--pages needs --page-key and --next-field"),
        _ => None,
    };

    let result = match (op.kind, cursor) {
        (AliasKind::Query, None) => {
            let query = hooks.alias_query::<Value>(&op.name, config, QueryOptions::new())?;
            let state = query.fetch().await;
            ctx.output.debug(&format!("key {}", query.key()));
            match state.error {
                Some(err) => return Err(err.into()),
                None => state.data.map(|d| Value::clone(&d)).unwrap_or(Value::Null),
            }
        }
        (AliasKind::ImmutableQuery, None) => {
            let query =
                hooks.alias_immutable_query::<Value>(&op.name, body, config, QueryOptions::new())?;
            let state = query.fetch().await;
            ctx.output.debug(&format!("key {}", query.key()));
            match state.error {
                Some(err) => return Err(err.into()),
                None => state.data.map(|d| Value::clone(&d)).unwrap_or(Value::Null),
            }
        }
        (AliasKind::Query, Some((page_key, next_field))) => {
            let next = next_page(page_key.clone(), next_field, CursorTarget::Query);
            let query = hooks.alias_infinite_query::<Value, _>(
                &op.name,
                config,
                PagingKeys::fixed([page_key]),
                next,
                QueryOptions::new(),
            )?;
            ctx.output.debug(&format!("key {}", query.key()));
            let mut state = query.fetch().await;
            while !state.is_error() && state.has_next_page && state.pages().len() < args.pages {
                state = query.fetch_next_page().await;
            }
            pages(state)?
        }
        (AliasKind::ImmutableQuery, Some((page_key, next_field))) => {
            let next = next_page(page_key.clone(), next_field, CursorTarget::Body);
            let query = hooks.alias_immutable_infinite_query::<Value, _>(
                &op.name,
                body,
                config,
                PagingKeys::fixed([page_key]),
                next,
                QueryOptions::new(),
            )?;
            ctx.output.debug(&format!("key {}", query.key()));
            let mut state = query.fetch().await;
            while !state.is_error() && state.has_next_page && state.pages().len() < args.pages {
                state = query.fetch_next_page().await;
            }
            pages(state)?
        }
        (AliasKind::Mutation, Some(_)) => bail!("'{}' is a mutation and cannot be paginated", op.name),
        (AliasKind::Mutation, None) => mutate(&hooks, &op.name, body, config).await?,
    };

    ctx.output.json(&result);
    Ok(())
}

async fn mutate(
    hooks: &ApiHooks,
    name: &str,
    body: Option<Value>,
    config: Option<RequestConfig>,
) -> Result<Value> {
    let mutation = hooks.alias_mutation::<Value, Value>(name, config, MutationOptions::new())?;
    let data = mutation.mutate(body.unwrap_or(Value::Null)).await?;
    Ok(Value::clone(&data))
}

fn request_config(args: &CallArgs) -> Result<Option<RequestConfig>> {
    let mut config = args.request.to_config()?;
    for pair in &args.headers {
        let (name, value) = parse_pair(pair)?;
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        config = Some(config.unwrap_or_default().header(name, value));
    }
    Ok(config)
}

/// Follow `next_field` of the last page into `page_key` of the next request.
fn next_page(
    page_key: String,
    next_field: String,
    target: CursorTarget,
) -> impl Fn(&Value, &[Arc<Value>]) -> Option<PageFragment> + Send + Sync + 'static {
    move |last, _| {
        let cursor = last.get(&next_field).filter(|v| !v.is_null())?.clone();
        Some(match target {
            CursorTarget::Query => PageFragment::new().query(page_key.clone(), cursor),
            CursorTarget::Body => PageFragment::new().body_field(page_key.clone(), cursor),
        })
    }
}

fn pages(state: InfiniteQueryState<Value, PageFragment, FetchError>) -> Result<Value> {
    if let Some(err) = state.error {
        return Err(err.into());
    }
    Ok(Value::Array(
        state.pages().iter().map(|p| Value::clone(p)).collect(),
    ))
}
