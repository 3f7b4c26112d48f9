//! Endpoint listing.

use anyhow::Result;
use apiq_core::Method;
use apiq_hooks::{operation_name, AliasKind};
use serde::Serialize;

use super::EndpointsArgs;
use crate::context::Context;
use crate::output::{kind_badge, method_badge};

#[derive(Debug, Serialize)]
struct EndpointRow {
    method: String,
    path: String,
    alias: Option<String>,
    operation: Option<String>,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Run the endpoints command.
pub async fn run(args: EndpointsArgs, ctx: &Context) -> Result<()> {
    let hooks = ctx.hooks()?;

    let rows: Vec<(EndpointRow, Method, AliasKind)> = hooks
        .registry()
        .iter()
        .filter(|e| !args.aliased || e.alias().is_some())
        .filter(|e| args.method.map_or(true, |m| e.method == m))
        .map(|e| {
            let kind = AliasKind::of(e);
            let row = EndpointRow {
                method: e.method.to_string(),
                path: e.path.clone(),
                alias: e.alias().map(str::to_string),
                // A later endpoint may have taken over this alias.
                operation: e
                    .alias()
                    .map(operation_name)
                    .filter(|name| hooks.operations().get(name).is_some_and(|op| op.endpoint == *e)),
                kind: kind.as_str(),
                description: e.description.clone(),
            };
            (row, e.method, kind)
        })
        .collect();

    if ctx.output.is_json() {
        let rows: Vec<&EndpointRow> = rows.iter().map(|(row, _, _)| row).collect();
        ctx.output.json(&rows);
        return Ok(());
    }

    ctx.output.header(&format!("Endpoints of {}", hooks.api()));

    if rows.is_empty() {
        ctx.output.info("No endpoints match.");
        return Ok(());
    }

    let path_width = rows.iter().map(|(r, _, _)| r.path.len()).max().unwrap_or(0);
    let op_width = rows
        .iter()
        .filter_map(|(r, _, _)| r.operation.as_ref().map(String::len))
        .max()
        .unwrap_or(1);

    for (row, method, kind) in &rows {
        ctx.output.table_row(
            &[
                method_badge(*method).as_str(),
                row.path.as_str(),
                row.operation.as_deref().unwrap_or("-"),
                kind_badge(*kind).as_str(),
            ],
            &[6, path_width, op_width, 0],
        );
        if let Some(ref description) = row.description {
            ctx.output.debug(description);
        }
    }

    ctx.output.info(&format!(
        "{} endpoint(s), {} operation(s)",
        rows.len(),
        hooks.operations().len()
    ));

    Ok(())
}
