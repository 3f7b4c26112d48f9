//! Cache key inspection.

use anyhow::{bail, Result};
use apiq_core::Method;

use super::KeyArgs;
use crate::context::Context;

/// Run the key command.
pub async fn run(args: KeyArgs, ctx: &Context) -> Result<()> {
    let hooks = ctx.hooks()?;
    let config = args.request.to_config()?;

    let key = match (&args.alias, &args.path) {
        (Some(alias), _) => hooks.key_by_alias(alias, config.as_ref())?,
        (None, Some(path)) => {
            let method = args.method.unwrap_or(Method::Get);
            hooks.key_by_path(method, path, config.as_ref())?
        }
        (None, None) => bail!("Pass --alias NAME or --path PATH"),
    };

    if ctx.output.is_json() {
        ctx.output.json(&key);
    } else {
        println!("{}", key);
    }

    Ok(())
}
