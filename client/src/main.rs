//! Session inspector for the storefront client.
//!
//! Prints the status of the persisted session, decodes a token given on the
//! command line, or clears the session:
//!
//! ```text
//! client                 # session status
//! client decode <token>  # decoded token structure
//! client logout          # clear the persisted session
//! ```

use anyhow::{Context, Result, bail};
use client::auth::AuthContext;
use client::config::Config;
use client::utils::jwt;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("status") => print_status(&config),
        Some("decode") => {
            let token = args.get(1).context("usage: client decode <token>")?;
            jwt::log_token_info(token);
            println!("{}", serde_json::to_string_pretty(&jwt::decode_unverified(token))?);
            Ok(())
        }
        Some("logout") => {
            let ctx = AuthContext::from_config(&config);
            ctx.logout()?;
            info!(key = ctx.storage_key(), "persisted session cleared");
            Ok(())
        }
        Some(other) => bail!("unknown command '{}', expected status, decode or logout", other),
    }
}

fn print_status(config: &Config) -> Result<()> {
    let ctx = AuthContext::from_config(config);
    let state = ctx.state();

    info!(
        dir = %config.storage_dir.display(),
        key = %config.storage_key,
        authenticated = state.is_authenticated_now(),
        "loaded persisted session"
    );

    let status = json!({
        "storageDir": config.storage_dir.display().to_string(),
        "storageKey": config.storage_key,
        "session": state,
        "needsRefresh": ctx.needs_refresh(config.refresh_window()),
        "refreshIntervalSeconds": config.refresh_interval_seconds,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
