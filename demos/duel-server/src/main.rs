//! Demo server hosting the built-in games.
//!
//! Environment:
//! - `DUELFORGE_BIND`: listen address (default `127.0.0.1:8080`)
//! - `DUELFORGE_TEARDOWN_GRACE_MS`: delay before a finished game is torn
//!   down (default 5000)
//! - `RUST_LOG`: log filter (default `info`)

use duelforge::prelude::*;
use tracing_subscriber::EnvFilter;

const BIND_VAR: &str = "DUELFORGE_BIND";
const GRACE_VAR: &str = "DUELFORGE_TEARDOWN_GRACE_MS";

/// Builds the server config from a variable lookup.
fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<ServerConfig, String> {
    let mut config = ServerConfig::default();
    if let Some(addr) = lookup(BIND_VAR) {
        config.bind_addr = addr;
    }
    if let Some(raw) = lookup(GRACE_VAR) {
        config.coordinator.teardown_grace_ms = raw
            .trim()
            .parse()
            .map_err(|e| format!("{GRACE_VAR} must be a whole number of milliseconds: {e}"))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config_from(|key| std::env::var(key).ok())?;
    tracing::info!(
        bind = %config.bind_addr,
        grace_ms = config.coordinator.teardown_grace_ms,
        "starting duel server"
    );

    let server = DuelforgeServer::builder()
        .config(config)
        .build(builtin_engines())
        .await?;

    server.run().await?;
    Ok(())
}
