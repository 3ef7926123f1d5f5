pub mod args;

pub use args::Args;

use crate::core::config::{ConfigLoader, SettingsSource, StudioConfig};
use crate::logging::{self, LoggingConfig};
use crate::server::{self, ServerState};
use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use tracing::info;

/// Load settings, start logging and serve until shutdown.
pub async fn run(args: Args) -> crate::Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_required(path)?,
        None => StudioConfig::default(),
    };
    let logging_config = LoggingConfig::load(&config.logging, args.debug)?;
    let _guard = logging::init(&logging_config)?;

    info!(
        "Starting server on {}:{} (debug={})",
        args.host, args.port, args.debug
    );
    let bind_addr = resolve_bind_addr(&args.host, args.port).await?;
    let state = ServerState::new(SettingsSource::from_process(config.seqera));
    server::serve(bind_addr, state).await?;
    Ok(())
}

/// Resolve `host:port`, accepting hostnames as well as IP literals.
pub async fn resolve_bind_addr(host: &str, port: u16) -> crate::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve bind address {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("no addresses found for {}:{}", host, port))
}
