//! aeropeer - session revocation gate for the peer-review platform.
//!
//! Main entry point: parses flags, initializes tracing, and serves the
//! gate in front of the session store.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use aeropeer_server::{AppState, GateConfig, Server};
use aeropeer_session::CacheConfig;

/// Session revocation gate for the aeropeer peer-review platform.
#[derive(Parser)]
#[command(name = "aeropeer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Session-store validation endpoint
    #[arg(long, env = "AEROPEER_VALIDATE_URL")]
    validate_url: Option<String>,

    /// Session-store device-metadata endpoint
    #[arg(long, env = "AEROPEER_ENRICH_URL")]
    enrich_url: Option<String>,

    /// Secret used to verify signed session credentials
    #[arg(long, env = "AEROPEER_CREDENTIAL_SECRET")]
    secret: String,

    /// Validity cache TTL in seconds
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Validity cache entry ceiling
    #[arg(long)]
    cache_max_entries: Option<usize>,

    /// Session-store request timeout in seconds
    #[arg(long)]
    store_timeout: Option<u64>,

    /// Default locale for login redirects
    #[arg(long, default_value = "en")]
    locale: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "aeropeer=debug,aeropeer_server=debug,aeropeer_session=debug,info"
    } else {
        "aeropeer=info,aeropeer_server=info,aeropeer_session=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let mut cache = CacheConfig::new();
    if let Some(ttl) = cli.cache_ttl {
        cache = cache.with_ttl(Duration::from_secs(ttl));
    }
    if let Some(max) = cli.cache_max_entries {
        cache = cache.with_max_entries(max);
    }

    let mut config = GateConfig::new(cli.secret)
        .with_bind_address(cli.bind)
        .with_default_locale(cli.locale)
        .with_cache(cache);

    if let Some(url) = cli.validate_url {
        config = config.with_validate_url(url);
    }
    if let Some(url) = cli.enrich_url {
        config = config.with_enrich_url(url);
    }
    if let Some(secs) = cli.store_timeout {
        config = config.with_store_timeout(Duration::from_secs(secs));
    }

    let state = AppState::from_config(config)?;

    tracing::info!(bind = %cli.bind, "aeropeer gate starting");
    Server::new(state).run().await?;

    Ok(())
}
