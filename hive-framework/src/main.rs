//! Hive framework host daemon
//!
//! Loads the host configuration, connects the job store, wires the bus,
//! registers one framework per descriptor file, and serves the combined
//! framework API until a stop signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hive_bus::{JobQueue, MemoryBus, RpcChannel};
use hive_framework::config::BaseConfig;
use hive_framework::host::FrameworkHost;
use hive_framework::registry::FrameworkRegistry;
use hive_framework::shutdown;
use hive_framework::store::{PgJobStore, postgres};

/// Hive framework host: registers frameworks and schedules their jobs
#[derive(Parser, Debug)]
#[command(name = "hive-framework", version)]
struct Args {
    /// Config file to use
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hive_framework=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Hive framework host");

    let config = BaseConfig::load(&args.config).context("failed to load host config")?;
    config.validate().context("invalid host config")?;

    info!(
        frameworks_dir = %config.paths.framework_configs.display(),
        bind_addr = %config.api.bind_addr,
        "loaded configuration"
    );

    let pool = postgres::create_pool(&config.store)
        .await
        .context("failed to create store pool")?;
    let store = Arc::new(PgJobStore::new(pool));

    info!("job store pool created");

    // In-process transport; broker-backed transports implement the same
    // bus traits and slot in here.
    let bus = Arc::new(MemoryBus::new());
    let rpc: Arc<dyn RpcChannel> = bus.clone();
    let queue: Arc<dyn JobQueue> = bus;

    let token = shutdown::install_shutdown_handler();
    let registry = FrameworkRegistry::builtin();

    let mut host = FrameworkHost::new(config, rpc, queue, store, registry, token);

    let started = host.start_frameworks().await?;
    info!(started, "frameworks registered");

    host.serve().await
}
