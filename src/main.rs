use minidis::config::Config;
use minidis::persistence;
use minidis::server;
use minidis::store::new_shared_store;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_args(&args);

    // RUST_LOG wins over --loglevel.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.loglevel))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let snapshot_path = config.snapshot_path();
    let store = new_shared_store();

    match persistence::restore(&store, &snapshot_path).await {
        Ok(0) => info!("No keys loaded from {}", snapshot_path.display()),
        Ok(keys) => info!("Loaded {keys} keys from {}", snapshot_path.display()),
        Err(e) => warn!(
            "Failed to load snapshot {}: {e}, starting with empty store",
            snapshot_path.display()
        ),
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            server::shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        });
    }

    let mut background = Vec::new();
    if config.save_interval > 0 {
        background.push(tokio::spawn(persistence::run_periodic_snapshot(
            store.clone(),
            snapshot_path.clone(),
            Duration::from_secs(config.save_interval),
            shutdown.clone(),
        )));
    }
    background.push(tokio::spawn(server::run_expiry_sweep(
        store.clone(),
        config.hz,
        shutdown.clone(),
    )));

    let result = server::run_server(store.clone(), &config, shutdown.clone()).await;
    shutdown.cancel();
    for task in background {
        let _ = task.await;
    }

    match persistence::snapshot(&store, &snapshot_path).await {
        Ok(keys) => info!("Saved {keys} keys to {}", snapshot_path.display()),
        Err(e) => warn!("Final snapshot to {} failed: {e}", snapshot_path.display()),
    }

    result
}
