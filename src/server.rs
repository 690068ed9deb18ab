use crate::command;
use crate::config::Config;
use crate::resp::{RespParser, RespValue};
use crate::store::SharedStore;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Keys sampled per active expiry round.
const EXPIRE_SAMPLE_SIZE: usize = 20;
/// Upper bound on rounds per sweep so one sweep cannot hold the lock for long.
const EXPIRE_MAX_ROUNDS: usize = 16;

/// Bind the configured address and serve until `shutdown` fires.
pub async fn run_server(
    store: SharedStore,
    config: &Config,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("minidis listening on {addr}");
    serve(listener, store, shutdown).await
}

/// Accept connections on `listener`, one task per client, until `shutdown`
/// fires. Open connections are told to stop as well.
pub async fn serve(
    listener: TcpListener,
    store: SharedStore,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        continue;
                    }
                };
                debug!("New connection from {peer_addr}");

                let store = store.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, store, shutdown).await {
                        debug!("Connection error from {peer_addr}: {e}");
                    }
                    debug!("Connection closed: {peer_addr}");
                });
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down listener");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    store: SharedStore,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        // Answer every complete request already buffered, in order.
        loop {
            match RespParser::next_request(&mut buf) {
                Ok(Some(request)) => {
                    let reply = command::execute(&request, &store).await;
                    stream.write_all(&reply).await?;
                }
                Ok(None) => break,
                Err(e) => {
                    let reply = RespValue::error(format!("ERR Protocol error: {e}"));
                    stream.write_all(&reply.serialize()).await?;
                    return Ok(());
                }
            }
        }

        tokio::select! {
            result = stream.read_buf(&mut buf) => {
                if result? == 0 {
                    return Ok(());
                }
            }
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}

/// Periodically evict expired keys that nobody reads. Runs `hz` times a
/// second; each run samples keys with deadlines and repeats while more than a
/// quarter of the sample had expired.
pub async fn run_expiry_sweep(store: SharedStore, hz: u64, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(1000 / hz.clamp(1, 1000)));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let mut ks = store.lock().await;
                let mut total = 0;
                for _ in 0..EXPIRE_MAX_ROUNDS {
                    let (sampled, evicted) = ks.active_expire(EXPIRE_SAMPLE_SIZE);
                    total += evicted;
                    if sampled == 0 || evicted * 4 <= sampled {
                        break;
                    }
                }
                if total > 0 {
                    debug!("Active expiry evicted {total} keys");
                }
            }
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
