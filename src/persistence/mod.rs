pub mod snapshot;

use crate::error::MinidisResult;
use crate::store::SharedStore;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a full snapshot of the store to `path`.
///
/// The keyspace is encoded under the lock; the file is written to
/// `<path>.tmp` and renamed over `path` after the lock is released, so a
/// crash mid-write never leaves a torn snapshot behind. Returns the number of
/// keys written.
pub async fn snapshot(store: &SharedStore, path: &Path) -> MinidisResult<usize> {
    let (bytes, keys) = {
        let mut ks = store.lock().await;
        ks.purge_expired();
        snapshot::encode(&ks)
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = tmp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;

    debug!("Snapshot of {keys} keys ({} bytes) written to {}", bytes.len(), path.display());
    Ok(keys)
}

/// Replace the whole store with the snapshot at `path`.
///
/// A missing file means no prior state: the store is emptied and `Ok(0)` is
/// returned. A file that fails to decode is an error and the store is left
/// untouched. Returns the number of keys loaded.
pub async fn restore(store: &SharedStore, path: &Path) -> MinidisResult<usize> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            store.lock().await.flush();
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let loaded = snapshot::decode(&data)?;
    let keys = loaded.len();
    *store.lock().await = loaded;
    Ok(keys)
}

/// Snapshot the store every `interval` until `shutdown` fires.
pub async fn run_periodic_snapshot(
    store: SharedStore,
    path: PathBuf,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => match snapshot(&store, &path).await {
                Ok(keys) => info!("Background snapshot saved {keys} keys to {}", path.display()),
                Err(e) => error!("Background snapshot to {} failed: {e}", path.display()),
            },
        }
    }
    debug!("Snapshot scheduler stopped");
}
