//! Durable copy of the snapshot, used as the startup seed when valid.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::metrics;
use crate::state::EntitySnapshot;

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored snapshot, if present and usable with `series_len`.
    /// Anything else means "start from the default seed".
    pub fn load(&self, series_len: usize) -> Option<EntitySnapshot> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no stored snapshot");
                return None;
            }
        };
        let snapshot: EntitySnapshot = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "stored snapshot unreadable, using default seed");
                return None;
            }
        };
        if snapshot.series_len() != series_len || snapshot.is_empty() {
            warn!(
                path = %self.path.display(),
                stored = snapshot.series_len(),
                expected = series_len,
                "stored snapshot does not match configuration, using default seed"
            );
            return None;
        }
        Some(snapshot)
    }

    /// Writes via a temp file and rename so readers never see a partial file.
    pub fn save(&self, snapshot: &EntitySnapshot) -> anyhow::Result<()> {
        let json = serde_json::to_vec(snapshot).context("serializing snapshot")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

async fn write(file: &SnapshotFile, snapshot: Arc<EntitySnapshot>) {
    let file = file.clone();
    let outcome = tokio::task::spawn_blocking(move || file.save(&snapshot)).await;
    match outcome {
        Ok(Ok(())) => metrics::record_persist("ok"),
        Ok(Err(err)) => {
            warn!(error = %err, "failed to persist snapshot");
            metrics::record_persist("error");
        }
        Err(err) => {
            warn!(error = %err, "snapshot writer task failed");
            metrics::record_persist("error");
        }
    }
}

/// Debounced writer: at most one write per `interval`, always of the latest
/// generation. Pending changes are flushed when `cancel` fires.
pub async fn run_persister(
    file: SnapshotFile,
    mut snapshots: watch::Receiver<Arc<EntitySnapshot>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut last_write: Option<Instant> = None;
    let mut dirty = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            res = snapshots.changed() => if res.is_err() { break },
        }
        dirty = true;

        if let Some(at) = last_write {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(at + interval) => {}
            }
        }

        let snapshot = snapshots.borrow_and_update().clone();
        write(&file, snapshot).await;
        last_write = Some(Instant::now());
        dirty = false;
    }

    if dirty || snapshots.has_changed().unwrap_or(false) {
        let snapshot = snapshots.borrow_and_update().clone();
        write(&file, snapshot).await;
    }
    debug!(path = %file.path().display(), "persister stopped");
}
