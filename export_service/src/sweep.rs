//! Background sweep of temporary export files (§4.10 "a background sweep
//! deletes files older than N hours (default 24)").

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::ExportError;

pub const DEFAULT_MAX_AGE_HOURS: u64 = 24;

/// Deletes every file directly under `dir` whose modification time is
/// older than `max_age`. Returns the number of files removed. Directories
/// are left untouched.
pub async fn sweep_expired(dir: &Path, max_age: Duration) -> Result<usize, ExportError> {
    let mut removed = 0usize;
    let now = SystemTime::now();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > max_age {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                tracing::warn!(path = %entry.path().display(), error = %err, "failed to sweep expired export file");
                continue;
            }
            removed += 1;
        }
    }
    Ok(removed)
}

/// Runs [`sweep_expired`] on a fixed interval until the returned task is
/// aborted; callers spawn this as a background task alongside the
/// ingestion/workflow worker pools (§9 "Async and background jobs").
pub fn spawn_sweeper(dir: std::path::PathBuf, interval: Duration, max_age: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match sweep_expired(&dir, max_age).await {
                Ok(n) if n > 0 => tracing::info!(count = n, "swept expired export files"),
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "export sweep failed"),
            }
        }
    })
}
