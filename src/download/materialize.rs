//! Idempotent per-photo download: probe, compare, fetch if needed, stamp.

use std::fs::FileTimes;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use super::paths::part_path;
use super::DownloadTask;

/// Network capability used by the materializer.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Size reported by a HEAD probe; `None` when the server sends no
    /// `Content-Length`.
    async fn head_content_length(&self, url: &str) -> Result<Option<u64>, DownloadError>;

    /// Stream the body of `url` into `dest`, returning the bytes written.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

#[async_trait::async_trait]
impl Transport for Client {
    async fn head_content_length(&self, url: &str) -> Result<Option<u64>, DownloadError> {
        let response = self.head(url).send().await.map_err(|e| DownloadError::Http {
            source: e,
            url: url.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        // Read the header directly: the body of a HEAD response is empty, so
        // reqwest's own length hint does not reflect the resource size.
        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok()))
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = self.get(url).send().await.map_err(|e| DownloadError::Http {
            source: e,
            url: url.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(dest)
            .await
            .map_err(|e| DownloadError::disk(dest, e))?;

        let mut bytes_written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Http {
                source: e,
                url: url.to_string(),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::disk(dest, e))?;
            bytes_written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| DownloadError::disk(dest, e))?;
        Ok(bytes_written)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    Downloaded { bytes: u64 },
    UpToDate,
}

/// Bring one destination file in line with its remote source.
///
/// A file already on disk whose size equals the probed content length is
/// left untouched. Anything else is removed and fetched again through a
/// `.part` sibling that is renamed into place once complete. Either way the
/// file ends with its mtime and atime set to the photo's upload time.
pub async fn materialize(
    transport: &dyn Transport,
    task: &DownloadTask,
) -> Result<MaterializeOutcome, DownloadError> {
    let path = task.download_path.as_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::CreateDir {
                path: parent.display().to_string(),
                source: e,
            })?;
    }

    let remote_len = transport.head_content_length(&task.url).await?;

    let existing = match fs::metadata(path).await {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(DownloadError::disk(path, e)),
    };

    let up_to_date = matches!(
        (&existing, remote_len),
        (Some(meta), Some(len)) if meta.is_file() && meta.len() == len
    );

    let outcome = if up_to_date {
        tracing::debug!(path = %path.display(), "Up to date, skipping");
        MaterializeOutcome::UpToDate
    } else {
        if existing.is_some() {
            tracing::debug!(
                path = %path.display(),
                local = existing.as_ref().map(|m| m.len()),
                remote = remote_len,
                "Size mismatch, refetching"
            );
            fs::remove_file(path)
                .await
                .map_err(|e| DownloadError::disk(path, e))?;
        }
        let bytes = fetch_via_part_file(transport, &task.url, path).await?;
        MaterializeOutcome::Downloaded { bytes }
    };

    if let Some(ts) = task.mtime {
        let desired = unix_to_system_time(ts);
        let current = existing
            .as_ref()
            .filter(|_| up_to_date)
            .and_then(|m| m.modified().ok());
        if current != Some(desired) {
            let stamp_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || set_file_times(&stamp_path, desired))
                .await
                .map_err(|e| DownloadError::Other(anyhow::anyhow!("timestamp task failed: {e}")))?
                .map_err(|e| DownloadError::Timestamps {
                    path: path.display().to_string(),
                    source: e,
                })?;
        }
    }

    Ok(outcome)
}

async fn fetch_via_part_file(
    transport: &dyn Transport,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError> {
    let part = part_path(path);
    let _ = fs::remove_file(&part).await;
    match transport.fetch_to_file(url, &part).await {
        Ok(bytes) => {
            fs::rename(&part, path)
                .await
                .map_err(|e| DownloadError::disk(path, e))?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&part).await;
            Err(e)
        }
    }
}

/// Convert a Unix timestamp to `SystemTime`, clamping dates before 1970 to
/// the epoch.
fn unix_to_system_time(timestamp: i64) -> SystemTime {
    if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH
    }
}

/// Set both modification and access time of `path`.
fn set_file_times(path: &Path, time: SystemTime) -> std::io::Result<()> {
    let times = FileTimes::new().set_modified(time).set_accessed(time);
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(times)
}
