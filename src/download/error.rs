use thiserror::Error;

/// Per-item download failures. None of these abort the run; the executor
/// logs them and moves on to the next task.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error fetching {url}: {source}")]
    Http {
        source: reqwest::Error,
        url: String,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Disk error on {path}: {source}")]
    Disk {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to set timestamps on {path}: {source}")]
    Timestamps {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DownloadError {
    pub(crate) fn disk(path: &std::path::Path, source: std::io::Error) -> Self {
        DownloadError::Disk {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether the failure came from the remote side rather than local I/O.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DownloadError::HttpStatus { .. } | DownloadError::Http { .. }
        )
    }
}
