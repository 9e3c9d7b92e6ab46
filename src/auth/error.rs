use thiserror::Error;

/// Failures while establishing an authorized Flickr session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials from {path}: {source}")]
    ReadCredentials {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed credentials in {path}: {source}")]
    ParseCredentials {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to save credentials to {path}: {source}")]
    SaveCredentials {
        path: String,
        source: std::io::Error,
    },

    #[error("OAuth endpoint {endpoint} returned HTTP {status}: {body}")]
    TokenRequest {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("OAuth response from {endpoint} is missing {field}")]
    MissingField {
        endpoint: String,
        field: &'static str,
    },

    #[error("Authorization required but stdin is not a terminal; run interactively once to cache a token")]
    NotInteractive,

    #[error("No verification code entered")]
    EmptyVerifier,

    #[error(transparent)]
    Api(#[from] crate::flickr::ApiError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
