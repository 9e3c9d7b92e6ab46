use thiserror::Error;

/// Errors surfaced by the Flickr REST layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API call {method} failed: {message} (code: {code})")]
    Remote {
        method: String,
        code: i64,
        message: String,
    },
    #[error("HTTP {status} calling {method}")]
    HttpStatus { method: String, status: u16 },
    #[error("Unexpected response shape for {method}: {reason}")]
    Decode { method: String, reason: String },
    #[error("Fetching page {page} of {method} failed: {source}")]
    Page {
        method: String,
        page: u32,
        #[source]
        source: Box<ApiError>,
    },
    #[error("Request signing failed: {0}")]
    Signing(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Per-item failure to produce a usable source URL.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Photo {id} has no {size} URL")]
    MissingUrl { id: String, size: &'static str },
    #[error("Photo {id} has an unparseable URL {url}: {source}")]
    InvalidUrl {
        id: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_names_method_and_page() {
        let e = ApiError::Page {
            method: "flickr.photosets.getPhotos".into(),
            page: 3,
            source: Box::new(ApiError::Remote {
                method: "flickr.photosets.getPhotos".into(),
                code: 1,
                message: "Photoset not found".into(),
            }),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"));
        assert!(msg.contains("Photoset not found"));
    }
}
