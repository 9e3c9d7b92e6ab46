use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::credentials::Credentials;
use super::oauth::{to_query, OAuthSigner, Params};
use crate::flickr::session::decode_response;
use crate::flickr::{ApiError, Args, Session};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Authorized Flickr REST client: every call is an OAuth-signed GET against
/// the REST endpoint, requesting plain JSON.
pub struct FlickrSession {
    client: Client,
    signer: OAuthSigner,
    pub(crate) token: Credentials,
    rest_endpoint: String,
}

impl std::fmt::Debug for FlickrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrSession")
            .field("token", &"<redacted>")
            .field("rest_endpoint", &self.rest_endpoint)
            .finish()
    }
}

impl FlickrSession {
    pub fn new(
        client: Client,
        signer: OAuthSigner,
        token: Credentials,
        rest_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            signer,
            token,
            rest_endpoint: rest_endpoint.into(),
        }
    }

    /// HTTP client suited to API calls, with a request timeout.
    pub fn default_client() -> Result<Client, reqwest::Error> {
        Client::builder().timeout(DEFAULT_TIMEOUT).build()
    }
}

#[async_trait::async_trait]
impl Session for FlickrSession {
    async fn call(&self, method: &str, args: &Args) -> Result<Value, ApiError> {
        let mut params: Params = vec![
            ("method".into(), method.to_string()),
            ("format".into(), "json".into()),
            ("nojsoncallback".into(), "1".into()),
        ];
        for (key, values) in args {
            for value in values {
                params.push((key.clone(), value.clone()));
            }
        }
        let signed = self
            .signer
            .sign("GET", &self.rest_endpoint, &params, Some(&self.token))?;

        tracing::debug!(method, "GET {}", self.rest_endpoint);
        let url = format!("{}?{}", self.rest_endpoint, to_query(&signed));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }
        let body: Value = response.json().await?;
        decode_response(method, body)
    }
}
