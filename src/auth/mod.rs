//! Flickr authorization via OAuth 1.0a.
//!
//! Startup tries the cached user token first. If it is missing or rejected by
//! `flickr.test.login`, the out-of-band flow runs: request token → user visits
//! the authorize URL → verifier typed back → access token, which is cached.

pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod oauth;
pub mod session;

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;

use self::credentials::Credentials;
use self::endpoints::Endpoints;
use self::error::AuthError;
use self::oauth::{to_query, OAuthSigner};
use self::session::FlickrSession;
use crate::flickr::{test_login, User};

/// Permission level requested during authorization.
const PERMS: &str = "read";

/// An authorized session and the account it belongs to.
#[derive(Debug)]
pub struct AuthResult {
    pub session: FlickrSession,
    pub user: User,
}

/// Top-level authentication orchestrator.
///
/// 1. Loads the application key/secret (fatal when unreadable).
/// 2. Verifies the cached user token, if any.
/// 3. Otherwise runs the out-of-band authorization flow and caches the token.
/// 4. Verifies the session again and returns it with the account.
pub async fn authenticate(
    app_credentials: &Path,
    token_cache: &Path,
    endpoints: &Endpoints,
) -> Result<AuthResult> {
    let consumer = Credentials::load(app_credentials)
        .await
        .context("Failed to load application credentials")?;
    let signer = OAuthSigner::new(consumer);
    let client = FlickrSession::default_client()?;

    match Credentials::load(token_cache).await {
        Ok(token) => {
            tracing::debug!("Loaded cached token from {}", token_cache.display());
            let session =
                FlickrSession::new(client.clone(), signer.clone(), token, &endpoints.rest);
            match test_login(&session).await {
                Ok(user) => {
                    tracing::info!("Authenticated as {} ({})", user.username, user.id);
                    return Ok(AuthResult { session, user });
                }
                Err(e) => tracing::warn!("Cached token rejected, re-authorizing: {}", e),
            }
        }
        Err(e) => tracing::info!("No usable cached token: {}", e),
    }

    if !io::stdin().is_terminal() {
        return Err(AuthError::NotInteractive.into());
    }

    let token = authorize_interactive(&client, &signer, endpoints).await?;
    token.save(token_cache).await?;

    let session = FlickrSession::new(client, signer, token, &endpoints.rest);
    let user = test_login(&session)
        .await
        .context("Newly authorized token was rejected")?;
    tracing::info!("Authenticated as {} ({})", user.username, user.id);
    Ok(AuthResult { session, user })
}

async fn authorize_interactive(
    client: &Client,
    signer: &OAuthSigner,
    endpoints: &Endpoints,
) -> Result<Credentials> {
    let request = request_token(client, signer, endpoints).await?;
    let url = authorize_url(endpoints, &request);

    let verifier = tokio::task::spawn_blocking(move || {
        println!("1. Go to {url}");
        println!("2. Authorize the application");
        print!("3. Enter the verification code: ");
        io::stdout().flush()?;
        let mut code = String::new();
        io::stdin().read_line(&mut code)?;
        Ok::<String, io::Error>(code.trim().to_string())
    })
    .await??;
    if verifier.is_empty() {
        return Err(AuthError::EmptyVerifier.into());
    }

    Ok(access_token(client, signer, endpoints, &request, &verifier).await?)
}

/// Obtain temporary credentials for the out-of-band flow.
async fn request_token(
    client: &Client,
    signer: &OAuthSigner,
    endpoints: &Endpoints,
) -> Result<Credentials, AuthError> {
    let params = [("oauth_callback".to_string(), "oob".to_string())];
    token_exchange(client, signer, &endpoints.request_token, &params, None).await
}

fn authorize_url(endpoints: &Endpoints, request: &Credentials) -> String {
    format!(
        "{}?{}",
        endpoints.authorize,
        to_query(&[
            ("oauth_token".to_string(), request.token.clone()),
            ("perms".to_string(), PERMS.to_string()),
        ])
    )
}

/// Trade the authorized request token and verifier for an access token.
async fn access_token(
    client: &Client,
    signer: &OAuthSigner,
    endpoints: &Endpoints,
    request: &Credentials,
    verifier: &str,
) -> Result<Credentials, AuthError> {
    let params = [("oauth_verifier".to_string(), verifier.to_string())];
    token_exchange(client, signer, &endpoints.access_token, &params, Some(request)).await
}

/// Signed GET to a token endpoint; the reply is form-encoded
/// `oauth_token=...&oauth_token_secret=...`.
async fn token_exchange(
    client: &Client,
    signer: &OAuthSigner,
    endpoint: &str,
    params: &[(String, String)],
    token: Option<&Credentials>,
) -> Result<Credentials, AuthError> {
    let signed = signer.sign("GET", endpoint, params, token)?;
    tracing::debug!("GET {}", endpoint);
    let response = client
        .get(format!("{}?{}", endpoint, to_query(&signed)))
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AuthError::TokenRequest {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    parse_token_response(endpoint, &body)
}

fn parse_token_response(endpoint: &str, body: &str) -> Result<Credentials, AuthError> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }
    let missing = |field| AuthError::MissingField {
        endpoint: endpoint.to_string(),
        field,
    };
    Ok(Credentials::new(
        token.ok_or_else(|| missing("oauth_token"))?,
        secret.ok_or_else(|| missing("oauth_token_secret"))?,
    ))
}
