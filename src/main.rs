//! flickr-sync: mirror a Flickr account's photosets to a local directory.
//!
//! Photosets are listed through the OAuth-signed REST API, then each one's
//! photos are downloaded in parallel into `<photos-dir>/sets/<photoset id>/`.
//! Files already present with the remote size are left alone, so reruns only
//! fetch what changed.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod download;
mod dump;
mod flickr;
mod pool;
mod types;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use auth::endpoints::Endpoints;
use download::materialize::Transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::from_cli(cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter())),
        )
        .init();

    tracing::debug!(?config, "Starting");

    let auth = auth::authenticate(
        &config.app_credentials,
        &config.token_cache,
        &Endpoints::default(),
    )
    .await?;

    // Downloads hit the static CDN with plain GETs; no signing and no overall
    // timeout, since originals can be large.
    let transport: Arc<dyn Transport> = Arc::new(reqwest::Client::builder().build()?);

    let download_config = config.download_config();
    let outcome = download::sync_library(&auth.session, transport, &download_config).await?;

    if let Some(path) = &config.metadata_dump {
        dump::write_metadata_dump(path, &auth.user, &outcome.snapshot).await?;
    }

    if outcome.summary.failures() > 0 {
        anyhow::bail!(
            "Sync incomplete: {} photosets not listed, {} downloads failed, {} workers lost",
            outcome.summary.failed_collections,
            outcome.summary.items.failed,
            outcome.summary.items.panicked_workers
        );
    }
    Ok(())
}
