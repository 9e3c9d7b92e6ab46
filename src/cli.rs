use clap::Parser;

use crate::pool::QueueCapacity;
use crate::types::*;

#[derive(Parser, Debug)]
#[command(
    name = "flickr-sync",
    version,
    about = "Mirror a Flickr account's photosets to a local directory"
)]
pub struct Cli {
    /// Local directory photos are written to
    #[arg(short = 'd', long, env = "FLICKR_SYNC_PHOTOS_DIR")]
    pub photos_dir: String,

    /// Write the fetched photoset and photo metadata to this JSON file
    #[arg(long)]
    pub metadata_dump: Option<String>,

    /// JSON file holding the application's API key and secret
    /// ({"Token": "<key>", "Secret": "<secret>"})
    #[arg(
        long,
        env = "FLICKR_SYNC_APP_CREDENTIALS",
        default_value = "~/.flickr-sync/app.json"
    )]
    pub app_credentials: String,

    /// Where the authorized user token is cached between runs
    #[arg(
        long,
        env = "FLICKR_SYNC_TOKEN_CACHE",
        default_value = "~/.flickr-sync/token.json"
    )]
    pub token_cache: String,

    /// Image size to download
    #[arg(long, value_enum, default_value = "original")]
    pub size: VersionSize,

    /// Number of concurrent downloads per photoset
    #[arg(long, default_value_t = 10)]
    pub threads_num: u16,

    /// Pending download tasks per photoset: a number, or "unbounded"
    #[arg(long, default_value = "unbounded", value_parser = parse_queue_capacity)]
    pub queue_capacity: QueueCapacity,

    /// Also download photos that belong to no photoset
    #[arg(long)]
    pub include_not_in_set: bool,

    /// List what would be downloaded without touching the network or disk
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (RUST_LOG overrides this)
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}
