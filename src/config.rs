use std::path::PathBuf;

use crate::download::DownloadConfig;
use crate::flickr::SizeVariant;
use crate::pool::QueueCapacity;
use crate::types::LogLevel;

/// Application configuration, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub photos_dir: PathBuf,
    pub metadata_dump: Option<PathBuf>,
    pub app_credentials: PathBuf,
    pub token_cache: PathBuf,

    pub threads_num: u16,
    pub queue_capacity: QueueCapacity,
    pub size: SizeVariant,
    pub log_level: LogLevel,

    pub include_not_in_set: bool,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        if cli.photos_dir.trim().is_empty() {
            anyhow::bail!("--photos-dir must not be empty");
        }

        Ok(Self {
            photos_dir: expand_tilde(&cli.photos_dir),
            metadata_dump: cli.metadata_dump.as_deref().map(expand_tilde),
            app_credentials: expand_tilde(&cli.app_credentials),
            token_cache: expand_tilde(&cli.token_cache),
            threads_num: cli.threads_num,
            queue_capacity: cli.queue_capacity,
            size: cli.size.into(),
            log_level: cli.log_level,
            include_not_in_set: cli.include_not_in_set,
            dry_run: cli.dry_run,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    /// The subset of settings the download engine consumes.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            directory: self.photos_dir.clone(),
            size: self.size,
            concurrent_downloads: self.threads_num as usize,
            queue_capacity: self.queue_capacity,
            include_not_in_set: self.include_not_in_set,
            dry_run: self.dry_run,
            no_progress_bar: self.no_progress_bar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn make_cli(args: &[&str]) -> crate::cli::Cli {
        let mut argv = vec!["flickr-sync", "--photos-dir", "/photos"];
        argv.extend_from_slice(args);
        crate::cli::Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/Pictures/flickr");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Pictures/flickr"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(
            expand_tilde("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            expand_tilde("relative/path"),
            PathBuf::from("relative/path")
        );
    }

    #[test]
    fn test_from_cli_passthrough() {
        let cfg = Config::from_cli(make_cli(&[
            "--threads-num",
            "4",
            "--size",
            "large",
            "--metadata-dump",
            "/tmp/dump.json",
        ]))
        .unwrap();
        assert_eq!(cfg.photos_dir, PathBuf::from("/photos"));
        assert_eq!(cfg.threads_num, 4);
        assert_eq!(cfg.size, SizeVariant::Large);
        assert_eq!(cfg.metadata_dump, Some(PathBuf::from("/tmp/dump.json")));
    }

    #[test]
    fn test_download_config() {
        let cfg = Config::from_cli(make_cli(&[
            "--dry-run",
            "--include-not-in-set",
            "--queue-capacity",
            "8",
        ]))
        .unwrap();
        let dl = cfg.download_config();
        assert_eq!(dl.directory, PathBuf::from("/photos"));
        assert_eq!(dl.concurrent_downloads, 10);
        assert_eq!(dl.queue_capacity, QueueCapacity::Bounded(8));
        assert!(dl.dry_run);
        assert!(dl.include_not_in_set);
    }
}
