//! Download engine. Photosets are processed one after another; the photos of
//! each photoset are materialized in parallel by a dedicated worker pool that
//! is drained and joined before the next photoset starts.

pub mod error;
pub mod materialize;
pub mod paths;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::flickr::{
    fetch_collection_list, fetch_items_in_collection, fetch_items_not_in_any_collection, Photo,
    Photoset, Session, SizeVariant,
};
use crate::pool::{QueueCapacity, TaskExecutor, WorkerPool};

use materialize::{materialize, MaterializeOutcome, Transport};
use paths::Destination;

/// Subset of application config consumed by the download engine.
/// Decoupled from CLI parsing so the engine can be tested independently.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub(crate) directory: PathBuf,
    pub(crate) size: SizeVariant,
    pub(crate) concurrent_downloads: usize,
    pub(crate) queue_capacity: QueueCapacity,
    pub(crate) include_not_in_set: bool,
    pub(crate) dry_run: bool,
    pub(crate) no_progress_bar: bool,
}

/// One photo to materialize: where it comes from, where it goes and the
/// timestamp it should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub photo_id: String,
    pub url: String,
    pub download_path: PathBuf,
    pub mtime: Option<i64>,
}

/// Per-photoset accounting. Every listed photo lands in exactly one of
/// `unresolved`, `downloaded`, `up_to_date` or `failed` (or was planned only,
/// on a dry run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub total: usize,
    pub planned: usize,
    pub unresolved: usize,
    pub downloaded: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub panicked_workers: usize,
}

impl std::ops::AddAssign for CollectionReport {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.planned += other.planned;
        self.unresolved += other.unresolved;
        self.downloaded += other.downloaded;
        self.up_to_date += other.up_to_date;
        self.failed += other.failed;
        self.panicked_workers += other.panicked_workers;
    }
}

/// Whole-run totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub collections: usize,
    pub failed_collections: usize,
    pub items: CollectionReport,
}

impl SyncSummary {
    /// Failures that should make the process exit non-zero. Unresolvable
    /// photos are only warned about.
    pub fn failures(&self) -> usize {
        self.failed_collections + self.items.failed + self.items.panicked_workers
    }
}

/// One photoset and the photos listed under it. `items` is `None` when the
/// listing could not be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub collection: Photoset,
    pub items: Option<Vec<Photo>>,
}

/// Everything fetched during a run, as written to the metadata dump.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibrarySnapshot {
    pub collections: Vec<CollectionSnapshot>,
    pub not_in_any_collection: Option<Vec<Photo>>,
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub summary: SyncSummary,
    pub snapshot: LibrarySnapshot,
}

/// Create a progress bar with a consistent template.
///
/// Returns `ProgressBar::hidden()` when the user passed `--no-progress-bar` or
/// stdout is not a TTY (piped output, cron jobs).
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .expect("valid template")
        .progress_chars("=> "),
    );
    pb
}

/// Pool executor that materializes one photo per task and tallies results.
struct Materializer {
    transport: Arc<dyn Transport>,
    progress: ProgressBar,
    downloaded: AtomicUsize,
    up_to_date: AtomicUsize,
    failed: AtomicUsize,
}

impl Materializer {
    fn new(transport: Arc<dyn Transport>, progress: ProgressBar) -> Self {
        Self {
            transport,
            progress,
            downloaded: AtomicUsize::new(0),
            up_to_date: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TaskExecutor<DownloadTask> for Materializer {
    async fn execute(&self, task: DownloadTask) {
        match materialize(self.transport.as_ref(), &task).await {
            Ok(MaterializeOutcome::Downloaded { bytes }) => {
                self.downloaded.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    photo_id = %task.photo_id,
                    size_bytes = bytes,
                    "Downloaded {}",
                    task.download_path.display()
                );
            }
            Ok(MaterializeOutcome::UpToDate) => {
                self.up_to_date.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                // Suspend the bar so the log line doesn't interleave with a redraw.
                self.progress.suspend(|| {
                    tracing::error!(
                        photo_id = %task.photo_id,
                        remote = e.is_remote(),
                        "Download failed: {}: {}",
                        task.download_path.display(),
                        e
                    );
                });
            }
        }
        self.progress.inc(1);
    }
}

/// Resolve a source URL and destination for every photo. Photos without a
/// usable URL are logged and counted, not returned.
fn plan_tasks(
    photos: &[Photo],
    destination: Destination<'_>,
    config: &DownloadConfig,
) -> (Vec<DownloadTask>, usize) {
    let mut tasks = Vec::with_capacity(photos.len());
    let mut unresolved = 0;
    for photo in photos {
        let url = match photo.source_url(config.size) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%destination, "Skipping photo: {}", e);
                unresolved += 1;
                continue;
            }
        };
        if photo.date_upload.is_none() {
            tracing::warn!(
                photo_id = %photo.id,
                "No upload time reported, file timestamps will not be set"
            );
        }
        tasks.push(DownloadTask {
            photo_id: photo.id.clone(),
            download_path: paths::item_path(&config.directory, destination, &photo.id, &url),
            url: url.into(),
            mtime: photo.date_upload,
        });
    }
    (tasks, unresolved)
}

/// Materialize one photoset's photos with a fresh worker pool, returning once
/// every task has finished.
pub async fn download_collection(
    transport: Arc<dyn Transport>,
    destination: Destination<'_>,
    photos: &[Photo],
    config: &DownloadConfig,
) -> CollectionReport {
    let (tasks, unresolved) = plan_tasks(photos, destination, config);
    let mut report = CollectionReport {
        total: photos.len(),
        planned: tasks.len(),
        unresolved,
        ..CollectionReport::default()
    };

    if config.dry_run {
        for task in &tasks {
            tracing::info!("[DRY RUN] Would download {}", task.download_path.display());
        }
        return report;
    }
    if tasks.is_empty() {
        return report;
    }

    let pb = create_progress_bar(config.no_progress_bar, tasks.len() as u64);
    pb.set_message(destination.to_string());
    let executor = Arc::new(Materializer::new(transport, pb.clone()));
    let mut pool = WorkerPool::<DownloadTask>::new(
        config.concurrent_downloads,
        config.queue_capacity,
        executor.clone(),
    );
    pool.start();
    tracing::debug!(workers = pool.size(), tasks = tasks.len(), %destination, "Started worker pool");

    for task in tasks {
        if let Err(e) = pool.add(task).await {
            pb.suspend(|| tracing::error!(%destination, "Could not queue download: {}", e));
            break;
        }
    }
    pool.close();
    let pool_report = pool.join().await;
    pb.finish_and_clear();

    report.downloaded = executor.downloaded.load(Ordering::Relaxed);
    report.up_to_date = executor.up_to_date.load(Ordering::Relaxed);
    report.failed = executor.failed.load(Ordering::Relaxed);
    report.panicked_workers = pool_report.panicked_workers;
    tracing::debug!(
        workers = pool_report.workers,
        completed = pool_report.completed,
        "Worker pool drained"
    );

    tracing::info!(
        "  {}: {} downloaded, {} up to date, {} skipped, {} failed",
        destination,
        report.downloaded,
        report.up_to_date,
        report.unresolved,
        report.failed
    );
    report
}

/// Sync every photoset of the session's user, then optionally the photos
/// that belong to no photoset.
///
/// Only a failure to list the photosets aborts the run. A photoset whose
/// photos cannot be listed is logged, recorded in the summary and skipped.
pub async fn sync_library(
    session: &dyn Session,
    transport: Arc<dyn Transport>,
    config: &DownloadConfig,
) -> Result<SyncOutcome> {
    let started = Instant::now();

    let photosets = fetch_collection_list(session)
        .await
        .context("Failed to list photosets")?;
    tracing::info!("Found {} photosets", photosets.len());

    let mut summary = SyncSummary::default();
    let mut snapshot = LibrarySnapshot::default();
    let count = photosets.len();

    for (index, photoset) in photosets.into_iter().enumerate() {
        summary.collections += 1;
        tracing::info!(
            photoset_id = %photoset.id,
            "Photoset {}/{}: {} ({} photos, {} videos)",
            index + 1,
            count,
            photoset.title,
            photoset.photos,
            photoset.videos
        );
        let items = match fetch_items_in_collection(session, &photoset.id).await {
            Ok(photos) => {
                summary.items += download_collection(
                    Arc::clone(&transport),
                    Destination::Photoset(&photoset.id),
                    &photos,
                    config,
                )
                .await;
                Some(photos)
            }
            Err(e) => {
                tracing::error!(photoset_id = %photoset.id, "Skipping photoset: {}", e);
                summary.failed_collections += 1;
                None
            }
        };
        snapshot.collections.push(CollectionSnapshot {
            collection: photoset,
            items,
        });
    }

    if config.include_not_in_set {
        summary.collections += 1;
        snapshot.not_in_any_collection = match fetch_items_not_in_any_collection(session).await {
            Ok(photos) => {
                tracing::info!("{} photos not in any photoset", photos.len());
                summary.items += download_collection(
                    Arc::clone(&transport),
                    Destination::NotInSet,
                    &photos,
                    config,
                )
                .await;
                Some(photos)
            }
            Err(e) => {
                tracing::error!("Skipping photos not in any photoset: {}", e);
                summary.failed_collections += 1;
                None
            }
        };
    }

    log_summary(&summary, config, started.elapsed());
    Ok(SyncOutcome { summary, snapshot })
}

fn log_summary(summary: &SyncSummary, config: &DownloadConfig, elapsed: Duration) {
    let items = &summary.items;
    if config.dry_run {
        tracing::info!("── Dry Run Summary ──");
        tracing::info!("  {} files would be downloaded", items.planned);
        tracing::info!("  {} photos without a usable URL", items.unresolved);
        tracing::info!("  destination: {}", config.directory.display());
        tracing::info!("  concurrency: {}", config.concurrent_downloads);
    } else {
        tracing::info!("── Summary ──");
        tracing::info!(
            "  {} downloaded, {} up to date, {} skipped, {} failed, {} total",
            items.downloaded,
            items.up_to_date,
            items.unresolved,
            items.failed,
            items.total
        );
    }
    if summary.failed_collections > 0 {
        tracing::warn!(
            "  {} of {} photosets could not be listed",
            summary.failed_collections,
            summary.collections
        );
    }
    if items.panicked_workers > 0 {
        tracing::warn!("  {} download workers were lost", items.panicked_workers);
    }
    tracing::info!("  elapsed: {}", format_duration(elapsed));
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
