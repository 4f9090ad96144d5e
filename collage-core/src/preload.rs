//! Preview preload pipeline with progress and ETA tracking.
//!
//! Given the resolved preview URLs for a collection, the preloader
//! issues one concurrent fetch/decode per asset and counts every
//! completion - success or failure - exactly once, so a bad asset can
//! never stall the pipeline. Each run is an epoch; replacing the input
//! set supersedes the previous epoch and makes its late completions
//! inert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::CollageResult;

/// Interval at which the ETA is recomputed.
pub const ETA_TICK: Duration = Duration::from_secs(1);

/// Fetches and decodes a preview image, returning its natural pixel
/// dimensions.
///
/// Doubles as the dimension probe used when sizing newly added media
/// elements.
#[async_trait]
pub trait PreviewLoader: Send + Sync {
    /// Fetch and decode the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or decode fails. The preloader
    /// treats the error as a counted completion, not a pipeline
    /// failure.
    async fn load(&self, url: &str) -> CollageResult<(u32, u32)>;
}

/// Probe the natural dimensions of a preview URL for media sizing.
///
/// Returns `None` on failure; callers fall back to the default media
/// size.
pub async fn probe_media_size(loader: &dyn PreviewLoader, url: &str) -> Option<(u32, u32)> {
    match loader.load(url).await {
        Ok(dims) => Some(dims),
        Err(e) => {
            tracing::debug!("dimension probe failed for {url}: {e}");
            None
        }
    }
}

/// Estimated seconds remaining, from elapsed time and completion rate.
///
/// Undefined when nothing has loaded yet, the set is empty, or loading
/// already finished.
#[must_use]
pub fn eta_seconds(elapsed: Duration, loaded: usize, total: usize) -> Option<u64> {
    if loaded == 0 || total == 0 || loaded >= total {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let avg = elapsed.as_secs_f64() / loaded as f64;
    #[allow(clippy::cast_precision_loss)]
    let remaining = (total - loaded) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((avg * remaining).round() as u64)
}

/// Snapshot of preload progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadProgress {
    /// Completions counted so far (successes and failures).
    pub loaded: usize,
    /// Assets in the current epoch's input set.
    pub total: usize,
    /// Estimated seconds remaining; absent before the first completion
    /// and after the last.
    pub eta_seconds: Option<u64>,
}

impl PreloadProgress {
    /// Whether every asset in the current set has completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

#[derive(Debug)]
struct PreloadState {
    epoch: u64,
    loaded: usize,
    total: usize,
    started: Instant,
    eta_seconds: Option<u64>,
}

/// Epoch-scoped preload pipeline.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct Preloader {
    state: Arc<Mutex<PreloadState>>,
    next_epoch: Arc<AtomicU64>,
}

impl Preloader {
    /// Create an idle preloader with an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PreloadState {
                epoch: 0,
                loaded: 0,
                total: 0,
                started: Instant::now(),
                eta_seconds: None,
            })),
            next_epoch: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Begin a new epoch for an input set of `total` assets,
    /// superseding any previous epoch.
    ///
    /// Progress resets to `loaded = 0, total`; completions from older
    /// epochs become inert.
    pub fn begin_epoch(&self, total: usize) -> u64 {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *state = PreloadState {
            epoch,
            loaded: 0,
            total,
            started: Instant::now(),
            eta_seconds: None,
        };
        epoch
    }

    /// Record one completion for the given epoch.
    ///
    /// Stale epochs are ignored, so late callbacks from a superseded
    /// run cannot corrupt a freshly reset pipeline.
    pub fn mark_loaded(&self, epoch: u64) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if state.epoch != epoch {
            tracing::debug!("ignoring completion from stale epoch {epoch}");
            return;
        }
        state.loaded += 1;
        if state.loaded >= state.total {
            state.eta_seconds = None;
        }
    }

    /// Current progress snapshot.
    #[must_use]
    pub fn progress(&self) -> PreloadProgress {
        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        PreloadProgress {
            loaded: state.loaded,
            total: state.total,
            eta_seconds: state.eta_seconds,
        }
    }

    /// Start preloading the given preview URLs.
    ///
    /// Spawns one task per URL with unbounded parallelism, plus a
    /// once-per-second ETA ticker scoped to the new epoch. The ticker
    /// exits on completion or when a later epoch supersedes this one.
    ///
    /// Returns the new epoch. Must be called within a tokio runtime.
    pub fn start(&self, urls: Vec<String>, loader: Arc<dyn PreviewLoader>) -> u64 {
        let epoch = self.begin_epoch(urls.len());

        for url in urls {
            let this = self.clone();
            let loader = Arc::clone(&loader);
            tokio::spawn(async move {
                if let Err(e) = loader.load(&url).await {
                    // Failures still count toward completion.
                    tracing::debug!("preload failed for {url}: {e}");
                }
                this.mark_loaded(epoch);
            });
        }

        let this = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(ETA_TICK);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so the ETA is
            // first computed a full interval in.
            tick.tick().await;
            loop {
                tick.tick().await;
                let mut state = this
                    .state
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                if state.epoch != epoch {
                    break;
                }
                if state.total == 0 || state.loaded >= state.total {
                    state.eta_seconds = None;
                    break;
                }
                state.eta_seconds = eta_seconds(state.started.elapsed(), state.loaded, state.total);
            }
        });

        epoch
    }
}

impl Default for Preloader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollageError;

    struct StubLoader {
        fail: bool,
    }

    #[async_trait]
    impl PreviewLoader for StubLoader {
        async fn load(&self, url: &str) -> CollageResult<(u32, u32)> {
            if self.fail || url.contains("bad") {
                Err(CollageError::ResourceLoad(format!("cannot decode {url}")))
            } else {
                Ok((1200, 800))
            }
        }
    }

    #[test]
    fn test_eta_undefined_at_boundaries() {
        let elapsed = Duration::from_secs(4);
        assert_eq!(eta_seconds(elapsed, 0, 10), None);
        assert_eq!(eta_seconds(elapsed, 0, 0), None);
        assert_eq!(eta_seconds(elapsed, 10, 10), None);
    }

    #[test]
    fn test_eta_from_completion_rate() {
        // 2 loaded in 4s -> 2s each -> 6 remaining -> 12s.
        assert_eq!(eta_seconds(Duration::from_secs(4), 2, 8), Some(12));
        // Rounded, not truncated.
        assert_eq!(eta_seconds(Duration::from_millis(4500), 3, 4), Some(2));
    }

    #[test]
    fn test_counters_reset_per_epoch() {
        let preloader = Preloader::new();
        let first = preloader.begin_epoch(3);
        preloader.mark_loaded(first);
        preloader.mark_loaded(first);
        assert_eq!(preloader.progress().loaded, 2);

        let second = preloader.begin_epoch(5);
        assert_ne!(first, second);
        let progress = preloader.progress();
        assert_eq!(progress.loaded, 0);
        assert_eq!(progress.total, 5);
    }

    #[test]
    fn test_stale_epoch_completions_are_inert() {
        let preloader = Preloader::new();
        let old = preloader.begin_epoch(3);
        preloader.begin_epoch(2);

        preloader.mark_loaded(old);
        preloader.mark_loaded(old);
        assert_eq!(preloader.progress().loaded, 0);
    }

    #[test]
    fn test_completion_clears_eta() {
        let preloader = Preloader::new();
        let epoch = preloader.begin_epoch(1);
        preloader.mark_loaded(epoch);
        let progress = preloader.progress();
        assert!(progress.is_complete());
        assert_eq!(progress.eta_seconds, None);
    }

    async fn wait_for_completion(preloader: &Preloader) -> PreloadProgress {
        for _ in 0..200 {
            let progress = preloader.progress();
            if progress.is_complete() {
                return progress;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("preload did not complete: {:?}", preloader.progress());
    }

    #[tokio::test]
    async fn test_pipeline_completes() {
        let preloader = Preloader::new();
        preloader.start(
            vec!["https://cdn.example/a".into(), "https://cdn.example/b".into()],
            Arc::new(StubLoader { fail: false }),
        );

        let progress = wait_for_completion(&preloader).await;
        assert_eq!(progress.loaded, 2);
        assert_eq!(progress.total, 2);
    }

    #[tokio::test]
    async fn test_failures_still_count_toward_completion() {
        let preloader = Preloader::new();
        preloader.start(
            vec![
                "https://cdn.example/ok".into(),
                "https://cdn.example/bad-1".into(),
                "https://cdn.example/bad-2".into(),
            ],
            Arc::new(StubLoader { fail: false }),
        );

        let progress = wait_for_completion(&preloader).await;
        assert_eq!(progress.loaded, 3);
    }

    #[tokio::test]
    async fn test_restart_supersedes_inflight_epoch() {
        let preloader = Preloader::new();
        preloader.start(
            vec!["https://cdn.example/a".into(); 4],
            Arc::new(StubLoader { fail: false }),
        );
        // New collection selected before the first run settles.
        preloader.start(
            vec!["https://cdn.example/z".into()],
            Arc::new(StubLoader { fail: true }),
        );

        let progress = wait_for_completion(&preloader).await;
        assert_eq!(progress.total, 1);
        assert_eq!(progress.loaded, 1);
    }

    #[tokio::test]
    async fn test_probe_media_size_failure_is_none() {
        let loader = StubLoader { fail: true };
        assert_eq!(probe_media_size(&loader, "https://cdn.example/x").await, None);

        let loader = StubLoader { fail: false };
        assert_eq!(
            probe_media_size(&loader, "https://cdn.example/x").await,
            Some((1200, 800))
        );
    }
}
