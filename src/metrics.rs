// Performance metrics module
//
// Provides lightweight metrics tracking for cleaning runs

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Process-wide cleaning metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Shared as `Arc<Metrics>` between the workflow and the binary, which logs
/// the summary on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of photos successfully cleaned
    pub photos_cleaned: AtomicUsize,

    /// Total number of photos that failed to clean
    pub photos_failed: AtomicUsize,

    /// Total bytes saved by successful cleans
    pub bytes_saved: AtomicU64,

    /// Total cleaning time in milliseconds
    pub total_cleaning_time_ms: AtomicU64,

    /// Number of state updates performed
    pub state_updates: AtomicU64,

    /// Number of statistics store errors
    pub statistics_errors: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            photos_cleaned: AtomicUsize::new(0),
            photos_failed: AtomicUsize::new(0),
            bytes_saved: AtomicU64::new(0),
            total_cleaning_time_ms: AtomicU64::new(0),
            state_updates: AtomicU64::new(0),
            statistics_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a cleaned photo and the bytes it saved
    pub fn record_photo_cleaned(&self, bytes_saved: u64) {
        self.photos_cleaned.fetch_add(1, Ordering::Relaxed);
        self.bytes_saved.fetch_add(bytes_saved, Ordering::Relaxed);
    }

    pub fn record_photo_failed(&self) {
        self.photos_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record cleaning time for a photo
    pub fn record_cleaning_time(&self, duration: Duration) {
        self.total_cleaning_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record `count` state updates
    pub fn record_state_updates(&self, count: usize) {
        self.state_updates.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_statistics_error(&self) {
        self.statistics_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average cleaning time per processed photo in milliseconds
    pub fn avg_cleaning_time_ms(&self) -> f64 {
        let total = self.total_cleaning_time_ms.load(Ordering::Relaxed);
        let count = self.photos_cleaned.load(Ordering::Relaxed)
            + self.photos_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Cleaning Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Photos: {} cleaned, {} failed, {} bytes saved",
            self.photos_cleaned.load(Ordering::Relaxed),
            self.photos_failed.load(Ordering::Relaxed),
            self.bytes_saved.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total cleaning time: {:.2}s (avg: {:.2}ms per photo)",
            self.total_cleaning_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_cleaning_time_ms()
        );
        tracing::info!(
            "State updates: {}, statistics errors: {}",
            self.state_updates.load(Ordering::Relaxed),
            self.statistics_errors.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
