use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Mutex;

/// Running totals shown on the statistics screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningTotals {
    /// Number of photos cleaned successfully
    #[serde(rename = "Total Cleaned", default)]
    pub total_cleaned: u64,

    /// Bytes saved across all cleaned photos
    #[serde(rename = "Space Saved", default)]
    pub space_saved: u64,
}

impl CleaningTotals {
    pub fn record(&mut self, bytes_saved: u64) {
        self.total_cleaned += 1;
        self.space_saved += bytes_saved;
    }

    /// Space saved formatted for display, e.g. "12.4 MB"
    pub fn space_saved_display(&self) -> String {
        const KB: f64 = 1024.0;
        let bytes = self.space_saved as f64;
        if bytes >= KB * KB * KB {
            format!("{:.1} GB", bytes / (KB * KB * KB))
        } else if bytes >= KB * KB {
            format!("{:.1} MB", bytes / (KB * KB))
        } else if bytes >= KB {
            format!("{:.1} KB", bytes / KB)
        } else {
            format!("{} B", self.space_saved)
        }
    }
}

/// Persistent counter of cleaned photos and bytes saved.
///
/// Updated once per successful clean and read back for display.
#[cfg_attr(test, mockall::automock)]
pub trait StatisticsStore: Send + Sync {
    fn load(&self) -> Result<CleaningTotals>;

    /// Count one more cleaned photo and add `bytes_saved`, returning the new totals.
    fn record_cleaned(&self, bytes_saved: u64) -> Result<CleaningTotals>;
}

/// Statistics kept in a YAML file.
///
/// A missing file reads as zero totals. Updates are read-modify-write under a
/// mutex so concurrent recorders in one process never lose an increment.
#[derive(Debug)]
pub struct YamlStatisticsStore {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl YamlStatisticsStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_totals(&self) -> Result<CleaningTotals> {
        if !self.path.exists() {
            return Ok(CleaningTotals::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read statistics: {}", self.path))?;

        if contents.trim().is_empty() {
            return Ok(CleaningTotals::default());
        }

        serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse statistics: {}", self.path))
    }

    fn write_totals(&self, totals: &CleaningTotals) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(totals).context("Failed to serialize statistics")?;

        fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write statistics: {}", self.path))
    }
}

impl StatisticsStore for YamlStatisticsStore {
    fn load(&self) -> Result<CleaningTotals> {
        let _guard = self.lock.lock().unwrap();
        self.read_totals()
    }

    fn record_cleaned(&self, bytes_saved: u64) -> Result<CleaningTotals> {
        let _guard = self.lock.lock().unwrap();

        let mut totals = self.read_totals()?;
        totals.record(bytes_saved);
        self.write_totals(&totals)?;

        tracing::debug!(
            "Statistics updated: {} cleaned, {} bytes saved",
            totals.total_cleaned,
            totals.space_saved
        );

        Ok(totals)
    }
}

/// In-process statistics, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStatisticsStore {
    totals: Mutex<CleaningTotals>,
}

impl MemoryStatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatisticsStore for MemoryStatisticsStore {
    fn load(&self) -> Result<CleaningTotals> {
        Ok(*self.totals.lock().unwrap())
    }

    fn record_cleaned(&self, bytes_saved: u64) -> Result<CleaningTotals> {
        let mut totals = self.totals.lock().unwrap();
        totals.record(bytes_saved);
        Ok(*totals)
    }
}
