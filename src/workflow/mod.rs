// Cleaning workflow
//
// Drives the pipeline against the shared StateManager: starts and finishes
// runs, forwards progress, records per-photo results and keeps the persistent
// statistics up to date.

use crate::metrics::Metrics;
use crate::models::config::{FEATURE_ANALYZE_BEFORE_CLEAN, FEATURE_NOISE_REDUCTION};
use crate::models::{CleanerConfig, Photo, PhotoStatus};
use crate::services::{
    CancelToken, CleaningError, CleaningPipeline, CleaningSuggestion, PhotoAnalyzer,
    StatisticsStore,
};
use crate::state::StateManager;
use std::sync::Arc;
use std::time::Instant;

/// A photo together with the name it is shown under.
#[derive(Clone, Debug)]
pub struct NamedPhoto {
    pub name: String,
    pub photo: Photo,
}

impl NamedPhoto {
    pub fn new(name: impl Into<String>, photo: Photo) -> Self {
        Self {
            name: name.into(),
            photo,
        }
    }

    /// Probe raw file contents. Fails with [`CleaningError::InvalidImage`]
    /// before any cleaning step runs.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CleaningError> {
        Ok(Self::new(name, Photo::from_bytes(bytes)?))
    }
}

/// Coordinates a [`CleaningPipeline`] with application state.
///
/// Every state mutation goes through the shared [`StateManager`], so
/// subscribers see `CleaningStarted`, `ProgressUpdated`, `PhotoProcessed`
/// and `CleaningFinished` in that order for every run.
///
/// Statistics store failures are logged and counted but never fail a clean.
pub struct CleaningWorkflow {
    state: Arc<StateManager>,
    pipeline: CleaningPipeline,
    analyzer: PhotoAnalyzer,
    statistics: Arc<dyn StatisticsStore>,
    metrics: Arc<Metrics>,
    analyze_before_clean: bool,
}

impl CleaningWorkflow {
    pub fn new(
        state: Arc<StateManager>,
        pipeline: CleaningPipeline,
        analyzer: PhotoAnalyzer,
        statistics: Arc<dyn StatisticsStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            pipeline,
            analyzer,
            statistics,
            metrics,
            analyze_before_clean: false,
        }
    }

    /// Build a workflow from the cleaner configuration.
    ///
    /// The `noise_reduction` flag gates the noise step and the
    /// `analyze_before_clean` flag publishes suggestions before each single clean.
    pub fn from_config(
        config: &CleanerConfig,
        state: Arc<StateManager>,
        statistics: Arc<dyn StatisticsStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let pipeline = CleaningPipeline::new(config.pipeline)
            .with_noise_reduction(config.is_enabled(FEATURE_NOISE_REDUCTION));
        let analyzer = PhotoAnalyzer::new(config.analyzer);

        let mut workflow = Self::new(state, pipeline, analyzer, statistics, metrics);
        workflow.analyze_before_clean = config.is_enabled(FEATURE_ANALYZE_BEFORE_CLEAN);
        workflow
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Read the persistent totals into state.
    pub fn load_totals(&self) {
        match self.statistics.load() {
            Ok(totals) => {
                let changes = self.state.set_totals(totals);
                self.metrics.record_state_updates(changes.len());
            }
            Err(e) => {
                tracing::warn!("Failed to load statistics: {:#}", e);
                self.metrics.record_statistics_error();
            }
        }
    }

    /// Analyze a photo and publish the suggestions.
    pub fn analyze(&self, photo: &Photo) -> Vec<CleaningSuggestion> {
        let suggestions = self.analyzer.analyze(photo);
        tracing::debug!("Analysis produced {} suggestions", suggestions.len());

        let changes = self.state.set_suggestions(suggestions.clone());
        self.metrics.record_state_updates(changes.len());
        suggestions
    }

    /// Clean one photo as a run of its own.
    ///
    /// Progress from the pipeline is forwarded to state. The error is
    /// returned to the caller after being recorded as a failed result; the run
    /// is finished either way. A cancelled clean records no result.
    pub async fn clean_single(
        &self,
        name: &str,
        photo: &Photo,
        cancel: Option<&CancelToken>,
    ) -> Result<Photo, CleaningError> {
        if self.analyze_before_clean {
            self.analyze(photo);
        }

        let changes = self.state.start_cleaning(vec![name.to_string()]);
        self.metrics.record_state_updates(changes.len());
        let changes = self
            .state
            .update_progress(name.to_string(), format!("Cleaning {}...", name));
        self.metrics.record_state_updates(changes.len());

        let started = Instant::now();
        let state = &self.state;
        let metrics = &self.metrics;
        let result = self
            .pipeline
            .clean_photo(photo, cancel, |progress| {
                metrics.record_state_updates(state.set_progress(progress).len());
            })
            .await;
        self.metrics.record_cleaning_time(started.elapsed());

        match &result {
            Ok(cleaned) => self.record_success(name, photo, cleaned),
            Err(CleaningError::Cancelled) => tracing::info!("Cleaning of {} cancelled", name),
            Err(e) => self.record_failure(name, e),
        }

        let changes = self.state.finish_cleaning();
        self.metrics.record_state_updates(changes.len());

        result
    }

    /// Clean photos one after another as a single run.
    ///
    /// Failed photos are recorded and dropped. The cleaned photos come back
    /// in input order under the names they came with. A cancelled run returns
    /// what was cleaned before the cancellation.
    pub async fn clean_batch(
        &self,
        items: &[NamedPhoto],
        cancel: Option<&CancelToken>,
    ) -> Vec<NamedPhoto> {
        let names: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
        let photos: Vec<Photo> = items.iter().map(|item| item.photo.clone()).collect();

        let changes = self.state.start_cleaning(names);
        self.metrics.record_state_updates(changes.len());

        let started = Instant::now();
        let mut cleaned_indices = Vec::with_capacity(items.len());
        let cleaned = self
            .pipeline
            .batch_clean_each(&photos, cancel, |item| {
                let name = &items[item.index].name;
                let changes = self
                    .state
                    .update_progress(name.clone(), format!("Cleaned {}", name));
                self.metrics.record_state_updates(changes.len());

                match item.outcome {
                    Ok(result) => {
                        self.record_success(name, item.input, result);
                        cleaned_indices.push(item.index);
                    }
                    Err(e) => self.record_failure(name, e),
                }

                let changes = self.state.set_progress(item.fraction);
                self.metrics.record_state_updates(changes.len());
            })
            .await;
        self.metrics.record_cleaning_time(started.elapsed());

        let changes = self.state.finish_cleaning();
        self.metrics.record_state_updates(changes.len());

        cleaned_indices
            .into_iter()
            .zip(cleaned)
            .map(|(index, photo)| NamedPhoto::new(items[index].name.clone(), photo))
            .collect()
    }

    fn record_success(&self, name: &str, input: &Photo, cleaned: &Photo) {
        let saved = input.encoded_len().saturating_sub(cleaned.encoded_len()) as u64;
        self.metrics.record_photo_cleaned(saved);

        match self.statistics.record_cleaned(saved) {
            Ok(totals) => {
                let changes = self.state.set_totals(totals);
                self.metrics.record_state_updates(changes.len());
            }
            Err(e) => {
                tracing::warn!("Failed to update statistics after {}: {:#}", name, e);
                self.metrics.record_statistics_error();
            }
        }

        let changes = self.state.add_photo_result(
            name.to_string(),
            PhotoStatus::Cleaned,
            format!("Saved {} bytes", saved),
            saved,
        );
        self.metrics.record_state_updates(changes.len());
    }

    fn record_failure(&self, name: &str, error: &CleaningError) {
        tracing::error!("Photo {} failed: {}", name, error);
        self.metrics.record_photo_failed();

        let changes = self.state.add_photo_result(
            name.to_string(),
            PhotoStatus::Failed,
            format!("Error: {}", error),
            0,
        );
        self.metrics.record_state_updates(changes.len());
    }
}
