use crate::models::{InvalidImage, PipelineSettings, Photo};
use crate::services::transform::{self, TransformError};
use thiserror::Error;
use tokio::sync::watch;

/// Progress reported after metadata stripping.
pub const PROGRESS_STRIPPED: f32 = 0.25;
/// Progress reported after noise reduction.
pub const PROGRESS_DENOISED: f32 = 0.5;
/// Progress reported when compression begins.
pub const PROGRESS_COMPRESSING: f32 = 0.75;

/// Errors surfaced by the cleaning pipeline
#[derive(Error, Debug)]
pub enum CleaningError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImage),

    #[error("Processing failed: {0}")]
    ProcessingFailed(#[from] TransformError),

    #[error("Cleaning cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Sending half of a cancellation pair. See [`cancel_pair`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace stores the flag even when every token has been dropped
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving half of a cancellation pair, checked between pipeline steps and
/// between batch items.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a linked cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Report for one finished batch item.
#[derive(Debug)]
pub struct BatchItem<'a> {
    pub index: usize,
    /// Completed items divided by total items
    pub fraction: f32,
    pub input: &'a Photo,
    pub outcome: &'a Result<Photo, CleaningError>,
}

/// Strips metadata, reduces noise and recompresses photos.
///
/// Every step runs on tokio's blocking pool and is awaited before the next
/// one starts, so a single clean never has two steps in flight. Batches run
/// strictly one photo at a time, which keeps at most one full-resolution
/// image decoded.
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    settings: PipelineSettings,
    noise_reduction: bool,
}

impl CleaningPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            noise_reduction: true,
        }
    }

    /// Enable or disable the noise-reduction step. A disabled step passes the
    /// photo through unchanged but still reports its progress checkpoint.
    pub fn with_noise_reduction(mut self, enabled: bool) -> Self {
        self.noise_reduction = enabled;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Clean one photo.
    ///
    /// `on_progress` sees 0.0 on entry, 0.25 after stripping, 0.5 after noise
    /// reduction, 0.75 as compression begins and 1.0 on exit. The final 1.0 is
    /// reported on failure and cancellation too.
    pub async fn clean_photo<F>(
        &self,
        photo: &Photo,
        cancel: Option<&CancelToken>,
        mut on_progress: F,
    ) -> Result<Photo, CleaningError>
    where
        F: FnMut(f32) + Send,
    {
        on_progress(0.0);
        let result = self.run_steps(photo, cancel, &mut on_progress).await;
        on_progress(1.0);

        match &result {
            Ok(cleaned) => tracing::info!(
                "Cleaned photo: {} -> {} bytes",
                photo.encoded_len(),
                cleaned.encoded_len()
            ),
            Err(e) => tracing::warn!("Photo cleaning failed: {}", e),
        }

        result
    }

    async fn run_steps<F>(
        &self,
        photo: &Photo,
        cancel: Option<&CancelToken>,
        on_progress: &mut F,
    ) -> Result<Photo, CleaningError>
    where
        F: FnMut(f32) + Send,
    {
        check_cancelled(cancel)?;
        let input = photo.clone();
        let stripped =
            tokio::task::spawn_blocking(move || transform::strip_metadata(&input)).await?;
        on_progress(PROGRESS_STRIPPED);

        check_cancelled(cancel)?;
        let denoised = if self.noise_reduction {
            let noise = self.settings.noise;
            tokio::task::spawn_blocking(move || transform::reduce_noise(&stripped, &noise)).await?
        } else {
            stripped
        };
        on_progress(PROGRESS_DENOISED);

        check_cancelled(cancel)?;
        on_progress(PROGRESS_COMPRESSING);
        let compression = self.settings.compression;
        let input_len = photo.encoded_len();
        let limit = compression.target_bytes.min(input_len);
        let compressed = tokio::task::spawn_blocking(move || {
            transform::compress_within(&denoised, &compression, limit)
        })
        .await??;

        tracing::debug!(
            "Compression finished at quality {:.2} after {} attempts ({} bytes)",
            compressed.quality,
            compressed.attempts,
            compressed.photo.encoded_len()
        );

        if compressed.photo.encoded_len() <= input_len {
            return Ok(compressed.photo);
        }

        // Even the floor quality grew the photo: keep the input's own JPEG data
        match transform::strip_jpeg_segments(photo) {
            Some(stripped) => {
                tracing::debug!(
                    "Floor-quality encode was larger than the input, kept input JPEG data"
                );
                Ok(stripped)
            }
            None => Ok(compressed.photo),
        }
    }

    /// Clean photos one after another, dropping the ones that fail.
    ///
    /// The result keeps input order. `on_progress`, when given, receives
    /// `completed / total` after every item whether it succeeded or not.
    pub async fn batch_clean(
        &self,
        photos: &[Photo],
        cancel: Option<&CancelToken>,
        mut on_progress: Option<&mut (dyn FnMut(f32) + Send)>,
    ) -> Vec<Photo> {
        self.batch_clean_each(photos, cancel, |item| {
            if let Some(callback) = on_progress.as_mut() {
                callback(item.fraction);
            }
        })
        .await
    }

    /// Like [`batch_clean`](Self::batch_clean) but hands every finished item,
    /// with its outcome, to `on_item`.
    ///
    /// A cancelled batch stops before the next item and returns what has been
    /// cleaned so far. Unprocessed items are not reported.
    pub async fn batch_clean_each<F>(
        &self,
        photos: &[Photo],
        cancel: Option<&CancelToken>,
        mut on_item: F,
    ) -> Vec<Photo>
    where
        F: FnMut(BatchItem<'_>) + Send,
    {
        let total = photos.len();
        let mut cleaned = Vec::with_capacity(total);

        tracing::info!("Starting batch of {} photos", total);

        for (index, photo) in photos.iter().enumerate() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                tracing::warn!("Batch cancelled after {} of {} photos", index, total);
                break;
            }

            let outcome = self.clean_photo(photo, cancel, |_| {}).await;

            match &outcome {
                Err(CleaningError::Cancelled) => {
                    tracing::warn!("Batch cancelled during photo {} of {}", index + 1, total);
                    break;
                }
                Err(e) => tracing::warn!("Skipping photo {} of {}: {}", index + 1, total, e),
                Ok(_) => {}
            }

            on_item(BatchItem {
                index,
                fraction: (index + 1) as f32 / total as f32,
                input: photo,
                outcome: &outcome,
            });

            if let Ok(result) = outcome {
                cleaned.push(result);
            }
        }

        tracing::info!("Batch finished: {} of {} photos cleaned", cleaned.len(), total);
        cleaned
    }
}

impl Default for CleaningPipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

fn check_cancelled(cancel: Option<&CancelToken>) -> Result<(), CleaningError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(CleaningError::Cancelled),
        _ => Ok(()),
    }
}
