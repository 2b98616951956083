use crate::models::Router;
use crate::services::analyzer::CleaningSuggestion;
use crate::services::statistics::CleaningTotals;

/// Outcome of cleaning one photo
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoStatus {
    Cleaned,
    Failed,
}

impl PhotoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhotoStatus::Cleaned => "cleaned",
            PhotoStatus::Failed => "failed",
        }
    }
}

/// Single source of truth for all application state.
///
/// Holds navigation, the progress of the running clean, per-run results and
/// the persistent totals as last read back.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never mutate it directly - use the manager so change events are emitted:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
#[derive(Clone, Debug)]
pub struct AppState {
    // Navigation
    pub router: Router,
    pub onboarding_completed: bool,

    // Runtime state
    pub is_cleaning: bool,
    pub current_photo: Option<String>,
    pub current_operation: String,

    // Progress state
    pub progress: f32,
    pub total_photos: usize,
    pub photos_to_clean: Vec<String>,

    // Results of the current run, in completion order
    pub cleaned_photos: Vec<String>,
    pub failed_photos: Vec<String>,
    pub run_bytes_saved: u64,

    // Persistent totals and analysis
    pub totals: CleaningTotals,
    pub last_suggestions: Vec<CleaningSuggestion>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            router: Router::default(),
            onboarding_completed: false,

            is_cleaning: false,
            current_photo: None,
            current_operation: String::new(),

            progress: 0.0,
            total_photos: 0,
            photos_to_clean: Vec::new(),

            cleaned_photos: Vec::new(),
            failed_photos: Vec::new(),
            run_bytes_saved: 0,

            totals: CleaningTotals::default(),
            last_suggestions: Vec::new(),
        }
    }
}

impl AppState {
    /// Number of photos finished in the current run (cleaned or failed).
    pub fn processed_count(&self) -> usize {
        self.cleaned_photos.len() + self.failed_photos.len()
    }

    /// Get current cleaning statistics.
    ///
    /// Returns a tuple of (cleaned, failed, total).
    pub fn cleaning_stats(&self) -> (usize, usize, usize) {
        (
            self.cleaned_photos.len(),
            self.failed_photos.len(),
            self.total_photos,
        )
    }

    /// Reset all cleaning-related state to initial values.
    ///
    /// Navigation and persistent totals are left alone.
    pub fn reset_cleaning_state(&mut self) {
        self.is_cleaning = false;
        self.current_photo = None;
        self.current_operation.clear();
        self.progress = 0.0;
        self.total_photos = 0;
        self.photos_to_clean.clear();
        self.cleaned_photos.clear();
        self.failed_photos.clear();
        self.run_bytes_saved = 0;
        self.last_suggestions.clear();
    }

    /// Record a finished photo.
    pub fn add_result(&mut self, photo: String, status: PhotoStatus, bytes_saved: u64) {
        match status {
            PhotoStatus::Cleaned => {
                self.cleaned_photos.push(photo);
                self.run_bytes_saved += bytes_saved;
            }
            PhotoStatus::Failed => {
                self.failed_photos.push(photo);
            }
        }
    }

    /// Summary line for the finished run, e.g. "2 cleaned, 1 failed, 1.2 MB saved"
    pub fn run_summary(&self) -> String {
        let saved = CleaningTotals {
            total_cleaned: 0,
            space_saved: self.run_bytes_saved,
        };

        let mut parts = vec![format!("{} cleaned", self.cleaned_photos.len())];
        if !self.failed_photos.is_empty() {
            parts.push(format!("{} failed", self.failed_photos.len()));
        }
        parts.push(format!("{} saved", saved.space_saved_display()));
        parts.join(", ")
    }
}
