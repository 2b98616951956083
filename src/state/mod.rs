// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for the presentation layer.

use crate::models::{AppState, PhotoStatus, Presentation, Route};
use crate::services::analyzer::CleaningSuggestion;
use crate::services::statistics::CleaningTotals;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify the presentation layer about state changes without
/// requiring it to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The navigation path has changed
    NavigationChanged { path: Vec<Route> },

    /// The sheet slot has changed (None = dismissed)
    SheetChanged { sheet: Option<Presentation> },

    /// The full-screen cover slot has changed (None = dismissed)
    CoverChanged { cover: Option<Presentation> },

    /// Onboarding completion flag has changed
    OnboardingChanged { completed: bool },

    /// A cleaning run has started
    CleaningStarted { total_photos: usize },

    /// Progress of the running clean has been updated
    ProgressUpdated {
        progress: f32,
        current_photo: Option<String>,
    },

    /// A cleaning run has finished
    CleaningFinished { cleaned: usize, failed: usize },

    /// A photo has been processed
    PhotoProcessed {
        photo: String,
        status: PhotoStatus,
        message: String,
    },

    /// Current operation has changed
    OperationChanged { operation: String },

    /// Persistent totals have changed
    StatisticsChanged { total_cleaned: u64, space_saved: u64 },

    /// New analysis suggestions are available
    SuggestionsChanged { count: usize },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// Navigation commands ([`navigate`](Self::navigate), [`go_back`](Self::go_back),
/// [`present_sheet`](Self::present_sheet), ...) are never rejected. A command
/// that leaves the router unchanged emits no event.
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a clone of the current state, safe to use without holding locks.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let depth = state_manager.read(|state| state.router.depth());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.state_tx.send(change);
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.router.path() != new.router.path() {
            changes.push(StateChange::NavigationChanged {
                path: new.router.path().to_vec(),
            });
        }

        if old.router.sheet() != new.router.sheet() {
            changes.push(StateChange::SheetChanged {
                sheet: new.router.sheet(),
            });
        }

        if old.router.cover() != new.router.cover() {
            changes.push(StateChange::CoverChanged {
                cover: new.router.cover(),
            });
        }

        if old.onboarding_completed != new.onboarding_completed {
            changes.push(StateChange::OnboardingChanged {
                completed: new.onboarding_completed,
            });
        }

        if old.is_cleaning != new.is_cleaning {
            if new.is_cleaning {
                changes.push(StateChange::CleaningStarted {
                    total_photos: new.total_photos,
                });
            } else {
                changes.push(StateChange::CleaningFinished {
                    cleaned: new.cleaned_photos.len(),
                    failed: new.failed_photos.len(),
                });
            }
        }

        if old.progress != new.progress || old.current_photo != new.current_photo {
            changes.push(StateChange::ProgressUpdated {
                progress: new.progress,
                current_photo: new.current_photo.clone(),
            });
        }

        if old.current_operation != new.current_operation {
            changes.push(StateChange::OperationChanged {
                operation: new.current_operation.clone(),
            });
        }

        if old.totals != new.totals {
            changes.push(StateChange::StatisticsChanged {
                total_cleaned: new.totals.total_cleaned,
                space_saved: new.totals.space_saved,
            });
        }

        if old.last_suggestions != new.last_suggestions {
            changes.push(StateChange::SuggestionsChanged {
                count: new.last_suggestions.len(),
            });
        }

        changes
    }

    // Navigation commands

    /// Push `route` onto the navigation path
    pub fn navigate(&self, route: Route) -> Vec<StateChange> {
        tracing::debug!("Navigate to {}", route);
        self.update(|state| state.router.navigate(route))
    }

    /// Pop the top route, if any
    pub fn go_back(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.router.go_back();
        })
    }

    /// Clear the navigation path
    pub fn reset_to_root(&self) -> Vec<StateChange> {
        self.update(|state| state.router.reset_to_root())
    }

    /// Show `content` as a sheet, replacing any current sheet
    pub fn present_sheet(&self, content: Presentation) -> Vec<StateChange> {
        self.update(|state| {
            state.router.present_sheet(content);
        })
    }

    /// Show `content` as a full-screen cover, replacing any current cover
    pub fn present_cover(&self, content: Presentation) -> Vec<StateChange> {
        self.update(|state| {
            state.router.present_cover(content);
        })
    }

    pub fn dismiss_sheet(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.router.dismiss_sheet();
        })
    }

    pub fn dismiss_cover(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.router.dismiss_cover();
        })
    }

    /// Mark onboarding finished and take the onboarding cover down
    pub fn complete_onboarding(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.onboarding_completed = true;
            if state.router.cover() == Some(Presentation::Onboarding) {
                state.router.dismiss_cover();
            }
        })
    }

    // Cleaning run commands

    /// Start a cleaning run over the named photos
    pub fn start_cleaning(&self, photos: Vec<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.is_cleaning = true;
            state.progress = 0.0;
            state.total_photos = photos.len();
            state.photos_to_clean = photos;
            state.current_photo = None;
            state.current_operation = "Starting cleaning...".to_string();
            state.cleaned_photos.clear();
            state.failed_photos.clear();
            state.run_bytes_saved = 0;
        })
    }

    /// Set the progress of the running clean, clamped to [0, 1]
    pub fn set_progress(&self, progress: f32) -> Vec<StateChange> {
        self.update(|state| {
            state.progress = progress.clamp(0.0, 1.0);
        })
    }

    /// Update the photo and operation currently being worked on
    pub fn update_progress(&self, photo: String, operation: String) -> Vec<StateChange> {
        self.update(|state| {
            state.current_photo = Some(photo);
            state.current_operation = operation;
        })
    }

    /// Record the result of processing a photo
    ///
    /// # Arguments
    /// * `photo` - Name of the photo that was processed
    /// * `status` - Whether it was cleaned or failed
    /// * `message` - Human-readable message about the result
    /// * `bytes_saved` - Bytes saved by the clean (0 for failures)
    pub fn add_photo_result(
        &self,
        photo: String,
        status: PhotoStatus,
        message: String,
        bytes_saved: u64,
    ) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(photo.clone(), status, bytes_saved);
        });

        let event = StateChange::PhotoProcessed {
            photo,
            status,
            message,
        };
        self.emit(event.clone());
        changes.push(event);

        changes
    }

    /// Finish the cleaning run
    pub fn finish_cleaning(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_cleaning = false;
            state.current_photo = None;
            state.current_operation = state.run_summary();
        })
    }

    /// Replace the persistent totals shown to the user
    pub fn set_totals(&self, totals: CleaningTotals) -> Vec<StateChange> {
        self.update(|state| state.totals = totals)
    }

    /// Publish the suggestions of the latest analysis
    pub fn set_suggestions(&self, suggestions: Vec<CleaningSuggestion>) -> Vec<StateChange> {
        self.update(|state| state.last_suggestions = suggestions)
    }

    /// Reset all cleaning-related state
    pub fn reset_cleaning_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.reset_cleaning_state());

        self.emit(StateChange::StateReset);
        changes.push(StateChange::StateReset);

        changes
    }

    /// Load configuration from UserConfig
    ///
    /// A user who has not finished onboarding gets the onboarding flow as a
    /// full-screen cover.
    pub fn load_from_user_config(
        &self,
        user_config: &crate::models::UserConfig,
    ) -> Vec<StateChange> {
        self.update(|state| {
            let settings = &user_config.user_settings;
            state.onboarding_completed = settings.onboarding_completed;

            if !settings.onboarding_completed {
                state.router.present_cover(Presentation::Onboarding);
            }

            tracing::info!(
                "Loaded user config: onboarding_completed={}, output_dir={}",
                settings.onboarding_completed,
                settings.output_dir
            );
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserConfig;

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.is_cleaning);
        assert!(state.router.is_at_root());
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_navigate_and_go_back() {
        let manager = StateManager::new();

        manager.navigate(Route::Settings);
        manager.navigate(Route::Profile);
        let changes = manager.go_back();

        assert_eq!(
            changes,
            vec![StateChange::NavigationChanged {
                path: vec![Route::Settings]
            }]
        );
        assert_eq!(manager.read(|s| s.router.path().to_vec()), vec![Route::Settings]);
    }

    #[test]
    fn test_go_back_at_root_emits_nothing() {
        let manager = StateManager::new();
        assert!(manager.go_back().is_empty());
        assert!(manager.reset_to_root().is_empty());
    }

    #[test]
    fn test_reset_to_root() {
        let manager = StateManager::new();
        manager.navigate(Route::Gallery);
        manager.navigate(Route::PhotoDetail);

        let changes = manager.reset_to_root();

        assert_eq!(changes, vec![StateChange::NavigationChanged { path: vec![] }]);
        assert!(manager.read(|s| s.router.is_at_root()));
    }

    #[test]
    fn test_present_sheet_replaces() {
        let manager = StateManager::new();
        manager.present_sheet(Presentation::Paywall);
        let changes = manager.present_sheet(Presentation::Settings);

        assert_eq!(
            changes,
            vec![StateChange::SheetChanged {
                sheet: Some(Presentation::Settings)
            }]
        );
        assert_eq!(manager.read(|s| s.router.sheet()), Some(Presentation::Settings));

        // Presenting the same content again is not a change
        assert!(manager.present_sheet(Presentation::Settings).is_empty());
    }

    #[test]
    fn test_dismiss_cover() {
        let manager = StateManager::new();
        manager.present_cover(Presentation::CleaningProgress);

        let changes = manager.dismiss_cover();
        assert_eq!(changes, vec![StateChange::CoverChanged { cover: None }]);
        assert!(manager.dismiss_cover().is_empty());
    }

    #[test]
    fn test_onboarding_from_user_config() {
        let manager = StateManager::new();
        manager.load_from_user_config(&UserConfig::default());

        assert_eq!(manager.read(|s| s.router.cover()), Some(Presentation::Onboarding));

        let changes = manager.complete_onboarding();
        assert!(changes.contains(&StateChange::OnboardingChanged { completed: true }));
        assert!(changes.contains(&StateChange::CoverChanged { cover: None }));
    }

    #[test]
    fn test_onboarding_completed_skips_cover() {
        let manager = StateManager::new();
        let mut config = UserConfig::default();
        config.user_settings.onboarding_completed = true;

        manager.load_from_user_config(&config);

        assert_eq!(manager.read(|s| s.router.cover()), None);
    }

    #[test]
    fn test_start_cleaning() {
        let manager = StateManager::new();
        let photos = vec!["a.jpg".to_string(), "b.jpg".to_string()];

        let changes = manager.start_cleaning(photos.clone());

        assert!(matches!(changes[0], StateChange::CleaningStarted { total_photos: 2 }));
        let state = manager.snapshot();
        assert!(state.is_cleaning);
        assert_eq!(state.photos_to_clean, photos);
    }

    #[test]
    fn test_set_progress_clamps() {
        let manager = StateManager::new();

        manager.set_progress(1.5);
        assert_eq!(manager.read(|s| s.progress), 1.0);

        manager.set_progress(-0.2);
        assert_eq!(manager.read(|s| s.progress), 0.0);
    }

    #[test]
    fn test_set_progress_emits_once_per_change() {
        let manager = StateManager::new();

        let changes = manager.set_progress(0.25);
        assert_eq!(
            changes,
            vec![StateChange::ProgressUpdated {
                progress: 0.25,
                current_photo: None
            }]
        );
        assert!(manager.set_progress(0.25).is_empty());
    }

    #[test]
    fn test_add_photo_result_and_finish() {
        let manager = StateManager::new();
        manager.start_cleaning(vec!["a.jpg".to_string(), "b.jpg".to_string()]);

        let changes = manager.add_photo_result(
            "a.jpg".to_string(),
            PhotoStatus::Cleaned,
            "Saved 1.0 KB".to_string(),
            1024,
        );
        assert!(changes.iter().any(|c| matches!(c, StateChange::PhotoProcessed { .. })));

        manager.add_photo_result(
            "b.jpg".to_string(),
            PhotoStatus::Failed,
            "Error".to_string(),
            0,
        );

        let changes = manager.finish_cleaning();
        assert!(changes.contains(&StateChange::CleaningFinished { cleaned: 1, failed: 1 }));

        let state = manager.snapshot();
        assert_eq!(state.current_operation, "1 cleaned, 1 failed, 1.0 KB saved");
    }

    #[test]
    fn test_set_totals() {
        let manager = StateManager::new();
        let totals = CleaningTotals {
            total_cleaned: 3,
            space_saved: 4096,
        };

        let changes = manager.set_totals(totals);

        assert_eq!(
            changes,
            vec![StateChange::StatisticsChanged {
                total_cleaned: 3,
                space_saved: 4096
            }]
        );
    }

    #[test]
    fn test_reset_cleaning_state() {
        let manager = StateManager::new();
        manager.start_cleaning(vec!["a.jpg".to_string()]);
        manager.set_suggestions(vec![CleaningSuggestion::ContainsMetadata]);

        let changes = manager.reset_cleaning_state();

        assert!(changes.contains(&StateChange::StateReset));
        let state = manager.snapshot();
        assert!(!state.is_cleaning);
        assert_eq!(state.total_photos, 0);
        assert!(state.last_suggestions.is_empty());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.navigate(Route::Gallery);

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            StateChange::NavigationChanged {
                path: vec![Route::Gallery]
            }
        );
    }

    #[test]
    fn test_clone_state_manager() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.navigate(Route::Statistics);

        assert_eq!(manager2.read(|s| s.router.current()), Some(Route::Statistics));
    }
}
