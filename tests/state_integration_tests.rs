//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits navigation, sheet and cover events on routing commands
//! - Emits cleaning run events in order
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple tasks

use photoclean::models::PhotoStatus;
use photoclean::{Presentation, Route, StateChange, StateManager, UserConfig};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<StateChange>) -> StateChange {
    timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed")
}

#[tokio::test]
async fn test_navigation_events_emitted() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.navigate(Route::Settings);
    state.navigate(Route::Profile);
    state.go_back();

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::NavigationChanged {
            path: vec![Route::Settings]
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::NavigationChanged {
            path: vec![Route::Settings, Route::Profile]
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::NavigationChanged {
            path: vec![Route::Settings]
        }
    );
}

#[tokio::test]
async fn test_sheet_replacement_and_dismissal() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.present_sheet(Presentation::Paywall);
    state.present_sheet(Presentation::Settings);
    state.dismiss_sheet();

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::SheetChanged {
            sheet: Some(Presentation::Paywall)
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::SheetChanged {
            sheet: Some(Presentation::Settings)
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::SheetChanged { sheet: None }
    );
}

#[tokio::test]
async fn test_sheet_and_cover_are_independent() {
    let state = Arc::new(StateManager::new());

    state.present_cover(Presentation::CleaningProgress);
    state.present_sheet(Presentation::PhotoPicker);
    state.dismiss_sheet();

    let snapshot = state.snapshot();
    assert_eq!(snapshot.router.cover(), Some(Presentation::CleaningProgress));
    assert_eq!(snapshot.router.sheet(), None);
}

#[tokio::test]
async fn test_onboarding_cover_on_first_run() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.load_from_user_config(&UserConfig::default());

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::CoverChanged {
            cover: Some(Presentation::Onboarding)
        }
    );

    state.complete_onboarding();

    let mut found_completed = false;
    let mut found_dismissed = false;
    for _ in 0..2 {
        match next_event(&mut rx).await {
            StateChange::OnboardingChanged { completed: true } => found_completed = true,
            StateChange::CoverChanged { cover: None } => found_dismissed = true,
            other => panic!("Unexpected event: {:?}", other),
        }
    }
    assert!(found_completed, "Should receive OnboardingChanged event");
    assert!(found_dismissed, "Should receive CoverChanged event");
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();
    let mut rx3 = state.subscribe();

    state.update(|s| {
        s.is_cleaning = true;
        s.total_photos = 5;
    });

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        let event = next_event(rx).await;
        assert_eq!(event, StateChange::CleaningStarted { total_photos: 5 });
    }
}

#[tokio::test]
async fn test_progress_updates_emit_events() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.update_progress("IMG_0001.jpg".to_string(), "Cleaning...".to_string());

    let mut received_progress = false;
    let mut received_operation = false;

    for _ in 0..2 {
        match next_event(&mut rx).await {
            StateChange::ProgressUpdated { current_photo, .. } => {
                assert_eq!(current_photo.as_deref(), Some("IMG_0001.jpg"));
                received_progress = true;
            }
            StateChange::OperationChanged { .. } => received_operation = true,
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    assert!(received_progress, "Should receive ProgressUpdated event");
    assert!(received_operation, "Should receive OperationChanged event");
}

#[tokio::test]
async fn test_photo_result_events() {
    let state = Arc::new(StateManager::new());
    state.start_cleaning(vec!["IMG_0001.jpg".to_string()]);
    let mut rx = state.subscribe();

    state.add_photo_result(
        "IMG_0001.jpg".to_string(),
        PhotoStatus::Cleaned,
        "Saved 2048 bytes".to_string(),
        2048,
    );

    match next_event(&mut rx).await {
        StateChange::PhotoProcessed {
            photo,
            status,
            message,
        } => {
            assert_eq!(photo, "IMG_0001.jpg");
            assert_eq!(status, PhotoStatus::Cleaned);
            assert_eq!(message, "Saved 2048 bytes");
        }
        other => panic!("Expected PhotoProcessed, got: {:?}", other),
    }

    assert_eq!(state.read(|s| s.run_bytes_saved), 2048);
}

#[tokio::test]
async fn test_cleaning_run_events() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.start_cleaning(vec!["a.jpg".to_string()]);

    let mut found_cleaning_started = false;
    for _ in 0..3 {
        match timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Ok(StateChange::CleaningStarted { .. })) => {
                found_cleaning_started = true;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }
    assert!(
        found_cleaning_started,
        "Should receive CleaningStarted event"
    );

    state.add_photo_result(
        "a.jpg".to_string(),
        PhotoStatus::Failed,
        "Error: corrupt".to_string(),
        0,
    );
    state.finish_cleaning();

    let mut found_cleaning_finished = false;
    for _ in 0..5 {
        match timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Ok(StateChange::CleaningFinished { cleaned, failed })) => {
                assert_eq!((cleaned, failed), (0, 1));
                found_cleaning_finished = true;
                break;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }
    assert!(
        found_cleaning_finished,
        "Should receive CleaningFinished event"
    );
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());

    let mut handles = vec![];

    for i in 0..10 {
        let state_clone = state.clone();
        let handle = tokio::spawn(async move {
            state_clone.set_progress(i as f32 / 10.0);
            state_clone.navigate(Route::Gallery);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // Last write wins for progress, every push lands on the path
    let (progress, depth) = state.read(|s| (s.progress, s.router.depth()));
    assert!((0.0..1.0).contains(&progress), "Progress should be within range");
    assert_eq!(depth, 10);
}

#[tokio::test]
async fn test_reset_cleaning_state() {
    let state = Arc::new(StateManager::new());

    state.navigate(Route::Cleaner);
    state.start_cleaning(vec!["a.jpg".to_string()]);
    state.add_photo_result(
        "a.jpg".to_string(),
        PhotoStatus::Cleaned,
        "Done".to_string(),
        100,
    );

    let mut rx = state.subscribe();
    state.reset_cleaning_state();

    let mut found_state_reset = false;
    for _ in 0..5 {
        match timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Ok(StateChange::StateReset)) => {
                found_state_reset = true;
                break;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }

    assert!(found_state_reset, "Expected StateReset event");

    let snapshot = state.snapshot();
    assert!(!snapshot.is_cleaning);
    assert_eq!(snapshot.progress, 0.0);
    assert_eq!(snapshot.total_photos, 0);
    assert!(snapshot.cleaned_photos.is_empty());
    assert_eq!(snapshot.router.current(), Some(Route::Cleaner));
}
