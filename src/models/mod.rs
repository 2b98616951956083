//! Data models for photoclean.
//!
//! - [`Photo`]: The encoded photo handle every cleaning step consumes and produces
//! - [`AppState`]: The central state container holding navigation, progress and results
//! - [`Router`], [`Route`], [`Presentation`]: Navigation stack and modal slots
//! - [`CleanerConfig`]: Pipeline, analyzer, logging and feature flag settings loaded from
//!   `PhotoClean.yaml`
//! - [`UserConfig`]: User preferences loaded from `User Settings.yaml`
//!
//! # Architecture Note
//!
//! Config structs derive `Serialize`/`Deserialize` for YAML persistence.
//! `AppState` is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager);
//! state updates go through its `update()` method so change events stay consistent.

pub mod app_state;
pub mod config;
pub mod navigation;
pub mod photo;

pub use app_state::{AppState, PhotoStatus};
pub use config::{
    AnalyzerSettings, CleanerConfig, CompressionSettings, LoggingSettings, NoiseSettings,
    PipelineSettings, UserConfig, UserSettings,
};
pub use navigation::{Presentation, Route, Router};
pub use photo::{BYTES_PER_MB, InvalidImage, Photo};
