// photoclean - Photo cleaning pipeline
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use models::{AppState, CleanerConfig, Photo, Presentation, Route, Router, UserConfig};
pub use services::{CancelToken, CleaningError, CleaningPipeline, PhotoAnalyzer};
pub use state::{StateChange, StateManager};
pub use workflow::{CleaningWorkflow, NamedPhoto};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
