//! Services module - Pure business logic for photo cleaning.
//!
//! The services are **framework-agnostic** and have no dependencies on the
//! presentation layer, so they can be tested and reused on their own.
//!
//! # Components
//!
//! - [`transform`]: The three image steps: [`strip_metadata`], [`reduce_noise`]
//!   and [`compress_to_target`]
//! - [`CleaningPipeline`]: Runs the steps in order with progress reporting,
//!   single-photo and sequential batch entry points, optional cancellation
//! - [`PhotoAnalyzer`]: Heuristic [`CleaningSuggestion`]s (large file, high
//!   resolution, metadata present)
//! - [`StatisticsStore`]: Persistent "total cleaned" / "space saved" counters
//!
//! # Usage Example
//!
//! ```ignore
//! use photoclean::services::CleaningPipeline;
//!
//! let pipeline = CleaningPipeline::default();
//! let cleaned = pipeline
//!     .clean_photo(&photo, None, |progress| println!("{:.0}%", progress * 100.0))
//!     .await?;
//! ```

pub mod analyzer;
pub mod pipeline;
pub mod statistics;
pub mod transform;

pub use analyzer::{CleaningSuggestion, PhotoAnalyzer, PhotoProperties};
pub use pipeline::{
    BatchItem, CancelHandle, CancelToken, CleaningError, CleaningPipeline, cancel_pair,
};
pub use statistics::{CleaningTotals, MemoryStatisticsStore, StatisticsStore, YamlStatisticsStore};
pub use transform::{
    Compression, TransformError, compress_to_target, compress_within, reduce_noise,
    strip_jpeg_segments, strip_metadata,
};
