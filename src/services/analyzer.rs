use crate::models::{AnalyzerSettings, BYTES_PER_MB, Photo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory produced by [`PhotoAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleaningSuggestion {
    LargeFileSize { size_mb: f64 },
    HighResolution { width: u32, height: u32 },
    ContainsMetadata,
}

impl fmt::Display for CleaningSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeFileSize { size_mb } => {
                write!(f, "Large file ({:.1} MB), compression recommended", size_mb)
            }
            Self::HighResolution { width, height } => {
                write!(f, "High resolution ({}x{}), consider resizing", width, height)
            }
            Self::ContainsMetadata => f.write_str("Contains metadata (EXIF/location)"),
        }
    }
}

/// The properties the analyzer looks at, read once from a photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoProperties {
    pub encoded_len: usize,
    pub width: u32,
    pub height: u32,
    pub has_metadata: bool,
}

impl PhotoProperties {
    pub fn of(photo: &Photo) -> Self {
        Self {
            encoded_len: photo.encoded_len(),
            width: photo.width(),
            height: photo.height(),
            has_metadata: photo.has_metadata(),
        }
    }
}

/// Inspects photos and suggests what cleaning would help.
///
/// Analysis is a pure read and never fails; a condition that does not hold
/// simply contributes no suggestion.
#[derive(Debug, Clone, Default)]
pub struct PhotoAnalyzer {
    settings: AnalyzerSettings,
}

impl PhotoAnalyzer {
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self { settings }
    }

    /// Suggestions for `photo`: size check, then resolution, then metadata.
    pub fn analyze(&self, photo: &Photo) -> Vec<CleaningSuggestion> {
        let suggestions = self.analyze_properties(&PhotoProperties::of(photo));
        tracing::debug!(
            "Analyzed {}x{} photo ({} bytes): {} suggestions",
            photo.width(),
            photo.height(),
            photo.encoded_len(),
            suggestions.len()
        );
        suggestions
    }

    pub fn analyze_properties(&self, properties: &PhotoProperties) -> Vec<CleaningSuggestion> {
        let mut suggestions = Vec::with_capacity(3);

        let size_mb = properties.encoded_len as f64 / BYTES_PER_MB;
        if size_mb > self.settings.large_file_mb {
            suggestions.push(CleaningSuggestion::LargeFileSize { size_mb });
        }

        if properties.width > self.settings.max_dimension
            || properties.height > self.settings.max_dimension
        {
            suggestions.push(CleaningSuggestion::HighResolution {
                width: properties.width,
                height: properties.height,
            });
        }

        if properties.has_metadata {
            suggestions.push(CleaningSuggestion::ContainsMetadata);
        }

        suggestions
    }
}
