use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Feature flag that gates the noise-reduction step.
pub const FEATURE_NOISE_REDUCTION: &str = "noise_reduction";

/// Feature flag that enables analysis before each clean.
pub const FEATURE_ANALYZE_BEFORE_CLEAN: &str = "analyze_before_clean";

/// Main configuration from PhotoClean.yaml
///
/// Holds the cleaning pipeline parameters, analyzer thresholds, logging
/// options and feature flags. Every section has defaults so an empty or
/// missing file yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub pipeline: PipelineSettings,
    pub analyzer: AnalyzerSettings,
    pub logging: LoggingSettings,
    pub features: IndexMap<String, bool>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        let mut features = IndexMap::new();
        features.insert(FEATURE_NOISE_REDUCTION.to_string(), true);
        features.insert(FEATURE_ANALYZE_BEFORE_CLEAN.to_string(), true);

        Self {
            pipeline: PipelineSettings::default(),
            analyzer: AnalyzerSettings::default(),
            logging: LoggingSettings::default(),
            features,
        }
    }
}

impl CleanerConfig {
    /// Check a feature flag. Unknown flags are disabled.
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.features.get(feature).copied().unwrap_or(false)
    }
}

/// Parameters of the three transform steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub noise: NoiseSettings,
    pub compression: CompressionSettings,
}

/// Smoothing filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Strength of the smoothing pass, 0..1
    pub noise_level: f32,
    /// Strength of the sharpening pass applied after smoothing, 0..1
    pub sharpness: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            noise_level: 0.02,
            sharpness: 0.4,
        }
    }
}

/// Size-targeted JPEG recompression parameters.
///
/// Qualities are fractions in 0..1 (0.7 means JPEG quality 70).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub target_bytes: usize,
    pub start_quality: f32,
    pub quality_step: f32,
    pub min_quality: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            target_bytes: 1_500_000,
            start_quality: 0.7,
            quality_step: 0.1,
            min_quality: 0.3,
        }
    }
}

/// Thresholds used by the heuristic analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Files strictly larger than this (in MB) are flagged
    pub large_file_mb: f64,
    /// Photos with either side strictly larger than this (in px) are flagged
    pub max_dimension: u32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            large_file_mb: 2.0,
            max_dimension: 4000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
    /// Write the log file as JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "photoclean".to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}

/// User configuration from User Settings.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "User_Settings")]
    pub user_settings: UserSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Onboarding Completed", default)]
    pub onboarding_completed: bool,

    #[serde(rename = "Output Directory", default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            onboarding_completed: false,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            user_settings: UserSettings::default(),
        }
    }
}

fn default_output_dir() -> String {
    "cleaned".to_string()
}
