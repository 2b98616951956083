use crate::models::{CleanerConfig, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default configuration directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "PhotoClean Data";

/// Prefix of environment variables that override `PhotoClean.yaml`.
///
/// Nested keys are separated by `__`, e.g.
/// `PHOTOCLEAN_PIPELINE__COMPRESSION__TARGET_BYTES=800000`.
pub const ENV_PREFIX: &str = "PHOTOCLEAN";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages the files of one configuration directory:
/// - Cleaner config (`PhotoClean.yaml`): Pipeline parameters, analyzer thresholds,
///   logging, feature flags
/// - User config (`User Settings.yaml`): Onboarding state, output directory
/// - Statistics (`Statistics.yaml`): Owned by [`crate::services::YamlStatisticsStore`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    cleaner_config_path: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
    statistics_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "PhotoClean Data")
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            cleaner_config_path: config_dir.join("PhotoClean.yaml"),
            user_config_path: config_dir.join("User Settings.yaml"),
            statistics_path: config_dir.join("Statistics.yaml"),
            config_dir,
        })
    }

    /// Load the cleaner configuration.
    ///
    /// Layers, lowest priority first: built-in defaults, `PhotoClean.yaml`
    /// (optional), then `PHOTOCLEAN_*` environment variables.
    pub fn load_cleaner_config(&self) -> Result<CleanerConfig> {
        self.load_cleaner_config_with(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Load the cleaner configuration with an explicit environment source.
    ///
    /// Tests pass an environment built from a map so they never touch the
    /// process environment.
    pub fn load_cleaner_config_with(&self, env: config::Environment) -> Result<CleanerConfig> {
        if !self.cleaner_config_path.exists() {
            tracing::warn!(
                "Cleaner config file not found at {}, using defaults",
                self.cleaner_config_path
            );
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::from(self.cleaner_config_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(env)
            .build()
            .with_context(|| {
                format!("Failed to read cleaner config: {}", self.cleaner_config_path)
            })?;

        let config: CleanerConfig = settings.try_deserialize().with_context(|| {
            format!("Failed to parse cleaner config: {}", self.cleaner_config_path)
        })?;

        tracing::info!("Loaded cleaner config from {}", self.cleaner_config_path);
        Ok(config)
    }

    /// Save the cleaner configuration file.
    ///
    /// # Arguments
    /// * `config` - The CleanerConfig to save
    pub fn save_cleaner_config(&self, config: &CleanerConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize cleaner config to YAML")?;

        fs::write(&self.cleaner_config_path, yaml_string).with_context(|| {
            format!("Failed to write cleaner config: {}", self.cleaner_config_path)
        })?;

        tracing::info!("Saved cleaner config to {}", self.cleaner_config_path);
        Ok(())
    }

    /// Load the user configuration file.
    ///
    /// # Returns
    /// The loaded UserConfig, or default if file doesn't exist
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
            return Ok(UserConfig::default());
        }

        let file_contents = fs::read_to_string(&self.user_config_path)
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    ///
    /// # Arguments
    /// * `config` - The UserConfig to save
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Path of the statistics file inside the configuration directory.
    pub fn statistics_path(&self) -> &Utf8Path {
        &self.statistics_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    fn env_from(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.config_dir().exists());
        assert!(manager.statistics_path().ends_with("Statistics.yaml"));
    }

    #[test]
    fn test_missing_cleaner_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = manager.load_cleaner_config_with(env_from(&[])).unwrap();

        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn test_load_save_cleaner_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = CleanerConfig::default();
        config.pipeline.compression.target_bytes = 500_000;
        config.analyzer.max_dimension = 3000;
        manager.save_cleaner_config(&config).unwrap();

        let loaded = manager.load_cleaner_config_with(env_from(&[])).unwrap();
        assert_eq!(loaded.pipeline.compression.target_bytes, 500_000);
        assert_eq!(loaded.analyzer.max_dimension, 3000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        manager.save_cleaner_config(&CleanerConfig::default()).unwrap();

        let loaded = manager
            .load_cleaner_config_with(env_from(&[
                ("PHOTOCLEAN_PIPELINE__COMPRESSION__TARGET_BYTES", "800000"),
                ("PHOTOCLEAN_LOGGING__DEBUG", "true"),
            ]))
            .unwrap();

        assert_eq!(loaded.pipeline.compression.target_bytes, 800_000);
        assert!(loaded.logging.debug);
    }

    #[test]
    fn test_load_save_user_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = UserConfig::default();
        config.user_settings.onboarding_completed = true;
        manager.save_user_config(&config).unwrap();

        let loaded = manager.load_user_config().unwrap();
        assert!(loaded.user_settings.onboarding_completed);
        assert_eq!(loaded.user_settings.output_dir, "cleaned");
    }

    #[test]
    fn test_missing_user_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let loaded = manager.load_user_config().unwrap();
        assert!(!loaded.user_settings.onboarding_completed);
    }
}
