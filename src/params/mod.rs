//! Parameter definitions with documented units and defaults.
//!
//! All tunable numbers of the engine live here:
//! - Units (Hz, seconds, ticks, logical pixels)
//! - Documented ranges and meanings
//! - Serde support so a YAML file can override any subset

mod analysis;
mod audio;
mod geometry;
mod render;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Re-export all types
pub use analysis::{AnalysisConfig, PrimeConfig};
pub use audio::{audio_constants, FftConfig};
pub use geometry::GrowthConfig;
pub use render::{RecordingConfig, RenderConfig};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub prime: PrimeConfig,
    pub growth: GrowthConfig,
    pub render: RenderConfig,
    pub fft: FftConfig,
}

impl EngineConfig {
    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.prime.validate()?;
        self.growth.validate()?;
        self.fft
            .validate()
            .map_err(|e| ConfigError::InvalidParameter(e.to_string()))?;
        if self.analysis.band_count > self.fft.bin_count() {
            return Err(ConfigError::InvalidParameter(format!(
                "band_count {} exceeds spectrum length {}",
                self.analysis.band_count,
                self.fft.bin_count()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "analysis:\n  band_count: 32\nprime:\n  threshold: 0.8\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.analysis.band_count, 32);
        assert_eq!(config.prime.threshold, 0.8);
        assert_eq!(config.prime.history_len, PrimeConfig::default().history_len);
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_band_count_larger_than_spectrum_rejected() {
        let yaml = "analysis:\n  band_count: 4096\n";
        assert!(matches!(
            EngineConfig::from_yaml_str(yaml),
            Err(ConfigError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml_str("analysis: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viz.yaml");
        std::fs::write(&path, "render:\n  seed: 7\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.render.seed, 7);
    }
}
