//! Spectrum banding and prime detection parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Banding of the raw spectrum into coarser bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of output bands (must be ≥ 1 and ≤ spectrum length)
    pub band_count: usize,

    /// Number of lowest raw samples averaged into the bass value
    pub bass_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            band_count: 64,
            bass_samples: 10,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band_count == 0 {
            return Err(ConfigError::InvalidParameter(
                "band_count must be > 0".to_string(),
            ));
        }
        if self.bass_samples == 0 {
            return Err(ConfigError::InvalidParameter(
                "bass_samples must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Prime activation gates and bookkeeping
///
/// A band index `i` maps to the synthetic frequency `base_hz + i * step_hz`
/// and to the primality candidate `i + candidate_offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimeConfig {
    /// Normalized amplitude (0-1) a band must exceed
    pub threshold: f32,

    /// Mapped frequency (Hz) a band must exceed
    pub audibility_floor_hz: u32,

    /// Frequency of band 0 (Hz)
    pub base_hz: u32,

    /// Frequency spacing between bands (Hz)
    pub step_hz: u32,

    /// Added to the band index before the primality test
    pub candidate_offset: u32,

    /// A detection scan runs once every this many evaluations
    /// 30 ticks = 0.5 s at 60 fps
    pub rate_limit_ticks: u32,

    /// Maximum retained activations (oldest evicted first)
    pub history_len: usize,
}

impl Default for PrimeConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            audibility_floor_hz: 50,
            base_hz: 10,
            step_hz: 10,
            candidate_offset: 1,
            rate_limit_ticks: 30,
            history_len: 5,
        }
    }
}

impl PrimeConfig {
    /// Synthetic frequency for a band index
    pub fn mapped_frequency(&self, band_index: usize) -> u32 {
        self.base_hz
            .saturating_add((band_index as u32).saturating_mul(self.step_hz))
    }

    /// Number tested for primality for a band index
    pub fn candidate(&self, band_index: usize) -> u32 {
        (band_index as u32).saturating_add(self.candidate_offset)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidParameter(format!(
                "prime threshold must be within 0..=1, got {}",
                self.threshold
            )));
        }
        if self.rate_limit_ticks == 0 {
            return Err(ConfigError::InvalidParameter(
                "rate_limit_ticks must be > 0".to_string(),
            ));
        }
        if self.history_len == 0 {
            return Err(ConfigError::InvalidParameter(
                "history_len must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_of_band_22() {
        let config = PrimeConfig::default();
        assert_eq!(config.candidate(22), 23);
        assert_eq!(config.mapped_frequency(22), 230);
    }

    #[test]
    fn test_low_bands_fall_under_floor() {
        let config = PrimeConfig::default();
        // Candidates 2, 3, 5 are prime but map to 20, 30, 50 Hz
        for index in [1, 2, 4] {
            assert!(config.mapped_frequency(index) <= config.audibility_floor_hz);
        }
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = PrimeConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
