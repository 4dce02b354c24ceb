//! Audio analysis configuration and constants.

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// FFT analysis configuration for turning PCM into a byte spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FftConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    /// Spectrum length is half of this
    pub fft_size: usize,

    /// FFT update interval for the live analysis thread (milliseconds)
    /// 16 ms ≈ one display frame at 60 fps
    pub update_interval_ms: u64,

    /// Time smoothing between successive spectra (0 = none, <1)
    pub smoothing: f32,

    /// Magnitude mapped to byte value 0 (decibels)
    pub min_db: f32,

    /// Magnitude mapped to byte value 255 (decibels)
    pub max_db: f32,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 2048,
            update_interval_ms: 16,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl FftConfig {
    /// Number of spectrum bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Frequency resolution of one bin (Hz)
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate_hz as f32 / self.fft_size as f32
    }

    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(AudioError::InvalidConfig(format!(
                "FFT size must be a power of 2 ≥ 32, got {}",
                self.fft_size
            )));
        }
        if self.sample_rate_hz == 0 {
            return Err(AudioError::InvalidConfig(
                "sample rate must be > 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(AudioError::InvalidConfig(format!(
                "smoothing must be within 0..1, got {}",
                self.smoothing
            )));
        }
        if self.min_db >= self.max_db {
            return Err(AudioError::InvalidConfig(format!(
                "min_db ({}) must be below max_db ({})",
                self.min_db, self.max_db
            )));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_config_hz_to_bin() {
        let config = FftConfig::default();

        // At 44100 Hz sample rate and 2048 FFT size:
        // Bin resolution = 44100 / 2048 ≈ 21.53 Hz per bin
        assert_eq!(config.hz_to_bin(0.0), 0);
        assert_eq!(config.hz_to_bin(21.6), 1);
        assert_eq!(config.hz_to_bin(100.0), 4);
    }

    #[test]
    fn test_bin_count_is_half_fft() {
        assert_eq!(FftConfig::default().bin_count(), 1024);
    }

    #[test]
    fn test_validate_rejects_non_power_of_two() {
        let config = FftConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_db_range() {
        let config = FftConfig {
            min_db: -10.0,
            max_db: -20.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
