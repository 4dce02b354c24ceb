//! Spectrum banding: raw per-frame amplitudes → bands, intensity and bass.

use crate::params::AnalysisConfig;

/// Largest value a spectrum sample can take
pub const MAX_AMPLITUDE: f32 = 255.0;

/// Result of analysing one frame of spectrum data
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BandAnalysis {
    /// Mean amplitude (0-255) of each proportional sub-range
    pub bands: Vec<f32>,

    /// Overall loudness: mean(bands) / 255
    pub intensity: f32,

    /// Low-end energy: mean of the lowest raw samples / 255
    pub bass: f32,
}

impl BandAnalysis {
    /// All-zero analysis with `band_count` bands
    pub fn silent(band_count: usize) -> Self {
        Self {
            bands: vec![0.0; band_count],
            intensity: 0.0,
            bass: 0.0,
        }
    }

    /// Band value normalized to 0-1
    pub fn normalized(&self, index: usize) -> f32 {
        self.bands.get(index).copied().unwrap_or(0.0) / MAX_AMPLITUDE
    }

    pub fn is_silent(&self) -> bool {
        self.intensity <= 0.0 && self.bass <= 0.0
    }
}

/// Stateless adapter from raw spectrum samples to bands
#[derive(Debug, Clone)]
pub struct FrequencyAnalyzer {
    config: AnalysisConfig,
}

impl FrequencyAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn band_count(&self) -> usize {
        self.config.band_count
    }

    /// Analyse one frame; absent or empty input yields all zeros
    pub fn analyze(&self, data: Option<&[u8]>) -> BandAnalysis {
        let band_count = self.config.band_count;
        let data = match data {
            Some(data) if !data.is_empty() => data,
            _ => return BandAnalysis::silent(band_count),
        };

        if band_count > data.len() {
            log::debug!(
                "band count {} exceeds spectrum length {}, clamping",
                band_count,
                data.len()
            );
        }

        let bands = average_bands(data, band_count.min(data.len()));
        let intensity = mean(&bands) / MAX_AMPLITUDE;

        let bass_len = self.config.bass_samples.min(data.len());
        let bass = data[..bass_len].iter().map(|&v| v as f32).sum::<f32>()
            / bass_len as f32
            / MAX_AMPLITUDE;

        BandAnalysis {
            bands,
            intensity,
            bass,
        }
    }
}

/// Average `data` into `count` contiguous, proportionally sized bands.
///
/// Band `b` covers `[b·L/count, (b+1)·L/count)` (floored). Requires
/// `count <= data.len()`; larger counts are clamped, zero yields nothing.
pub fn average_bands(data: &[u8], count: usize) -> Vec<f32> {
    let len = data.len();
    let count = count.min(len);
    (0..count)
        .map(|band| {
            let start = band * len / count;
            let end = ((band + 1) * len / count).max(start + 1);
            let slice = &data[start..end];
            slice.iter().map(|&v| v as f32).sum::<f32>() / slice.len() as f32
        })
        .collect()
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn analyzer(band_count: usize) -> FrequencyAnalyzer {
        FrequencyAnalyzer::new(AnalysisConfig {
            band_count,
            ..Default::default()
        })
    }

    #[test]
    fn test_alternating_spectrum_bands() {
        let data = [0, 255, 0, 255, 0, 255, 0, 255];
        assert_eq!(average_bands(&data, 4), vec![127.5; 4]);
    }

    #[test]
    fn test_absent_spectrum_is_silent() {
        let result = analyzer(16).analyze(None);
        assert_eq!(result.bands, vec![0.0; 16]);
        assert_eq!(result.intensity, 0.0);
        assert_eq!(result.bass, 0.0);
    }

    #[test]
    fn test_empty_spectrum_is_silent() {
        let result = analyzer(8).analyze(Some(&[]));
        assert_eq!(result, BandAnalysis::silent(8));
        assert!(result.is_silent());
    }

    #[test]
    fn test_full_scale_intensity_and_bass() {
        let data = vec![255u8; 64];
        let result = analyzer(8).analyze(Some(&data));
        assert!((result.intensity - 1.0).abs() < 1e-6);
        assert!((result.bass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bass_uses_lowest_ten_samples() {
        let mut data = vec![0u8; 64];
        for v in data.iter_mut().take(10) {
            *v = 51;
        }
        let result = analyzer(8).analyze(Some(&data));
        assert!((result.bass - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_short_spectrum_bass_uses_available_samples() {
        let result = analyzer(2).analyze(Some(&[255, 255, 255, 255]));
        assert!((result.bass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_band_count_clamped_to_length() {
        let result = analyzer(16).analyze(Some(&[10, 20, 30]));
        assert_eq!(result.bands, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_uneven_split_covers_every_sample() {
        // L=10, B=3 → [0,3), [3,6), [6,10)
        let data = [0, 0, 0, 30, 30, 30, 90, 90, 90, 90];
        assert_eq!(average_bands(&data, 3), vec![0.0, 30.0, 90.0]);
    }

    proptest! {
        #[test]
        fn prop_band_count_and_means(
            data in prop::collection::vec(any::<u8>(), 1..512),
            count_seed in 1usize..512,
        ) {
            let count = 1 + count_seed % data.len();
            let bands = average_bands(&data, count);
            prop_assert_eq!(bands.len(), count);

            for (b, value) in bands.iter().enumerate() {
                let start = b * data.len() / count;
                let end = (b + 1) * data.len() / count;
                let slice = &data[start..end];
                let expected = slice.iter().map(|&v| v as f32).sum::<f32>() / slice.len() as f32;
                prop_assert!((value - expected).abs() < 1e-3);
            }
        }

        #[test]
        fn prop_intensity_is_normalized(data in prop::collection::vec(any::<u8>(), 1..256)) {
            let result = analyzer(8.min(data.len())).analyze(Some(&data));
            prop_assert!((0.0..=1.0).contains(&result.intensity));
            prop_assert!((0.0..=1.0).contains(&result.bass));
        }
    }
}
