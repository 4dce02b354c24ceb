//! Procedural test tone: a few sines with a slow swell.

use std::f64::consts::TAU;

use super::{FrequencySpectrum, SpectrumAnalyzer, SpectrumSource};
use crate::error::AudioError;
use crate::params::FftConfig;

/// Swell rate of the overall level (Hz)
const SWELL_HZ: f64 = 0.25;

pub struct ToneSource {
    frequencies: Vec<f32>,
    sample_rate: usize,
    analyzer: SpectrumAnalyzer,
    samples: Vec<f32>,
}

impl ToneSource {
    pub fn new(frequencies: Vec<f32>, config: FftConfig) -> Result<Self, AudioError> {
        if frequencies.is_empty() {
            return Err(AudioError::InvalidConfig(
                "tone needs at least one frequency".to_string(),
            ));
        }
        let nyquist = config.sample_rate_hz as f32 / 2.0;
        if let Some(bad) = frequencies.iter().find(|&&hz| !(hz > 0.0 && hz < nyquist)) {
            return Err(AudioError::InvalidConfig(format!(
                "tone frequency {} Hz outside (0, {})",
                bad, nyquist
            )));
        }

        let analyzer = SpectrumAnalyzer::new(config.clone())?;
        Ok(Self {
            samples: vec![0.0; config.fft_size],
            sample_rate: config.sample_rate_hz,
            frequencies,
            analyzer,
        })
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Fill the window of samples ending at `end_s`
    fn synthesize(&mut self, end_s: f64) {
        let len = self.samples.len();
        let gain = 0.8 / self.frequencies.len() as f64;
        for (i, sample) in self.samples.iter_mut().enumerate() {
            let t = end_s - (len - 1 - i) as f64 / self.sample_rate as f64;
            let swell = 0.6 + 0.4 * (TAU * SWELL_HZ * t).sin();
            let value: f64 = self
                .frequencies
                .iter()
                .map(|&hz| (TAU * hz as f64 * t).sin())
                .sum();
            *sample = (value * gain * swell) as f32;
        }
    }
}

impl SpectrumSource for ToneSource {
    fn spectrum_at(&mut self, time_s: f64) -> Option<FrequencySpectrum> {
        self.synthesize(time_s);
        Some(self.analyzer.process(&self.samples))
    }

    fn describe(&self) -> String {
        let list: Vec<String> = self.frequencies.iter().map(|hz| format!("{} Hz", hz)).collect();
        format!("tone {}", list.join(" + "))
    }
}
