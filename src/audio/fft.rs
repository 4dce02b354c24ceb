//! Windowed FFT producing analyser-style byte spectra.
//!
//! Magnitudes are normalized by the window length, smoothed over time,
//! converted to decibels and mapped linearly from `[min_db, max_db]` onto
//! `0..=255`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::FrequencySpectrum;
use crate::error::AudioError;
use crate::params::FftConfig;

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

pub struct SpectrumAnalyzer {
    config: FftConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: FftConfig) -> Result<Self, AudioError> {
        config.validate()?;
        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        Ok(Self {
            window: (0..size).map(|i| hann_window(i, size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; config.bin_count()],
            fft,
            config,
        })
    }

    pub fn config(&self) -> &FftConfig {
        &self.config
    }

    /// Analyze the most recent `fft_size` samples; shorter input is
    /// zero-padded at the front
    pub fn process(&mut self, samples: &[f32]) -> FrequencySpectrum {
        let size = self.config.fft_size;
        let recent = &samples[samples.len().saturating_sub(size)..];
        let pad = size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let smoothing = self.config.smoothing;
        let db_range = self.config.max_db - self.config.min_db;
        let bins = self
            .smoothed
            .iter_mut()
            .zip(&self.buffer)
            .map(|(smoothed, value)| {
                let magnitude = value.norm() / size as f32;
                *smoothed = smoothing * *smoothed + (1.0 - smoothing) * magnitude;
                let db = 20.0 * smoothed.max(1e-12).log10();
                let scaled = (db - self.config.min_db) / db_range * 255.0;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();
        FrequencySpectrum::new(bins)
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}
