//! WAV file playback as a spectrum source.

use std::io::Read;
use std::path::Path;

use super::{FrequencySpectrum, SpectrumAnalyzer, SpectrumSource};
use crate::error::AudioError;
use crate::params::FftConfig;

/// Decoded mono PCM analyzed in sliding windows
pub struct WavSource {
    label: String,
    samples: Vec<f32>,
    sample_rate: u32,
    analyzer: SpectrumAnalyzer,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>, config: FftConfig) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)?;
        Self::from_wav(reader, path.display().to_string(), config)
    }

    /// Decode from any reader, e.g. an in-memory buffer
    pub fn from_reader<R: Read>(reader: R, config: FftConfig) -> Result<Self, AudioError> {
        let reader = hound::WavReader::new(reader)?;
        Self::from_wav(reader, "<memory>".to_string(), config)
    }

    fn from_wav<R: Read>(
        reader: hound::WavReader<R>,
        label: String,
        config: FftConfig,
    ) -> Result<Self, AudioError> {
        let spec = reader.spec();
        let samples = downmix(reader)?;

        // Bins follow the file's own sample rate
        let config = FftConfig {
            sample_rate_hz: spec.sample_rate as usize,
            ..config
        };
        let analyzer = SpectrumAnalyzer::new(config)?;

        log::info!(
            "loaded {}: {} Hz, {} ch, {:.1} s",
            label,
            spec.sample_rate,
            spec.channels,
            samples.len() as f64 / spec.sample_rate as f64
        );

        Ok(Self {
            label,
            samples,
            sample_rate: spec.sample_rate,
            analyzer,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Average all channels into one normalized stream
fn downmix<R: Read>(mut reader: hound::WavReader<R>) -> Result<Vec<f32>, AudioError> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect())
}

impl SpectrumSource for WavSource {
    fn spectrum_at(&mut self, time_s: f64) -> Option<FrequencySpectrum> {
        if !(0.0..self.duration()).contains(&time_s) {
            return None;
        }
        let end = ((time_s * self.sample_rate as f64) as usize + 1).min(self.samples.len());
        Some(self.analyzer.process(&self.samples[..end]))
    }

    fn describe(&self) -> String {
        format!("wav {}", self.label)
    }
}
