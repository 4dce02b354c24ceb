//! Spectrum sources: PCM audio in, one byte spectrum per display tick out.
//!
//! The engine never touches audio directly; it only sees the
//! [`FrequencySpectrum`] a [`SpectrumSource`] hands it each tick.

pub mod fft;
pub mod tone;
pub mod wav;

#[cfg(feature = "live-audio")]
mod synthesis;
#[cfg(feature = "live-audio")]
mod system;

pub use fft::{hann_window, SpectrumAnalyzer};
#[cfg(feature = "live-audio")]
pub use system::AudioSystem;
pub use tone::ToneSource;
pub use wav::WavSource;

/// Byte-valued magnitudes, one per frequency bin, low to high
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencySpectrum {
    bins: Vec<u8>,
}

impl FrequencySpectrum {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// All-zero spectrum of `len` bins
    pub fn silent(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Loudest bin and its value
    pub fn peak(&self) -> Option<(usize, u8)> {
        self.bins
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|&(_, value)| value)
    }
}

impl From<Vec<u8>> for FrequencySpectrum {
    fn from(bins: Vec<u8>) -> Self {
        Self::new(bins)
    }
}

/// Produces the spectrum for each display tick
pub trait SpectrumSource {
    /// Spectrum at `time_s` seconds into the session, or `None` when there
    /// is no audio (e.g. the source is exhausted)
    fn spectrum_at(&mut self, time_s: f64) -> Option<FrequencySpectrum>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
