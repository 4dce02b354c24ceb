//! Prime-indexed activity detection with a bounded, rate-limited history.

use crate::analysis::MAX_AMPLITUDE;
use crate::params::PrimeConfig;

/// A band whose mapped frequency is prime and loud enough to react to
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimeActivation {
    /// Band index that triggered the activation
    pub bin_index: usize,

    /// Primality candidate the band mapped to
    pub candidate: u32,

    /// Synthetic frequency of the band (Hz)
    pub mapped_frequency: u32,

    /// Loop time of detection (seconds)
    pub timestamp: f64,
}

/// Primality by trial division up to √n
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let n = n as u64;
    let mut divisor = 3u64;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// First `count` prime numbers
pub fn prime_sequence(count: usize) -> Vec<u32> {
    (2u32..).filter(|&n| is_prime(n)).take(count).collect()
}

/// Scans bands for prime-indexed, high-amplitude activity
#[derive(Debug, Clone)]
pub struct PrimeEventDetector {
    config: PrimeConfig,
    history: Vec<PrimeActivation>,
    evaluations: u64,
}

impl PrimeEventDetector {
    pub fn new(config: PrimeConfig) -> Self {
        let capacity = config.history_len;
        Self {
            config,
            history: Vec::with_capacity(capacity + 1),
            evaluations: 0,
        }
    }

    /// Evaluate one tick worth of bands.
    ///
    /// A scan only runs on every `rate_limit_ticks`-th evaluation and emits
    /// at most one activation (the lowest qualifying band).
    pub fn evaluate(&mut self, bands: &[f32], now: f64) -> Option<PrimeActivation> {
        self.evaluations += 1;
        if self.evaluations % self.config.rate_limit_ticks as u64 != 0 {
            return None;
        }

        let activation = bands
            .iter()
            .enumerate()
            .find_map(|(index, &amplitude)| self.qualify(index, amplitude, now))?;

        self.history.push(activation);
        if self.history.len() > self.config.history_len {
            let overflow = self.history.len() - self.config.history_len;
            self.history.drain(..overflow);
        }

        log::debug!(
            "prime activation: band {} → {} Hz",
            activation.bin_index,
            activation.mapped_frequency
        );
        Some(activation)
    }

    fn qualify(&self, index: usize, amplitude: f32, now: f64) -> Option<PrimeActivation> {
        let candidate = self.config.candidate(index);
        if !is_prime(candidate) {
            return None;
        }
        if amplitude / MAX_AMPLITUDE <= self.config.threshold {
            return None;
        }
        let mapped_frequency = self.config.mapped_frequency(index);
        if mapped_frequency <= self.config.audibility_floor_hz {
            return None;
        }
        if self.contains_frequency(mapped_frequency) {
            return None;
        }
        Some(PrimeActivation {
            bin_index: index,
            candidate,
            mapped_frequency,
            timestamp: now,
        })
    }

    fn contains_frequency(&self, frequency: u32) -> bool {
        self.history
            .iter()
            .any(|activation| activation.mapped_frequency == frequency)
    }

    /// Recent activations, oldest first
    pub fn history(&self) -> &[PrimeActivation] {
        &self.history
    }

    /// Copy of the history, oldest first
    pub fn snapshot(&self) -> Vec<PrimeActivation> {
        self.history.clone()
    }

    /// Whether `band_index` currently has a recorded activation
    pub fn is_active_band(&self, band_index: usize) -> bool {
        self.history
            .iter()
            .any(|activation| activation.bin_index == band_index)
    }

    pub fn config(&self) -> &PrimeConfig {
        &self.config
    }

    /// Forget all activations and restart the rate-limit window
    pub fn clear(&mut self) {
        self.history.clear();
        self.evaluations = 0;
    }
}
