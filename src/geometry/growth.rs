//! Growth easing shared by every mode.

use crate::params::GrowthConfig;

/// Eased scalar in [0, 1] gating a mode's scale and opacity
#[derive(Debug, Clone)]
pub struct Growth {
    config: GrowthConfig,
    value: f32,
}

impl Growth {
    pub fn new(config: GrowthConfig) -> Self {
        Self { config, value: 0.0 }
    }

    /// Advance one tick and return the new value
    ///
    /// # Arguments
    /// * `audio_active` - Whether a spectrum was supplied this tick
    /// * `new_activations` - Prime activations detected this tick
    pub fn step(&mut self, audio_active: bool, new_activations: usize) -> f32 {
        let mut value = self.value;
        if audio_active {
            value += self.config.active_step;
        } else {
            value -= self.config.idle_decay;
        }
        value += self.config.activation_boost * new_activations as f32;
        self.value = value.clamp(0.0, 1.0);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Ease-out quad of the raw value, smoother near full growth
    pub fn eased(&self) -> f32 {
        self.value * (2.0 - self.value)
    }

    /// Visual scale factor that never collapses to zero
    pub fn scale(&self) -> f32 {
        0.2 + 0.8 * self.eased()
    }

    /// Opacity factor that keeps a faint outline while idle
    pub fn opacity(&self) -> f32 {
        0.15 + 0.85 * self.eased()
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reaches_full_after_one_second() {
        let mut growth = Growth::new(GrowthConfig::default());
        for _ in 0..59 {
            growth.step(true, 0);
        }
        assert!(growth.value() < 1.0);
        growth.step(true, 0);
        growth.step(true, 0);
        assert_eq!(growth.value(), 1.0);
    }

    #[test]
    fn test_activation_boost() {
        let mut growth = Growth::new(GrowthConfig::default());
        growth.step(true, 1);
        let expected = 1.0 / 60.0 + 0.15;
        assert!((growth.value() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_decays_to_zero_when_idle() {
        let mut growth = Growth::new(GrowthConfig::default());
        for _ in 0..120 {
            growth.step(true, 0);
        }
        for _ in 0..60 {
            growth.step(false, 0);
        }
        assert_eq!(growth.value(), 0.0);
        assert!(growth.scale() > 0.0);
    }

    proptest! {
        #[test]
        fn prop_monotone_and_bounded_while_active(
            activations in prop::collection::vec(0usize..4, 1..300)
        ) {
            let mut growth = Growth::new(GrowthConfig::default());
            let mut previous = growth.value();
            for n in activations {
                let value = growth.step(true, n);
                prop_assert!(value >= previous);
                prop_assert!((0.0..=1.0).contains(&value));
                previous = value;
            }
        }

        #[test]
        fn prop_idle_never_increases(ticks in 1usize..200, warmup in 0usize..100) {
            let mut growth = Growth::new(GrowthConfig::default());
            for _ in 0..warmup {
                growth.step(true, 0);
            }
            let mut previous = growth.value();
            for _ in 0..ticks {
                let value = growth.step(false, 0);
                prop_assert!(value <= previous);
                prop_assert!(value >= 0.0);
                previous = value;
            }
        }
    }
}
