//! Growth easing parameters shared by all geometry modes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Growth easing: how fast a mode fades in and out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Increment per tick while audio is active
    /// 1/60 reaches full growth after ~1 s at 60 fps
    pub active_step: f32,

    /// Increment per new prime activation
    pub activation_boost: f32,

    /// Decrement per tick while no audio is present
    pub idle_decay: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            active_step: 1.0 / 60.0,
            activation_boost: 0.15,
            idle_decay: 0.02,
        }
    }
}

impl GrowthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("active_step", self.active_step),
            ("activation_boost", self.activation_boost),
            ("idle_decay", self.idle_decay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter(format!(
                    "growth {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
