//! Rendering and recording configuration.

use serde::{Deserialize, Serialize};

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Initial window width (logical pixels)
    pub window_width: u32,

    /// Initial window height (logical pixels)
    pub window_height: u32,

    /// Field of view for sacred-geometry modes (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Camera distance from the origin along +Z (world units)
    pub camera_distance: f32,

    /// Session seed for every random particle field
    pub seed: u64,

    /// Assumed tick length when no previous timestamp exists (seconds)
    pub nominal_frame_s: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 100.0,
            camera_distance: 5.0,
            seed: 0x5EED,
            nominal_frame_s: 1.0 / 60.0,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Path of one numbered frame
    pub fn frame_path(&self, frame_num: usize) -> String {
        format!("{}/frame_{:05}.png", self.frames_dir(), frame_num)
    }
}
