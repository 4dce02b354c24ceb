//! Camera rigs for the world-space geometry modes.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Resolved camera for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position (world units)
    pub eye: Vec3,

    /// Look-at target (world units)
    pub target: Vec3,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near: f32,

    /// Far clipping plane (world units)
    pub far: f32,
}

impl Camera {
    /// Straight-on view from +Z at the configured distance
    pub fn front(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_degrees: config.fov_degrees,
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Create view-projection matrix for the given aspect ratio
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        // Y stays up, the camera never rolls
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
        proj * view
    }

    /// Logical pixels per world unit at clip depth `w` for a viewport height
    pub fn pixels_per_unit(&self, viewport_height: f32, w: f32) -> f32 {
        let focal = viewport_height * 0.5 / (self.fov_degrees.to_radians() * 0.5).tan();
        focal / w.max(f32::EPSILON)
    }
}

/// How a mode moves its camera over time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPreset {
    /// Stationary front view
    Fixed,

    /// Circle the origin at constant elevation
    Orbit {
        /// Angular speed (radians per second)
        speed_rad_per_s: f32,

        /// Height above the XZ plane (world units)
        elevation: f32,
    },

    /// Gentle side-to-side sway around the front view
    Drift {
        /// Sway amplitude (world units)
        amplitude: f32,

        /// Sway frequency (Hz)
        freq_hz: f32,
    },
}

/// Camera rig: a preset plus the render configuration it is framed with
#[derive(Debug, Clone)]
pub struct CameraRig {
    preset: CameraPreset,
    config: RenderConfig,
}

impl CameraRig {
    pub fn new(preset: CameraPreset, config: RenderConfig) -> Self {
        Self { preset, config }
    }

    pub fn preset(&self) -> CameraPreset {
        self.preset
    }

    /// Compute the camera for given time
    ///
    /// # Arguments
    /// * `time_s` - Seconds since the loop started
    pub fn camera_at(&self, time_s: f32) -> Camera {
        let base = Camera::front(&self.config);
        let distance = self.config.camera_distance;

        match self.preset {
            CameraPreset::Fixed => base,
            CameraPreset::Orbit {
                speed_rad_per_s,
                elevation,
            } => {
                let angle = time_s * speed_rad_per_s;
                let radius = (distance * distance - elevation * elevation).max(0.0).sqrt();
                Camera {
                    eye: Vec3::new(angle.sin() * radius, elevation, angle.cos() * radius),
                    ..base
                }
            }
            CameraPreset::Drift { amplitude, freq_hz } => {
                let phase = time_s * freq_hz * std::f32::consts::TAU;
                Camera {
                    eye: Vec3::new(
                        phase.sin() * amplitude,
                        (phase * 0.5).cos() * amplitude * 0.5,
                        distance,
                    ),
                    ..base
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_camera_looks_at_origin() {
        let rig = CameraRig::new(CameraPreset::Fixed, RenderConfig::default());
        let camera = rig.camera_at(12.5);
        assert_eq!(camera.eye, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let rig = CameraRig::new(
            CameraPreset::Orbit {
                speed_rad_per_s: 0.4,
                elevation: 1.5,
            },
            RenderConfig::default(),
        );
        for t in 0..100 {
            let camera = rig.camera_at(t as f32 * 0.1);
            assert!((camera.eye.length() - 5.0).abs() < 1e-4);
            assert!((camera.eye.y - 1.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_origin_projects_to_screen_centre() {
        let camera = Camera::front(&RenderConfig::default());
        let clip = camera.view_proj(16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let rig = CameraRig::new(
            CameraPreset::Drift {
                amplitude: 0.3,
                freq_hz: 0.05,
            },
            RenderConfig::default(),
        );
        let view_proj = rig.camera_at(3.0).view_proj(1.5);

        // Matrix should not be identity or zero
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(view_proj.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
