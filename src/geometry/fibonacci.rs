//! Fibonacci spiral: golden spiral, square tiling and φ-scaled rings.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec2, Vec3};

use super::resources::{MeshData, MeshHandle, OwnedMeshes, ResourceStore};
use super::scene::{MeshStyle, Primitive, Scene, Stroke};
use super::shapes::PHI;
use super::transient::{Transient, TransientPool};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::camera::{CameraPreset, CameraRig};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Quarter turns drawn along the spiral
pub const SPIRAL_POINTS: usize = 16;

/// Fibonacci numbers used for the square tiling
pub const FIBONACCI: [u32; 8] = [1, 1, 2, 3, 5, 8, 13, 21];

pub const RING_COUNT: usize = 7;

const SPIRAL_SCALE: f32 = 0.04;
const SQUARE_UNIT: f32 = 0.1;
const RING_BASE: f32 = 0.1;

/// Point `t` (in quarter turns) on the golden spiral
pub fn spiral_point(t: f32) -> Vec3 {
    let angle = FRAC_PI_2 * t;
    let radius = SPIRAL_SCALE * PHI.powf(angle / PI);
    Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
}

/// Squares (min corner, side) tiling a golden rectangle, centred on the origin
pub fn fibonacci_squares(unit: f32) -> Vec<(Vec2, f32)> {
    let mut squares = vec![(Vec2::ZERO, FIBONACCI[0] as f32)];
    let mut min = Vec2::ZERO;
    let mut max = Vec2::ONE;

    for (n, &fib) in FIBONACCI.iter().enumerate().skip(1) {
        let size = fib as f32;
        // Attach right, above, left, below in turn
        let corner = match (n - 1) % 4 {
            0 => Vec2::new(max.x, min.y),
            1 => Vec2::new(min.x, max.y),
            2 => Vec2::new(min.x - size, min.y),
            _ => Vec2::new(min.x, min.y - size),
        };
        min = min.min(corner);
        max = max.max(corner + Vec2::splat(size));
        squares.push((corner, size));
    }

    let center = (min + max) * 0.5;
    squares
        .into_iter()
        .map(|(corner, size)| ((corner - center) * unit, size * unit))
        .collect()
}

fn spiral_mesh() -> MeshData {
    let steps = SPIRAL_POINTS * 10;
    let points = (0..=steps)
        .map(|i| spiral_point(i as f32 / 10.0))
        .collect();
    MeshData::strip(points, false)
}

fn squares_mesh() -> MeshData {
    let mut mesh = MeshData::default();
    for (corner, size) in fibonacci_squares(SQUARE_UNIT) {
        let outline = vec![
            Vec3::new(corner.x, corner.y, 0.0),
            Vec3::new(corner.x + size, corner.y, 0.0),
            Vec3::new(corner.x + size, corner.y + size, 0.0),
            Vec3::new(corner.x, corner.y + size, 0.0),
        ];
        mesh.merge(&MeshData::strip(outline, true));
    }
    mesh
}

pub struct FibonacciGenerator {
    rig: CameraRig,
    growth: Growth,
    meshes: OwnedMeshes,
    spiral: Option<MeshHandle>,
    squares: Option<MeshHandle>,
    head: f32,
    rotation: f32,
    trail: TransientPool,
}

impl FibonacciGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rig: CameraRig::new(CameraPreset::Fixed, config.render.clone()),
            growth: Growth::new(config.growth.clone()),
            meshes: OwnedMeshes::default(),
            spiral: None,
            squares: None,
            head: 0.0,
            rotation: 0.0,
            trail: TransientPool::new(48),
        }
    }
}

impl GeometryGenerator for FibonacciGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::FibonacciSpiral
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        self.spiral = Some(self.meshes.allocate(resources, spiral_mesh()));
        self.squares = Some(self.meshes.allocate(resources, squares_mesh()));
        self.head = 0.0;
        self.rotation = 0.0;
        self.trail.clear();
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        let (spiral, squares) = match (self.spiral, self.squares) {
            (Some(spiral), Some(squares)) => (spiral, squares),
            _ => return Err(GeometryError::NotInitialized(self.mode())),
        };
        resources.mesh(spiral)?;
        resources.mesh(squares)?;

        let dt = input.delta_time;
        self.growth.step(input.audio_active, input.new_activations);
        self.rotation = (self.rotation - dt * (0.05 + input.intensity * 0.2)) % TAU;
        self.head = (self.head + dt * (0.8 + input.intensity * 3.0)) % SPIRAL_POINTS as f32;

        let head = spiral_point(self.head);
        self.trail.step(dt);
        self.trail.spawn(Transient::new(head, 3.0 + input.bass * 3.0, 1.5));

        let opacity = self.growth.opacity();
        let chakra = input.selected_chakra.index();

        let mut children = vec![
            Primitive::Mesh {
                mesh: squares,
                transform: Mat4::IDENTITY,
                style: MeshStyle::stroked(Stroke::new(
                    input.theme.cycle(chakra + 2).fade(opacity * 0.4),
                    1.0,
                )),
            },
            Primitive::Mesh {
                mesh: spiral,
                transform: Mat4::IDENTITY,
                style: MeshStyle::stroked(Stroke::new(
                    input.theme.accent.fade(opacity),
                    2.0 + input.intensity * 2.0,
                )),
            },
        ];

        for k in 0..RING_COUNT {
            let level = input.band_for(k, RING_COUNT);
            children.push(Primitive::Circle {
                center: Vec3::ZERO,
                radius: RING_BASE * PHI.powi(k as i32) * (1.0 + level * 0.1),
                stroke: Some(Stroke::new(
                    input.theme.cycle(chakra + k).fade(opacity * (0.3 + level * 0.5)),
                    1.0,
                )),
                fill: None,
            });
        }

        for i in 0..=SPIRAL_POINTS {
            let color = if input.is_prime_band(i) {
                Color::HIGHLIGHT
            } else {
                input.theme.cycle(chakra + i)
            };
            children.push(Primitive::Point {
                position: spiral_point(i as f32),
                size: 4.0,
                color: color.fade(opacity),
            });
        }

        children.extend(self.trail.iter().map(|particle| Primitive::Point {
            position: particle.position,
            size: particle.scale,
            color: input.theme.accent.lighten(0.4).fade(particle.opacity * opacity),
        }));
        children.push(Primitive::Sphere {
            center: head,
            radius: 0.05 + input.bass * 0.05,
            color: Color::WHITE.fade(opacity),
        });

        let mut scene = Scene::world(self.rig.camera_at(input.time), Color::BACKGROUND);
        scene.push(Primitive::Group {
            transform: Mat4::from_rotation_z(self.rotation)
                * Mat4::from_scale(Vec3::splat(self.growth.scale())),
            children,
        });
        Ok(scene)
    }

    fn dispose(&mut self, resources: &mut ResourceStore) {
        self.meshes.release_all(resources);
        self.spiral = None;
        self.squares = None;
        self.trail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};

    #[test]
    fn test_spiral_radius_grows_by_phi_per_half_turn() {
        let r0 = spiral_point(0.0).length();
        let r2 = spiral_point(2.0).length();
        assert!((r0 - SPIRAL_SCALE).abs() < 1e-6);
        assert!((r2 / r0 - PHI).abs() < 1e-4);
    }

    #[test]
    fn test_spiral_point_quarter_turns() {
        let p = spiral_point(1.0);
        assert!(p.x.abs() < 1e-6);
        assert!(p.y > 0.0);
    }

    #[test]
    fn test_squares_tile_golden_rectangle() {
        let squares = fibonacci_squares(1.0);
        assert_eq!(squares.len(), FIBONACCI.len());

        let area: f32 = squares.iter().map(|(_, s)| s * s).sum();
        assert_eq!(area, 21.0 * 34.0);

        let min = squares.iter().fold(Vec2::splat(f32::MAX), |m, (c, _)| m.min(*c));
        let max = squares
            .iter()
            .fold(Vec2::splat(f32::MIN), |m, (c, s)| m.max(*c + Vec2::splat(*s)));
        let extent = max - min;
        assert_eq!(extent.x.max(extent.y), 34.0);
        assert_eq!(extent.x.min(extent.y), 21.0);
        assert!(((min + max) * 0.5).length() < 1e-5);
    }

    #[test]
    fn test_scene_contents() {
        let mut generator = FibonacciGenerator::new(&GeneratorConfig::default());
        let (quiet, _) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Circle), RING_COUNT);
        assert_eq!(quiet.count(PrimitiveKind::Mesh), 2);
        assert_eq!(quiet.count(PrimitiveKind::Sphere), 1);
    }
}
