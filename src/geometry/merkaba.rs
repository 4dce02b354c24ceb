//! Merkaba: counter-spinning star tetrahedron around a nested octahedron.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};
use rand::Rng;

use super::resources::{MeshData, MeshHandle, OwnedMeshes, ResourceStore};
use super::scene::{MeshStyle, Primitive, Scene, Stroke};
use super::shapes;
use super::transient::{Transient, TransientPool};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::camera::{CameraPreset, CameraRig};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

pub const PARTICLE_COUNT: usize = 150;

const SALT: u64 = 0x4D45_524B;

/// Spin rates (radians per second at zero intensity)
const UPPER_SPIN: f32 = 0.5;
const LOWER_SPIN: f32 = -0.35;
const OCTAHEDRON_SPIN: f32 = -0.8;

/// Seeded particle cloud filling the unit cube
pub fn particle_cloud(config: &GeneratorConfig) -> Vec<Vec3> {
    let mut rng = config.rng(SALT);
    (0..PARTICLE_COUNT)
        .map(|_| {
            Vec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            )
        })
        .collect()
}

/// The second tetrahedron: the first mirrored through Z then turned 180° about Z
pub fn mirrored_tetrahedron() -> MeshData {
    let mirror = Mat4::from_rotation_z(PI) * Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
    let mut mesh = shapes::tetrahedron();
    for vertex in &mut mesh.vertices {
        *vertex = mirror.transform_point3(*vertex);
    }
    // Mirroring flips winding
    for [_, b, c] in &mut mesh.triangles {
        std::mem::swap(b, c);
    }
    mesh
}

#[derive(Clone, Copy)]
struct Handles {
    upper: MeshHandle,
    lower: MeshHandle,
    octahedron: MeshHandle,
    particles: MeshHandle,
}

pub struct MerkabaGenerator {
    config: GeneratorConfig,
    rig: CameraRig,
    growth: Growth,
    meshes: OwnedMeshes,
    handles: Option<Handles>,
    upper_angle: f32,
    lower_angle: f32,
    octahedron_angle: f32,
    flashes: TransientPool,
}

impl MerkabaGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            config: config.clone(),
            rig: CameraRig::new(
                CameraPreset::Orbit {
                    speed_rad_per_s: 0.15,
                    elevation: 1.2,
                },
                config.render.clone(),
            ),
            growth: Growth::new(config.growth.clone()),
            meshes: OwnedMeshes::default(),
            handles: None,
            upper_angle: 0.0,
            lower_angle: 0.0,
            octahedron_angle: 0.0,
            flashes: TransientPool::new(8),
        }
    }
}

impl GeometryGenerator for MerkabaGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Merkaba
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        self.handles = Some(Handles {
            upper: self.meshes.allocate(resources, shapes::tetrahedron()),
            lower: self.meshes.allocate(resources, mirrored_tetrahedron()),
            octahedron: self.meshes.allocate(resources, shapes::octahedron()),
            particles: self
                .meshes
                .allocate(resources, MeshData::new(particle_cloud(&self.config))),
        });
        self.upper_angle = 0.0;
        self.lower_angle = 0.0;
        self.octahedron_angle = 0.0;
        self.flashes.clear();
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        let handles = self
            .handles
            .ok_or(GeometryError::NotInitialized(self.mode()))?;
        for handle in [handles.upper, handles.lower, handles.octahedron, handles.particles] {
            resources.mesh(handle)?;
        }

        let dt = input.delta_time;
        let drive = 1.0 + input.intensity;
        self.growth.step(input.audio_active, input.new_activations);
        self.upper_angle = (self.upper_angle + dt * UPPER_SPIN * drive) % TAU;
        self.lower_angle = (self.lower_angle + dt * LOWER_SPIN * drive) % TAU;
        self.octahedron_angle = (self.octahedron_angle + dt * OCTAHEDRON_SPIN * drive) % TAU;

        for _ in input.fresh_activations() {
            self.flashes
                .spawn(Transient::new(Vec3::ZERO, 0.2, 1.2).expanding(2.0));
        }
        self.flashes.step(dt);

        let opacity = self.growth.opacity();
        let scale = (0.5 + input.intensity) * self.growth.scale();
        let chakra = input.selected_chakra.index();
        let upper_color = input.theme.accent;
        let lower_color = input.theme.cycle(chakra + 3);
        let octahedron_color = input.theme.cycle(chakra + 1);

        let solid = |color: Color| MeshStyle {
            stroke: Some(Stroke::new(color.fade(opacity), 1.5)),
            fill: Some(color.fade(opacity * 0.15)),
            points: None,
        };

        let mut children = vec![
            Primitive::Mesh {
                mesh: handles.upper,
                transform: Mat4::from_rotation_y(self.upper_angle),
                style: solid(upper_color),
            },
            Primitive::Mesh {
                mesh: handles.lower,
                transform: Mat4::from_rotation_y(self.lower_angle),
                style: solid(lower_color),
            },
            Primitive::Mesh {
                mesh: handles.octahedron,
                transform: Mat4::from_rotation_y(self.octahedron_angle)
                    * Mat4::from_rotation_x(self.octahedron_angle * 0.5)
                    * Mat4::from_scale(Vec3::splat(0.5)),
                style: MeshStyle::stroked(Stroke::new(octahedron_color.fade(opacity), 1.0)),
            },
            Primitive::Mesh {
                mesh: handles.particles,
                transform: Mat4::from_rotation_y(-self.upper_angle * 0.25),
                style: MeshStyle::points(
                    2.0 + input.bass * 2.0,
                    input.theme.cycle(chakra + 5).fade(opacity * 0.8),
                ),
            },
        ];

        children.extend(self.flashes.iter().map(|flash| Primitive::Sphere {
            center: flash.position,
            radius: flash.scale,
            color: Color::HIGHLIGHT.fade(flash.opacity * 0.3),
        }));

        let mut scene = Scene::world(self.rig.camera_at(input.time), Color::BACKGROUND);
        scene.push(Primitive::Group {
            transform: Mat4::from_scale(Vec3::splat(scale)),
            children,
        });
        Ok(scene)
    }

    fn dispose(&mut self, resources: &mut ResourceStore) {
        self.meshes.release_all(resources);
        self.handles = None;
        self.flashes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};
    use crate::prime::PrimeActivation;

    #[test]
    fn test_particle_cloud_is_seeded() {
        let config = GeneratorConfig::default();
        let a = particle_cloud(&config);
        let b = particle_cloud(&config);
        assert_eq!(a.len(), PARTICLE_COUNT);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.abs().max_element() <= 1.0));

        let other = particle_cloud(&GeneratorConfig {
            seed: 7,
            ..Default::default()
        });
        assert_ne!(a, other);
    }

    #[test]
    fn test_mirrored_tetrahedron_is_point_reflection() {
        let upper = shapes::tetrahedron();
        let lower = mirrored_tetrahedron();
        for (a, b) in upper.vertices.iter().zip(&lower.vertices) {
            assert!((*a + *b).length() < 1e-5);
        }
    }

    #[test]
    fn test_scene_has_four_meshes() {
        let mut generator = MerkabaGenerator::new(&GeneratorConfig::default());
        let (quiet, loud) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Mesh), 4);
        assert_eq!(loud.count(PrimitiveKind::Mesh), 4);
    }

    #[test]
    fn test_activation_spawns_flash() {
        let mut generator = MerkabaGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();

        let bands = vec![200.0; testing::BANDS];
        let activations = [PrimeActivation {
            bin_index: 22,
            candidate: 23,
            mapped_frequency: 230,
            timestamp: 0.5,
        }];
        let mut input = testing::frame(&bands, &activations, 0.5);
        input.new_activations = 1;

        let scene = generator.update(&input, &resources).unwrap();
        assert_eq!(scene.count(PrimitiveKind::Sphere), 1);
        generator.dispose(&mut resources);
    }
}
