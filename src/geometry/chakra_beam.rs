//! Chakra beam: seven glyph nodes on a vertical column of rising light.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

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
use crate::theme::{Chakra, Color};

pub const NODE_COUNT: usize = 7;
pub const PARTICLE_COUNT: usize = 60;

const SALT: u64 = 0x4348_414B;
const BEAM_HALF_HEIGHT: f32 = 2.3;
const NODE_SPACING: f32 = 0.6;
const GLYPH_SIZE: f32 = 0.18;

/// Height of node `k`, root at the bottom
pub fn node_position(k: usize) -> Vec3 {
    let first = -NODE_SPACING * (NODE_COUNT - 1) as f32 / 2.0;
    Vec3::new(0.0, first + k as f32 * NODE_SPACING, 0.0)
}

/// Unit-size glyph outline for a chakra
pub fn glyph(chakra: Chakra) -> MeshData {
    match chakra {
        Chakra::Root => MeshData::strip(shapes::regular_polygon(Vec3::ZERO, 1.0, 4, PI / 4.0), true),
        Chakra::Sacral => {
            let mut points = shapes::arc_points(Vec3::ZERO, 1.0, PI / 6.0, TAU - PI / 6.0, 24, true);
            let mut inner = shapes::arc_points(
                Vec3::new(0.35, 0.0, 0.0),
                0.75,
                PI / 4.0,
                TAU - PI / 4.0,
                24,
                true,
            );
            inner.reverse();
            points.extend(inner);
            MeshData::strip(points, true)
        }
        Chakra::SolarPlexus => {
            MeshData::strip(shapes::regular_polygon(Vec3::ZERO, 1.0, 3, -FRAC_PI_2), true)
        }
        Chakra::Heart => {
            let mut mesh =
                MeshData::strip(shapes::regular_polygon(Vec3::ZERO, 1.0, 3, FRAC_PI_2), true);
            mesh.merge(&MeshData::strip(
                shapes::regular_polygon(Vec3::ZERO, 1.0, 3, -FRAC_PI_2),
                true,
            ));
            mesh
        }
        Chakra::Throat => {
            let mut mesh = shapes::unit_circle(32);
            mesh.merge(&MeshData::strip(
                shapes::circle_points(Vec3::ZERO, 0.25, 12),
                true,
            ));
            mesh
        }
        Chakra::ThirdEye => {
            // Two lens arcs meeting at the corners, plus the iris
            let mut lens =
                shapes::arc_points(Vec3::new(0.0, -0.6, 0.0), 1.17, PI * 0.2, PI * 0.8, 16, true);
            lens.extend(shapes::arc_points(
                Vec3::new(0.0, 0.6, 0.0),
                1.17,
                PI * 1.2,
                PI * 1.8,
                16,
                true,
            ));
            let mut mesh = MeshData::strip(lens, true);
            mesh.merge(&MeshData::strip(
                shapes::circle_points(Vec3::ZERO, 0.35, 16),
                true,
            ));
            mesh
        }
        Chakra::Crown => {
            let mut mesh = MeshData::default();
            for k in 0..8 {
                let angle = k as f32 * TAU / 8.0;
                let base = Vec3::new(angle.cos(), angle.sin(), 0.0) * 0.3;
                mesh.merge(&MeshData::strip(shapes::petal(base, angle, 0.7, 0.3, 8), true));
            }
            mesh
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BeamParticle {
    position: Vec3,
    speed: f32,
}

fn seed_particles(config: &GeneratorConfig) -> Vec<BeamParticle> {
    let mut rng = config.rng(SALT);
    (0..PARTICLE_COUNT)
        .map(|_| BeamParticle {
            position: Vec3::new(
                rng.random_range(-0.15..=0.15),
                rng.random_range(-BEAM_HALF_HEIGHT..BEAM_HALF_HEIGHT),
                rng.random_range(-0.15..=0.15),
            ),
            speed: rng.random_range(0.5..1.5),
        })
        .collect()
}

pub struct ChakraBeamGenerator {
    config: GeneratorConfig,
    rig: CameraRig,
    growth: Growth,
    meshes: OwnedMeshes,
    glyphs: Vec<MeshHandle>,
    particles: Vec<BeamParticle>,
    bursts: TransientPool,
    since_burst: f32,
    spin: f32,
}

impl ChakraBeamGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            config: config.clone(),
            rig: CameraRig::new(CameraPreset::Fixed, config.render.clone()),
            growth: Growth::new(config.growth.clone()),
            meshes: OwnedMeshes::default(),
            glyphs: Vec::new(),
            particles: Vec::new(),
            bursts: TransientPool::new(24),
            since_burst: 0.0,
            spin: 0.0,
        }
    }

    fn spawn_burst(&mut self, node: usize, highlight: bool) {
        let ring = Transient::new(node_position(node), GLYPH_SIZE, 0.8)
            .expanding(0.9)
            .tagged(usize::from(highlight));
        self.bursts.spawn(ring);
    }
}

impl GeometryGenerator for ChakraBeamGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::ChakraBeam
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        self.glyphs = Chakra::ALL
            .iter()
            .map(|&chakra| self.meshes.allocate(resources, glyph(chakra)))
            .collect();
        self.particles = seed_particles(&self.config);
        self.bursts.clear();
        self.since_burst = 0.0;
        self.spin = 0.0;
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        if self.glyphs.len() != NODE_COUNT {
            return Err(GeometryError::NotInitialized(self.mode()));
        }
        for &handle in &self.glyphs {
            resources.mesh(handle)?;
        }

        let dt = input.delta_time;
        self.growth.step(input.audio_active, input.new_activations);
        self.spin = (self.spin + dt * (0.5 + input.intensity * 2.0)) % TAU;

        let rise = 0.3 + input.intensity * 1.5;
        for particle in &mut self.particles {
            particle.position.y += dt * particle.speed * rise;
            if particle.position.y > BEAM_HALF_HEIGHT {
                particle.position.y -= 2.0 * BEAM_HALF_HEIGHT;
            }
        }

        let selected = input.selected_chakra.index();
        self.bursts.step(dt);
        self.since_burst += dt;
        let interval = 0.6 / (1.0 + input.intensity * 2.0);
        if self.since_burst >= interval {
            self.since_burst = 0.0;
            self.spawn_burst(selected, false);
        }
        for _ in input.fresh_activations() {
            self.spawn_burst(selected, true);
        }

        let opacity = self.growth.opacity();
        let mut children = vec![Primitive::Line {
            from: Vec3::new(0.0, -BEAM_HALF_HEIGHT, 0.0),
            to: Vec3::new(0.0, BEAM_HALF_HEIGHT, 0.0),
            stroke: Stroke::new(
                Color::WHITE.lerp(input.theme.accent, 0.5).fade(opacity * 0.5),
                3.0 + input.bass * 6.0,
            ),
        }];

        children.extend(self.particles.iter().map(|particle| Primitive::Point {
            position: particle.position,
            size: 2.0 + particle.speed,
            color: input.theme.accent.lighten(0.5).fade(opacity * 0.7),
        }));

        for (k, &handle) in self.glyphs.iter().enumerate() {
            let level = input.band_for(k, NODE_COUNT);
            let center = node_position(k);
            let color = input.theme.chakras[k];
            let is_selected = k == selected;
            let spin = if is_selected { self.spin } else { 0.0 };

            children.push(Primitive::Sphere {
                center,
                radius: 0.1 * (1.0 + level * 0.6) * if is_selected { 1.4 } else { 1.0 },
                color: color.fade(opacity * (0.5 + level * 0.5)),
            });
            children.push(Primitive::Mesh {
                mesh: handle,
                transform: Mat4::from_translation(center + Vec3::new(0.0, 0.0, 0.05))
                    * Mat4::from_rotation_z(spin)
                    * Mat4::from_scale(Vec3::splat(GLYPH_SIZE * (1.0 + level * 0.3))),
                style: MeshStyle::stroked(Stroke::new(
                    color.lerp(Color::WHITE, 0.3).fade(opacity),
                    if is_selected { 2.0 } else { 1.2 },
                )),
            });
        }

        children.extend(self.bursts.iter().map(|ring| {
            let color = if ring.tag == 1 {
                Color::HIGHLIGHT
            } else {
                input.theme.accent
            };
            Primitive::Circle {
                center: ring.position,
                radius: ring.scale,
                stroke: Some(Stroke::new(color.fade(ring.opacity * opacity), 1.5)),
                fill: None,
            }
        }));

        let mut scene = Scene::world(self.rig.camera_at(input.time), Color::BACKGROUND);
        scene.push(Primitive::Group {
            transform: Mat4::from_scale(Vec3::splat(self.growth.scale())),
            children,
        });
        Ok(scene)
    }

    fn dispose(&mut self, resources: &mut ResourceStore) {
        self.meshes.release_all(resources);
        self.glyphs.clear();
        self.particles.clear();
        self.bursts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};

    #[test]
    fn test_nodes_evenly_spaced_and_centred() {
        let first = node_position(0);
        let last = node_position(NODE_COUNT - 1);
        assert!((first.y + last.y).abs() < 1e-5);
        for k in 1..NODE_COUNT {
            let gap = node_position(k).y - node_position(k - 1).y;
            assert!((gap - NODE_SPACING).abs() < 1e-5);
        }
    }

    #[test]
    fn test_every_glyph_is_valid() {
        for chakra in Chakra::ALL {
            let mesh = glyph(chakra);
            assert!(mesh.is_valid(), "{} glyph invalid", chakra);
            assert!(!mesh.edges.is_empty());
        }
        assert_eq!(glyph(Chakra::Root).edges.len(), 4);
        assert_eq!(glyph(Chakra::Heart).edges.len(), 6);
    }

    #[test]
    fn test_scene_contents() {
        let mut generator = ChakraBeamGenerator::new(&GeneratorConfig::default());
        let (quiet, loud) = testing::exercise(&mut generator);
        for scene in [&quiet, &loud] {
            assert_eq!(scene.count(PrimitiveKind::Mesh), NODE_COUNT);
            assert_eq!(scene.count(PrimitiveKind::Sphere), NODE_COUNT);
            assert_eq!(scene.count(PrimitiveKind::Point), PARTICLE_COUNT);
        }
        // 1.5 s at full intensity spawns several bursts
        assert!(loud.count(PrimitiveKind::Circle) > 0);
    }

    #[test]
    fn test_particles_stay_in_beam() {
        let mut generator = ChakraBeamGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        testing::drive(&mut generator, &mut resources, 255.0, 600);
        assert!(generator
            .particles
            .iter()
            .all(|p| p.position.y.abs() <= BEAM_HALF_HEIGHT));
        generator.dispose(&mut resources);
    }
}
