//! Metatron's Cube: 13 circles of the Fruit of Life, fully connected.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, TAU};

use glam::{Mat4, Vec3};

use super::resources::{MeshData, MeshHandle, OwnedMeshes, ResourceStore};
use super::scene::{MeshStyle, Primitive, Scene, Stroke};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::camera::{CameraPreset, CameraRig};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

pub const VERTEX_COUNT: usize = 13;

/// Centre plus alternating outer vertices, the two interlocking tetrahedra
pub const TETRAHEDRA: [[usize; 4]; 2] = [[0, 7, 9, 11], [0, 8, 10, 12]];

const INNER_RADIUS: f32 = 1.0;
const OUTER_RADIUS: f32 = 2.0;
const VERTEX_RADIUS: f32 = 0.08;

/// Centre, inner hexagon, outer hexagon; pointy side up
pub fn vertices() -> Vec<Vec3> {
    let mut vertices = Vec::with_capacity(VERTEX_COUNT);
    vertices.push(Vec3::ZERO);
    for radius in [INNER_RADIUS, OUTER_RADIUS] {
        for k in 0..6 {
            let angle = FRAC_PI_2 + k as f32 * FRAC_PI_3;
            vertices.push(Vec3::new(angle.cos(), angle.sin(), 0.0) * radius);
        }
    }
    vertices
}

/// Every unordered vertex pair
pub fn edges() -> Vec<[u32; 2]> {
    let n = VERTEX_COUNT as u32;
    (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| [a, b]))
        .collect()
}

pub struct MetatronGenerator {
    rig: CameraRig,
    growth: Growth,
    vertices: Vec<Vec3>,
    meshes: OwnedMeshes,
    lattice: Option<MeshHandle>,
    rotation: f32,
}

impl MetatronGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rig: CameraRig::new(
                CameraPreset::Drift {
                    amplitude: 0.4,
                    freq_hz: 0.05,
                },
                config.render.clone(),
            ),
            growth: Growth::new(config.growth.clone()),
            vertices: vertices(),
            meshes: OwnedMeshes::default(),
            lattice: None,
            rotation: 0.0,
        }
    }
}

impl GeometryGenerator for MetatronGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::MetatronCube
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        let mesh = MeshData::new(self.vertices.clone()).with_edges(edges());
        self.lattice = Some(self.meshes.allocate(resources, mesh));
        self.rotation = 0.0;
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        let lattice = self
            .lattice
            .ok_or(GeometryError::NotInitialized(self.mode()))?;
        resources.mesh(lattice)?;

        self.growth.step(input.audio_active, input.new_activations);
        self.rotation = (self.rotation + input.delta_time * (0.05 + input.intensity * 0.3)) % TAU;
        let opacity = self.growth.opacity();
        let chakra = input.selected_chakra.index();

        let mut children = vec![Primitive::Mesh {
            mesh: lattice,
            transform: Mat4::IDENTITY,
            style: MeshStyle::stroked(Stroke::new(
                input.theme.cycle(chakra + 4).fade(opacity * 0.35),
                1.0,
            )),
        }];

        for (t, tetra) in TETRAHEDRA.iter().enumerate() {
            let color = if t == 0 {
                input.theme.accent
            } else {
                input.theme.cycle(chakra + 2)
            };
            let stroke = Stroke::new(color.fade(opacity), 2.0 + input.bass * 2.0);
            for (i, &a) in tetra.iter().enumerate() {
                for &b in &tetra[i + 1..] {
                    children.push(Primitive::Line {
                        from: self.vertices[a],
                        to: self.vertices[b],
                        stroke,
                    });
                }
            }
        }

        for (k, &center) in self.vertices.iter().enumerate() {
            let level = input.band_for(k, VERTEX_COUNT);
            children.push(Primitive::Sphere {
                center,
                radius: VERTEX_RADIUS * (1.0 + level * 0.8),
                color: input.theme.cycle(k).lerp(Color::WHITE, level * 0.3).fade(opacity),
            });
        }

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
        self.lattice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};

    #[test]
    fn test_vertex_layout() {
        let vertices = vertices();
        assert_eq!(vertices.len(), VERTEX_COUNT);
        assert_eq!(vertices[0], Vec3::ZERO);
        for v in &vertices[1..7] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        for v in &vertices[7..] {
            assert!((v.length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_all_78_edges() {
        let edges = edges();
        assert_eq!(edges.len(), 78);
        assert!(edges.iter().all(|[a, b]| a < b));
    }

    #[test]
    fn test_scene_contents() {
        let config = GeneratorConfig::default();
        let mut generator = MetatronGenerator::new(&config);
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();

        let scene = testing::drive(&mut generator, &mut resources, 128.0, 10);
        assert_eq!(scene.count(PrimitiveKind::Sphere), 13);
        assert_eq!(scene.count(PrimitiveKind::Line), 12);

        let mut lattice_edges = 0;
        scene.visit(|primitive, _| {
            if let Primitive::Mesh { mesh, .. } = primitive {
                lattice_edges = resources.get(*mesh).map_or(0, |m| m.edges.len());
            }
        });
        assert_eq!(lattice_edges, 78);

        generator.dispose(&mut resources);
        assert_eq!(resources.live_count(), 0);
    }

    #[test]
    fn test_vertex_pulses_with_its_band() {
        let mut generator = MetatronGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();

        // vertex 5 reads band 5·64/13 = 24
        let mut bands = vec![0.0; testing::BANDS];
        bands[24] = 255.0;
        let scene = generator
            .update(&testing::frame(&bands, &[], 0.0), &resources)
            .unwrap();

        let mut radii = Vec::new();
        scene.visit(|primitive, _| {
            if let Primitive::Sphere { radius, .. } = primitive {
                radii.push(*radius);
            }
        });
        assert!((radii[5] - VERTEX_RADIUS * 1.8).abs() < 1e-5);
        assert!((radii[4] - VERTEX_RADIUS).abs() < 1e-5);
    }

    #[test]
    fn test_exercise_contract() {
        testing::exercise(&mut MetatronGenerator::new(&GeneratorConfig::default()));
    }
}
