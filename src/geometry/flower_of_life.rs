//! Flower of Life: hexagonal rings of overlapping circles and spheres.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use super::resources::{MeshHandle, OwnedMeshes, ResourceStore};
use super::scene::{MeshStyle, Primitive, Scene, Stroke};
use super::shapes;
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::camera::{CameraPreset, CameraRig};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Rings 0..=3: 1 + 6 + 12 + 18 cells
pub const RINGS: usize = 4;

/// Radius of one cell (world units)
pub const CELL_RADIUS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellShape {
    Circle,
    Sphere,
}

/// One circle or sphere of the pattern
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowerCell {
    pub ring: usize,
    pub index: usize,
    pub position: Vec3,
    pub shape: CellShape,

    /// Matching point on the next ring inward, when connected
    pub connector: Option<Vec3>,
}

/// Deterministic cell layout for a given cell radius
pub fn layout(cell_radius: f32) -> Vec<FlowerCell> {
    let spacing = cell_radius * 3f32.sqrt();
    let mut cells = Vec::new();

    for ring in 0..RINGS {
        let count = if ring == 0 { 1 } else { 6 * ring };
        for index in 0..count {
            let angle = index as f32 / count as f32 * TAU;
            let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let shape = if ring % 2 == 0 || index % 3 == 0 {
                CellShape::Sphere
            } else {
                CellShape::Circle
            };
            let connector =
                (ring > 0 && index % 2 == 0).then(|| direction * (ring - 1) as f32 * spacing);

            cells.push(FlowerCell {
                ring,
                index,
                position: direction * ring as f32 * spacing,
                shape,
                connector,
            });
        }
    }
    cells
}

pub struct FlowerOfLifeGenerator {
    rig: CameraRig,
    growth: Growth,
    cells: Vec<FlowerCell>,
    meshes: OwnedMeshes,
    circle: Option<MeshHandle>,
    sphere: Option<MeshHandle>,
    rotation: f32,
}

impl FlowerOfLifeGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rig: CameraRig::new(CameraPreset::Fixed, config.render.clone()),
            growth: Growth::new(config.growth.clone()),
            cells: layout(CELL_RADIUS),
            meshes: OwnedMeshes::default(),
            circle: None,
            sphere: None,
            rotation: 0.0,
        }
    }

    pub fn cells(&self) -> &[FlowerCell] {
        &self.cells
    }
}

impl GeometryGenerator for FlowerOfLifeGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::FlowerOfLife
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        self.circle = Some(self.meshes.allocate(resources, shapes::unit_circle(48)));
        self.sphere = Some(self.meshes.allocate(resources, shapes::wire_sphere(6, 4, 24)));
        self.rotation = 0.0;
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        let (circle, sphere) = match (self.circle, self.sphere) {
            (Some(circle), Some(sphere)) => (circle, sphere),
            _ => return Err(GeometryError::NotInitialized(self.mode())),
        };
        resources.mesh(circle)?;
        resources.mesh(sphere)?;

        self.growth.step(input.audio_active, input.new_activations);
        self.rotation = (self.rotation + input.delta_time * (0.1 + input.intensity * 0.5)) % TAU;

        let opacity = self.growth.opacity();
        let hot_rings: Vec<usize> = input
            .activations
            .iter()
            .map(|a| a.bin_index % RINGS)
            .collect();

        let mut children = Vec::with_capacity(self.cells.len() * 2);
        for cell in &self.cells {
            let base = input.theme.cycle(input.selected_chakra.index() + cell.ring);
            let color = if hot_rings.contains(&cell.ring) {
                base.lerp(Color::HIGHLIGHT, 0.6)
            } else {
                base
            };
            let pulse = 1.0 + input.band_for(cell.ring, RINGS) * 0.3;
            let transform = Mat4::from_translation(cell.position)
                * Mat4::from_scale(Vec3::splat(CELL_RADIUS * pulse));

            let (mesh, stroke) = match cell.shape {
                CellShape::Sphere => (sphere, Stroke::new(color.fade(opacity * 0.6), 1.0)),
                CellShape::Circle => (circle, Stroke::new(color.fade(opacity), 1.5)),
            };
            children.push(Primitive::Mesh {
                mesh,
                transform,
                style: MeshStyle::stroked(stroke),
            });

            if let Some(target) = cell.connector {
                children.push(Primitive::Line {
                    from: cell.position,
                    to: target,
                    stroke: Stroke::new(input.theme.accent.fade(opacity * 0.5), 1.0),
                });
            }
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
        self.circle = None;
        self.sphere = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing;
    use crate::geometry::PrimitiveKind;

    #[test]
    fn test_layout_has_37_cells() {
        let cells = layout(CELL_RADIUS);
        assert_eq!(cells.len(), 37);
        let per_ring: Vec<usize> = (0..RINGS)
            .map(|r| cells.iter().filter(|c| c.ring == r).count())
            .collect();
        assert_eq!(per_ring, vec![1, 6, 12, 18]);
    }

    #[test]
    fn test_shape_alternation() {
        let cells = layout(CELL_RADIUS);
        for cell in &cells {
            let expected = if cell.ring % 2 == 0 || cell.index % 3 == 0 {
                CellShape::Sphere
            } else {
                CellShape::Circle
            };
            assert_eq!(cell.shape, expected);
        }
        // ring 1: indices 0 and 3 are spheres
        let ring1_spheres = cells
            .iter()
            .filter(|c| c.ring == 1 && c.shape == CellShape::Sphere)
            .count();
        assert_eq!(ring1_spheres, 2);
    }

    #[test]
    fn test_ring_radius_and_connectors() {
        let spacing = CELL_RADIUS * 3f32.sqrt();
        for cell in layout(CELL_RADIUS) {
            assert!((cell.position.length() - cell.ring as f32 * spacing).abs() < 1e-5);
            match cell.connector {
                Some(target) => {
                    assert!(cell.ring > 0 && cell.index % 2 == 0);
                    assert!((target.length() - (cell.ring - 1) as f32 * spacing).abs() < 1e-5);
                }
                None => assert!(cell.ring == 0 || cell.index % 2 == 1),
            }
        }
    }

    #[test]
    fn test_scene_counts() {
        let mut generator = FlowerOfLifeGenerator::new(&GeneratorConfig::default());
        let (quiet, loud) = testing::exercise(&mut generator);
        for scene in [quiet, loud] {
            assert_eq!(scene.count(PrimitiveKind::Mesh), 37);
            assert_eq!(scene.count(PrimitiveKind::Line), 3 + 6 + 9);
        }
    }

    #[test]
    fn test_update_before_init_fails() {
        let mut generator = FlowerOfLifeGenerator::new(&GeneratorConfig::default());
        let resources = ResourceStore::new();
        let bands = vec![0.0; testing::BANDS];
        let result = generator.update(&testing::frame(&bands, &[], 0.0), &resources);
        assert!(matches!(result, Err(GeometryError::NotInitialized(_))));
    }
}
