//! Sri Yantra: nine interlocking triangles inside two lotus rings.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec3};

use super::resources::{MeshData, MeshHandle, OwnedMeshes, ResourceStore};
use super::scene::{MeshStyle, Primitive, Scene, Stroke};
use super::shapes;
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::camera::{CameraPreset, CameraRig};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// (scale, vertical offset) of the downward triangles, largest first
const DOWNWARD: [(f32, f32); 5] = [
    (1.0, 0.12),
    (0.82, 0.08),
    (0.64, 0.04),
    (0.46, 0.0),
    (0.28, -0.04),
];

/// (scale, vertical offset) of the upward triangles, largest first
const UPWARD: [(f32, f32); 4] = [(0.9, -0.1), (0.7, -0.06), (0.5, -0.02), (0.32, 0.02)];

/// Circumradius of a unit-scale triangle
const TRIANGLE_RADIUS: f32 = 1.4;

pub const INNER_PETALS: usize = 8;
pub const OUTER_PETALS: usize = 16;
const INNER_LOTUS_RADIUS: f32 = 1.5;
const OUTER_LOTUS_RADIUS: f32 = 1.85;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YantraTriangle {
    pub points: [Vec3; 3],
    pub downward: bool,
}

/// The nine triangles, downward ones first
pub fn triangles() -> Vec<YantraTriangle> {
    let build = |(scale, offset): (f32, f32), downward: bool| {
        let apex = if downward { -FRAC_PI_2 } else { FRAC_PI_2 };
        let center = Vec3::new(0.0, offset, 0.0);
        let radius = TRIANGLE_RADIUS * scale;
        let points = [0.0, 1.0, 2.0].map(|k: f32| {
            let angle = apex + k * TAU / 3.0;
            center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
        });
        YantraTriangle { points, downward }
    };

    DOWNWARD
        .iter()
        .map(|&spec| build(spec, true))
        .chain(UPWARD.iter().map(|&spec| build(spec, false)))
        .collect()
}

/// Petal outlines evenly spaced around a ring
pub fn lotus(count: usize, radius: f32, length: f32) -> Vec<Vec<Vec3>> {
    let width = TAU * radius / count as f32 * 0.9;
    (0..count)
        .map(|k| {
            let angle = FRAC_PI_2 + k as f32 * TAU / count as f32;
            let base = Vec3::new(angle.cos(), angle.sin(), 0.0) * radius;
            shapes::petal(base, angle, length, width, 12)
        })
        .collect()
}

/// Three nested square outlines around the lotus rings
pub fn bhupura() -> MeshData {
    let mut mesh = MeshData::default();
    for half in [2.3, 2.4, 2.5] {
        let corners = vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ];
        mesh.merge(&MeshData::strip(corners, true));
    }
    mesh
}

pub struct SriYantraGenerator {
    rig: CameraRig,
    growth: Growth,
    triangles: Vec<YantraTriangle>,
    inner_lotus: Vec<Vec<Vec3>>,
    outer_lotus: Vec<Vec<Vec3>>,
    meshes: OwnedMeshes,
    enclosure: Option<MeshHandle>,
    lotus_angle: f32,
}

impl SriYantraGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rig: CameraRig::new(CameraPreset::Fixed, config.render.clone()),
            growth: Growth::new(config.growth.clone()),
            triangles: triangles(),
            inner_lotus: lotus(INNER_PETALS, INNER_LOTUS_RADIUS, 0.3),
            outer_lotus: lotus(OUTER_PETALS, OUTER_LOTUS_RADIUS, 0.35),
            meshes: OwnedMeshes::default(),
            enclosure: None,
            lotus_angle: 0.0,
        }
    }
}

impl GeometryGenerator for SriYantraGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::SriYantra
    }

    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()> {
        self.enclosure = Some(self.meshes.allocate(resources, bhupura()));
        self.lotus_angle = 0.0;
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore) -> GeometryResult<Scene> {
        let enclosure = self
            .enclosure
            .ok_or(GeometryError::NotInitialized(self.mode()))?;
        resources.mesh(enclosure)?;

        self.growth.step(input.audio_active, input.new_activations);
        self.lotus_angle = (self.lotus_angle + input.delta_time * (0.03 + input.intensity * 0.2)) % TAU;
        let opacity = self.growth.opacity();
        let chakra = input.selected_chakra.index();
        let breath = 1.0 + input.intensity * 0.08;

        let mut children = vec![Primitive::Mesh {
            mesh: enclosure,
            transform: Mat4::IDENTITY,
            style: MeshStyle::stroked(Stroke::new(
                input.theme.cycle(chakra + 3).fade(opacity * 0.6),
                1.5,
            )),
        }];

        let mut yantra = Vec::with_capacity(self.triangles.len());
        for (i, triangle) in self.triangles.iter().enumerate() {
            let level = input.band_for(i, self.triangles.len());
            let color = if triangle.downward {
                input.theme.accent
            } else {
                input.theme.cycle(chakra + 1)
            };
            yantra.push(Primitive::Polyline {
                points: triangle.points.to_vec(),
                closed: true,
                stroke: Stroke::new(color.lerp(Color::WHITE, level * 0.4).fade(opacity), 1.5),
            });
        }
        children.push(Primitive::Group {
            transform: Mat4::from_scale(Vec3::splat(breath)),
            children: yantra,
        });

        // Lotus rings turn in opposite directions
        let rings = [(&self.inner_lotus, 1.0f32), (&self.outer_lotus, -1.0f32)];
        for (ring, (outlines, direction)) in rings.into_iter().enumerate() {
            let count = outlines.len();
            let mut ring_children = Vec::with_capacity(count);
            for (k, outline) in outlines.iter().enumerate() {
                let level = input.band_for(k, count);
                ring_children.push(Primitive::Polyline {
                    points: outline.clone(),
                    closed: true,
                    stroke: Stroke::new(
                        input
                            .theme
                            .cycle(chakra + 5 + ring)
                            .lerp(Color::WHITE, level * 0.5)
                            .fade(opacity),
                        1.0 + level,
                    ),
                });
            }
            children.push(Primitive::Group {
                transform: Mat4::from_rotation_z(self.lotus_angle * direction),
                children: ring_children,
            });
        }

        for radius in [INNER_LOTUS_RADIUS, OUTER_LOTUS_RADIUS] {
            children.push(Primitive::Circle {
                center: Vec3::ZERO,
                radius,
                stroke: Some(Stroke::new(input.theme.accent.fade(opacity * 0.4), 1.0)),
                fill: None,
            });
        }

        children.push(Primitive::Sphere {
            center: Vec3::new(0.0, 0.0, 0.01),
            radius: 0.06 * (1.0 + input.bass),
            color: Color::HIGHLIGHT.fade(opacity),
        });

        let mut scene = Scene::world(self.rig.camera_at(input.time), Color::BACKGROUND);
        scene.push(Primitive::Group {
            transform: Mat4::from_scale(Vec3::splat(self.growth.scale())),
            children,
        });
        Ok(scene)
    }

    fn dispose(&mut self, resources: &mut ResourceStore) {
        self.meshes.release_all(resources);
        self.enclosure = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};

    #[test]
    fn test_nine_triangles() {
        let triangles = triangles();
        assert_eq!(triangles.len(), 9);
        assert_eq!(triangles.iter().filter(|t| t.downward).count(), 5);

        // downward apex sits below the centroid
        let first = triangles[0];
        let centroid = (first.points[0] + first.points[1] + first.points[2]) / 3.0;
        assert!(first.points[0].y < centroid.y);
    }

    #[test]
    fn test_scales_decrease() {
        for set in [&DOWNWARD[..], &UPWARD[..]] {
            for pair in set.windows(2) {
                assert!(pair[0].0 > pair[1].0);
            }
        }
    }

    #[test]
    fn test_scene_counts() {
        let mut generator = SriYantraGenerator::new(&GeneratorConfig::default());
        let (_, loud) = testing::exercise(&mut generator);

        let mut triangles = 0;
        let mut petals = 0;
        loud.visit(|primitive, _| {
            if let Primitive::Polyline { points, .. } = primitive {
                if points.len() == 3 {
                    triangles += 1;
                } else {
                    petals += 1;
                }
            }
        });
        assert_eq!(triangles, 9);
        assert_eq!(petals, INNER_PETALS + OUTER_PETALS);
        assert_eq!(loud.count(PrimitiveKind::Sphere), 1);
    }

    #[test]
    fn test_bhupura_is_three_squares() {
        let mesh = bhupura();
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.edges.len(), 12);
    }
}
