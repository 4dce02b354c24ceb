//! Scene tessellation into colored triangles.
//!
//! Every primitive is projected to logical pixels, expanded into triangles
//! there (so stroke widths stay in pixels under perspective) and finally
//! emitted in normalized device coordinates.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;
use crate::error::GeometryResult;
use crate::geometry::{Primitive, ResourceStore, Scene, Space, Stroke};
use crate::theme::Color;

/// Thinnest line that still covers pixels
const MIN_LINE_WIDTH: f32 = 0.75;

const MIN_SEGMENTS: usize = 12;
const MAX_SEGMENTS: usize = 96;

/// Vertex shared by both backends
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    /// Normalized device coordinates, +Y up
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Triangle list ready for a surface
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub clear: Color,
    pub vertices: Vec<ColorVertex>,
}

impl Frame {
    /// Nothing but the clear color
    pub fn empty(clear: Color) -> Self {
        Self {
            clear,
            vertices: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Flatten `scene` into triangles for a viewport in logical pixels
pub fn tessellate(scene: &Scene, resources: &ResourceStore, viewport: Vec2) -> GeometryResult<Frame> {
    let projector = Projector::new(scene.space, viewport);
    let mut builder = Builder::new(viewport);

    let mut result = Ok(());
    scene.visit(|primitive, transform| {
        if result.is_ok() {
            result = emit(primitive, transform, &projector, resources, &mut builder);
        }
    });
    result?;

    Ok(Frame {
        clear: scene.clear,
        vertices: builder.vertices,
    })
}

/// Circle segment count for an on-screen radius
fn segments_for(radius_px: f32) -> usize {
    ((radius_px * 0.5) as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Largest axis scale of a transform
fn max_scale(transform: &Mat4) -> f32 {
    transform
        .x_axis
        .truncate()
        .length()
        .max(transform.y_axis.truncate().length())
        .max(transform.z_axis.truncate().length())
}

struct Projector {
    camera: Option<Camera>,
    view_proj: Mat4,
    viewport: Vec2,
}

impl Projector {
    fn new(space: Space, viewport: Vec2) -> Self {
        match space {
            Space::Screen => Self {
                camera: None,
                view_proj: Mat4::IDENTITY,
                viewport,
            },
            Space::World(camera) => Self {
                camera: Some(camera),
                view_proj: camera.view_proj(viewport.x / viewport.y.max(1.0)),
                viewport,
            },
        }
    }

    /// Logical pixel position of a point and the pixels per unit there.
    /// `None` when the point sits behind the near plane.
    fn project(&self, point: Vec3) -> Option<(Vec2, f32)> {
        let Some(camera) = &self.camera else {
            return Some((point.truncate(), 1.0));
        };

        let clip = self.view_proj * point.extend(1.0);
        if clip.w < camera.near {
            return None;
        }
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        let px = Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        );
        Some((px, camera.pixels_per_unit(self.viewport.y, clip.w)))
    }
}

struct Builder {
    viewport: Vec2,
    vertices: Vec<ColorVertex>,
}

impl Builder {
    fn new(viewport: Vec2) -> Self {
        Self {
            viewport: viewport.max(Vec2::ONE),
            vertices: Vec::new(),
        }
    }

    fn vertex(&mut self, p: Vec2, color: Color) {
        self.vertices.push(ColorVertex {
            position: [
                p.x / self.viewport.x * 2.0 - 1.0,
                1.0 - p.y / self.viewport.y * 2.0,
            ],
            color: color.to_array(),
        });
    }

    fn triangle(&mut self, [a, b, c]: [Vec2; 3], [ca, cb, cc]: [Color; 3]) {
        self.vertex(a, ca);
        self.vertex(b, cb);
        self.vertex(c, cc);
    }

    fn line(&mut self, a: Vec2, b: Vec2, stroke: &Stroke) {
        if stroke.color.a <= 0.0 || stroke.width <= 0.0 {
            return;
        }
        let dir = b - a;
        let len = dir.length();
        if len < 1e-4 {
            return;
        }
        let half = stroke.width.max(MIN_LINE_WIDTH) * 0.5;
        let n = Vec2::new(-dir.y, dir.x) / len * half;
        let colors = [stroke.color; 3];
        self.triangle([a + n, b + n, b - n], colors);
        self.triangle([a + n, b - n, a - n], colors);
    }

    fn polyline(&mut self, points: &[Vec2], closed: bool, stroke: &Stroke) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], stroke);
        }
        if closed && points.len() > 2 {
            self.line(points[points.len() - 1], points[0], stroke);
        }
    }

    /// Fan over a convex outline
    fn fan(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 || color.a <= 0.0 {
            return;
        }
        for i in 1..points.len() - 1 {
            self.triangle([points[0], points[i], points[i + 1]], [color; 3]);
        }
    }

    /// Fan from an interior point over a closed ring
    fn fan_around(&mut self, center: Vec2, ring: &[Vec2], inner: Color, outer: Color) {
        if ring.len() < 3 || (inner.a <= 0.0 && outer.a <= 0.0) {
            return;
        }
        for i in 0..ring.len() {
            let next = ring[(i + 1) % ring.len()];
            self.triangle([center, ring[i], next], [inner, outer, outer]);
        }
    }

    /// Radially shaded disc
    fn disc(&mut self, center: Vec2, radius: f32, inner: Color, outer: Color) {
        if radius <= 0.0 {
            return;
        }
        let segments = segments_for(radius);
        let ring: Vec<Vec2> = (0..segments)
            .map(|i| {
                let angle = i as f32 * TAU / segments as f32;
                center + Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        self.fan_around(center, &ring, inner, outer);
    }
}

fn emit(
    primitive: &Primitive,
    transform: &Mat4,
    projector: &Projector,
    resources: &ResourceStore,
    builder: &mut Builder,
) -> GeometryResult<()> {
    let project = |p: Vec3| projector.project(transform.transform_point3(p));
    let project_all = |points: &[Vec3]| -> Option<Vec<Vec2>> {
        points.iter().map(|&p| project(p).map(|(px, _)| px)).collect()
    };

    match primitive {
        Primitive::Line { from, to, stroke } => {
            if let (Some((a, _)), Some((b, _))) = (project(*from), project(*to)) {
                builder.line(a, b, stroke);
            }
        }

        Primitive::Polyline {
            points,
            closed,
            stroke,
        } => {
            if let Some(points) = project_all(points) {
                builder.polyline(&points, *closed, stroke);
            }
        }

        Primitive::Polygon { points, fill } => {
            if let Some(points) = project_all(points) {
                builder.fan(&points, *fill);
            }
        }

        Primitive::Circle {
            center,
            radius,
            stroke,
            fill,
        } => {
            let Some((center_px, ppu)) = project(*center) else {
                return Ok(());
            };
            let segments = segments_for(radius * max_scale(transform) * ppu);
            let outline: Vec<Vec3> = (0..segments)
                .map(|i| {
                    let angle = i as f32 * TAU / segments as f32;
                    *center + Vec3::new(angle.cos(), angle.sin(), 0.0) * *radius
                })
                .collect();
            let Some(ring) = project_all(&outline) else {
                return Ok(());
            };
            if let Some(fill) = fill {
                builder.fan_around(center_px, &ring, *fill, *fill);
            }
            if let Some(stroke) = stroke {
                builder.polyline(&ring, true, stroke);
            }
        }

        Primitive::Sphere {
            center,
            radius,
            color,
        } => {
            if let Some((center_px, ppu)) = project(*center) {
                let radius_px = radius * max_scale(transform) * ppu;
                builder.disc(center_px, radius_px, color.lighten(0.4), *color);
            }
        }

        Primitive::Rect { min, max, fill } => {
            let corners = [
                Vec3::new(min.x, min.y, 0.0),
                Vec3::new(max.x, min.y, 0.0),
                Vec3::new(max.x, max.y, 0.0),
                Vec3::new(min.x, max.y, 0.0),
            ];
            if let Some(corners) = project_all(&corners) {
                builder.fan(&corners, *fill);
            }
        }

        Primitive::Point {
            position,
            size,
            color,
        } => {
            if let Some((p, _)) = project(*position) {
                builder.disc(p, size * 0.5, *color, *color);
            }
        }

        Primitive::Mesh {
            mesh,
            transform: local,
            style,
        } => {
            let data = resources.mesh(*mesh)?;
            let full = *transform * *local;
            let projected: Vec<Option<Vec2>> = data
                .vertices
                .iter()
                .map(|&v| projector.project(full.transform_point3(v)).map(|(px, _)| px))
                .collect();
            let vertex = |i: u32| projected.get(i as usize).copied().flatten();

            if let Some(fill) = style.fill {
                for triangle in &data.triangles {
                    if let [Some(a), Some(b), Some(c)] = triangle.map(vertex) {
                        builder.triangle([a, b, c], [fill; 3]);
                    }
                }
            }
            if let Some(stroke) = &style.stroke {
                for &[i, j] in &data.edges {
                    if let (Some(a), Some(b)) = (vertex(i), vertex(j)) {
                        builder.line(a, b, stroke);
                    }
                }
            }
            if let Some((size, color)) = style.points {
                for &p in projected.iter().flatten() {
                    builder.disc(p, size * 0.5, color, color);
                }
            }
        }

        // Scene::visit flattens groups before we see them
        Primitive::Group { .. } => {}
    }
    Ok(())
}
