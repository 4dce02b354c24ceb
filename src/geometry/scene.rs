//! Scene: the draw description a generator returns each tick.
//!
//! Coordinates are either logical screen pixels (origin top-left, +Y down)
//! or world units viewed through a [`Camera`]. Stroke widths and point
//! sizes are always logical pixels.

use glam::{Mat4, Vec2, Vec3};

use super::resources::MeshHandle;
use crate::camera::Camera;
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Coordinate space of a scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Space {
    /// Logical pixels, origin top-left
    Screen,

    /// World units projected through a camera
    World(Camera),
}

/// Outline style
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,

    /// Line width (logical pixels)
    pub width: f32,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

/// How a retained mesh is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshStyle {
    /// Draw edges
    pub stroke: Option<Stroke>,

    /// Fill triangles
    pub fill: Option<Color>,

    /// Draw each vertex as a dot of (size, color)
    pub points: Option<(f32, Color)>,
}

impl MeshStyle {
    pub fn stroked(stroke: Stroke) -> Self {
        Self {
            stroke: Some(stroke),
            ..Default::default()
        }
    }

    pub fn points(size: f32, color: Color) -> Self {
        Self {
            points: Some((size, color)),
            ..Default::default()
        }
    }
}

/// One drawable element
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Line {
        from: Vec3,
        to: Vec3,
        stroke: Stroke,
    },

    Polyline {
        points: Vec<Vec3>,
        closed: bool,
        stroke: Stroke,
    },

    /// Convex polygon fill
    Polygon { points: Vec<Vec3>, fill: Color },

    /// Circle in the local XY plane
    Circle {
        center: Vec3,
        radius: f32,
        stroke: Option<Stroke>,
        fill: Option<Color>,
    },

    /// Camera-facing shaded ball
    Sphere {
        center: Vec3,
        radius: f32,
        color: Color,
    },

    /// Axis-aligned rectangle in the local XY plane
    Rect { min: Vec2, max: Vec2, fill: Color },

    /// Fixed-size dot
    Point {
        position: Vec3,
        size: f32,
        color: Color,
    },

    /// Instance of a retained mesh
    Mesh {
        mesh: MeshHandle,
        transform: Mat4,
        style: MeshStyle,
    },

    /// Children drawn under an extra transform
    Group {
        transform: Mat4,
        children: Vec<Primitive>,
    },
}

/// Discriminant used for counting primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Line,
    Polyline,
    Polygon,
    Circle,
    Sphere,
    Rect,
    Point,
    Mesh,
    Group,
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Line { .. } => PrimitiveKind::Line,
            Primitive::Polyline { .. } => PrimitiveKind::Polyline,
            Primitive::Polygon { .. } => PrimitiveKind::Polygon,
            Primitive::Circle { .. } => PrimitiveKind::Circle,
            Primitive::Sphere { .. } => PrimitiveKind::Sphere,
            Primitive::Rect { .. } => PrimitiveKind::Rect,
            Primitive::Point { .. } => PrimitiveKind::Point,
            Primitive::Mesh { .. } => PrimitiveKind::Mesh,
            Primitive::Group { .. } => PrimitiveKind::Group,
        }
    }

    /// First non-finite number in this primitive, if any
    fn find_non_finite(&self) -> Option<&'static str> {
        let bad_vec = |v: &Vec3| !v.is_finite();
        match self {
            Primitive::Line { from, to, stroke } => {
                (bad_vec(from) || bad_vec(to) || !stroke.width.is_finite()).then_some("line")
            }
            Primitive::Polyline { points, stroke, .. } => {
                (points.iter().any(bad_vec) || !stroke.width.is_finite()).then_some("polyline")
            }
            Primitive::Polygon { points, .. } => points.iter().any(bad_vec).then_some("polygon"),
            Primitive::Circle { center, radius, .. } => {
                (bad_vec(center) || !radius.is_finite()).then_some("circle")
            }
            Primitive::Sphere { center, radius, .. } => {
                (bad_vec(center) || !radius.is_finite()).then_some("sphere")
            }
            Primitive::Rect { min, max, .. } => {
                (!min.is_finite() || !max.is_finite()).then_some("rect")
            }
            Primitive::Point { position, size, .. } => {
                (bad_vec(position) || !size.is_finite()).then_some("point")
            }
            Primitive::Mesh { transform, .. } => {
                (!transform.is_finite()).then_some("mesh transform")
            }
            Primitive::Group {
                transform,
                children,
            } => {
                if !transform.is_finite() {
                    return Some("group transform");
                }
                children.iter().find_map(Primitive::find_non_finite)
            }
        }
    }
}

/// Everything one tick draws
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub space: Space,
    pub clear: Color,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn screen(clear: Color) -> Self {
        Self {
            space: Space::Screen,
            clear,
            primitives: Vec::new(),
        }
    }

    pub fn world(camera: Camera, clear: Color) -> Self {
        Self {
            space: Space::World(camera),
            clear,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn extend(&mut self, primitives: impl IntoIterator<Item = Primitive>) {
        self.primitives.extend(primitives);
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Visit every leaf primitive with its accumulated transform
    pub fn visit(&self, mut f: impl FnMut(&Primitive, &Mat4)) {
        fn walk(primitives: &[Primitive], parent: &Mat4, f: &mut impl FnMut(&Primitive, &Mat4)) {
            for primitive in primitives {
                match primitive {
                    Primitive::Group {
                        transform,
                        children,
                    } => walk(children, &(*parent * *transform), f),
                    leaf => f(leaf, parent),
                }
            }
        }
        walk(&self.primitives, &Mat4::IDENTITY, &mut f);
    }

    /// Number of leaf primitives of `kind`, groups flattened
    pub fn count(&self, kind: PrimitiveKind) -> usize {
        let mut n = 0;
        self.visit(|primitive, _| {
            if primitive.kind() == kind {
                n += 1;
            }
        });
        n
    }

    /// Reject scenes containing NaN or infinite numbers
    pub fn validate(&self, mode: VisualizationMode) -> GeometryResult<()> {
        match self.primitives.iter().find_map(Primitive::find_non_finite) {
            Some(detail) => Err(GeometryError::NonFinite {
                mode,
                detail: detail.to_string(),
            }),
            None => Ok(()),
        }
    }
}
