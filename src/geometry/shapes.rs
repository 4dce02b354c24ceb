//! Procedural shape builders used by the generators.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::resources::MeshData;

/// Golden ratio
pub const PHI: f32 = 1.618_034;

/// Points on a circle in the XY plane, without the closing duplicate
pub fn circle_points(center: Vec3, radius: f32, segments: usize) -> Vec<Vec3> {
    arc_points(center, radius, 0.0, TAU, segments, false)
}

/// Points along an arc in the XY plane from `start` to `end` (radians)
pub fn arc_points(
    center: Vec3,
    radius: f32,
    start: f32,
    end: f32,
    segments: usize,
    include_end: bool,
) -> Vec<Vec3> {
    let segments = segments.max(1);
    let count = if include_end { segments + 1 } else { segments };
    (0..count)
        .map(|i| {
            let angle = start + (end - start) * i as f32 / segments as f32;
            center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
        })
        .collect()
}

/// Vertices of a regular polygon with the first vertex at `rotation`
pub fn regular_polygon(center: Vec3, radius: f32, sides: usize, rotation: f32) -> Vec<Vec3> {
    circle_points(center, radius, sides)
        .into_iter()
        .map(|p| rotate_z(p - center, rotation) + center)
        .collect()
}

pub fn rotate_z(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
}

/// Unit circle outline mesh
pub fn unit_circle(segments: usize) -> MeshData {
    MeshData::strip(circle_points(Vec3::ZERO, 1.0, segments), true)
}

/// Unit sphere wireframe: latitude rings plus longitude meridians
pub fn wire_sphere(rings: usize, meridians: usize, segments: usize) -> MeshData {
    let mut mesh = MeshData::default();

    for ring in 1..rings {
        let polar = PI * ring as f32 / rings as f32;
        let (radius, z) = (polar.sin(), polar.cos());
        let points = circle_points(Vec3::new(0.0, 0.0, z), radius, segments);
        mesh.merge(&MeshData::strip(points, true));
    }

    for meridian in 0..meridians {
        let azimuth = PI * meridian as f32 / meridians as f32;
        let (s, c) = azimuth.sin_cos();
        let points = circle_points(Vec3::ZERO, 1.0, segments)
            .into_iter()
            .map(|p| Vec3::new(p.x * c, p.x * s, p.y))
            .collect();
        mesh.merge(&MeshData::strip(points, true));
    }

    mesh
}

fn solid(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> MeshData {
    let mut edges: Vec<[u32; 2]> = Vec::new();
    for [a, b, c] in &faces {
        for (i, j) in [(*a, *b), (*b, *c), (*c, *a)] {
            let edge = [i.min(j), i.max(j)];
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
    MeshData::new(vertices)
        .with_edges(edges)
        .with_triangles(faces)
}

/// Regular tetrahedron inscribed in the unit sphere
pub fn tetrahedron() -> MeshData {
    let k = 1.0 / 3f32.sqrt();
    solid(
        vec![
            Vec3::new(1.0, 1.0, 1.0) * k,
            Vec3::new(-1.0, -1.0, 1.0) * k,
            Vec3::new(-1.0, 1.0, -1.0) * k,
            Vec3::new(1.0, -1.0, -1.0) * k,
        ],
        vec![[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]],
    )
}

/// Regular octahedron inscribed in the unit sphere
pub fn octahedron() -> MeshData {
    solid(
        vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ],
        vec![
            [0, 2, 4],
            [0, 4, 3],
            [0, 3, 5],
            [0, 5, 2],
            [1, 2, 5],
            [1, 5, 3],
            [1, 3, 4],
            [1, 4, 2],
        ],
    )
}

/// Two arcs meeting at both ends, pointing along `direction` from `base`
pub fn petal(base: Vec3, direction: f32, length: f32, width: f32, segments: usize) -> Vec<Vec3> {
    let half = segments.max(2) / 2;
    let mut points = Vec::with_capacity(half * 2 + 1);
    for i in 0..=half * 2 {
        let t = i as f32 / (half * 2) as f32;
        let along = t * length;
        let side = (t * PI).sin() * width * 0.5;
        points.push(Vec2::new(along, side));
    }
    // Return leg on the opposite side
    for i in (1..half * 2).rev() {
        let t = i as f32 / (half * 2) as f32;
        points.push(Vec2::new(t * length, -(t * PI).sin() * width * 0.5));
    }
    points
        .into_iter()
        .map(|p| base + rotate_z(Vec3::new(p.x, p.y, 0.0), direction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_points_on_radius() {
        let points = circle_points(Vec3::new(1.0, 2.0, 0.0), 0.5, 32);
        assert_eq!(points.len(), 32);
        for p in points {
            let d = (p - Vec3::new(1.0, 2.0, 0.0)).length();
            assert!((d - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_arc_includes_end() {
        let points = arc_points(Vec3::ZERO, 1.0, 0.0, PI, 4, true);
        assert_eq!(points.len(), 5);
        assert!((points[4] - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_platonic_solids_edge_counts() {
        let tetra = tetrahedron();
        assert_eq!(tetra.vertices.len(), 4);
        assert_eq!(tetra.edges.len(), 6);
        assert_eq!(tetra.triangles.len(), 4);

        let octa = octahedron();
        assert_eq!(octa.vertices.len(), 6);
        assert_eq!(octa.edges.len(), 12);
        assert!(octa.is_valid());
    }

    #[test]
    fn test_wire_sphere_is_unit() {
        let sphere = wire_sphere(6, 4, 24);
        assert!(sphere.is_valid());
        for v in &sphere.vertices {
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_petal_tip_reaches_length() {
        let points = petal(Vec3::ZERO, 0.0, 2.0, 0.5, 8);
        let tip = points.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert!((tip - 2.0).abs() < 1e-5);
        assert!(points.iter().all(|p| p.y.abs() <= 0.25 + 1e-5));
    }
}
