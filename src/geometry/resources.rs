//! Retained mesh storage owned on behalf of geometry generators.
//!
//! Generators allocate their static meshes in `init` and must release every
//! handle in `dispose`. `live_count` makes leaks observable across mode
//! switches.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;

use crate::error::{GeometryError, GeometryResult};

/// Opaque reference to a mesh in a [`ResourceStore`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(u32);

impl MeshHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Indexed geometry in local space
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,

    /// Index pairs drawn as stroked lines
    pub edges: Vec<[u32; 2]>,

    /// Index triples drawn as filled triangles
    pub triangles: Vec<[u32; 3]>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            ..Default::default()
        }
    }

    pub fn with_edges(mut self, edges: Vec<[u32; 2]>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_triangles(mut self, triangles: Vec<[u32; 3]>) -> Self {
        self.triangles = triangles;
        self
    }

    /// Connect consecutive vertices, optionally closing the loop
    pub fn strip(vertices: Vec<Vec3>, closed: bool) -> Self {
        let n = vertices.len() as u32;
        let mut edges: Vec<[u32; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        if closed && n > 2 {
            edges.push([n - 1, 0]);
        }
        Self::new(vertices).with_edges(edges)
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &MeshData) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.edges
            .extend(other.edges.iter().map(|[a, b]| [a + offset, b + offset]));
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Every index refers to an existing vertex and every vertex is finite
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.vertices.iter().all(|v| v.is_finite())
            && self.edges.iter().flatten().all(|&i| i < n)
            && self.triangles.iter().flatten().all(|&i| i < n)
    }
}

/// Allocation table for retained meshes
#[derive(Debug, Default)]
pub struct ResourceStore {
    meshes: HashMap<u32, MeshData>,
    next_id: u32,
    allocated_total: u64,
    released_total: u64,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mesh and return its handle
    pub fn allocate(&mut self, mesh: MeshData) -> MeshHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.meshes.insert(id, mesh);
        self.allocated_total += 1;
        MeshHandle(id)
    }

    /// Free a mesh; returns false for unknown or already released handles
    pub fn release(&mut self, handle: MeshHandle) -> bool {
        let released = self.meshes.remove(&handle.0).is_some();
        if released {
            self.released_total += 1;
        } else {
            log::warn!("release of unknown mesh {}", handle);
        }
        released
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(&handle.0)
    }

    /// Like [`get`](Self::get) but reports a missing mesh as an error
    pub fn mesh(&self, handle: MeshHandle) -> GeometryResult<&MeshData> {
        self.get(handle)
            .ok_or(GeometryError::MissingMesh(handle.id()))
    }

    /// Meshes currently allocated
    pub fn live_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn allocated_total(&self) -> u64 {
        self.allocated_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }
}

/// Handles allocated by one generator, released together
#[derive(Debug, Default)]
pub struct OwnedMeshes {
    handles: Vec<MeshHandle>,
}

impl OwnedMeshes {
    pub fn allocate(&mut self, store: &mut ResourceStore, mesh: MeshData) -> MeshHandle {
        let handle = store.allocate(mesh);
        self.handles.push(handle);
        handle
    }

    pub fn release_all(&mut self, store: &mut ResourceStore) {
        for handle in self.handles.drain(..) {
            store.release(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
