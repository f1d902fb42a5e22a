//! CPU-side geometry: bounding boxes, vertex data and STL parsing.
//!
//! Imported primitives land here as [`RawGeometry`] before GPU upload, which
//! keeps bounds computation and normal generation testable without a device.
//!
//! # Bounds
//!
//! [`Aabb`] starts out [`Aabb::EMPTY`] (inverted) so folding points into it
//! needs no special first case. Scene bounds are built by transforming each
//! primitive's local box into world space and taking the union:
//!
//! ```
//! use vitrine::{Aabb, Mat4, Vec3};
//!
//! let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
//! let world = local.transformed(Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)));
//!
//! assert_eq!(world.center(), Vec3::new(4.0, 0.0, 0.0));
//! assert_eq!(world.max_dim(), 2.0);
//! assert!(Aabb::EMPTY.is_empty());
//! ```
//!
//! # STL
//!
//! [`parse_stl`] accepts binary and ASCII files through `stl_io`. STL has no
//! UVs, so every vertex gets `[0, 0]`, and faces keep their stored normal.

use std::io::{Read, Seek};

use glam::{Mat4, Vec3};

use crate::error::LoadError;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// The inverted box that any point expands.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.include(p);
            aabb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest extent along any axis.
    pub fn max_dim(&self) -> f32 {
        self.size().max_element()
    }

    /// Bounds of this box after transforming its eight corners.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        Self::from_points(corners.map(|c| matrix.transform_point3(c)))
    }
}

/// Raw geometry data before GPU upload.
///
/// Indices form a triangle list. Vertices are in the primitive's local space;
/// node transforms are applied by the scene graph, not baked in here.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Local-space bounds; empty when there are no vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    /// Smooth normals: area-weighted average of adjacent face normals.
    ///
    /// Used when a glTF primitive has no `NORMAL` attribute. Triangles with
    /// out-of-range indices are skipped, and vertices no triangle touches
    /// end up with a zero normal.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0; 3];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(a), Some(b), Some(c)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };
            let p0 = Vec3::from(a.position);
            let face_normal = (Vec3::from(b.position) - p0).cross(Vec3::from(c.position) - p0);

            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }
}

/// Parse binary or ASCII STL. Faces are unwelded so each keeps its flat normal.
pub fn parse_stl<R: Read + Seek>(reader: &mut R) -> Result<RawGeometry, LoadError> {
    let stl = stl_io::read_stl(reader).map_err(|e| LoadError::Stl(e.to_string()))?;

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);

    for face in &stl.faces {
        let normal: [f32; 3] = face.normal.into();
        for &vertex_idx in &face.vertices {
            let Some(vertex) = stl.vertices.get(vertex_idx) else {
                return Err(LoadError::Stl(format!("vertex index {vertex_idx} out of range")));
            };
            indices.push(vertices.len() as u32);
            vertices.push(Vertex3d::new((*vertex).into(), normal, [0.0, 0.0]));
        }
    }

    Ok(RawGeometry::new(vertices, indices))
}

/// Parse STL from an in-memory buffer.
pub fn parse_stl_bytes(bytes: &[u8]) -> Result<RawGeometry, LoadError> {
    parse_stl(&mut std::io::Cursor::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(p: [f32; 3]) -> Vertex3d {
        Vertex3d::new(p, [0.0, 1.0, 0.0], [0.0, 0.0])
    }

    #[test]
    fn raw_geometry_bounds() {
        let geom = RawGeometry::new(
            vec![v([0.0, 0.0, 0.0]), v([1.0, 2.0, 3.0]), v([-1.0, -1.0, -1.0])],
            vec![0, 1, 2],
        );

        let bounds = geom.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.max_dim(), 4.0);
    }

    #[test]
    fn empty_bounds_stay_empty() {
        let geom = RawGeometry::default();
        assert!(geom.bounds().is_empty());
        assert!(geom.bounds().transformed(Mat4::IDENTITY).is_empty());
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let moved = aabb.transformed(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(moved.size(), Vec3::splat(2.0));
    }

    #[test]
    fn recalculated_normals_face_up() {
        let mut geom = RawGeometry::new(
            vec![
                Vertex3d::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                Vertex3d::new([0.0, 0.0, 1.0], [0.0; 3], [0.0; 2]),
                Vertex3d::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            ],
            vec![0, 1, 2],
        );
        geom.recalculate_normals();
        for vertex in &geom.vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn parses_ascii_stl() {
        let stl = b"solid tri
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
";
        let geom = parse_stl_bytes(stl).unwrap();
        assert_eq!(geom.vertices.len(), 3);
        assert_eq!(geom.indices, vec![0, 1, 2]);
        assert_eq!(geom.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(geom.bounds().max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn garbage_stl_is_an_error() {
        assert!(matches!(
            parse_stl_bytes(b"not an stl file"),
            Err(LoadError::Stl(_))
        ));
    }
}
