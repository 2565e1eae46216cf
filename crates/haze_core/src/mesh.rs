//! Triangle mesh geometry.
//!
//! A mesh is the shared vertex data the renderer turns into individual
//! triangle primitives. Winding is counter-clockwise: a triangle whose
//! vertices appear CCW when viewed from a point faces that point.

use crate::{CoreError, CoreResult};
use haze_math::{BBox, Vec3};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex when present)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: BBox,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `compute_normals()` or `ensure_normals()` if you need them.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = BBox::from_points(positions.iter().copied());
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Create a mesh, rejecting index buffers that don't describe whole,
    /// in-range triangles and normal arrays of the wrong length.
    pub fn try_new(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
    ) -> CoreResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(CoreError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(CoreError::InvalidMesh(format!(
                "index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }
        if let Some(n) = &normals {
            if n.len() != positions.len() {
                return Err(CoreError::InvalidMesh(format!(
                    "{} normals for {} vertices",
                    n.len(),
                    positions.len()
                )));
            }
        }
        Ok(Self::new(positions, indices, normals))
    }

    /// Compute smooth vertex normals by summing area-weighted face normals.
    ///
    /// Replaces any existing normals. Vertices that touch only degenerate
    /// faces get +Y.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for [i0, i1, i2] in self.triangles() {
            let p0 = self.positions[i0];
            let edge1 = self.positions[i1] - p0;
            let edge2 = self.positions[i2] - p0;

            // Unnormalized cross product, so larger faces weigh more
            let face_normal = edge1.cross(edge2);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has one normal per vertex, computing them if necessary.
    pub fn ensure_normals(&mut self) {
        let should_compute = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };

        if should_compute {
            if let Some(normals) = &self.normals {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over the vertex indices of every well-formed triangle.
    ///
    /// Trailing partial triangles and out-of-range indices are skipped with a warning.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let vertex_count = self.positions.len();
        self.indices.chunks_exact(3).filter_map(move |chunk| {
            let tri = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];
            if tri.iter().any(|&i| i >= vertex_count) {
                log::warn!(
                    "Invalid triangle indices: {:?}, vertex count: {}",
                    tri,
                    vertex_count
                );
                return None;
            }
            Some(tri)
        })
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }
}
