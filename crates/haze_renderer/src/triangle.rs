//! Triangle primitive for ray tracing.
//!
//! Intersects the supporting plane first, then classifies the hit point with
//! barycentric coordinates from the 2×2 edge system.

use crate::{primitive::SurfaceHit, Bsdf};
use haze_core::Mesh;
use haze_math::{BBox, Ray, Vec3};
use std::sync::Arc;

/// A triangle primitive with per-vertex shading normals.
#[derive(Clone)]
pub struct Triangle {
    /// Vertices
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
    /// Shading normals at each vertex (unit length)
    n1: Vec3,
    n2: Vec3,
    n3: Vec3,
    /// Geometric normal (unnormalized, CCW winding)
    face: Vec3,
    bsdf: Arc<dyn Bsdf>,
    bbox: BBox,
}

impl Triangle {
    /// Create a flat-shaded triangle from three vertices.
    pub fn new(p1: Vec3, p2: Vec3, p3: Vec3, bsdf: Arc<dyn Bsdf>) -> Self {
        let n = (p2 - p1).cross(p3 - p1).try_normalize().unwrap_or(Vec3::ZERO);
        Self::with_normals(p1, p2, p3, [n, n, n], bsdf)
    }

    /// Create a smooth-shaded triangle from vertices and vertex normals.
    pub fn with_normals(p1: Vec3, p2: Vec3, p3: Vec3, normals: [Vec3; 3], bsdf: Arc<dyn Bsdf>) -> Self {
        let face = (p2 - p1).cross(p3 - p1);

        // Pad thin dimensions to avoid degenerate boxes
        let delta = 0.0001;
        let mut bbox = BBox::from_points([p1, p2, p3]);
        bbox.min -= Vec3::splat(delta);
        bbox.max += Vec3::splat(delta);

        Self {
            p1,
            p2,
            p3,
            n1: normals[0],
            n2: normals[1],
            n3: normals[2],
            face,
            bsdf,
            bbox,
        }
    }

    /// Build the triangle at vertex indices `tri` of a mesh.
    ///
    /// Uses the mesh's vertex normals when present, otherwise the face normal.
    pub fn from_mesh(mesh: &Mesh, tri: [usize; 3], bsdf: Arc<dyn Bsdf>) -> Self {
        let [i0, i1, i2] = tri;
        let (p1, p2, p3) = (mesh.positions[i0], mesh.positions[i1], mesh.positions[i2]);
        match &mesh.normals {
            Some(normals) if normals.len() == mesh.positions.len() => {
                Self::with_normals(p1, p2, p3, [normals[i0], normals[i1], normals[i2]], bsdf)
            }
            _ => Self::new(p1, p2, p3, bsdf),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.p1, self.p2, self.p3]
    }

    pub fn bsdf(&self) -> &dyn Bsdf {
        self.bsdf.as_ref()
    }

    pub fn get_bbox(&self) -> BBox {
        self.bbox
    }

    /// Ray parameter and barycentric weights `(w1, w2, w3)` of the hit.
    ///
    /// Rays parallel to the plane and degenerate triangles never hit.
    fn test(&self, ray: &Ray) -> Option<(f32, [f32; 3])> {
        let divisor = ray.direction.dot(self.face);
        if divisor == 0.0 {
            return None;
        }

        let t = (self.p1 - ray.origin).dot(self.face) / divisor;
        if !ray.accepts(t) {
            return None;
        }

        // Solve p - p1 = a (p2 - p1) + b (p3 - p1)
        let v0 = self.p2 - self.p1;
        let v1 = self.p3 - self.p1;
        let v2 = ray.at(t) - self.p1;
        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);
        let denom = d00 * d11 - d01 * d01;
        if denom == 0.0 {
            return None;
        }

        let alpha = (d11 * d20 - d01 * d21) / denom;
        let beta = (d00 * d21 - d01 * d20) / denom;
        let gamma = 1.0 - alpha - beta;

        let inside = |w: f32| (0.0..=1.0).contains(&w);
        if inside(alpha) && inside(beta) && inside(gamma) {
            Some((t, [gamma, alpha, beta]))
        } else {
            None
        }
    }

    pub fn has_intersection(&self, ray: &Ray) -> bool {
        self.test(ray).is_some()
    }

    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let (t, [w1, w2, w3]) = self.test(ray)?;
        let n = (w1 * self.n1 + w2 * self.n2 + w3 * self.n3)
            .try_normalize()
            .unwrap_or_else(|| self.face.normalize_or_zero());
        Some(SurfaceHit { t, n })
    }
}
