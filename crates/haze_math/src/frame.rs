use crate::{Mat3, Vec3};

/// Orthonormal shading frame with `z` aligned to a surface normal.
///
/// BSDFs and hemisphere samplers work in this local space, where
/// `cos θ = wi.z`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    o2w: Mat3,
}

impl Frame {
    /// Build a frame around `n`. `n` does not need to be normalized.
    pub fn from_normal(n: Vec3) -> Self {
        let z = n.normalize();

        // Perturb the smallest component so the helper is never parallel to z
        let mut h = z;
        let a = h.abs();
        if a.x <= a.y && a.x <= a.z {
            h.x = 1.0;
        } else if a.y <= a.x && a.y <= a.z {
            h.y = 1.0;
        } else {
            h.z = 1.0;
        }

        let y = h.cross(z).normalize();
        let x = z.cross(y).normalize();

        Self {
            o2w: Mat3::from_cols(x, y, z),
        }
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.o2w.z_axis
    }

    /// Local (object) space to world space.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.o2w * v
    }

    /// World space to local space (the basis is orthonormal, so this is the transpose).
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        self.o2w.transpose() * v
    }
}
