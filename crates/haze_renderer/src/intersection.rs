//! Intersection record filled by primitive and BVH queries.

use crate::{Bsdf, Primitive};
use haze_math::{Ray, Vec3};

/// Record of the closest ray/primitive hit found so far.
///
/// Borrowed from the scene for `'a`: the record never owns the primitive or
/// its material. A fresh record is used for each query.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    /// Ray parameter of the hit
    pub t: f32,
    /// Surface normal at the hit (unit length, not flipped toward the ray)
    pub n: Vec3,
    /// The primitive that was hit
    pub primitive: Option<&'a Primitive>,
    /// Material at the hit. May be a synthesized fog material.
    pub bsdf: Option<&'a dyn Bsdf>,
}

impl<'a> Default for Intersection<'a> {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            n: Vec3::ZERO,
            primitive: None,
            bsdf: None,
        }
    }
}

impl<'a> Intersection<'a> {
    /// World-space hit point for the ray that produced this record.
    #[inline]
    pub fn hit_point(&self, ray: &Ray) -> Vec3 {
        ray.at(self.t)
    }

    /// True once any primitive has written into the record.
    pub fn is_hit(&self) -> bool {
        self.t.is_finite()
    }
}

impl<'a> std::fmt::Debug for Intersection<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intersection")
            .field("t", &self.t)
            .field("n", &self.n)
            .field("primitive", &self.primitive.map(|p| p as *const Primitive))
            .field("has_bsdf", &self.bsdf.is_some())
            .finish()
    }
}
