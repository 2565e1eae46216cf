//! Closed set of geometric primitives the BVH indexes.

use crate::{Bsdf, Intersection, Sphere, Triangle};
use haze_math::{BBox, Ray, Vec3};

/// Raw hit returned by the concrete shapes before it is recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub t: f32,
    pub n: Vec3,
}

/// A sphere or a triangle.
///
/// Enum dispatch keeps the leaf loop free of virtual calls; the set of
/// shapes is fixed.
#[derive(Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Primitive {
    pub fn get_bbox(&self) -> BBox {
        match self {
            Primitive::Sphere(s) => s.get_bbox(),
            Primitive::Triangle(t) => t.get_bbox(),
        }
    }

    pub fn bsdf(&self) -> &dyn Bsdf {
        match self {
            Primitive::Sphere(s) => s.bsdf(),
            Primitive::Triangle(t) => t.bsdf(),
        }
    }

    /// Test the ray and record the hit if it is the closest so far.
    ///
    /// On success `ray.max_t` is narrowed to the hit so later tests only
    /// accept closer surfaces.
    pub fn intersect<'a>(&'a self, ray: &mut Ray, isect: &mut Intersection<'a>) -> bool {
        let hit = match self {
            Primitive::Sphere(s) => s.intersect(ray),
            Primitive::Triangle(t) => t.intersect(ray),
        };

        match hit {
            Some(SurfaceHit { t, n }) => {
                ray.max_t = t;
                isect.t = t;
                isect.n = n;
                isect.primitive = Some(self);
                isect.bsdf = Some(self.bsdf());
                true
            }
            None => false,
        }
    }

    /// Occlusion-only query. Leaves the ray untouched.
    pub fn has_intersection(&self, ray: &Ray) -> bool {
        match self {
            Primitive::Sphere(s) => s.has_intersection(ray),
            Primitive::Triangle(t) => t.has_intersection(ray),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}
