//! Sphere primitive for ray tracing.

use crate::{primitive::SurfaceHit, Bsdf};
use haze_math::{BBox, Ray, Vec3};
use std::sync::Arc;

/// A sphere primitive.
#[derive(Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    r2: f32,
    bsdf: Arc<dyn Bsdf>,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32, bsdf: Arc<dyn Bsdf>) -> Self {
        let radius = radius.max(0.0);
        Self {
            center,
            radius,
            r2: radius * radius,
            bsdf,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bsdf(&self) -> &dyn Bsdf {
        self.bsdf.as_ref()
    }

    pub fn get_bbox(&self) -> BBox {
        let rvec = Vec3::splat(self.radius);
        BBox::new(self.center - rvec, self.center + rvec)
    }

    /// Outward unit normal at a point on the surface.
    #[inline]
    pub fn normal(&self, p: Vec3) -> Vec3 {
        (p - self.center) / self.radius
    }

    /// Both roots of the ray/sphere quadratic, smaller first.
    ///
    /// `None` when the ray misses the sphere or the direction is zero.
    pub fn test(&self, ray: &Ray) -> Option<(f32, f32)> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * oc.dot(ray.direction);
        let c = oc.dot(oc) - self.r2;

        if a == 0.0 {
            return None;
        }

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let t1 = (-b - sqrtd) / (2.0 * a);
        let t2 = (-b + sqrtd) / (2.0 * a);
        Some((t1, t2))
    }

    /// Nearest root inside the ray's valid interval.
    fn nearest_root(&self, ray: &Ray) -> Option<f32> {
        let (t1, t2) = self.test(ray)?;
        if ray.accepts(t1) {
            Some(t1)
        } else if ray.accepts(t2) {
            Some(t2)
        } else {
            None
        }
    }

    pub fn has_intersection(&self, ray: &Ray) -> bool {
        self.nearest_root(ray).is_some()
    }

    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let t = self.nearest_root(ray)?;
        Some(SurfaceHit {
            t,
            n: self.normal(ray.at(t)),
        })
    }
}
