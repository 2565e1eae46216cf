//! Scene assembly: primitives, lights and background.

use crate::{Bsdf, BvhAccel, Color, Intersection, Light, Primitive, Sphere, Triangle};
use haze_core::Mesh;
use haze_math::{Ray, Vec3};
use std::sync::Arc;

/// Radiance seen by rays that leave the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Solid(Color),
    /// White at the horizon blending to light blue overhead
    SkyGradient,
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid(Color::ZERO)
    }
}

impl Background {
    pub fn radiance(&self, direction: Vec3) -> Color {
        match self {
            Background::Solid(color) => *color,
            Background::SkyGradient => {
                let unit_direction = direction.normalize_or_zero();
                let a = 0.5 * (unit_direction.y + 1.0);
                let white = Color::new(1.0, 1.0, 1.0);
                let blue = Color::new(0.5, 0.7, 1.0);
                white * (1.0 - a) + blue * a
            }
        }
    }
}

/// A render-ready scene. Immutable and shared by reference across threads.
pub struct Scene {
    bvh: BvhAccel,
    lights: Vec<Box<dyn Light>>,
    background: Background,
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn bvh(&self) -> &BvhAccel {
        &self.bvh
    }

    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    pub fn background(&self) -> Background {
        self.background
    }

    #[inline]
    pub fn intersect<'a>(&'a self, ray: &mut Ray, isect: &mut Intersection<'a>) -> bool {
        self.bvh.intersect(ray, isect)
    }

    #[inline]
    pub fn has_intersection(&self, ray: &Ray) -> bool {
        self.bvh.has_intersection(ray)
    }
}

/// Collects primitives and lights, then builds the BVH.
#[derive(Default)]
pub struct SceneBuilder {
    primitives: Vec<Primitive>,
    lights: Vec<Box<dyn Light>>,
    background: Background,
}

impl SceneBuilder {
    pub fn add_primitive(&mut self, primitive: impl Into<Primitive>) -> &mut Self {
        self.primitives.push(primitive.into());
        self
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32, bsdf: Arc<dyn Bsdf>) -> &mut Self {
        self.add_primitive(Sphere::new(center, radius, bsdf))
    }

    /// Add every well-formed triangle of a mesh with one shared material.
    pub fn add_mesh(&mut self, mesh: &Mesh, bsdf: Arc<dyn Bsdf>) -> &mut Self {
        let before = self.primitives.len();
        for tri in mesh.triangles() {
            self.primitives
                .push(Triangle::from_mesh(mesh, tri, bsdf.clone()).into());
        }
        log::debug!(
            "Added mesh: {} of {} triangles",
            self.primitives.len() - before,
            mesh.triangle_count()
        );
        self
    }

    pub fn add_light(&mut self, light: impl Light + 'static) -> &mut Self {
        self.lights.push(Box::new(light));
        self
    }

    pub fn background(&mut self, background: Background) -> &mut Self {
        self.background = background;
        self
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Build the BVH and freeze the scene.
    ///
    /// # Panics
    ///
    /// Panics if `max_leaf_size` is zero.
    pub fn build(self, max_leaf_size: usize) -> Scene {
        log::info!(
            "Building scene: {} primitives, {} lights",
            self.primitives.len(),
            self.lights.len()
        );
        Scene {
            bvh: BvhAccel::new(self.primitives, max_leaf_size),
            lights: self.lights,
            background: self.background,
        }
    }
}
