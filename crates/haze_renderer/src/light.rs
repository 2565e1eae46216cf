//! Light sources sampled by the direct lighting estimator.

use crate::{sampler::UniformGridSampler2D, Color};
use haze_math::Vec3;
use rand::RngCore;

/// A sampled direction toward a light.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// Radiance arriving along `wi` (before visibility)
    pub radiance: Color,
    /// Unit world-space direction from the shading point toward the light
    pub wi: Vec3,
    /// Distance to the sampled point on the light (∞ for directional lights)
    pub dist_to_light: f32,
    /// Solid-angle density of the sample (1 for delta lights)
    pub pdf: f32,
}

impl LightSample {
    fn none() -> Self {
        Self {
            radiance: Color::ZERO,
            wi: Vec3::Z,
            dist_to_light: 0.0,
            pdf: 0.0,
        }
    }
}

/// Trait for scene lights.
pub trait Light: Send + Sync {
    /// Sample incident radiance at world point `p`.
    fn sample_l(&self, p: Vec3, rng: &mut dyn RngCore) -> LightSample;

    /// True if the light is a point or direction (one sample is enough).
    fn is_delta_light(&self) -> bool;
}

/// Isotropic point light without distance falloff.
#[derive(Debug, Clone)]
pub struct PointLight {
    radiance: Color,
    position: Vec3,
}

impl PointLight {
    pub fn new(radiance: Color, position: Vec3) -> Self {
        Self { radiance, position }
    }
}

impl Light for PointLight {
    fn sample_l(&self, p: Vec3, _rng: &mut dyn RngCore) -> LightSample {
        let d = self.position - p;
        let dist = d.length();
        if dist == 0.0 {
            return LightSample::none();
        }
        LightSample {
            radiance: self.radiance,
            wi: d / dist,
            dist_to_light: dist,
            pdf: 1.0,
        }
    }

    fn is_delta_light(&self) -> bool {
        true
    }
}

/// Light arriving from a single direction, e.g. the sun.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    radiance: Color,
    dir_to_light: Vec3,
}

impl DirectionalLight {
    /// `dir_to_light` points from the scene toward the light.
    pub fn new(radiance: Color, dir_to_light: Vec3) -> Self {
        Self {
            radiance,
            dir_to_light: dir_to_light.normalize_or_zero(),
        }
    }
}

impl Light for DirectionalLight {
    fn sample_l(&self, _p: Vec3, _rng: &mut dyn RngCore) -> LightSample {
        LightSample {
            radiance: self.radiance,
            wi: self.dir_to_light,
            dist_to_light: f32::INFINITY,
            pdf: 1.0,
        }
    }

    fn is_delta_light(&self) -> bool {
        true
    }
}

/// One-sided rectangular emitter.
///
/// Emits along `direction`; the rectangle spans `position ± dim_x/2 ± dim_y/2`.
#[derive(Debug, Clone)]
pub struct AreaLight {
    radiance: Color,
    position: Vec3,
    direction: Vec3,
    dim_x: Vec3,
    dim_y: Vec3,
    area: f32,
}

impl AreaLight {
    pub fn new(radiance: Color, position: Vec3, direction: Vec3, dim_x: Vec3, dim_y: Vec3) -> Self {
        Self {
            radiance,
            position,
            direction: direction.normalize_or_zero(),
            dim_x,
            dim_y,
            area: dim_x.cross(dim_y).length(),
        }
    }

    pub fn area(&self) -> f32 {
        self.area
    }
}

impl Light for AreaLight {
    fn sample_l(&self, p: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let sample = UniformGridSampler2D.get_sample(rng) - 0.5;
        let d = self.position + sample.x * self.dim_x + sample.y * self.dim_y - p;
        let sqr_dist = d.length_squared();
        if sqr_dist == 0.0 || self.area == 0.0 {
            return LightSample::none();
        }

        let dist = sqr_dist.sqrt();
        let wi = d / dist;
        let cos_theta = wi.dot(self.direction);
        if cos_theta == 0.0 {
            return LightSample::none();
        }

        // Back side is dark
        let radiance = if cos_theta < 0.0 {
            self.radiance
        } else {
            Color::ZERO
        };

        LightSample {
            radiance,
            wi,
            dist_to_light: dist,
            pdf: sqr_dist / (self.area * cos_theta.abs()),
        }
    }

    fn is_delta_light(&self) -> bool {
        false
    }
}
