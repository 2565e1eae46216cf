//! BSDFs describing how light scatters at a surface point.
//!
//! All directions are in the local shading frame (`haze_math::Frame`),
//! where the surface normal is +Z and `cos θ = w.z`.

use crate::sampler::{CosineWeightedHemisphereSampler, UniformSphereSampler};
use haze_math::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// Color type alias (linear RGB radiance/reflectance)
pub type Color = Vec3;

/// Luminance of a linear RGB color.
#[inline]
pub fn illum(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

/// Result of importance-sampling a BSDF.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    /// BSDF value f(wo, wi)
    pub value: Color,
    /// Sampled incoming direction (local frame)
    pub wi: Vec3,
    /// Density of `wi` (solid angle)
    pub pdf: f32,
}

/// Trait for surface (or volume) scattering functions.
pub trait Bsdf: Send + Sync {
    /// Evaluate the BSDF for a pair of local directions.
    fn f(&self, wo: Vec3, wi: Vec3) -> Color;

    /// Importance-sample an incoming direction for `wo`.
    fn sample_f(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample;

    /// Radiance emitted by the surface. Most materials return black.
    fn get_emission(&self) -> Color {
        Color::ZERO
    }

    /// True if the BSDF is a Dirac delta (f() is zero everywhere).
    fn is_delta(&self) -> bool {
        false
    }
}

/// Lambertian (diffuse) reflector.
#[derive(Debug, Clone)]
pub struct DiffuseBsdf {
    reflectance: Color,
}

impl DiffuseBsdf {
    pub fn new(reflectance: Color) -> Self {
        Self { reflectance }
    }
}

impl Bsdf for DiffuseBsdf {
    fn f(&self, _wo: Vec3, wi: Vec3) -> Color {
        if wi.z <= 0.0 {
            return Color::ZERO;
        }
        self.reflectance / PI
    }

    fn sample_f(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let (wi, pdf) = CosineWeightedHemisphereSampler.get_sample(rng);
        BsdfSample {
            value: self.f(wo, wi),
            wi,
            pdf,
        }
    }
}

/// Pure emitter (area light geometry). Absorbs everything it receives.
#[derive(Debug, Clone)]
pub struct EmissionBsdf {
    radiance: Color,
}

impl EmissionBsdf {
    pub fn new(radiance: Color) -> Self {
        Self { radiance }
    }
}

impl Bsdf for EmissionBsdf {
    fn f(&self, _wo: Vec3, _wi: Vec3) -> Color {
        Color::ZERO
    }

    fn sample_f(&self, _wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let (wi, pdf) = CosineWeightedHemisphereSampler.get_sample(rng);
        BsdfSample {
            value: Color::ZERO,
            wi,
            pdf,
        }
    }

    fn get_emission(&self) -> Color {
        self.radiance
    }
}

/// Perfect mirror.
#[derive(Debug, Clone)]
pub struct MirrorBsdf {
    reflectance: Color,
}

impl MirrorBsdf {
    pub fn new(reflectance: Color) -> Self {
        Self { reflectance }
    }
}

impl Bsdf for MirrorBsdf {
    fn f(&self, _wo: Vec3, _wi: Vec3) -> Color {
        Color::ZERO
    }

    fn sample_f(&self, wo: Vec3, _rng: &mut dyn RngCore) -> BsdfSample {
        let wi = reflect(wo);
        let cos = wi.z.abs();
        if cos <= 0.0 {
            return BsdfSample {
                value: Color::ZERO,
                wi,
                pdf: 0.0,
            };
        }
        // Divide out the cosine the integrator multiplies back in
        BsdfSample {
            value: self.reflectance / cos,
            wi,
            pdf: 1.0,
        }
    }

    fn is_delta(&self) -> bool {
        true
    }
}

/// Isotropic phase function used for synthesized fog scattering events.
#[derive(Debug, Clone)]
pub struct FogBsdf {
    albedo: f32,
}

impl FogBsdf {
    pub fn new(albedo: f32) -> Self {
        Self {
            albedo: albedo.clamp(0.0, 1.0),
        }
    }
}

impl Bsdf for FogBsdf {
    fn f(&self, _wo: Vec3, _wi: Vec3) -> Color {
        Color::splat(self.albedo * UniformSphereSampler::PDF)
    }

    fn sample_f(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let wi = UniformSphereSampler.get_sample(rng);
        BsdfSample {
            value: self.f(wo, wi),
            wi,
            pdf: UniformSphereSampler::PDF,
        }
    }
}

/// Mirror a local direction about the +Z normal.
#[inline]
pub fn reflect(wo: Vec3) -> Vec3 {
    Vec3::new(-wo.x, -wo.y, wo.z)
}
