//! Random sampling helpers.
//!
//! Every function takes the random source explicitly so renders stay
//! reproducible when pixels are traced on different threads.

use haze_math::{Vec2, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// Uniform f32 in [0, 1) built from the top 24 bits of a u32.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

/// Returns true with probability `p`.
///
/// `p <= 0` never draws from the stream, so a disabled coin leaves the
/// random sequence untouched.
#[inline]
pub fn coin_flip(rng: &mut dyn RngCore, p: f32) -> bool {
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    gen_f32(rng) < p
}

/// Uniform directions on the +Z hemisphere, pdf = 1 / 2π.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformHemisphereSampler;

impl UniformHemisphereSampler {
    pub const PDF: f32 = 1.0 / (2.0 * PI);

    pub fn get_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let xi1 = gen_f32(rng);
        let xi2 = gen_f32(rng);

        let theta = xi1.acos();
        let phi = 2.0 * PI * xi2;

        Vec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            xi1,
        )
    }
}

/// Cosine-weighted directions on the +Z hemisphere, pdf = cos θ / π.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineWeightedHemisphereSampler;

impl CosineWeightedHemisphereSampler {
    /// Returns the direction and its pdf.
    pub fn get_sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        let xi1 = gen_f32(rng);
        let xi2 = gen_f32(rng);

        // Malley's method: project a uniform disk sample up to the hemisphere
        let r = xi1.sqrt();
        let theta = 2.0 * PI * xi2;
        let z = (1.0 - xi1).max(0.0).sqrt();

        (Vec3::new(r * theta.cos(), r * theta.sin(), z), z / PI)
    }
}

/// Uniform directions on the unit sphere, pdf = 1 / 4π.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSphereSampler;

impl UniformSphereSampler {
    pub const PDF: f32 = 1.0 / (4.0 * PI);

    pub fn get_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let z = 1.0 - 2.0 * gen_f32(rng);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * gen_f32(rng);
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    }
}

/// Uniform jitter inside the unit square.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformGridSampler2D;

impl UniformGridSampler2D {
    pub fn get_sample(&self, rng: &mut dyn RngCore) -> Vec2 {
        Vec2::new(gen_f32(rng), gen_f32(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gen_f32_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let x = gen_f32(&mut rng);
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_coin_flip_extremes() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut reference = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(!coin_flip(&mut rng, 0.0));
            assert!(coin_flip(&mut rng, 1.0));
        }
        // Neither extreme consumed any randomness
        assert_eq!(rng.next_u32(), reference.next_u32());
    }

    #[test]
    fn test_coin_flip_frequency() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 20_000;
        let heads = (0..n).filter(|_| coin_flip(&mut rng, 0.25)).count();
        let freq = heads as f32 / n as f32;
        assert!((freq - 0.25).abs() < 0.02, "freq = {}", freq);
    }

    #[test]
    fn test_hemisphere_samples_are_unit_and_upper() {
        let mut rng = StdRng::seed_from_u64(4);
        let sampler = UniformHemisphereSampler;
        for _ in 0..1000 {
            let w = sampler.get_sample(&mut rng);
            assert!((w.length() - 1.0).abs() < 1e-4);
            assert!(w.z >= 0.0);
        }
    }

    #[test]
    fn test_uniform_hemisphere_mean_cosine() {
        // E[cos θ] over the uniform hemisphere is 1/2
        let mut rng = StdRng::seed_from_u64(5);
        let sampler = UniformHemisphereSampler;
        let n = 20_000;
        let mean: f32 = (0..n).map(|_| sampler.get_sample(&mut rng).z).sum::<f32>() / n as f32;
        assert!((mean - 0.5).abs() < 0.02, "mean = {}", mean);
    }

    #[test]
    fn test_cosine_sampler_pdf_matches_direction() {
        let mut rng = StdRng::seed_from_u64(6);
        let sampler = CosineWeightedHemisphereSampler;
        for _ in 0..1000 {
            let (w, pdf) = sampler.get_sample(&mut rng);
            assert!((w.length() - 1.0).abs() < 1e-4);
            assert!((pdf - w.z / PI).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_samples_cover_both_hemispheres() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampler = UniformSphereSampler;
        let samples: Vec<Vec3> = (0..1000).map(|_| sampler.get_sample(&mut rng)).collect();
        assert!(samples.iter().any(|w| w.z > 0.0));
        assert!(samples.iter().any(|w| w.z < 0.0));
        assert!(samples.iter().all(|w| (w.length() - 1.0).abs() < 1e-4));
    }
}
