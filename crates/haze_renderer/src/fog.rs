//! Ray-marched fog approximation.
//!
//! A Perlin noise field stands in for fog density. Camera rays are marched
//! toward their first surface hit and may scatter at any step; light reaching
//! a scattering point is dimmed by an exponential falloff in distance and the
//! average density along the way. This is a visual approximation: it does not
//! converge to a transmittance integral.

use crate::{sampler::coin_flip, Color};
use haze_core::FogSettings;
use haze_math::{Ray, Vec3};
use noise::{NoiseFn, Perlin};
use rand::RngCore;

/// A scattering event found while marching a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogEvent {
    /// Ray parameter of the event (same units as the marched ray)
    pub t: f32,
    pub position: Vec3,
}

/// Noise-driven fog density field plus its marching rules.
#[derive(Clone)]
pub struct FogMedium {
    settings: FogSettings,
    noise: Perlin,
}

impl FogMedium {
    /// Panics if `settings.step` is not positive.
    pub fn new(settings: &FogSettings) -> Self {
        assert!(settings.step > 0.0, "fog step must be positive");
        Self {
            settings: settings.clone(),
            noise: Perlin::new(settings.noise_seed),
        }
    }

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Density in `[0, 2]`; zero at or below the height floor.
    pub fn density(&self, p: Vec3) -> f32 {
        if let Some(floor) = self.settings.height_floor {
            if p.y <= floor {
                return 0.0;
            }
        }
        let q = p * self.settings.frequency;
        let n = self.noise.get([q.x as f64, q.y as f64, q.z as f64]) as f32;
        (n + 1.0).clamp(0.0, 2.0)
    }

    /// Chance that one marching step scatters.
    pub fn scatter_probability(&self, density: f32) -> f32 {
        (1.0 - (-self.settings.sigma_s * density * self.settings.step).exp()).clamp(0.0, 1.0)
    }

    /// March `ray` over `(0, t_max)` and return the first scattering event.
    ///
    /// At most `max_march_steps` density samples are taken.
    pub fn march(&self, ray: &Ray, t_max: f32, rng: &mut dyn RngCore) -> Option<FogEvent> {
        let speed = ray.direction.length();
        if speed == 0.0 || !t_max.is_finite() {
            return None;
        }
        let dir = ray.direction / speed;
        let distance = t_max * speed;
        let step = self.settings.step;

        for k in 1..=self.settings.max_march_steps {
            let i = k as f32 * step;
            if i >= distance {
                break;
            }
            let position = ray.origin + dir * i;
            let density = self.density(position);
            if density > 0.0 && coin_flip(rng, self.scatter_probability(density)) {
                return Some(FogEvent {
                    t: i / speed,
                    position,
                });
            }
        }
        None
    }

    /// Fraction of light surviving from `p` toward a light `dist` away
    /// along the unit direction `wi`. Always in `[0, 1]`.
    pub fn attenuation(&self, p: Vec3, wi: Vec3, dist: f32) -> f32 {
        let dist = dist.min(self.settings.max_light_march);
        if !(dist > 0.0) {
            return 1.0;
        }

        let step = self.settings.step;
        let count = (dist / step).floor() as usize + 1;
        let total: f32 = (0..count)
            .map(|k| self.density(p + wi * (k as f32 * step)))
            .sum();
        let avg_density = total / count as f32;

        (-self.settings.absorption * avg_density * dist)
            .exp()
            .clamp(0.0, 1.0)
    }

    /// Light scattered toward the viewer at a fog event.
    pub fn in_scatter(&self, light_radiance: Color, attenuation: f32) -> Color {
        light_radiance * Color::from_array(self.settings.rayleigh_tint) * attenuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn enabled() -> FogSettings {
        FogSettings {
            enabled: true,
            ..FogSettings::default()
        }
    }

    #[test]
    fn test_density_range() {
        let fog = FogMedium::new(&enabled());
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let p = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            let d = fog.density(p);
            assert!((0.0..=2.0).contains(&d), "density {}", d);
        }
    }

    #[test]
    fn test_height_floor_clears_fog() {
        let fog = FogMedium::new(&FogSettings {
            height_floor: Some(0.75),
            ..enabled()
        });
        assert_eq!(fog.density(Vec3::new(0.3, 0.5, 0.1)), 0.0);
        assert_eq!(fog.density(Vec3::new(0.3, 0.75, 0.1)), 0.0);
    }

    #[test]
    fn test_no_scattering_without_coefficient() {
        let fog = FogMedium::new(&FogSettings {
            sigma_s: 0.0,
            ..enabled()
        });
        let mut rng = StdRng::seed_from_u64(2);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(fog.march(&ray, 50.0, &mut rng).is_none());
    }

    #[test]
    fn test_dense_fog_scatters_on_first_step() {
        let fog = FogMedium::new(&FogSettings {
            sigma_s: 1e6,
            ..enabled()
        });
        let mut rng = StdRng::seed_from_u64(3);

        // Unnormalized direction: t is reported in ray units
        let ray = Ray::new(Vec3::new(0.1, 0.2, 0.3), Vec3::new(0.0, 0.0, 2.0));
        let event = fog.march(&ray, 10.0, &mut rng).expect("dense fog must scatter");
        assert!((event.t - 0.025).abs() < 1e-6);
        assert!((event.position - ray.at(event.t)).length() < 1e-5);
    }

    #[test]
    fn test_march_stays_before_surface() {
        let fog = FogMedium::new(&FogSettings {
            sigma_s: 5.0,
            ..enabled()
        });
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.5, -0.2));
            if let Some(event) = fog.march(&ray, 3.0, &mut rng) {
                assert!(event.t > 0.0 && event.t < 3.0);
            }
        }
    }

    #[test]
    fn test_attenuation_is_clamped_and_monotone() {
        let fog = FogMedium::new(&enabled());
        let p = Vec3::new(0.4, 1.3, -0.7);
        let a_near = fog.attenuation(p, Vec3::Y, 1.0);
        let a_far = fog.attenuation(p, Vec3::Y, 10.0);
        assert!((0.0..=1.0).contains(&a_near));
        assert!((0.0..=1.0).contains(&a_far));
        assert_eq!(fog.attenuation(p, Vec3::Y, 0.0), 1.0);

        let thick = FogMedium::new(&FogSettings {
            absorption: 50.0,
            ..enabled()
        });
        assert!(thick.attenuation(p, Vec3::Y, 10.0) <= a_far);

        // Directional lights are infinitely far; the march is bounded
        let inf = fog.attenuation(p, Vec3::Y, f32::INFINITY);
        assert!((0.0..=1.0).contains(&inf));
    }

    #[test]
    fn test_far_hit_march_terminates() {
        let fog = FogMedium::new(&FogSettings {
            sigma_s: 0.0,
            ..enabled()
        });
        let mut rng = StdRng::seed_from_u64(5);

        // Past 2^20 an f32 accumulator stops advancing by 0.05
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(fog.march(&ray, 3.0e6, &mut rng).is_none());
    }

    #[test]
    fn test_far_scatter_stays_within_step_budget() {
        let fog = FogMedium::new(&FogSettings {
            sigma_s: 1e6,
            max_march_steps: 10,
            ..enabled()
        });
        let mut rng = StdRng::seed_from_u64(6);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        if let Some(event) = fog.march(&ray, 3.0e6, &mut rng) {
            assert!(event.t <= 10.0 * fog.settings().step + 1e-6);
        }
    }

    #[test]
    #[should_panic(expected = "fog step must be positive")]
    fn test_zero_step_rejected() {
        FogMedium::new(&FogSettings {
            step: 0.0,
            ..enabled()
        });
    }

    #[test]
    fn test_in_scatter_applies_tint() {
        let fog = FogMedium::new(&enabled());
        let c = fog.in_scatter(Color::ONE, 0.5);
        assert!((c - Color::new(0.83, 1.0, 1.2) * 0.5).length() < 1e-6);
    }
}
