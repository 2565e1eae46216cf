//! Monte Carlo path tracing integrator.
//!
//! Radiance along a camera ray is the sum of
//! - light scattered by fog (when a fog event fires on the camera ray),
//! - emission at the first hit (zero bounce),
//! - direct and indirect lighting (at least one bounce),
//! - a constant ambient term.
//!
//! Recursion ends when the ray's bounce budget reaches one or the Russian
//! roulette coin says stop. Each call follows exactly one path.

use crate::{
    sampler::{coin_flip, UniformHemisphereSampler},
    Bsdf, Color, FogBsdf, FogMedium, Intersection, Scene,
};
use haze_core::TracerSettings;
use haze_math::{Frame, Ray, Vec3, EPS_F};
use rand::RngCore;

/// Radiance estimator over a built scene.
///
/// Holds only shared references plus the fog material it hands out for
/// synthesized fog hits, so one tracer is shared by every render thread.
pub struct PathTracer<'a> {
    scene: &'a Scene,
    settings: &'a TracerSettings,
    fog: Option<FogMedium>,
    fog_bsdf: FogBsdf,
}

/// Shading frame and outgoing direction at a hit.
struct Shading<'b> {
    frame: Frame,
    hit_p: Vec3,
    w_out: Vec3,
    bsdf: &'b dyn Bsdf,
}

impl<'a> PathTracer<'a> {
    pub fn new(scene: &'a Scene, settings: &'a TracerSettings) -> Self {
        let fog = settings
            .fog
            .enabled
            .then(|| FogMedium::new(&settings.fog));
        Self {
            scene,
            settings,
            fog,
            fog_bsdf: FogBsdf::new(settings.fog.albedo),
        }
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn settings(&self) -> &TracerSettings {
        self.settings
    }

    /// Local frame at the hit. `None` for records without a material or
    /// with a degenerate normal.
    fn shading<'b>(&self, ray: &Ray, isect: &Intersection<'b>) -> Option<Shading<'b>> {
        let bsdf = isect.bsdf?;
        let n = isect.n.try_normalize()?;
        let frame = Frame::from_normal(n);
        Some(Shading {
            frame,
            hit_p: isect.hit_point(ray),
            w_out: frame.to_local(-ray.direction.normalize_or_zero()),
            bsdf,
        })
    }

    /// Light emitted by the hit surface itself.
    pub fn zero_bounce_radiance(&self, _ray: &Ray, isect: &Intersection<'_>) -> Color {
        isect.bsdf.map_or(Color::ZERO, |bsdf| bsdf.get_emission())
    }

    /// Direct lighting by uniform hemisphere sampling.
    ///
    /// Only sees lights that have geometry (emissive surfaces).
    pub fn estimate_direct_lighting_hemisphere(
        &self,
        ray: &Ray,
        isect: &Intersection<'_>,
        rng: &mut dyn RngCore,
    ) -> Color {
        let Some(sh) = self.shading(ray, isect) else {
            return Color::ZERO;
        };
        if sh.bsdf.is_delta() {
            return Color::ZERO;
        }

        // Same budget as the importance estimator gives area lights
        let num_samples = self.scene.lights().len().max(1) * self.settings.ns_area_light as usize;
        if num_samples == 0 {
            return Color::ZERO;
        }

        let mut l_out = Color::ZERO;
        for _ in 0..num_samples {
            let wi = UniformHemisphereSampler.get_sample(rng);
            let mut sample_ray = Ray::spawn(sh.hit_p, sh.frame.to_world(wi), 0);
            let mut sample_isect = Intersection::default();

            if self.scene.intersect(&mut sample_ray, &mut sample_isect) {
                let emission = self.zero_bounce_radiance(&sample_ray, &sample_isect);
                let contribution =
                    emission * sh.bsdf.f(sh.w_out, wi) * wi.z / UniformHemisphereSampler::PDF;
                if contribution.is_finite() {
                    l_out += contribution;
                }
            }
        }

        l_out / num_samples as f32
    }

    /// Direct lighting by sampling the lights.
    ///
    /// Delta lights take one sample, area lights `ns_area_light`; each
    /// light's samples are averaged and the lights summed.
    pub fn estimate_direct_lighting_importance(
        &self,
        ray: &Ray,
        isect: &Intersection<'_>,
        rng: &mut dyn RngCore,
    ) -> Color {
        let Some(sh) = self.shading(ray, isect) else {
            return Color::ZERO;
        };
        // A delta BSDF never reflects a sampled light direction
        if sh.bsdf.is_delta() {
            return Color::ZERO;
        }
        let n = sh.frame.normal();

        let mut l_out = Color::ZERO;
        for light in self.scene.lights() {
            let num_samples = if light.is_delta_light() {
                1
            } else {
                self.settings.ns_area_light
            };
            if num_samples == 0 {
                continue;
            }

            let mut l_light = Color::ZERO;
            for _ in 0..num_samples {
                let sample = light.sample_l(sh.hit_p, rng);
                if !(sample.pdf > 0.0) {
                    continue;
                }

                // Light below the surface contributes nothing
                let cos_theta = n.dot(sample.wi);
                if cos_theta <= 0.0 {
                    continue;
                }

                let shadow = Ray::spawn(sh.hit_p, sample.wi, 0)
                    .with_bounds(EPS_F, sample.dist_to_light - EPS_F);
                if self.scene.has_intersection(&shadow) {
                    continue;
                }

                let f = sh.bsdf.f(sh.w_out, sh.frame.to_local(sample.wi));
                let contribution = sample.radiance * f * cos_theta / sample.pdf;
                if contribution.is_finite() {
                    l_light += contribution;
                }
            }
            l_out += l_light / num_samples as f32;
        }

        l_out
    }

    /// Direct lighting with the configured estimator.
    pub fn one_bounce_radiance(
        &self,
        ray: &Ray,
        isect: &Intersection<'_>,
        rng: &mut dyn RngCore,
    ) -> Color {
        if self.settings.direct_hemisphere_sample {
            self.estimate_direct_lighting_hemisphere(ray, isect, rng)
        } else {
            self.estimate_direct_lighting_importance(ray, isect, rng)
        }
    }

    /// Direct plus indirect lighting, following one path.
    ///
    /// Returns only `one_bounce_radiance` when `ray.depth <= 1` or Russian
    /// roulette terminates the path. Surviving paths are reweighted by the
    /// continuation probability.
    pub fn at_least_one_bounce_radiance(
        &self,
        ray: &Ray,
        isect: &Intersection<'_>,
        rng: &mut dyn RngCore,
    ) -> Color {
        let p_stop = self.settings.russian_roulette;
        if ray.depth <= 1 || coin_flip(rng, p_stop) {
            return self.one_bounce_radiance(ray, isect, rng);
        }

        let mut l_out = if self.settings.accumulate_bounces {
            self.one_bounce_radiance(ray, isect, rng)
        } else {
            Color::ZERO
        };

        let Some(sh) = self.shading(ray, isect) else {
            return l_out;
        };
        let p_continue = 1.0 - p_stop;
        if p_continue <= 0.0 {
            return l_out;
        }

        let sample = sh.bsdf.sample_f(sh.w_out, rng);
        if !(sample.pdf > 0.0) {
            return l_out;
        }

        let mut next = Ray::spawn(sh.hit_p, sh.frame.to_world(sample.wi), ray.depth - 1);
        let mut next_isect = Intersection::default();
        if self.scene.intersect(&mut next, &mut next_isect) {
            let cos_theta = sample.wi.z;
            if cos_theta > 0.0 {
                let l_next = self.at_least_one_bounce_radiance(&next, &next_isect, rng);
                let contribution = l_next * sample.value * cos_theta / sample.pdf / p_continue;
                if contribution.is_finite() {
                    l_out += contribution;
                }
            }
        }

        l_out
    }

    /// Radiance arriving along a camera ray.
    ///
    /// `ray.depth` is the bounce budget; zero means emission only.
    pub fn est_radiance_global_illumination(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        let mut r = *ray;
        let mut isect = Intersection::default();
        if !self.scene.intersect(&mut r, &mut isect) {
            return self.scene.background().radiance(ray.direction);
        }

        let mut l_out = Color::ZERO;

        if let Some(fog) = &self.fog {
            if let Some(event) = fog.march(ray, isect.t, rng) {
                isect.t = event.t;
                isect.n = -ray.direction.normalize_or_zero();
                isect.primitive = None;
                isect.bsdf = Some(&self.fog_bsdf);

                // Light in-scattered from the first light only
                if let Some(light) = self.scene.lights().first() {
                    let sample = light.sample_l(event.position, rng);
                    if sample.pdf > 0.0 {
                        let attenuation =
                            fog.attenuation(event.position, sample.wi, sample.dist_to_light);
                        l_out += fog.in_scatter(sample.radiance, attenuation);
                    }
                }
            }
        }

        l_out += self.zero_bounce_radiance(ray, &isect);
        if ray.depth > 0 {
            l_out += self.at_least_one_bounce_radiance(ray, &isect, rng);
        }
        l_out + Color::from_array(self.settings.ambient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Background, DiffuseBsdf, EmissionBsdf, MirrorBsdf, PointLight, Triangle,
    };
    use haze_core::FogSettings;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;
    use std::sync::Arc;

    fn settings() -> TracerSettings {
        TracerSettings {
            ambient: [0.0; 3],
            ..TracerSettings::default()
        }
    }

    /// Floor quad at y = 0 facing +Y.
    fn add_floor(builder: &mut crate::SceneBuilder, bsdf: Arc<dyn Bsdf>) {
        let (a, b, c, d) = (
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(-10.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, -10.0),
        );
        builder
            .add_primitive(Triangle::new(a, b, c, bsdf.clone()))
            .add_primitive(Triangle::new(a, c, d, bsdf));
    }

    /// Camera-style ray hitting the floor at (0.5, 0, -0.3).
    fn floor_ray(depth: u32) -> Ray {
        Ray::new(Vec3::new(0.5, 1.0, 0.7), Vec3::new(0.0, -1.0, -1.0).normalize()).with_depth(depth)
    }

    fn lit_floor_scene() -> Scene {
        let mut builder = Scene::builder();
        add_floor(&mut builder, Arc::new(DiffuseBsdf::new(Color::splat(0.5))));
        builder.add_light(PointLight::new(Color::ONE, Vec3::new(0.5, 2.0, -0.3)));
        builder.build(4)
    }

    #[test]
    fn test_zero_bounce_is_exactly_emission() {
        let emission = Color::new(1.0, 2.0, 3.0);
        let mut builder = Scene::builder();
        builder.add_sphere(Vec3::ZERO, 1.0, Arc::new(EmissionBsdf::new(emission)));
        let scene = builder.build(4);
        let settings = settings();
        let tracer = PathTracer::new(&scene, &settings);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z).with_depth(5);
        let mut r = ray;
        let mut isect = Intersection::default();
        assert!(scene.intersect(&mut r, &mut isect));
        assert_eq!(tracer.zero_bounce_radiance(&ray, &isect), emission);

        // No lights and a non-reflecting emitter: nothing else is added
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(tracer.est_radiance_global_illumination(&ray, &mut rng), emission);
    }

    #[test]
    fn test_point_light_direct_lighting() {
        let scene = lit_floor_scene();
        let settings = settings();
        let tracer = PathTracer::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(2);

        // Light straight above: albedo / π · I · cos θ with cos θ = 1
        let l = tracer.est_radiance_global_illumination(&floor_ray(1), &mut rng);
        assert!((l - Color::splat(0.5 / PI)).length() < 1e-4, "l = {:?}", l);
    }

    #[test]
    fn test_occluded_light_is_dark() {
        let mut builder = Scene::builder();
        let grey: Arc<dyn Bsdf> = Arc::new(DiffuseBsdf::new(Color::splat(0.5)));
        add_floor(&mut builder, grey.clone());
        builder
            .add_sphere(Vec3::new(0.5, 1.0, -0.3), 0.2, grey)
            .add_light(PointLight::new(Color::ONE, Vec3::new(0.5, 2.0, -0.3)));
        let scene = builder.build(4);
        let settings = settings();
        let tracer = PathTracer::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(3);

        let l = tracer.est_radiance_global_illumination(&floor_ray(1), &mut rng);
        assert_eq!(l, Color::ZERO);
    }

    #[test]
    fn test_depth_one_returns_direct_only() {
        let scene = lit_floor_scene();
        let settings = settings();
        let tracer = PathTracer::new(&scene, &settings);

        let ray = floor_ray(1);
        let mut r = ray;
        let mut isect = Intersection::default();
        assert!(scene.intersect(&mut r, &mut isect));

        let mut rng_a = StdRng::seed_from_u64(4);
        let mut rng_b = StdRng::seed_from_u64(4);
        let bounced = tracer.at_least_one_bounce_radiance(&ray, &isect, &mut rng_a);
        let direct = tracer.one_bounce_radiance(&ray, &isect, &mut rng_b);
        assert_eq!(bounced, direct);

        // Neither call drew more numbers than the other
        assert_eq!(rng_a.next_u32(), rng_b.next_u32());
    }

    #[test]
    fn test_accumulate_bounces_off_drops_first_vertex_direct() {
        // Nothing above the floor, so every secondary ray escapes
        let scene = lit_floor_scene();
        let ray = floor_ray(2);
        let mut r = ray;
        let mut isect = Intersection::default();
        assert!(scene.intersect(&mut r, &mut isect));

        let last_only = TracerSettings {
            accumulate_bounces: false,
            ..settings()
        };
        let tracer = PathTracer::new(&scene, &last_only);
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(tracer.at_least_one_bounce_radiance(&ray, &isect, &mut rng), Color::ZERO);
        assert_eq!(tracer.est_radiance_global_illumination(&ray, &mut rng), Color::ZERO);

        let accumulate = settings();
        let tracer = PathTracer::new(&scene, &accumulate);
        let direct = tracer.one_bounce_radiance(&ray, &isect, &mut rng);
        let total = tracer.at_least_one_bounce_radiance(&ray, &isect, &mut rng);
        assert!((direct - Color::splat(0.5 / PI)).length() < 1e-4, "direct = {:?}", direct);
        let indirect = total - direct;
        assert!(indirect.min_element() >= -1e-6, "indirect = {:?}", indirect);
    }

    #[test]
    fn test_delta_bsdf_skips_direct_sampling() {
        // Mirror floor inside an emitter: hemisphere sampling would draw
        // from the stream if the delta check were skipped
        let mut builder = Scene::builder();
        add_floor(&mut builder, Arc::new(MirrorBsdf::new(Color::ONE)));
        builder.add_sphere(Vec3::ZERO, 50.0, Arc::new(EmissionBsdf::new(Color::ONE)));
        let scene = builder.build(4);
        let settings = TracerSettings {
            direct_hemisphere_sample: true,
            ..settings()
        };
        let tracer = PathTracer::new(&scene, &settings);

        let ray = floor_ray(1);
        let mut r = ray;
        let mut isect = Intersection::default();
        assert!(scene.intersect(&mut r, &mut isect));

        let mut rng = StdRng::seed_from_u64(12);
        let mut reference = StdRng::seed_from_u64(12);
        assert_eq!(tracer.one_bounce_radiance(&ray, &isect, &mut rng), Color::ZERO);
        assert_eq!(rng.next_u32(), reference.next_u32());
    }

    #[test]
    fn test_certain_roulette_stops_at_first_bounce() {
        let scene = lit_floor_scene();
        let settings = TracerSettings {
            russian_roulette: 1.0,
            ..settings()
        };
        let tracer = PathTracer::new(&scene, &settings);

        let ray = floor_ray(8);
        let mut r = ray;
        let mut isect = Intersection::default();
        assert!(scene.intersect(&mut r, &mut isect));

        let mut rng_a = StdRng::seed_from_u64(5);
        let mut rng_b = StdRng::seed_from_u64(5);
        assert_eq!(
            tracer.at_least_one_bounce_radiance(&ray, &isect, &mut rng_a),
            tracer.one_bounce_radiance(&ray, &isect, &mut rng_b)
        );
    }

    #[test]
    fn test_empty_scene_returns_background() {
        let settings = TracerSettings::default();
        let mut rng = StdRng::seed_from_u64(6);

        let scene = Scene::builder().build(4);
        let tracer = PathTracer::new(&scene, &settings);
        for _ in 0..100 {
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            let ray = Ray::new(Vec3::ZERO, dir).with_depth(5);
            assert_eq!(tracer.est_radiance_global_illumination(&ray, &mut rng), Color::ZERO);
        }

        let mut builder = Scene::builder();
        builder.background(Background::SkyGradient);
        let scene = builder.build(4);
        let tracer = PathTracer::new(&scene, &settings);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Y).with_depth(5);
        assert_eq!(tracer.est_radiance_global_illumination(&ray, &mut rng), Color::ONE);
    }

    #[test]
    fn test_hemisphere_estimator_inside_emitter() {
        // Floor inside a uniformly glowing sphere: L_out = albedo · E
        let mut builder = Scene::builder();
        add_floor(&mut builder, Arc::new(DiffuseBsdf::new(Color::splat(0.5))));
        builder.add_sphere(Vec3::ZERO, 50.0, Arc::new(EmissionBsdf::new(Color::ONE)));
        let scene = builder.build(4);
        let settings = TracerSettings {
            direct_hemisphere_sample: true,
            ns_area_light: 4000,
            ..settings()
        };
        let tracer = PathTracer::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(7);

        let l = tracer.est_radiance_global_illumination(&floor_ray(1), &mut rng);
        assert!((l - Color::splat(0.5)).abs().max_element() < 0.03, "l = {:?}", l);
    }

    #[test]
    fn test_mirror_has_no_direct_term() {
        let mut builder = Scene::builder();
        add_floor(&mut builder, Arc::new(MirrorBsdf::new(Color::ONE)));
        builder
            .add_sphere(Vec3::new(0.5, 3.0, -1.3), 0.5, Arc::new(EmissionBsdf::new(Color::splat(2.0))))
            .add_light(PointLight::new(Color::ONE, Vec3::new(0.5, 2.0, -0.3)));
        let scene = builder.build(4);

        let settings = settings();
        let tracer = PathTracer::new(&scene, &settings);
        let mut rng = StdRng::seed_from_u64(8);

        // Mirror has no diffuse part, and the emitter has no reflectance
        let direct_only = tracer.est_radiance_global_illumination(&floor_ray(1), &mut rng);
        assert_eq!(direct_only, Color::ZERO);
        let bounced = tracer.est_radiance_global_illumination(&floor_ray(3), &mut rng);
        assert!(bounced.is_finite());
    }

    #[test]
    fn test_fog_adds_in_scattered_light() {
        let mut builder = Scene::builder();
        add_floor(&mut builder, Arc::new(DiffuseBsdf::new(Color::ZERO)));
        builder.add_light(PointLight::new(Color::ONE, Vec3::new(0.5, 2.0, -0.3)));
        let scene = builder.build(4);

        let clear = settings();
        let tracer = PathTracer::new(&scene, &clear);
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(
            tracer.est_radiance_global_illumination(&floor_ray(3), &mut rng),
            Color::ZERO
        );

        let foggy = TracerSettings {
            fog: FogSettings {
                enabled: true,
                sigma_s: 1e6,
                ..FogSettings::default()
            },
            ..settings()
        };
        let tracer = PathTracer::new(&scene, &foggy);
        let l = tracer.est_radiance_global_illumination(&floor_ray(3), &mut rng);
        assert!(l.is_finite());
        assert!(l.max_element() > 0.0, "l = {:?}", l);
    }

    #[test]
    fn test_radiance_is_finite_and_non_negative() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut builder = Scene::builder();
        let grey: Arc<dyn Bsdf> = Arc::new(DiffuseBsdf::new(Color::splat(0.6)));
        add_floor(&mut builder, grey.clone());
        for i in 0..20 {
            let bsdf: Arc<dyn Bsdf> = match i % 3 {
                0 => grey.clone(),
                1 => Arc::new(MirrorBsdf::new(Color::splat(0.9))),
                _ => Arc::new(EmissionBsdf::new(Color::splat(3.0))),
            };
            let center = Vec3::new(
                rng.gen_range(-4.0..4.0),
                rng.gen_range(0.5..4.0),
                rng.gen_range(-4.0..4.0),
            );
            builder.add_sphere(center, rng.gen_range(0.2..0.8), bsdf);
        }
        builder
            .add_light(PointLight::new(Color::splat(5.0), Vec3::new(0.0, 6.0, 0.0)))
            .add_light(crate::AreaLight::new(
                Color::splat(4.0),
                Vec3::new(0.0, 5.0, 0.0),
                -Vec3::Y,
                Vec3::X,
                Vec3::Z,
            ));
        let scene = builder.build(2);

        let settings = TracerSettings {
            russian_roulette: 0.3,
            fog: FogSettings {
                enabled: true,
                sigma_s: 2.0,
                ..FogSettings::default()
            },
            ..TracerSettings::default()
        };
        let tracer = PathTracer::new(&scene, &settings);

        for _ in 0..300 {
            let origin = Vec3::new(
                rng.gen_range(-6.0..6.0),
                rng.gen_range(0.5..6.0),
                rng.gen_range(-6.0..6.0),
            );
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..0.2),
                rng.gen_range(-1.0..1.0),
            );
            let ray = Ray::new(origin, dir.normalize_or_zero()).with_depth(settings.max_ray_depth);
            let l = tracer.est_radiance_global_illumination(&ray, &mut rng);
            assert!(l.is_finite(), "l = {:?}", l);
            assert!(l.min_element() >= 0.0, "l = {:?}", l);
        }
    }
}
