//! Haze Renderer - BVH accelerated CPU path tracing
//!
//! A Monte Carlo path tracer for physically-based rendering:
//!
//! - **Geometry**: spheres and triangles behind a flat `Primitive` enum,
//!   indexed by an arena `BvhAccel`
//! - **Integrator**: `PathTracer` with light importance sampling, Russian
//!   roulette and a ray-marched fog approximation
//! - **Output**: adaptive per-pixel sampling, parallel bucket rendering,
//!   PNG export
//!
//! # Example
//!
//! ```ignore
//! use haze_renderer::{render, Camera, DiffuseBsdf, PathTracer, PointLight, Scene};
//!
//! let mut builder = Scene::builder();
//! builder
//!     .add_sphere(Vec3::ZERO, 1.0, Arc::new(DiffuseBsdf::new(Color::splat(0.7))))
//!     .add_light(PointLight::new(Color::splat(5.0), Vec3::new(0.0, 4.0, 2.0)));
//! let scene = builder.build(settings.max_leaf_size);
//!
//! let tracer = PathTracer::new(&scene, &settings);
//! let image = render(&tracer, &camera);
//! image.save_png("out.png", settings.gamma)?;
//! ```

mod bsdf;
mod bucket;
mod bvh;
mod camera;
mod error;
mod fog;
mod intersection;
mod light;
mod pathtracer;
mod primitive;
mod renderer;
pub mod sampler;
mod scene;
mod sphere;
mod triangle;

pub use bsdf::{illum, reflect, Bsdf, BsdfSample, Color, DiffuseBsdf, EmissionBsdf, FogBsdf, MirrorBsdf};
pub use bucket::{
    generate_buckets, pixel_rng, render, render_bucket, render_with_progress, Bucket, BucketResult,
    DEFAULT_BUCKET_SIZE,
};
pub use bvh::{BvhAccel, BvhNode, TraversalStats};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use fog::{FogEvent, FogMedium};
pub use intersection::Intersection;
pub use light::{AreaLight, DirectionalLight, Light, LightSample, PointLight};
pub use pathtracer::PathTracer;
pub use primitive::{Primitive, SurfaceHit};
pub use renderer::{color_to_rgba, linear_to_gamma, raytrace_pixel, ImageBuffer, PixelSample};
pub use scene::{Background, Scene, SceneBuilder};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export common math types from haze_math
pub use haze_math::{BBox, Ray, Vec3, EPS_F};
