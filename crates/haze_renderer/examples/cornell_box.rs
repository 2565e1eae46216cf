//! Cornell box example.
//!
//! Builds the classic box in code, renders it in parallel and writes a PNG.
//!
//! Run with: cargo run --release --example cornell_box -- [settings.json]

use anyhow::Result;
use haze_core::{Mesh, TracerSettings};
use haze_renderer::{
    render_with_progress, AreaLight, Bsdf, Camera, Color, DiffuseBsdf, EmissionBsdf, MirrorBsdf,
    PathTracer, Scene, Vec3,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Two-triangle quad, CCW as seen from the side it faces.
fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Result<Mesh> {
    Ok(Mesh::try_new(vec![a, b, c, d], vec![0, 1, 2, 0, 2, 3], None)?)
}

fn build_scene(settings: &TracerSettings) -> Result<Scene> {
    let white: Arc<dyn Bsdf> = Arc::new(DiffuseBsdf::new(Color::splat(0.73)));
    let red: Arc<dyn Bsdf> = Arc::new(DiffuseBsdf::new(Color::new(0.65, 0.05, 0.05)));
    let green: Arc<dyn Bsdf> = Arc::new(DiffuseBsdf::new(Color::new(0.12, 0.45, 0.15)));
    let glow: Arc<dyn Bsdf> = Arc::new(EmissionBsdf::new(Color::splat(8.0)));

    let v = Vec3::new;
    let mut builder = Scene::builder();
    builder
        // Floor, ceiling, back wall
        .add_mesh(&quad(v(-1.0, 0.0, -1.0), v(-1.0, 0.0, 1.0), v(1.0, 0.0, 1.0), v(1.0, 0.0, -1.0))?, white.clone())
        .add_mesh(&quad(v(-1.0, 2.0, -1.0), v(1.0, 2.0, -1.0), v(1.0, 2.0, 1.0), v(-1.0, 2.0, 1.0))?, white.clone())
        .add_mesh(&quad(v(-1.0, 0.0, -1.0), v(1.0, 0.0, -1.0), v(1.0, 2.0, -1.0), v(-1.0, 2.0, -1.0))?, white.clone())
        // Left (red) and right (green) walls
        .add_mesh(&quad(v(-1.0, 0.0, -1.0), v(-1.0, 2.0, -1.0), v(-1.0, 2.0, 1.0), v(-1.0, 0.0, 1.0))?, red)
        .add_mesh(&quad(v(1.0, 0.0, -1.0), v(1.0, 0.0, 1.0), v(1.0, 2.0, 1.0), v(1.0, 2.0, -1.0))?, green)
        // Visible light panel just under the ceiling
        .add_mesh(&quad(v(-0.25, 1.99, -0.25), v(0.25, 1.99, -0.25), v(0.25, 1.99, 0.25), v(-0.25, 1.99, 0.25))?, glow)
        .add_sphere(v(-0.4, 0.35, -0.3), 0.35, Arc::new(MirrorBsdf::new(Color::splat(0.9))))
        .add_sphere(v(0.45, 0.3, 0.3), 0.3, white)
        .add_light(AreaLight::new(
            Color::splat(8.0),
            v(0.0, 1.98, 0.0),
            -Vec3::Y,
            Vec3::X * 0.5,
            Vec3::Z * 0.5,
        ));

    Ok(builder.build(settings.max_leaf_size))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => TracerSettings::from_json_file(path)?,
        None => TracerSettings::default(),
    };

    let scene = build_scene(&settings)?;
    let mut camera = Camera::new()
        .with_resolution(400, 400)
        .with_position(Vec3::new(0.0, 1.0, 3.4), Vec3::new(0.0, 1.0, 0.0), Vec3::Y)
        .with_fov(40.0)
        .with_lens(0.6, 1.0)
        .build();
    if let Some(focus) = camera.autofocus(&scene, 0.5, 0.5) {
        log::info!("Focused at {:.2}", focus);
    }

    let tracer = PathTracer::new(&scene, &settings);
    let done = AtomicUsize::new(0);
    let image = render_with_progress(&tracer, &camera, |result| {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("{} buckets finished (last: {})", n, result.bucket.index);
    });

    image.save_png("cornell_box.png", settings.gamma)?;
    Ok(())
}
