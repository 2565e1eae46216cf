//! Per-pixel sampling and the output image buffer.
//!
//! Implements:
//! - Adaptive multi-sampling with a 95% confidence stopping rule
//! - Gamma correction and 8-bit conversion
//! - PNG output

use crate::{
    bsdf::illum, sampler::UniformGridSampler2D, Camera, Color, PathTracer, RenderError,
    RenderResult,
};
use rand::RngCore;
use std::path::Path;

/// Averaged radiance of one pixel and the samples it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: Color,
    pub samples: u32,
}

/// Sample pixel (x, y) until it converges or the budget runs out.
///
/// Samples are taken in batches of `samples_per_batch`, up to `ns_aa`. After
/// each batch the 95% confidence half-width of the pixel's illuminance,
/// `I = 1.96 σ / √n`, is compared with `max_tolerance · μ`; sampling stops
/// once it is within tolerance. Row 0 is the top of the image.
pub fn raytrace_pixel(
    tracer: &PathTracer<'_>,
    camera: &Camera,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> PixelSample {
    let settings = tracer.settings();
    let width = camera.image_width as f32;
    let height = camera.image_height as f32;
    let max_samples = settings.ns_aa.max(1);
    let batch = settings.samples_per_batch.max(1);

    let mut color_acc = Color::ZERO;
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    let mut n = 0u32;

    while n < max_samples {
        let this_batch = batch.min(max_samples - n);
        for _ in 0..this_batch {
            let jitter = UniformGridSampler2D.get_sample(rng);
            let u = (x as f32 + jitter.x) / width;
            let v = 1.0 - (y as f32 + jitter.y) / height;
            let ray = camera
                .generate_lens_ray(u, v, rng)
                .with_depth(settings.max_ray_depth);

            let sample = tracer.est_radiance_global_illumination(&ray, rng);
            color_acc += sample;

            let l = illum(sample) as f64;
            s1 += l;
            s2 += l * l;
        }
        n += this_batch;

        if settings.max_tolerance > 0.0 && n > 1 {
            let count = n as f64;
            let mean = s1 / count;
            let variance = ((s2 - s1 * s1 / count) / (count - 1.0)).max(0.0);
            let half_width = 1.96 * variance.sqrt() / count.sqrt();
            if half_width <= settings.max_tolerance as f64 * mean {
                break;
            }
        }
    }

    PixelSample {
        color: color_acc / n as f32,
        samples: n,
    }
}

/// Convert a linear value to display space.
#[inline]
pub fn linear_to_gamma(linear: f32, gamma: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / gamma)
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color, gamma: f32) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c, gamma).clamp(0.0, 1.0)) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

/// Linear radiance per pixel plus the samples each pixel took.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
    pub sample_counts: Vec<u32>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; len],
            sample_counts: vec![0; len],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    pub fn samples(&self, x: u32, y: u32) -> u32 {
        self.sample_counts[(y * self.width + x) as usize]
    }

    /// Store a finished pixel.
    pub fn update_pixel(&mut self, x: u32, y: u32, sample: PixelSample) {
        let idx = (y * self.width + x) as usize;
        self.pixels[idx] = sample.color;
        self.sample_counts[idx] = sample.samples;
    }

    /// Mean samples per pixel.
    pub fn average_samples(&self) -> f32 {
        if self.sample_counts.is_empty() {
            return 0.0;
        }
        self.sample_counts.iter().map(|&c| c as f64).sum::<f64>() as f32
            / self.sample_counts.len() as f32
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self, gamma: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color, gamma));
        }
        bytes
    }

    /// Write the gamma-corrected image as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>, gamma: f32) -> RenderResult<()> {
        let path = path.as_ref();
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba(gamma))
            .ok_or(RenderError::BufferSize {
                width: self.width,
                height: self.height,
            })?;
        img.save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}
