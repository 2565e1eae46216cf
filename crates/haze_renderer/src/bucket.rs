//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel using rayon. Every pixel draws from its own random
//! stream, so the image does not depend on how tiles land on threads.

use crate::renderer::{raytrace_pixel, ImageBuffer, PixelSample};
use crate::{Camera, PathTracer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::Instant;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Generate buckets for an image, sorted in spiral order from center.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();
    let mut index = 0;

    // Generate grid of buckets
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    // Update indices after sorting
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center, nearest first.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    buckets.sort_by(|a, b| {
        let a_center_x = a.x as f32 + a.width as f32 / 2.0;
        let a_center_y = a.y as f32 + a.height as f32 / 2.0;
        let b_center_x = b.x as f32 + b.width as f32 / 2.0;
        let b_center_y = b.y as f32 + b.height as f32 / 2.0;

        let a_dist = (a_center_x - center_x).powi(2) + (a_center_y - center_y).powi(2);
        let b_dist = (b_center_x - center_x).powi(2) + (b_center_y - center_y).powi(2);

        a_dist.partial_cmp(&b_dist).unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Random stream for pixel (x, y) under a render seed.
pub fn pixel_rng(seed: u64, x: u32, y: u32) -> StdRng {
    let coord = ((y as u64) << 32) | x as u64;
    StdRng::seed_from_u64(splitmix64(seed ^ splitmix64(coord)))
}

/// Render a single bucket.
///
/// Returns pixels in row-major order within the bucket.
pub fn render_bucket(bucket: &Bucket, tracer: &PathTracer<'_>, camera: &Camera) -> Vec<PixelSample> {
    let seed = tracer.settings().seed;
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let global_x = bucket.x + local_x;
            let global_y = bucket.y + local_y;
            let mut rng = pixel_rng(seed, global_x, global_y);
            pixels.push(raytrace_pixel(tracer, camera, global_x, global_y, &mut rng));
        }
    }

    pixels
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixels in row-major order
    pub pixels: Vec<PixelSample>,
    /// BVH primitive tests spent on this bucket
    pub primitive_tests: usize,
}

impl BucketResult {
    /// Create a new bucket result.
    pub fn new(bucket: Bucket, pixels: Vec<PixelSample>) -> Self {
        Self {
            bucket,
            pixels,
            primitive_tests: 0,
        }
    }

    /// Copy the bucket's pixels into a full image.
    pub fn write_to(&self, image: &mut ImageBuffer) {
        let width = self.bucket.width.max(1);
        for (i, px) in self.pixels.iter().enumerate() {
            let x = self.bucket.x + i as u32 % width;
            let y = self.bucket.y + i as u32 / width;
            image.update_pixel(x, y, *px);
        }
    }
}

/// Render the whole image at the camera's resolution.
pub fn render(tracer: &PathTracer<'_>, camera: &Camera) -> ImageBuffer {
    render_with_progress(tracer, camera, |_| {})
}

/// Render the whole image, calling `on_bucket` as each bucket finishes.
///
/// `on_bucket` runs on worker threads in completion order.
pub fn render_with_progress<F>(tracer: &PathTracer<'_>, camera: &Camera, on_bucket: F) -> ImageBuffer
where
    F: Fn(&BucketResult) + Sync,
{
    let (width, height) = (camera.image_width, camera.image_height);
    let buckets = generate_buckets(width, height, DEFAULT_BUCKET_SIZE);
    let start = Instant::now();
    let bvh = tracer.scene().bvh();

    log::info!(
        "Rendering {}x{} in {} buckets on {} threads",
        width,
        height,
        buckets.len(),
        rayon::current_num_threads()
    );

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| {
            // A bucket runs start to finish on one worker, so its
            // thread-local tally is exactly this bucket's work
            bvh.flush_isects();
            let mut result = BucketResult::new(*bucket, render_bucket(bucket, tracer, camera));
            result.primitive_tests = bvh.flush_isects();
            log::debug!("Bucket {} done", bucket.index);
            on_bucket(&result);
            result
        })
        .collect();

    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        result.write_to(&mut image);
    }

    let elapsed = start.elapsed().as_secs_f64();
    let isects: usize = results.iter().map(|r| r.primitive_tests).sum();
    log::info!(
        "Rendered in {:.2}s: {:.1} samples/pixel, {} primitive tests",
        elapsed,
        image.average_samples(),
        isects
    );

    image
}
