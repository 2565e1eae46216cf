//! Camera for ray generation: a pinhole by default, with an optional thin
//! lens for depth of field.

use crate::sampler::gen_f32;
use crate::{Intersection, Scene};
use haze_math::{Ray, Vec3};
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// Configure with the builder methods, then call `build()` (or
/// `initialize()`) before generating rays.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,

    // Lens
    defocus_angle: f32, // Cone angle of rays through each image point
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    center: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            // Cached values (initialized to defaults)
            center: Vec3::ZERO,
            lower_left: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        }
    }

    /// Set image resolution (also fixes the aspect ratio).
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Set the thin lens: defocus cone angle in degrees (0 = pinhole) and
    /// focus distance.
    pub fn with_lens(mut self, defocus_angle: f32, focus_dist: f32) -> Self {
        self.defocus_angle = defocus_angle.max(0.0);
        if focus_dist > 0.0 {
            self.focus_dist = focus_dist;
        }
        self
    }

    /// Finish the builder chain.
    pub fn build(mut self) -> Self {
        self.initialize();
        self
    }

    /// Recompute the cached view plane from the current settings.
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Viewport lies on the focus plane
        let theta = self.vfov.to_radians();
        let viewport_height = 2.0 * (theta / 2.0).tan() * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(self.w).normalize();
        let v = self.w.cross(u);

        self.horizontal = viewport_width * u;
        self.vertical = viewport_height * v;
        self.lower_left =
            self.center - self.focus_dist * self.w - self.horizontal / 2.0 - self.vertical / 2.0;

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;
    }

    /// Ray through normalized image coordinates.
    ///
    /// `(0, 0)` is the lower-left corner of the image and `(1, 1)` the
    /// upper-right. The direction is normalized.
    pub fn generate_ray(&self, u: f32, v: f32) -> Ray {
        let target = self.lower_left + u * self.horizontal + v * self.vertical;
        Ray::new(self.center, (target - self.center).normalize())
    }

    /// Like `generate_ray`, but starts the ray on the lens disk.
    ///
    /// Draws from `rng` only when the lens is open.
    pub fn generate_lens_ray(&self, u: f32, v: f32, rng: &mut dyn RngCore) -> Ray {
        if self.defocus_angle <= 0.0 {
            return self.generate_ray(u, v);
        }
        let target = self.lower_left + u * self.horizontal + v * self.vertical;
        let p = random_in_unit_disk(rng);
        let origin = self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v;
        Ray::new(origin, (target - origin).normalize())
    }

    /// Focus on whatever the ray through `(u, v)` hits first.
    ///
    /// Returns the new focus distance, or `None` (focus unchanged) on a miss.
    pub fn autofocus(&mut self, scene: &Scene, u: f32, v: f32) -> Option<f32> {
        let mut ray = self.generate_ray(u, v);
        let mut isect = Intersection::default();
        if !scene.intersect(&mut ray, &mut isect) || !(isect.t > 0.0) {
            return None;
        }
        // Pinhole rays are unit length, so t is a distance
        self.focus_dist = isect.t;
        self.initialize();
        Some(isect.t)
    }

    pub fn focus_dist(&self) -> f32 {
        self.focus_dist
    }

    pub fn position(&self) -> Vec3 {
        self.center
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new().build()
    }
}

/// Rejection-sample a point in the unit disk (z = 0).
fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
