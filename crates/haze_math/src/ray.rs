use crate::Vec3;

/// Offset used to keep secondary rays from re-hitting the surface they leave.
pub const EPS_F: f32 = 1e-4;

/// A ray in 3D space with a valid parametric interval and a bounce budget.
///
/// `max_t` shrinks as closer hits are found during traversal, so every
/// concurrent query must own its own `Ray`. `depth` counts the bounces the
/// ray is still allowed to take.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Not required to be normalized.
    pub direction: Vec3,
    pub min_t: f32,
    pub max_t: f32,
    pub depth: u32,
}

impl Ray {
    /// Create a ray valid over `[0, ∞)` with no remaining bounces.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            min_t: 0.0,
            max_t: f32::INFINITY,
            depth: 0,
        }
    }

    /// Create a secondary ray leaving a surface, offset by `EPS_F`.
    pub fn spawn(origin: Vec3, direction: Vec3, depth: u32) -> Self {
        Self {
            origin,
            direction,
            min_t: EPS_F,
            max_t: f32::INFINITY,
            depth,
        }
    }

    /// Builder: set the remaining bounce budget.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Builder: set the valid parametric interval.
    pub fn with_bounds(mut self, min_t: f32, max_t: f32) -> Self {
        self.min_t = min_t;
        self.max_t = max_t;
        self
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True if `t` lies in the ray's current valid interval.
    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        t >= 0.0 && self.min_t <= t && t <= self.max_t
    }
}
