use crate::{Ray, Vec3};

/// Axis-aligned bounding box used by the BVH.
///
/// A box starts out empty (inverted, `min = +∞`, `max = −∞`) and grows as
/// points or other boxes are added. Once anything has been added,
/// `min <= max` holds componentwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox {
    /// The empty box. Contains nothing and is never hit.
    pub const EMPTY: BBox = BBox {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two opposite corner points.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a degenerate box around a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing every point of the iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut bbox, p| {
            bbox.expand_point(p);
            bbox
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to include a point.
    pub fn expand_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow the box to include another box.
    pub fn expand(&mut self, other: &BBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Box enclosing both inputs.
    pub fn union(a: &BBox, b: &BBox) -> BBox {
        let mut out = *a;
        out.expand(b);
        out
    }

    /// `max − min`. Zero for an empty box.
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Axis with the largest extent (0=X, 1=Y, 2=Z). Ties favor X, then Y.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Slab test against the ray's current `[min_t, max_t]` interval.
    ///
    /// Returns the entry/exit parameters clipped to the ray interval, so on
    /// success `ray.min_t <= t0 <= t1 <= ray.max_t`. Zero direction
    /// components divide to signed infinity, which makes axis-parallel rays
    /// fall out of the min/max naturally.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.direction[axis];
            let ta = (self.min[axis] - o) / d;
            let tb = (self.max[axis] - o) / d;
            t_enter = t_enter.max(ta.min(tb));
            t_exit = t_exit.min(ta.max(tb));
        }

        if t_enter > t_exit {
            return None;
        }

        let t0 = t_enter.max(ray.min_t);
        let t1 = t_exit.min(ray.max_t);
        if t0 <= t1 {
            Some((t0, t1))
        } else {
            None
        }
    }

    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BBox {
        BBox::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_bbox_new_orders_corners() {
        let bbox = BBox::new(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));
        assert_eq!(bbox.min, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(bbox.max, Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_bbox_empty() {
        let bbox = BBox::EMPTY;
        assert!(bbox.is_empty());
        assert_eq!(bbox.extent(), Vec3::ZERO);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(!bbox.hit(&ray));
    }

    #[test]
    fn test_bbox_expand_and_union() {
        let mut bbox = BBox::EMPTY;
        bbox.expand_point(Vec3::new(1.0, 2.0, 3.0));
        assert!(!bbox.is_empty());
        assert_eq!(bbox.extent(), Vec3::ZERO);

        bbox.expand_point(Vec3::new(-1.0, 0.0, 5.0));
        assert_eq!(bbox.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 2.0, 5.0));

        let other = BBox::new(Vec3::splat(4.0), Vec3::splat(6.0));
        let u = BBox::union(&bbox, &other);
        assert_eq!(u.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(u.max, Vec3::splat(6.0));
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BBox::from_points([Vec3::ZERO, Vec3::new(2.0, -1.0, 4.0), Vec3::Y]);
        assert_eq!(bbox.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(2.0, 1.0, 4.0));
    }

    #[test]
    fn test_bbox_centroid_and_extent() {
        let bbox = BBox::new(Vec3::ZERO, Vec3::new(10.0, 4.0, 2.0));
        assert_eq!(bbox.centroid(), Vec3::new(5.0, 2.0, 1.0));
        assert_eq!(bbox.extent(), Vec3::new(10.0, 4.0, 2.0));
    }

    #[test]
    fn test_bbox_longest_axis() {
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
        // Ties resolve to the lowest axis
        assert_eq!(BBox::new(Vec3::ZERO, Vec3::splat(3.0)).longest_axis(), 0);
    }

    #[test]
    fn test_bbox_hit_through_center_each_axis() {
        let bbox = unit_box();
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            for sign in [1.0, -1.0] {
                let dir = axis * sign;
                let ray = Ray::new(-dir * 5.0, dir).with_bounds(0.001, f32::INFINITY);
                let (t0, t1) = bbox.intersect(&ray).expect("ray through center must hit");
                assert!(t0 < t1);
                assert!((t0 - 4.0).abs() < 1e-5);
                assert!((t1 - 6.0).abs() < 1e-5);
                assert!(t0 >= ray.min_t && t1 <= ray.max_t);
            }
        }
    }

    #[test]
    fn test_bbox_miss_outside_slab() {
        let bbox = unit_box();

        // Parallel to Z but outside the X slab
        let ray = Ray::new(Vec3::new(10.0, 0.0, -5.0), Vec3::Z);
        assert!(!bbox.hit(&ray));

        // Parallel to X but outside the Y slab
        let ray = Ray::new(Vec3::new(-5.0, 1.5, 0.0), Vec3::X);
        assert!(!bbox.hit(&ray));

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(!bbox.hit(&ray));
    }

    #[test]
    fn test_bbox_respects_ray_interval() {
        let bbox = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z).with_bounds(0.0, 3.0);
        assert!(!bbox.hit(&ray));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z).with_bounds(7.0, 10.0);
        assert!(!bbox.hit(&ray));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z).with_bounds(0.0, 5.0);
        let (t0, t1) = bbox.intersect(&ray).unwrap();
        assert_eq!(t0, 4.0);
        assert_eq!(t1, 5.0);
    }

    #[test]
    fn test_bbox_origin_inside_clips_to_min_t() {
        let bbox = unit_box();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)).with_bounds(0.001, f32::INFINITY);
        let (t0, t1) = bbox.intersect(&ray).unwrap();
        assert_eq!(t0, 0.001);
        assert!((t1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bbox_flat_box_is_hit() {
        // Zero-thickness box (e.g. an axis-aligned triangle)
        let bbox = BBox::new(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let (t0, t1) = bbox.intersect(&ray).unwrap();
        assert_eq!(t0, 2.0);
        assert_eq!(t1, 2.0);
    }
}
