//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and leaves refer to contiguous index ranges of
//! the primitive array the BVH owns. The tree is built once, then shared
//! read-only between render threads.

use crate::{Intersection, Primitive};
use haze_math::{BBox, Ray};
use std::cell::Cell;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

thread_local! {
    /// Primitive tests this thread has done since its last flush.
    static PENDING_ISECTS: Cell<usize> = const { Cell::new(0) };
}

fn add_pending_isects(n: usize) {
    PENDING_ISECTS.with(|pending| pending.set(pending.get() + n));
}

/// BVH node - either an internal node with two children or a leaf range.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Internal node; `left` and `right` index into the node arena.
    Internal { bbox: BBox, left: usize, right: usize },
    /// Leaf node covering `primitives[start..end]`, never empty.
    Leaf { bbox: BBox, start: usize, end: usize },
}

impl BvhNode {
    pub fn bbox(&self) -> &BBox {
        match self {
            BvhNode::Internal { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Per-query traversal counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub primitive_tests: usize,
}

/// BVH over a set of primitives.
pub struct BvhAccel {
    primitives: Vec<Primitive>,
    nodes: Vec<BvhNode>,
    root: Option<usize>,
    max_leaf_size: usize,
    total_isects: AtomicUsize,
}

impl BvhAccel {
    /// Build a BVH, reordering `primitives` in place.
    ///
    /// # Panics
    ///
    /// Panics if `max_leaf_size` is zero.
    pub fn new(mut primitives: Vec<Primitive>, max_leaf_size: usize) -> Self {
        assert!(max_leaf_size >= 1, "max_leaf_size must be at least 1");

        let start = Instant::now();
        let mut nodes = Vec::with_capacity(2 * primitives.len() / max_leaf_size + 1);
        let root = if primitives.is_empty() {
            None
        } else {
            Some(Self::build(&mut primitives, 0, max_leaf_size, &mut nodes))
        };

        let bvh = Self {
            primitives,
            nodes,
            root,
            max_leaf_size,
            total_isects: AtomicUsize::new(0),
        };

        log::info!(
            "Built BVH: {} primitives, {} nodes, {} leaves, depth {} in {:.2}ms",
            bvh.primitives.len(),
            bvh.nodes.len(),
            bvh.leaves().count(),
            bvh.depth(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        bvh
    }

    /// Recursive construction over `prims`, which starts at `offset` in the
    /// full primitive array. Returns the index of the created node.
    fn build(
        prims: &mut [Primitive],
        offset: usize,
        max_leaf_size: usize,
        nodes: &mut Vec<BvhNode>,
    ) -> usize {
        let bbox = prims
            .iter()
            .fold(BBox::EMPTY, |acc, p| BBox::union(&acc, &p.get_bbox()));

        // Create leaf for small sets
        if prims.len() <= max_leaf_size {
            nodes.push(BvhNode::Leaf {
                bbox,
                start: offset,
                end: offset + prims.len(),
            });
            return nodes.len() - 1;
        }

        // Split on the widest axis at the mean centroid
        let axis = bbox.longest_axis();
        let split = prims
            .iter()
            .map(|p| p.get_bbox().centroid()[axis])
            .sum::<f32>()
            / prims.len() as f32;

        let mut mid = partition(prims, |p| p.get_bbox().centroid()[axis] < split);

        // All centroids on one side (e.g. duplicates): halve by index instead
        if mid == 0 || mid == prims.len() {
            mid = prims.len() / 2;
        }

        let (left_prims, right_prims) = prims.split_at_mut(mid);
        let left = Self::build(left_prims, offset, max_leaf_size, nodes);
        let right = Self::build(right_prims, offset + mid, max_leaf_size, nodes);

        let bbox = BBox::union(nodes[left].bbox(), nodes[right].bbox());
        nodes.push(BvhNode::Internal { bbox, left, right });
        nodes.len() - 1
    }

    /// Primitives in BVH order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Bounds of the whole scene (empty box for an empty BVH).
    pub fn get_bbox(&self) -> BBox {
        self.root
            .map(|root| *self.nodes[root].bbox())
            .unwrap_or(BBox::EMPTY)
    }

    /// Primitive index ranges of every leaf.
    pub fn leaves(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            BvhNode::Leaf { start, end, .. } => Some(*start..*end),
            BvhNode::Internal { .. } => None,
        })
    }

    /// Number of levels (0 for an empty BVH, 1 for a single leaf).
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[BvhNode], idx: usize) -> usize {
            match &nodes[idx] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Internal { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        self.root.map_or(0, |root| depth_of(&self.nodes, root))
    }

    /// Primitive tests flushed into this BVH so far.
    pub fn total_isects(&self) -> usize {
        self.total_isects.load(Ordering::Relaxed)
    }

    /// Move the calling thread's pending primitive-test count into
    /// `total_isects` and return it.
    ///
    /// Queries only bump a thread-local tally. Counts are per thread, not
    /// per BVH, so flush before and after a batch of queries to attribute
    /// them.
    pub fn flush_isects(&self) -> usize {
        let n = PENDING_ISECTS.with(|pending| pending.replace(0));
        if n > 0 {
            self.total_isects.fetch_add(n, Ordering::Relaxed);
        }
        n
    }

    /// Find the closest hit along `ray`, narrowing `ray.max_t` as it goes.
    pub fn intersect<'a>(&'a self, ray: &mut Ray, isect: &mut Intersection<'a>) -> bool {
        let mut stats = TraversalStats::default();
        self.intersect_with_stats(ray, isect, &mut stats)
    }

    /// `intersect`, also reporting how much work the query did.
    pub fn intersect_with_stats<'a>(
        &'a self,
        ray: &mut Ray,
        isect: &mut Intersection<'a>,
        stats: &mut TraversalStats,
    ) -> bool {
        let before = stats.primitive_tests;
        let hit = match self.root {
            Some(root) => self.intersect_node(root, ray, isect, stats),
            None => false,
        };
        add_pending_isects(stats.primitive_tests - before);
        hit
    }

    fn intersect_node<'a>(
        &'a self,
        idx: usize,
        ray: &mut Ray,
        isect: &mut Intersection<'a>,
        stats: &mut TraversalStats,
    ) -> bool {
        let node = &self.nodes[idx];
        stats.nodes_visited += 1;
        if !node.bbox().hit(ray) {
            return false;
        }

        match node {
            BvhNode::Leaf { start, end, .. } => {
                let mut hit_anything = false;
                for prim in &self.primitives[*start..*end] {
                    stats.primitive_tests += 1;
                    // Each hit narrows ray.max_t, so only closer hits replace it
                    hit_anything |= prim.intersect(ray, isect);
                }
                hit_anything
            }
            BvhNode::Internal { left, right, .. } => {
                let hit_left = self.intersect_node(*left, ray, isect, stats);
                let hit_right = self.intersect_node(*right, ray, isect, stats);
                hit_left || hit_right
            }
        }
    }

    /// True if anything blocks `ray` within its interval.
    pub fn has_intersection(&self, ray: &Ray) -> bool {
        let mut stats = TraversalStats::default();
        self.has_intersection_with_stats(ray, &mut stats)
    }

    pub fn has_intersection_with_stats(&self, ray: &Ray, stats: &mut TraversalStats) -> bool {
        let before = stats.primitive_tests;
        let hit = match self.root {
            Some(root) => self.has_intersection_node(root, ray, stats),
            None => false,
        };
        add_pending_isects(stats.primitive_tests - before);
        hit
    }

    fn has_intersection_node(&self, idx: usize, ray: &Ray, stats: &mut TraversalStats) -> bool {
        let node = &self.nodes[idx];
        stats.nodes_visited += 1;
        if !node.bbox().hit(ray) {
            return false;
        }

        match node {
            BvhNode::Leaf { start, end, .. } => self.primitives[*start..*end].iter().any(|prim| {
                stats.primitive_tests += 1;
                prim.has_intersection(ray)
            }),
            BvhNode::Internal { left, right, .. } => {
                self.has_intersection_node(*left, ray, stats)
                    || self.has_intersection_node(*right, ray, stats)
            }
        }
    }
}

/// Move every element matching `pred` to the front; returns how many matched.
fn partition<T>(items: &mut [T], mut pred: impl FnMut(&T) -> bool) -> usize {
    let mut first = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(first, i);
            first += 1;
        }
    }
    first
}
