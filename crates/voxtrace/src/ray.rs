//! Ray segments and slab clipping against the grid bounding box.

use voxtrace_math::{is_finite_point, Point3, Vec3, AXES};

use crate::grid::{Aabb3, GridGeometry};

/// A straight segment from `source` to `destination`.
///
/// The segment is parameterized by `t ∈ [0, 1]`: `t = 0` at the source,
/// `t = 1` at the destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the segment.
    pub source: Point3,
    /// End of the segment.
    pub destination: Point3,
}

impl Ray {
    /// Create a segment between two points.
    pub fn new(source: Point3, destination: Point3) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Unnormalized direction `destination - source`.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.destination - self.source
    }

    /// Euclidean length of the segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Evaluate the segment at parameter `t`: `source + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.source + t * self.direction()
    }

    /// The same segment traversed from destination to source.
    pub fn reversed(&self) -> Self {
        Self::new(self.destination, self.source)
    }

    /// True if the segment has zero length or a non-finite endpoint.
    ///
    /// Degenerate segments cross no voxels.
    pub fn is_degenerate(&self) -> bool {
        if !is_finite_point(&self.source) || !is_finite_point(&self.destination) {
            return true;
        }
        let len = self.length();
        len == 0.0 || !len.is_finite()
    }

    /// Clip the segment against an axis-aligned box using the slab method.
    ///
    /// Each axis contributes the interval between its two plane crossings;
    /// the result is their intersection with `[0, 1]`. An axis the segment
    /// runs parallel to contributes nothing unless the segment lies outside
    /// that axis's `[min, max]`, which rejects it outright.
    ///
    /// Returns `None` for degenerate segments and segments that miss the box.
    pub fn clip(&self, aabb: &Aabb3) -> Option<ClipInterval> {
        if self.is_degenerate() {
            return None;
        }
        let dir = self.direction();
        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;

        for a in 0..AXES {
            let (lo, hi) = (aabb.min[a], aabb.max[a]);
            let s = self.source[a];
            let d = dir[a];

            if d == 0.0 {
                if s < lo || s > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let t0 = (lo - s) * inv;
            let t1 = (hi - s) * inv;
            let (t_near, t_far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

            t_enter = t_enter.max(t_near);
            t_exit = t_exit.min(t_far);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(ClipInterval { t_enter, t_exit })
    }

    /// Clip the segment against a grid's bounding box.
    pub fn clip_to_grid(&self, grid: &GridGeometry) -> Option<ClipInterval> {
        self.clip(&grid.bounding_box())
    }

    /// Length of the part of the segment inside the grid's bounding box.
    pub fn clipped_length(&self, grid: &GridGeometry) -> f64 {
        self.clip_to_grid(grid)
            .map_or(0.0, |clip| clip.span() * self.length())
    }
}

/// Parametric sub-interval `[t_enter, t_exit] ⊆ [0, 1]` of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInterval {
    /// Parameter where the segment enters the box.
    pub t_enter: f64,
    /// Parameter where the segment leaves the box.
    pub t_exit: f64,
}

impl ClipInterval {
    /// Width of the interval in parameter units.
    #[inline]
    pub fn span(&self) -> f64 {
        self.t_exit - self.t_enter
    }
}
