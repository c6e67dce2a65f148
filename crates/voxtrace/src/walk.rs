//! Voxel-by-voxel walk along a clipped segment.
//!
//! This is the fast voxel traversal of Amanatides & Woo, bounded to the
//! grid and reporting the length of segment inside each voxel rather than
//! only the voxel sequence.
//!
//! # Algorithm
//!
//! The walk starts in the voxel containing the clipped entry point. For every
//! axis the segment moves along, it tracks the parameter `t_next` of the next
//! voxel boundary on that axis. Each step records the current voxel with the
//! length up to the earliest boundary (or the clip exit), then crosses that
//! boundary. Boundaries reached at the same parameter on several axes, within
//! [`Tolerance::tie`] of the axis crossing interval, are crossed together so a
//! corner crossing yields neither a zero-length entry nor a skipped voxel.

use serde::{Deserialize, Serialize};
use voxtrace_math::{Tolerance, AXES};

use crate::grid::{GridGeometry, VoxelIndex};
use crate::ray::{ClipInterval, Ray};

/// One voxel crossed by a segment and the segment length inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelCrossing {
    /// Voxel address.
    pub index: VoxelIndex,
    /// Length of segment inside the voxel, in world units.
    pub length: f64,
}

/// Ordered voxel crossings of one segment, from source toward destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    crossings: Vec<VoxelCrossing>,
}

impl TraversalResult {
    /// A result with no crossings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of voxels crossed.
    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    /// True if the segment crossed no voxel.
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }

    /// Crossings in traversal order.
    pub fn crossings(&self) -> &[VoxelCrossing] {
        &self.crossings
    }

    /// Iterate over crossings in traversal order.
    pub fn iter(&self) -> std::slice::Iter<'_, VoxelCrossing> {
        self.crossings.iter()
    }

    /// Sum of per-voxel lengths.
    pub fn total_length(&self) -> f64 {
        self.crossings.iter().map(|c| c.length).sum()
    }

    /// Split into index-aligned voxel and length sequences.
    pub fn into_parts(self) -> (Vec<VoxelIndex>, Vec<f64>) {
        self.crossings
            .into_iter()
            .map(|c| (c.index, c.length))
            .unzip()
    }
}

impl FromIterator<VoxelCrossing> for TraversalResult {
    fn from_iter<I: IntoIterator<Item = VoxelCrossing>>(iter: I) -> Self {
        Self {
            crossings: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TraversalResult {
    type Item = VoxelCrossing;
    type IntoIter = std::vec::IntoIter<VoxelCrossing>;

    fn into_iter(self) -> Self::IntoIter {
        self.crossings.into_iter()
    }
}

impl<'a> IntoIterator for &'a TraversalResult {
    type Item = &'a VoxelCrossing;
    type IntoIter = std::slice::Iter<'a, VoxelCrossing>;

    fn into_iter(self) -> Self::IntoIter {
        self.crossings.iter()
    }
}

/// Iterator over the voxels a clipped segment crosses.
///
/// Yields a [`VoxelCrossing`] per voxel with a positive length, in order
/// from the segment's source toward its destination.
#[derive(Debug, Clone)]
pub struct VoxelWalker {
    /// Current voxel.
    index: [i64; 3],
    /// Voxel counts per axis.
    shape: [i64; 3],
    /// Step direction per axis (-1, 0 or 1).
    step: [i64; 3],
    /// Parameter of the next boundary crossing per axis.
    t_next: [f64; 3],
    /// Parameter distance between boundaries per axis.
    t_delta: [f64; 3],
    /// Grid origin, spacing, segment source and direction, per axis.
    origin: [f64; 3],
    spacing: [f64; 3],
    source: [f64; 3],
    direction: [f64; 3],
    /// Parameter reached so far.
    t_cur: f64,
    /// Parameter where the segment leaves the grid.
    t_exit: f64,
    total_length: f64,
    tolerance: Tolerance,
    done: bool,
}

impl VoxelWalker {
    /// Start a walk over `clip`, an interval returned by [`Ray::clip_to_grid`]
    /// for the same ray and grid.
    pub fn new(ray: &Ray, grid: &GridGeometry, clip: ClipInterval, tolerance: Tolerance) -> Self {
        let dims = grid.shape();
        let shape = dims.map(|n| n as i64);
        let dir = ray.direction();
        let entry = grid.world_to_grid(&ray.at(clip.t_enter));

        let mut walker = Self {
            index: [0; 3],
            shape,
            step: [0; 3],
            t_next: [f64::INFINITY; 3],
            t_delta: [f64::INFINITY; 3],
            origin: [grid.origin().x, grid.origin().y, grid.origin().z],
            spacing: [grid.spacing().x, grid.spacing().y, grid.spacing().z],
            source: [ray.source.x, ray.source.y, ray.source.z],
            direction: [dir.x, dir.y, dir.z],
            t_cur: clip.t_enter,
            t_exit: clip.t_exit,
            total_length: ray.length(),
            tolerance,
            done: grid.is_empty(),
        };
        if walker.done {
            return walker;
        }

        for a in 0..AXES {
            // Entry points on the far faces floor to `shape`; rounding can
            // also land them just below zero.
            #[allow(clippy::cast_possible_truncation)]
            let cell = entry[a].floor() as i64;
            walker.index[a] = cell.clamp(0, shape[a] - 1);

            let d = walker.direction[a];
            if d != 0.0 {
                walker.step[a] = if d > 0.0 { 1 } else { -1 };
                walker.t_delta[a] = walker.spacing[a] / d.abs();
                walker.t_next[a] = walker.boundary_t(a);
            }
        }

        // An entry point sitting on an interior boundary (a downward walk
        // starting exactly on a face, or a coordinate rounded to just below
        // it) crosses that boundary immediately.
        let t_enter = clip.t_enter;
        for a in 0..AXES {
            if walker.step[a] != 0
                && walker
                    .tolerance
                    .crossings_tied(walker.t_next[a], t_enter, walker.t_delta[a])
            {
                walker.cross(a);
            }
        }
        walker
    }

    /// Parameter at which the segment reaches the boundary it is heading
    /// toward on `axis`.
    #[inline]
    fn boundary_t(&self, axis: usize) -> f64 {
        let face = if self.step[axis] > 0 {
            self.index[axis] + 1
        } else {
            self.index[axis]
        };
        let world = self.origin[axis] + face as f64 * self.spacing[axis];
        (world - self.source[axis]) / self.direction[axis]
    }

    /// Step across the next boundary on `axis`, ending the walk if that
    /// leaves the grid.
    #[inline]
    fn cross(&mut self, axis: usize) {
        let next = self.index[axis] + self.step[axis];
        if next < 0 || next >= self.shape[axis] {
            self.done = true;
            return;
        }
        self.index[axis] = next;
        self.t_next[axis] = self.boundary_t(axis);
    }

    fn current(&self) -> VoxelIndex {
        VoxelIndex::new(
            self.index[0] as usize,
            self.index[1] as usize,
            self.index[2] as usize,
        )
    }
}

impl Iterator for VoxelWalker {
    type Item = VoxelCrossing;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.t_cur < self.t_exit {
            let t_min = self.t_next.iter().copied().fold(f64::INFINITY, f64::min);
            let t_advance = t_min.max(self.t_cur).min(self.t_exit);
            let length = (t_advance - self.t_cur) * self.total_length;
            let index = self.current();
            self.t_cur = t_advance;

            if t_advance < self.t_exit {
                for a in 0..AXES {
                    if self.step[a] != 0
                        && self
                            .tolerance
                            .crossings_tied(self.t_next[a], t_min, self.t_delta[a])
                    {
                        self.cross(a);
                    }
                }
            } else {
                self.done = true;
            }

            if length > 0.0 {
                return Some(VoxelCrossing { index, length });
            }
        }
        None
    }
}

/// Traverse one segment through the grid.
///
/// Segments that are degenerate or miss the grid's bounding box yield an
/// empty result.
pub fn trace_ray(ray: &Ray, grid: &GridGeometry, tolerance: Tolerance) -> TraversalResult {
    if grid.is_empty() {
        return TraversalResult::empty();
    }
    match ray.clip_to_grid(grid) {
        Some(clip) => VoxelWalker::new(ray, grid, clip, tolerance).collect(),
        None => TraversalResult::empty(),
    }
}
