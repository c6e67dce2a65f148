//! Regular voxel grid geometry.
//!
//! A grid is an origin (the lower corner of voxel `(0, 0, 0)`), a per-axis
//! voxel spacing and a per-axis voxel count. Axis order is whatever the
//! caller uses, as long as points, origin, spacing and shape agree.
//!
//! Voxel `i` on axis `a` owns the half-open world interval
//! `[origin[a] + i * spacing[a], origin[a] + (i + 1) * spacing[a])`.

use serde::{Deserialize, Serialize};
use voxtrace_math::{is_finite_point, point, vector, Point3, Vec3, AXES};

use crate::error::{Result, TraceError};

/// Integer address of one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct VoxelIndex {
    /// Index along the first axis.
    pub i: usize,
    /// Index along the second axis.
    pub j: usize,
    /// Index along the third axis.
    pub k: usize,
}

impl VoxelIndex {
    /// Create a voxel index.
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// Component along `axis` (0, 1 or 2).
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    #[inline]
    pub fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.i,
            1 => self.j,
            2 => self.k,
            _ => panic!("axis out of range: {axis}"),
        }
    }

    /// The index as an `[i, j, k]` array.
    #[inline]
    pub fn to_array(self) -> [usize; 3] {
        [self.i, self.j, self.k]
    }
}

impl From<[usize; 3]> for VoxelIndex {
    fn from(ijk: [usize; 3]) -> Self {
        Self::new(ijk[0], ijk[1], ijk[2])
    }
}

impl From<VoxelIndex> for [usize; 3] {
    fn from(index: VoxelIndex) -> Self {
        index.to_array()
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Test whether a point lies inside the box (faces included).
    pub fn contains_point(&self, p: &Point3) -> bool {
        (0..AXES).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }

    /// Edge lengths of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Geometry of a regular axis-aligned voxel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    origin: Point3,
    spacing: Vec3,
    shape: [usize; 3],
}

impl GridGeometry {
    /// Create a grid, validating that every spacing component is strictly
    /// positive and finite and that the origin and far corner are finite.
    pub fn new(origin: Point3, spacing: Vec3, shape: [usize; 3]) -> Result<Self> {
        if !is_finite_point(&origin) {
            return Err(TraceError::InvalidGrid(format!(
                "origin must be finite, got ({}, {}, {})",
                origin.x, origin.y, origin.z
            )));
        }
        for a in 0..AXES {
            let s = spacing[a];
            if s <= 0.0 || !s.is_finite() {
                return Err(TraceError::InvalidGrid(format!(
                    "spacing on axis {a} must be positive and finite, got {s}"
                )));
            }
            if shape[a] > i64::MAX as usize {
                return Err(TraceError::InvalidGrid(format!(
                    "shape on axis {a} is too large: {}",
                    shape[a]
                )));
            }
        }
        shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| TraceError::InvalidGrid("voxel count overflows usize".into()))?;

        let grid = Self {
            origin,
            spacing,
            shape,
        };
        if !is_finite_point(&grid.bounding_box().max) {
            return Err(TraceError::InvalidGrid(
                "grid extent overflows floating point range".into(),
            ));
        }
        Ok(grid)
    }

    /// Create a grid from raw triples with a signed shape, as received from
    /// array-oriented callers. Negative shape components are rejected.
    pub fn from_raw(origin: [f64; 3], spacing: [f64; 3], shape: [i64; 3]) -> Result<Self> {
        let mut dims = [0usize; 3];
        for a in 0..AXES {
            dims[a] = usize::try_from(shape[a]).map_err(|_| {
                TraceError::InvalidGrid(format!(
                    "shape on axis {a} must be non-negative, got {}",
                    shape[a]
                ))
            })?;
        }
        Self::new(point(origin), vector(spacing), dims)
    }

    /// Unit-spaced grid with its origin at zero, sized by voxel counts alone.
    pub fn from_dims(shape: [usize; 3]) -> Result<Self> {
        Self::new(Point3::origin(), Vec3::new(1.0, 1.0, 1.0), shape)
    }

    /// World position of the lower corner of voxel `(0, 0, 0)`.
    #[inline]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Per-axis voxel size.
    #[inline]
    pub fn spacing(&self) -> &Vec3 {
        &self.spacing
    }

    /// Per-axis voxel counts.
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// True if any axis has zero voxels.
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Convert a world point to continuous grid coordinates.
    ///
    /// Integer values fall on voxel boundaries; `floor` of a coordinate is
    /// the index of the voxel that owns it.
    pub fn world_to_grid(&self, p: &Point3) -> Vec3 {
        (*p - self.origin).component_div(&self.spacing)
    }

    /// Convert continuous grid coordinates back to a world point.
    pub fn grid_to_world(&self, g: &Vec3) -> Point3 {
        self.origin + g.component_mul(&self.spacing)
    }

    /// World-space bounding box of the whole grid.
    pub fn bounding_box(&self) -> Aabb3 {
        let counts = Vec3::new(
            self.shape[0] as f64,
            self.shape[1] as f64,
            self.shape[2] as f64,
        );
        Aabb3::new(self.origin, self.origin + counts.component_mul(&self.spacing))
    }

    /// World-space bounds of a single voxel.
    pub fn voxel_bounds(&self, index: VoxelIndex) -> Aabb3 {
        let lo = Vec3::new(index.i as f64, index.j as f64, index.k as f64);
        let hi = lo.add_scalar(1.0);
        Aabb3::new(self.grid_to_world(&lo), self.grid_to_world(&hi))
    }

    /// True if `index` addresses a voxel inside the grid.
    pub fn contains_index(&self, index: VoxelIndex) -> bool {
        (0..AXES).all(|a| index.axis(a) < self.shape[a])
    }

    /// Voxel owning a world point under the half-open convention, or `None`
    /// if the point lies outside the grid.
    pub fn voxel_of(&self, p: &Point3) -> Option<VoxelIndex> {
        let g = self.world_to_grid(p);
        let mut ijk = [0usize; 3];
        for a in 0..AXES {
            let c = g[a].floor();
            if c.is_nan() || c < 0.0 || c >= self.shape[a] as f64 {
                return None;
            }
            ijk[a] = c as usize;
        }
        Some(VoxelIndex::from(ijk))
    }

    /// Flat offset of a voxel in a dense buffer laid out with the last axis
    /// varying fastest. `None` if the index is out of range.
    pub fn linear_index(&self, index: VoxelIndex) -> Option<usize> {
        if !self.contains_index(index) {
            return None;
        }
        Some((index.i * self.shape[1] + index.j) * self.shape[2] + index.k)
    }
}
