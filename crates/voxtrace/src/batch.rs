//! Batch traversal of many segments through one grid.
//!
//! Every segment is traversed independently. Results are index-aligned with
//! the input: entry `n` of the output always belongs to segment `n`, whether
//! the batch ran on one thread or on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use voxtrace_math::{point, Point3};

use crate::error::{Result, TraceError};
use crate::grid::{GridGeometry, VoxelIndex};
use crate::ray::Ray;
use crate::settings::TraceSettings;
use crate::walk::{trace_ray, TraversalResult};

/// Per-segment voxel crossings of a batch, as two ragged, index-aligned
/// sequences.
///
/// Segments that miss the grid have empty entries; every input segment has
/// an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    voxel_indices: Vec<Vec<VoxelIndex>>,
    lengths: Vec<Vec<f64>>,
}

impl BatchResult {
    /// Number of segments in the batch.
    pub fn len(&self) -> usize {
        self.voxel_indices.len()
    }

    /// True for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.voxel_indices.is_empty()
    }

    /// Voxels crossed by each segment, in traversal order.
    pub fn voxel_indices(&self) -> &[Vec<VoxelIndex>] {
        &self.voxel_indices
    }

    /// Length inside each crossed voxel, aligned with [`Self::voxel_indices`].
    pub fn lengths(&self) -> &[Vec<f64>] {
        &self.lengths
    }

    /// Crossings of segment `ray`, or `None` if out of range.
    pub fn ray(&self, ray: usize) -> Option<(&[VoxelIndex], &[f64])> {
        Some((
            self.voxel_indices.get(ray)?.as_slice(),
            self.lengths.get(ray)?.as_slice(),
        ))
    }

    /// Iterate over `(voxels, lengths)` per segment in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&[VoxelIndex], &[f64])> + '_ {
        self.voxel_indices
            .iter()
            .zip(&self.lengths)
            .map(|(v, l)| (v.as_slice(), l.as_slice()))
    }

    /// Number of segments that crossed at least one voxel.
    pub fn hit_count(&self) -> usize {
        self.voxel_indices.iter().filter(|v| !v.is_empty()).count()
    }

    /// Sum of all lengths over all segments.
    pub fn total_length(&self) -> f64 {
        self.lengths.iter().flatten().sum()
    }

    /// Sum the lengths falling in each voxel into a dense buffer laid out
    /// as [`GridGeometry::linear_index`].
    pub fn path_length_map(&self, grid: &GridGeometry) -> Vec<f64> {
        let mut map = vec![0.0; grid.voxel_count()];
        for (voxels, lengths) in self.iter() {
            for (&index, &length) in voxels.iter().zip(lengths) {
                if let Some(offset) = grid.linear_index(index) {
                    map[offset] += length;
                }
            }
        }
        map
    }

    /// Split into the two ragged sequences.
    pub fn into_parts(self) -> (Vec<Vec<VoxelIndex>>, Vec<Vec<f64>>) {
        (self.voxel_indices, self.lengths)
    }
}

impl FromIterator<TraversalResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = TraversalResult>>(iter: I) -> Self {
        let (voxel_indices, lengths) = iter.into_iter().map(TraversalResult::into_parts).unzip();
        Self {
            voxel_indices,
            lengths,
        }
    }
}

/// Traverse each `sources[n] -> destinations[n]` segment through `grid`
/// with default settings.
///
/// Fails with [`TraceError::ShapeMismatch`] before traversing anything if
/// the two slices differ in length.
///
/// # Example
///
/// ```
/// use voxtrace::{traverse_batch, GridGeometry, Point3, VoxelIndex};
///
/// let grid = GridGeometry::from_dims([3, 3, 5]).unwrap();
/// let sources = [Point3::new(0.5, 0.5, -2.0)];
/// let destinations = [Point3::new(0.5, 0.5, 7.0)];
///
/// let result = traverse_batch(&sources, &destinations, &grid).unwrap();
/// let (voxels, lengths) = result.ray(0).unwrap();
/// assert_eq!(voxels.len(), 5);
/// assert_eq!(voxels[4], VoxelIndex::new(0, 0, 4));
/// assert!((lengths.iter().sum::<f64>() - 5.0).abs() < 1e-9);
/// ```
pub fn traverse_batch(
    sources: &[Point3],
    destinations: &[Point3],
    grid: &GridGeometry,
) -> Result<BatchResult> {
    traverse_batch_with(sources, destinations, grid, &TraceSettings::default())
}

/// Traverse a batch with explicit settings.
pub fn traverse_batch_with(
    sources: &[Point3],
    destinations: &[Point3],
    grid: &GridGeometry,
    settings: &TraceSettings,
) -> Result<BatchResult> {
    settings.validate()?;
    check_batch_shape(sources.len(), destinations.len())?;

    let rays = sources.len();
    let parallel = settings.runs_parallel(rays);
    let tolerance = settings.tolerance();

    debug!(
        rays,
        shape = ?grid.shape(),
        parallel,
        "Starting batch traversal"
    );

    let trace_one =
        |(s, d): (&Point3, &Point3)| trace_ray(&Ray::new(*s, *d), grid, tolerance);

    let result: BatchResult = if parallel {
        sources
            .par_iter()
            .zip(destinations.par_iter())
            .map(trace_one)
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    } else {
        sources.iter().zip(destinations).map(trace_one).collect()
    };

    debug!(rays, hits = result.hit_count(), "Batch traversal complete");
    Ok(result)
}

/// Array-oriented entry point: raw coordinate triples and a signed grid
/// shape, validated before any segment is traversed.
///
/// Grid problems are reported as [`TraceError::InvalidGrid`], length
/// mismatches as [`TraceError::ShapeMismatch`].
pub fn raytrace(
    sources: &[[f64; 3]],
    destinations: &[[f64; 3]],
    shape: [i64; 3],
    origin: [f64; 3],
    spacing: [f64; 3],
) -> Result<BatchResult> {
    let grid = GridGeometry::from_raw(origin, spacing, shape)?;
    check_batch_shape(sources.len(), destinations.len())?;

    let sources: Vec<Point3> = sources.iter().copied().map(point).collect();
    let destinations: Vec<Point3> = destinations.iter().copied().map(point).collect();
    traverse_batch(&sources, &destinations, &grid)
}

fn check_batch_shape(sources: usize, destinations: usize) -> Result<()> {
    if sources != destinations {
        return Err(TraceError::ShapeMismatch {
            sources,
            destinations,
        });
    }
    Ok(())
}
