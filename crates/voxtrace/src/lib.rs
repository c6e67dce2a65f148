#![warn(missing_docs)]

//! Exact traversal of line segments through a regular voxel grid.
//!
//! For each segment (a source and a destination point) this crate reports
//! the voxels it crosses, in order from source to destination, and the
//! length of segment inside each one. Path-integral imaging (tomography
//! and similar) accumulates per-voxel quantities from these lengths.
//!
//! # Architecture
//!
//! - [`GridGeometry`] - grid origin, spacing and shape; coordinate transforms
//! - [`Ray`] - a segment, with slab clipping against the grid bounds
//! - [`VoxelWalker`] - incremental voxel walk over a clipped segment
//! - [`traverse_batch`] - many segments, index-aligned ragged results
//!
//! # Example
//!
//! ```
//! use voxtrace::{traverse_batch, GridGeometry, Point3};
//!
//! let grid = GridGeometry::from_dims([3, 3, 5]).unwrap();
//! let sources = [Point3::new(0.5, 0.5, -2.0), Point3::new(100.0, 100.0, 100.0)];
//! let destinations = [Point3::new(0.5, 0.5, 7.0), Point3::new(200.0, 200.0, 200.0)];
//!
//! let result = traverse_batch(&sources, &destinations, &grid).unwrap();
//! assert_eq!(result.voxel_indices()[0].len(), 5);
//! assert!(result.voxel_indices()[1].is_empty());
//! ```

pub mod batch;
pub mod error;
pub mod grid;
pub mod ray;
pub mod settings;
pub mod walk;

pub use batch::{raytrace, traverse_batch, traverse_batch_with, BatchResult};
pub use error::{Result, TraceError};
pub use grid::{Aabb3, GridGeometry, VoxelIndex};
pub use ray::{ClipInterval, Ray};
pub use settings::TraceSettings;
pub use walk::{trace_ray, TraversalResult, VoxelCrossing, VoxelWalker};

pub use voxtrace_math::{Point3, Tolerance, Vec3};
