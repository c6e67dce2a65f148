//! Traversal properties checked over deterministic ray fans.

use std::collections::HashSet;

use approx::assert_relative_eq;
use voxtrace::{
    raytrace, trace_ray, traverse_batch, GridGeometry, Point3, Ray, TraceError, TraceSettings,
    Tolerance, Vec3, VoxelIndex,
};

fn skewed_grid() -> GridGeometry {
    GridGeometry::new(
        Point3::new(-1.0, 2.0, 0.5),
        Vec3::new(0.5, 1.25, 0.8),
        [7, 5, 9],
    )
    .unwrap()
}

/// Segments through (and around) the grid center in a spread of directions.
fn ray_fan(grid: &GridGeometry, count: usize) -> Vec<Ray> {
    let bb = grid.bounding_box();
    let center = Point3::from((bb.min.coords + bb.max.coords) * 0.5);
    let reach = bb.extent().norm();
    (0..count)
        .map(|n| {
            let n = n as f64;
            let theta = 0.123_4 + n * 0.785_3;
            let phi = 0.2 + n * 0.371_9;
            let dir = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
            let offset = Vec3::new(
                (n * 1.37).sin() * 0.4 * bb.extent().x,
                (n * 0.91).cos() * 0.4 * bb.extent().y,
                (n * 2.03).sin() * 0.4 * bb.extent().z,
            );
            // Vary where segments start and stop: some begin or end inside
            let near = 0.2 + 0.9 * ((n * 0.61).sin().abs());
            let far = 0.3 + 0.8 * ((n * 0.47).cos().abs());
            Ray::new(
                center + offset - dir * reach * near,
                center + offset + dir * reach * far,
            )
        })
        .collect()
}

/// Relative comparison of accumulated lengths, scaled to at least 1.
fn lengths_equal(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-9 * scale
}

fn trace(ray: &Ray, grid: &GridGeometry) -> voxtrace::TraversalResult {
    trace_ray(ray, grid, Tolerance::DEFAULT)
}

#[test]
fn test_misses_are_empty() {
    let grid = skewed_grid();
    let bb = grid.bounding_box();
    let rays = [
        // Entirely below the grid on the first axis
        Ray::new(
            Point3::new(bb.min.x - 2.0, 0.0, 0.0),
            Point3::new(bb.min.x - 1.0, 10.0, 10.0),
        ),
        // Heading away from the grid
        Ray::new(
            Point3::new(bb.max.x + 1.0, 3.0, 1.0),
            Point3::new(bb.max.x + 5.0, 3.0, 1.0),
        ),
        // Passing beside it
        Ray::new(
            Point3::new(-50.0, bb.max.y + 0.5, 1.0),
            Point3::new(50.0, bb.max.y + 0.5, 1.0),
        ),
    ];
    let sources: Vec<Point3> = rays.iter().map(|r| r.source).collect();
    let destinations: Vec<Point3> = rays.iter().map(|r| r.destination).collect();
    let result = traverse_batch(&sources, &destinations, &grid).unwrap();
    assert_eq!(result.len(), rays.len());
    for (voxels, lengths) in result.iter() {
        assert!(voxels.is_empty());
        assert!(lengths.is_empty());
    }
}

#[test]
fn test_length_conservation() {
    let grid = skewed_grid();
    let mut hits = 0;
    for ray in ray_fan(&grid, 400) {
        let result = trace(&ray, &grid);
        let clipped = ray.clipped_length(&grid);
        assert!(
            lengths_equal(result.total_length(), clipped),
            "sum {} != clipped {} for {:?}",
            result.total_length(),
            clipped,
            ray
        );
        assert!(result.total_length() <= ray.length() * (1.0 + 1e-12));
        if !result.is_empty() {
            hits += 1;
        }
    }
    assert!(hits > 100);
}

#[test]
fn test_indices_valid_and_unique() {
    let grid = skewed_grid();
    for ray in ray_fan(&grid, 400) {
        let result = trace(&ray, &grid);
        let mut seen = HashSet::new();
        for crossing in result.iter() {
            assert!(grid.contains_index(crossing.index));
            assert!(crossing.length > 0.0);
            assert!(seen.insert(crossing.index), "{:?} revisited", crossing.index);
        }
    }
}

#[test]
fn test_consecutive_voxels_are_face_or_tie_neighbors() {
    let grid = skewed_grid();
    for ray in ray_fan(&grid, 400) {
        let result = trace(&ray, &grid);
        for pair in result.crossings().windows(2) {
            let (a, b) = (pair[0].index.to_array(), pair[1].index.to_array());
            let moved: usize = (0..3).map(|axis| a[axis].abs_diff(b[axis])).sum();
            assert!((1..=3).contains(&moved));
            assert!((0..3).all(|axis| a[axis].abs_diff(b[axis]) <= 1));
        }
    }
}

#[test]
fn test_direction_symmetry() {
    let grid = skewed_grid();
    for ray in ray_fan(&grid, 400) {
        let forward = trace(&ray, &grid);
        let backward = trace(&ray.reversed(), &grid);
        assert_eq!(forward.len(), backward.len(), "{:?}", ray);
        for (f, b) in forward.iter().zip(backward.iter().rev()) {
            assert_eq!(f.index, b.index);
            assert_relative_eq!(f.length, b.length, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}

#[test]
fn test_single_voxel_containment() {
    let grid = skewed_grid();
    let voxel = grid.voxel_bounds(VoxelIndex::new(3, 2, 4));
    let extent = voxel.extent();
    let source = voxel.min + extent.component_mul(&Vec3::new(0.1, 0.2, 0.3));
    let destination = voxel.min + extent.component_mul(&Vec3::new(0.9, 0.6, 0.7));
    let ray = Ray::new(source, destination);

    let result = trace(&ray, &grid);
    assert_eq!(result.len(), 1);
    assert_eq!(result.crossings()[0].index, VoxelIndex::new(3, 2, 4));
    assert_relative_eq!(result.crossings()[0].length, ray.length(), epsilon = 1e-12);
}

#[test]
fn test_deterministic() {
    let grid = skewed_grid();
    let rays = ray_fan(&grid, 300);
    let sources: Vec<Point3> = rays.iter().map(|r| r.source).collect();
    let destinations: Vec<Point3> = rays.iter().map(|r| r.destination).collect();

    let first = traverse_batch(&sources, &destinations, &grid).unwrap();
    let second = traverse_batch(&sources, &destinations, &grid).unwrap();
    let sequential = voxtrace::traverse_batch_with(
        &sources,
        &destinations,
        &grid,
        &TraceSettings::sequential(),
    )
    .unwrap();

    for ((a, b), c) in first.iter().zip(second.iter()).zip(sequential.iter()) {
        assert_eq!(a.0, b.0);
        assert_eq!(a.0, c.0);
        let bits = |l: &[f64]| l.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(a.1), bits(b.1));
        assert_eq!(bits(a.1), bits(c.1));
    }
}

#[test]
fn test_column_scenario() {
    let result = raytrace(
        &[[0.5, 0.5, -2.0]],
        &[[0.5, 0.5, 7.0]],
        [3, 3, 5],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
    )
    .unwrap();
    let (voxels, lengths) = result.ray(0).unwrap();
    assert_eq!(
        voxels.iter().map(|v| v.to_array()).collect::<Vec<_>>(),
        vec![[0, 0, 0], [0, 0, 1], [0, 0, 2], [0, 0, 3], [0, 0, 4]]
    );
    for &l in lengths {
        assert_relative_eq!(l, 1.0, epsilon = 1e-12);
    }
    let ray = Ray::new(Point3::new(0.5, 0.5, -2.0), Point3::new(0.5, 0.5, 7.0));
    assert_relative_eq!(ray.length(), 9.0, epsilon = 1e-12);
    assert_relative_eq!(lengths.iter().sum::<f64>(), 5.0, epsilon = 1e-12);
}

#[test]
fn test_far_miss_scenario() {
    let result = raytrace(
        &[[100.0, 100.0, 100.0]],
        &[[200.0, 200.0, 200.0]],
        [3, 3, 5],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
    )
    .unwrap();
    assert_eq!(result.len(), 1);
    assert!(result.voxel_indices()[0].is_empty());
    assert!(result.lengths()[0].is_empty());
}

#[test]
fn test_shape_mismatch_scenario() {
    let err = raytrace(
        &[[0.5, 0.5, -2.0], [1.5, 0.5, -2.0], [2.5, 0.5, -2.0]],
        &[[0.5, 0.5, 7.0], [1.5, 0.5, 7.0]],
        [3, 3, 5],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TraceError::ShapeMismatch {
            sources: 3,
            destinations: 2
        }
    ));
}

#[test]
fn test_vertical_sweep() {
    // A regular sweep of vertical segments, one per column of an 11 x 11 x 5 grid
    let grid = GridGeometry::from_dims([11, 11, 5]).unwrap();
    let mut sources = Vec::new();
    let mut destinations = Vec::new();
    for j in 0..11 {
        for i in 0..11 {
            let (x, y) = (i as f64 + 0.5, j as f64 + 0.5);
            sources.push(Point3::new(x, y, -10.0));
            destinations.push(Point3::new(x, y, 10.0));
        }
    }
    let result = traverse_batch(&sources, &destinations, &grid).unwrap();
    assert_eq!(result.len(), 121);
    assert_eq!(result.hit_count(), 121);
    for (n, (voxels, lengths)) in result.iter().enumerate() {
        let (i, j) = (n % 11, n / 11);
        let expected: Vec<VoxelIndex> = (0..5).map(|k| VoxelIndex::new(i, j, k)).collect();
        assert_eq!(voxels, expected.as_slice());
        for &l in lengths {
            assert_relative_eq!(l, 1.0, epsilon = 1e-12);
        }
    }
    let map = result.path_length_map(&grid);
    for value in map {
        assert_relative_eq!(value, 1.0, epsilon = 1e-12);
    }
}
