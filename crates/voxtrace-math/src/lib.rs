#![warn(missing_docs)]

//! Math types for voxtrace.
//!
//! Thin wrappers around nalgebra providing the point and vector types used
//! by the grid traversal kernel, plus the tolerance that makes
//! boundary decisions reproducible.

use nalgebra::Vector3;

/// A point in 3D world space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D world space.
pub type Vec3 = Vector3<f64>;

/// Number of spatial axes.
pub const AXES: usize = 3;

/// Build a point from a coordinate triple.
#[inline]
pub fn point(coords: [f64; 3]) -> Point3 {
    Point3::new(coords[0], coords[1], coords[2])
}

/// Build a vector from a component triple.
#[inline]
pub fn vector(components: [f64; 3]) -> Vec3 {
    Vec3::new(components[0], components[1], components[2])
}

/// True if every coordinate of `p` is finite.
#[inline]
pub fn is_finite_point(p: &Point3) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

/// Tolerance for comparing boundary crossings during traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Fraction of a voxel crossing interval under which two boundary
    /// crossings are treated as simultaneous.
    pub tie: f64,
}

impl Tolerance {
    /// Default traversal tolerance (ties within 1e-9 of a crossing interval).
    pub const DEFAULT: Self = Self { tie: 1e-9 };

    /// Check whether crossing `t` ties with the earliest crossing `t_min`,
    /// given the parametric spacing `t_delta` between crossings on t's axis.
    ///
    /// The earliest crossing always ties with itself.
    #[inline]
    pub fn crossings_tied(&self, t: f64, t_min: f64, t_delta: f64) -> bool {
        t.is_finite() && (t <= t_min || t - t_min <= self.tie * t_delta)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_from_triple() {
        let p = point([1.0, 2.0, 3.0]);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.z - 3.0).abs() < 1e-12);
        assert!((p[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_from_triple() {
        let v = vector([3.0, 4.0, 0.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_finite_point() {
        assert!(is_finite_point(&point([0.0, -1.0, 1e300])));
        assert!(!is_finite_point(&point([f64::NAN, 0.0, 0.0])));
        assert!(!is_finite_point(&point([0.0, f64::INFINITY, 0.0])));
    }

    #[test]
    fn test_crossings_tied() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.crossings_tied(0.5, 0.5, 0.1));
        assert!(tol.crossings_tied(0.5 + 1e-12, 0.5, 0.1));
        assert!(!tol.crossings_tied(0.5 + 1e-6, 0.5, 0.1));
        // Infinite crossings never tie
        assert!(!tol.crossings_tied(f64::INFINITY, 0.5, f64::INFINITY));
        // Zero tolerance still matches the minimum itself
        let exact = Tolerance { tie: 0.0 };
        assert!(exact.crossings_tied(0.5, 0.5, f64::INFINITY));
        assert!(!exact.crossings_tied(0.5 + 1e-15, 0.5, 0.1));
    }
}
