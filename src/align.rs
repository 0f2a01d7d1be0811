//! Orthogonal Procrustes alignment: the rotation minimizing `‖R·A − B‖_F`
//! between two correlated, centered 3xN Cartesian point clouds.

use log::warn;
use nalgebra::{Matrix3, Vector3};

/// `R = V·Uᵀ` from the SVD of `A·Bᵀ`.
///
/// `a` and `b` must already be centered at the origin and correlated
/// (`a[i]` corresponds to `b[i]`). No reflection correction is applied: if
/// the optimal alignment happens to be an improper rotation (`det(R) = -1`),
/// this function returns it as-is, matching the documented behavior of the
/// system this crate's alignment engine is modeled on. Callers that need a
/// proper rotation must check `det(R)` themselves.
///
/// Fewer than 3 non-colinear points make the rotation well-defined but not
/// unique; this is logged as a degenerate-alignment condition rather than
/// treated as an error, and the best-effort SVD-derived rotation is still
/// returned.
pub fn procrustes_rotation(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Matrix3<f64> {
    assert_eq!(a.len(), b.len(), "point clouds must be the same length");

    if a.len() < 3 {
        warn!(
            "degenerate alignment: only {} point(s); rotation may not be unique",
            a.len()
        );
    }

    let mut covariance = Matrix3::zeros();
    for (pa, pb) in a.iter().zip(b.iter()) {
        covariance += pa * pb.transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u.expect("SVD configured to compute U");
    let v_t = svd.v_t.expect("SVD configured to compute V^T");
    v_t.transpose() * u.transpose()
}

/// Centroid of a point cloud; `Vector3::zeros()` for an empty slice.
pub fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    if points.is_empty() {
        return Vector3::zeros();
    }
    let sum: Vector3<f64> = points.iter().sum();
    sum / (points.len() as f64)
}

/// Root-mean-square distance between two correlated point clouds.
pub fn rmsd(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> f64 {
    assert_eq!(a.len(), b.len(), "point clouds must be the same length");
    if a.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(pa, pb)| (pa - pb).norm_squared())
        .sum();
    (sum_sq / (a.len() as f64)).sqrt()
}
