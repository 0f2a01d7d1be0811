//! Periodic boundary condition utilities: fractional displacement
//! corrections, wrap-to-cell, and PBC-aware distance.
//!
//! Grounded on the minimum-image idiom used across the crystal-structure
//! corpus: wrap with `rem_euclid` (correct for negative inputs, unlike `%`),
//! and find the nearest periodic image by rounding the fractional
//! displacement to the nearest integer per axis.

use nalgebra::Matrix3;

use crate::base::{Position, XtalError};

/// Wrap a single fractional coordinate into `[0, 1)`.
#[inline]
pub fn wrap_frac_coord(coord: f64) -> f64 {
    let wrapped = coord.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap a fractional position into `[0, 1)^3`. Idempotent: wrapping an
/// already-wrapped position is a no-op.
pub fn wrap(frac: &Position) -> Position {
    Position::new(
        wrap_frac_coord(frac.x),
        wrap_frac_coord(frac.y),
        wrap_frac_coord(frac.z),
    )
}

/// Nearest-image correction of a fractional displacement: subtract the
/// nearest integer from each axis so the result lies in `[-0.5, 0.5)`.
///
/// Precondition: `|d_axis| < 2` for every axis, matching the assumption that
/// the two points being compared lie within the same or an adjacent unit
/// cell. Violating it returns [`XtalError::GeometricPrecondition`] rather
/// than silently producing a nonsensical displacement.
pub fn nearest_image(displacement: &Position) -> Result<Position, XtalError> {
    for (axis, value) in displacement.iter().enumerate() {
        if value.abs() >= 2.0 {
            return Err(XtalError::GeometricPrecondition(format!(
                "axis {axis} displacement {value} is outside [-2, 2]"
            )));
        }
    }
    Ok(Position::new(
        displacement.x - displacement.x.round(),
        displacement.y - displacement.y.round(),
        displacement.z - displacement.z.round(),
    ))
}

/// PBC-adjust an ordered list of fractional positions so they form a locally
/// contiguous point cloud: the first position anchors the set, and every
/// other position is re-expressed as the anchor plus its nearest-image
/// displacement from the anchor.
///
/// This is what makes a match that straddles a cell face safe to feed into
/// Procrustes alignment: without it, atoms on opposite sides of a periodic
/// boundary would appear far apart in fractional space even though they are
/// geometrically close.
pub fn adjust_for_pbc(positions: &[Position]) -> Result<Vec<Position>, XtalError> {
    let Some(anchor) = positions.first().copied() else {
        return Ok(Vec::new());
    };
    let mut adjusted = Vec::with_capacity(positions.len());
    adjusted.push(anchor);
    for pos in &positions[1..] {
        let displacement = nearest_image(&(pos - anchor))?;
        adjusted.push(anchor + displacement);
    }
    Ok(adjusted)
}

/// Compute the in-cell and PBC-nearest-image Cartesian distance between two
/// fractional positions under the given lattice basis. Returns
/// `(in_cell_distance, pbc_distance)`.
pub fn bond_distances(
    f_to_c: &Matrix3<f64>,
    a: &Position,
    b: &Position,
) -> Result<(f64, f64), XtalError> {
    let in_cell = (f_to_c * (b - a)).norm();
    let pbc_disp = nearest_image(&(b - a))?;
    let pbc = (f_to_c * pbc_disp).norm();
    Ok((in_cell, pbc))
}
