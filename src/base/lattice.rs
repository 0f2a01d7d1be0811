use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::species::Position;

/// Basis vectors of a unit cell, and the fractional<->Cartesian maps derived
/// from them.
///
/// `f_to_c` is the column-major basis matrix (column `i` is the i-th basis
/// vector); its inverse is recomputed on demand in [`Lattice::to_fractional`]
/// rather than cached, so a `Lattice` round-trips through `serde` without a
/// stale derived field to keep in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// `basis.column(i)` is the i-th basis vector.
    pub f_to_c: Matrix3<f64>,
}

impl Lattice {
    /// Construct a lattice from row basis vectors, matching how crystal
    /// formats typically list cell vectors.
    pub fn new(row_basis: Matrix3<f64>) -> Self {
        let f_to_c = row_basis.transpose();
        assert!(
            f_to_c.try_inverse().is_some(),
            "lattice basis must be invertible"
        );
        Self { f_to_c }
    }

    /// Construct directly from a column-major basis matrix.
    pub fn from_column_basis(f_to_c: Matrix3<f64>) -> Self {
        assert!(
            f_to_c.try_inverse().is_some(),
            "lattice basis must be invertible"
        );
        Self { f_to_c }
    }

    pub fn to_cartesian(&self, frac: &Position) -> Position {
        self.f_to_c * frac
    }

    pub fn to_fractional(&self, cart: &Position) -> Position {
        let c_to_f = self
            .f_to_c
            .try_inverse()
            .expect("lattice basis must be invertible");
        c_to_f * cart
    }

    pub fn volume(&self) -> f64 {
        self.f_to_c.determinant().abs()
    }
}

impl PartialEq for Lattice {
    fn eq(&self, other: &Self) -> bool {
        self.f_to_c == other.f_to_c
    }
}
