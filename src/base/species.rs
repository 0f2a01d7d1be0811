use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Fractional coordinates of an atom within its unit cell.
pub type Position = Vector3<f64>;

/// An atomic species symbol (e.g. `"C"`, `"H"`, `"Fe"`).
///
/// Equality is symbol equality only; whether an atom is an R-group
/// attachment point is tracked separately on [`Atom::masked`], not baked
/// into the symbol the way the source loader's sentinel-tag scheme does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Species(pub String);

impl Species {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for Species {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// A single site in a [`crate::base::Crystal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub species: Species,
    pub frac_coords: Position,
    /// True iff this atom is an R-group attachment point: excluded from the
    /// unmasked-query portion of a replacement match, rather than deleted.
    pub masked: bool,
}

impl Atom {
    pub fn new(species: impl Into<Species>, frac_coords: Position) -> Self {
        Self {
            species: species.into(),
            frac_coords,
            masked: false,
        }
    }

    pub fn masked(species: impl Into<Species>, frac_coords: Position) -> Self {
        Self {
            species: species.into(),
            frac_coords,
            masked: true,
        }
    }

    pub fn with_masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }
}
