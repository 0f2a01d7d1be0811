mod crystal;
mod error;
mod graph;
mod lattice;
mod species;

pub use crystal::Crystal;
pub use error::XtalError;
pub use graph::{Bond, BondGraph};
pub use lattice::Lattice;
pub use species::{Atom, Position, Species};

pub(crate) use graph::{degree, has_bond, neighbors};
