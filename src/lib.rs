#[allow(unused_imports)]
#[macro_use]
extern crate approx;

pub mod align;
pub mod base;
pub mod geometry;
pub mod isomorphism;
mod replace;
mod scheme;

use rand::Rng;

pub use base::{Atom, Bond, BondGraph, Crystal, Lattice, Position, Species, XtalError};
pub use isomorphism::{Location, Search, SearchOptions};
pub use replace::substructure_replace;
pub use scheme::{OrientationChoice, ReplaceOptions};

/// Locate every occurrence of `query` as a subgraph of `parent`, grouped
/// into locations and orientations.
pub fn substructure_search(query: &Crystal, parent: &Crystal, options: &SearchOptions) -> Search {
    Search::new(query, parent, options)
}

/// Convenience sugar equivalent to [`substructure_search`] followed by
/// [`substructure_replace`].
pub fn replace(
    parent: &Crystal,
    query: &Crystal,
    replacement: &Crystal,
    search_options: &SearchOptions,
    replace_options: &ReplaceOptions,
    rng: &mut impl Rng,
) -> Result<Crystal, XtalError> {
    let search = substructure_search(query, parent, search_options);
    substructure_replace(&search, replacement, replace_options, rng)
}

/// Idiomatic Rust stand-in for the source language's infix membership
/// overload (`query in parent`): a thin wrapper over
/// [`substructure_search`] that only asks "does any match exist?".
pub trait CrystalExt {
    fn contains_substructure(&self, query: &Crystal, options: &SearchOptions) -> bool;
}

impl CrystalExt for Crystal {
    fn contains_substructure(&self, query: &Crystal, options: &SearchOptions) -> bool {
        substructure_search(query, self, options).nb_isomorphisms() > 0
    }
}
