//! Grouping of raw isomorphisms into locations and orientations, and the
//! read-only [`Search`] result type.

use itertools::Itertools;
use log::info;

use crate::base::Crystal;
use crate::isomorphism::ullmann::find_subgraph_isomorphisms;

/// Matcher configuration for [`substructure_search`](crate::substructure_search).
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Require a full graph isomorphism (sizes equal, edges preserved both
    /// ways) rather than a subgraph match.
    pub exact: bool,
}

/// One equivalence class of isomorphisms sharing the same unordered parent
/// vertex set.
#[derive(Debug, Clone)]
pub struct Location {
    /// Canonical (ascending) parent vertex indices occupied by every
    /// orientation at this location.
    pub vertices: Vec<usize>,
    /// Distinct injective maps `query index -> parent index`, in the order
    /// they were discovered, each with `vertices` as its sorted image.
    pub orientations: Vec<Vec<usize>>,
}

/// Read-only result of a subgraph-isomorphism search: the query and parent
/// it was computed from, grouped into locations and orientations.
#[derive(Debug, Clone)]
pub struct Search {
    pub query: Crystal,
    pub parent: Crystal,
    pub locations: Vec<Location>,
}

impl Search {
    /// Run the isomorphism search and group the results.
    pub fn new(query: &Crystal, parent: &Crystal, options: &SearchOptions) -> Self {
        let isomorphisms = find_subgraph_isomorphisms(query, parent, options.exact);
        let locations = group_by_location(isomorphisms);
        info!(
            "substructure_search: {} location(s), {} orientation(s) total",
            locations.len(),
            locations.iter().map(|l| l.orientations.len()).sum::<usize>()
        );
        Self {
            query: query.clone(),
            parent: parent.clone(),
            locations,
        }
    }

    pub fn nb_isomorphisms(&self) -> usize {
        self.locations.iter().map(|l| l.orientations.len()).sum()
    }

    pub fn nb_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn nb_orientations_at_location(&self, k: usize) -> usize {
        self.locations.get(k).map(|l| l.orientations.len()).unwrap_or(0)
    }
}

/// Group isomorphisms by their canonical sorted image, in lexicographic
/// order of that image, preserving per-location discovery order for
/// orientations.
fn group_by_location(isomorphisms: Vec<Vec<usize>>) -> Vec<Location> {
    let mut keyed: Vec<(Vec<usize>, Vec<usize>)> = isomorphisms
        .into_iter()
        .map(|iso| {
            let mut sorted_image = iso.clone();
            sorted_image.sort_unstable();
            (sorted_image, iso)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    keyed
        .into_iter()
        .group_by(|(key, _)| key.clone())
        .into_iter()
        .map(|(vertices, group)| Location {
            vertices,
            orientations: group.map(|(_, iso)| iso).collect(),
        })
        .collect()
}
