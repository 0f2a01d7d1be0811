use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Per-edge properties of a bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    /// PBC-aware Euclidean distance between the bonded atoms.
    pub distance: f64,
    /// True iff the nearest-image distance differs from the in-cell distance,
    /// i.e. this bond's shortest path crosses a unit cell boundary.
    pub cross_boundary: bool,
}

/// An undirected graph over atom indices `0..N`, vertices unlabeled here
/// (species labels live on [`crate::base::Atom`] and are looked up by index)
/// and edges carrying [`Bond`] properties.
///
/// Vertex `i` always corresponds to [`petgraph::stable_graph::NodeIndex`] of
/// value `i`: bond graphs are rebuilt with contiguous indices every time a
/// crystal is sliced or concatenated, so callers can index by plain `usize`.
pub type BondGraph = StableUnGraph<(), Bond>;

pub fn empty_graph(num_atoms: usize) -> BondGraph {
    let mut graph = BondGraph::with_capacity(num_atoms, num_atoms * 2);
    for _ in 0..num_atoms {
        graph.add_node(());
    }
    graph
}

fn idx(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

/// Add an edge `(u, v)` with the given bond properties. No-op (keeps the
/// existing edge weight) if the edge already exists, preserving the
/// simple-graph invariant (no multi-edges).
pub fn add_bond(graph: &mut BondGraph, u: usize, v: usize, bond: Bond) {
    if u == v {
        return;
    }
    if graph.find_edge(idx(u), idx(v)).is_none() {
        graph.add_edge(idx(u), idx(v), bond);
    }
}

pub fn has_bond(graph: &BondGraph, u: usize, v: usize) -> bool {
    graph.find_edge(idx(u), idx(v)).is_some()
}

pub fn degree(graph: &BondGraph, v: usize) -> usize {
    graph.neighbors(idx(v)).count()
}

pub fn neighbors(graph: &BondGraph, v: usize) -> impl Iterator<Item = usize> + '_ {
    graph.neighbors(idx(v)).map(|n| n.index())
}

/// Iterate all `(u, v, bond)` edges with `u < v`.
pub fn edges(graph: &BondGraph) -> impl Iterator<Item = (usize, usize, &Bond)> {
    graph.edge_references().map(|e| {
        let (u, v) = (e.source().index(), e.target().index());
        let (u, v) = if u <= v { (u, v) } else { (v, u) };
        (u, v, e.weight())
    })
}

/// Induce the subgraph over `indices` (in the given order), returning a
/// fresh [`BondGraph`] with contiguous indices `0..indices.len()` where new
/// vertex `k` corresponds to `indices[k]` in `graph`.
pub fn induce(graph: &BondGraph, indices: &[usize]) -> BondGraph {
    let mut position_of = vec![None; graph.node_bound()];
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        position_of[old_idx] = Some(new_idx);
    }

    let mut sub = empty_graph(indices.len());
    for (new_u, &old_u) in indices.iter().enumerate() {
        for old_v in neighbors(graph, old_u) {
            if let Some(new_v) = position_of.get(old_v).copied().flatten() {
                if new_u < new_v {
                    let bond = *graph
                        .edge_weight(graph.find_edge(idx(old_u), idx(old_v)).unwrap())
                        .unwrap();
                    add_bond(&mut sub, new_u, new_v, bond);
                }
            }
        }
    }
    sub
}
