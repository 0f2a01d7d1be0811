//! Ullmann's subgraph-isomorphism backtracking algorithm, specialized so
//! vertex labels are atomic species and initial pruning uses vertex degree.
//!
//! Grounded on the classical formulation (build a candidate compatibility
//! matrix, refine it by the neighborhood condition, backtrack over
//! tentative assignments), adapted to the crystal model: vertices are atom
//! indices, labels are [`crate::base::Species`], and adjacency comes from
//! each crystal's [`crate::base::BondGraph`].

use std::collections::BTreeMap;

use log::trace;

use crate::base::{degree, neighbors, Crystal};

/// `M[i][p]` is true iff query vertex `i` may still map to parent vertex `p`.
type CompatMatrix = Vec<Vec<bool>>;

/// Enumerate all injective vertex maps `iso: query index -> parent index`
/// that preserve species labels (tag-insensitive) and adjacency.
///
/// In `exact` mode the match must also be a graph isomorphism: `|Vq| ==
/// |Vp|`, and no parent-side edge may exist among the mapped vertices
/// unless it is also a query edge.
///
/// Returns the empty vector immediately, without attempting any
/// backtracking, when the query has more vertices than the parent or when
/// the query's species multiset is not a sub-multiset of the parent's.
pub fn find_subgraph_isomorphisms(query: &Crystal, parent: &Crystal, exact: bool) -> Vec<Vec<usize>> {
    let nq = query.num_atoms();
    let np = parent.num_atoms();

    if nq == 0 {
        return Vec::new();
    }
    if nq > np {
        return Vec::new();
    }
    if exact && nq != np {
        return Vec::new();
    }
    if !species_multiset_is_subset(query, parent) {
        return Vec::new();
    }

    let deg_q: Vec<usize> = (0..nq).map(|i| degree(&query.bonds, i)).collect();
    let deg_p: Vec<usize> = (0..np).map(|p| degree(&parent.bonds, p)).collect();

    let initial: CompatMatrix = (0..nq)
        .map(|i| {
            (0..np)
                .map(|p| {
                    query.atoms[i].species == parent.atoms[p].species
                        && if exact {
                            deg_q[i] == deg_p[p]
                        } else {
                            deg_q[i] <= deg_p[p]
                        }
                })
                .collect()
        })
        .collect();

    let mut results = Vec::new();
    let mut used = vec![false; np];
    let mut assignment = vec![0usize; nq];
    let mut matrix = initial;
    if refine(&mut matrix, query, parent) {
        backtrack(
            0,
            &mut matrix,
            &mut used,
            &mut assignment,
            query,
            parent,
            exact,
            &mut results,
        );
    }
    trace!(
        "ullmann: {} isomorphism(s) found ({} query atoms into {} parent atoms)",
        results.len(),
        nq,
        np
    );
    results
}

fn species_multiset_is_subset(query: &Crystal, parent: &Crystal) -> bool {
    let mut parent_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in &parent.atoms {
        *parent_counts.entry(atom.species.symbol()).or_insert(0) += 1;
    }
    let mut query_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in &query.atoms {
        *query_counts.entry(atom.species.symbol()).or_insert(0) += 1;
    }
    query_counts
        .into_iter()
        .all(|(symbol, count)| parent_counts.get(symbol).copied().unwrap_or(0) >= count)
}

/// Propagate Ullmann's neighborhood condition to a fixpoint: for every
/// surviving candidate `(i, p)`, every neighbor `j` of `i` in the query must
/// have some surviving candidate `q` that neighbors `p` in the parent.
/// Returns `false` if any row becomes empty (a dead end).
fn refine(matrix: &mut CompatMatrix, query: &Crystal, parent: &Crystal) -> bool {
    let nq = matrix.len();
    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..nq {
            let query_neighbors: Vec<usize> = neighbors(&query.bonds, i).collect();
            for p in 0..matrix[i].len() {
                if !matrix[i][p] {
                    continue;
                }
                let parent_neighbors: Vec<usize> = neighbors(&parent.bonds, p).collect();
                for &j in &query_neighbors {
                    let has_support = parent_neighbors.iter().any(|&q| matrix[j][q]);
                    if !has_support {
                        matrix[i][p] = false;
                        changed = true;
                        break;
                    }
                }
            }
            if matrix[i].iter().all(|&ok| !ok) {
                return false;
            }
        }
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn backtrack(
    depth: usize,
    matrix: &mut CompatMatrix,
    used: &mut [bool],
    assignment: &mut [usize],
    query: &Crystal,
    parent: &Crystal,
    exact: bool,
    results: &mut Vec<Vec<usize>>,
) {
    let nq = matrix.len();
    if depth == nq {
        if !exact || is_graph_isomorphism(assignment, query, parent) {
            results.push(assignment.to_vec());
        }
        return;
    }

    let candidates: Vec<usize> = (0..matrix[depth].len())
        .filter(|&p| matrix[depth][p] && !used[p])
        .collect();

    for p in candidates {
        let mut tentative = matrix.clone();
        tentative[depth] = vec![false; tentative[depth].len()];
        tentative[depth][p] = true;

        used[p] = true;
        assignment[depth] = p;

        if refine(&mut tentative, query, parent) {
            backtrack(
                depth + 1,
                &mut tentative,
                used,
                assignment,
                query,
                parent,
                exact,
                results,
            );
        }

        used[p] = false;
    }
}

/// In exact mode, reject assignments where the parent has an edge among the
/// mapped vertices that has no corresponding query edge.
fn is_graph_isomorphism(assignment: &[usize], query: &Crystal, parent: &Crystal) -> bool {
    let nq = assignment.len();
    for i in 0..nq {
        for j in (i + 1)..nq {
            let query_edge = crate::base::has_bond(&query.bonds, i, j);
            let parent_edge = crate::base::has_bond(&parent.bonds, assignment[i], assignment[j]);
            if query_edge != parent_edge {
                return false;
            }
        }
    }
    true
}
