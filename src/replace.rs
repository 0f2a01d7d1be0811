//! The geometric replacement engine: for each selected (location,
//! orientation) configuration, align a copy of the replacement onto the
//! matched parent subset, rewire bonds, and assemble the final crystal.

use std::collections::{BTreeSet, HashMap};

use log::{info, warn};
use nalgebra::Vector3;
use rand::Rng;

use crate::align::{centroid, procrustes_rotation, rmsd};
use crate::base::{self, Crystal, XtalError};
use crate::geometry;
use crate::isomorphism::{find_subgraph_isomorphisms, Search};
use crate::scheme::{resolve_scheme, OrientationChoice, ReplaceOptions};

/// A single accepted replacement at one location: either a transformed
/// replacement fragment to insert, or `None` for a null mapping (the match
/// is deleted but nothing is inserted in its place).
struct ReplacementFragment {
    xrm: Option<Crystal>,
    /// Parent vertex indices occupied by this match; always present, since
    /// the unmasked ones are deleted whether or not a fragment is inserted.
    /// A masked query index's parent atom is the attachment anchor and is
    /// retained, never added to the deletion set.
    iso: Vec<usize>,
    /// query index -> replacement index, for unmasked query indices that
    /// have a counterpart in the replacement. `None` for masked query
    /// indices and for unmasked ones too small for the replacement to cover.
    u2r: Vec<Option<usize>>,
    /// Indexed by `xrm`'s atom indices: false for the replacement's own
    /// masked attachment atom(s), which are never inserted.
    keep_replacement: Vec<bool>,
    /// Indexed by `xrm`'s atom indices: for a masked (dropped) replacement
    /// atom, the parent atom its bonds reroute to, if one was found.
    anchor_for_masked: Vec<Option<usize>>,
}

/// Substitute the query matches chosen by `options` with aligned copies of
/// `replacement`, returning a freshly assembled crystal.
///
/// If `search` has no locations at all, this logs the non-fatal `NoMatch`
/// condition and returns a clone of the parent, renamed per `options.name`.
pub fn substructure_replace(
    search: &Search,
    replacement: &Crystal,
    options: &ReplaceOptions,
    rng: &mut impl Rng,
) -> Result<Crystal, XtalError> {
    if search.nb_locations() == 0 {
        warn!("substructure_replace: query has no matches in the parent; returning parent unchanged");
        let mut unchanged = search.parent.clone();
        unchanged.name = options.name.clone();
        return Ok(unchanged);
    }

    let configs = resolve_scheme(search, options, rng)?;

    let mut fragments = Vec::with_capacity(configs.len());
    for (loc, ori) in &configs {
        fragments.push(build_fragment(search, replacement, *loc, *ori)?);
    }

    let result = assemble(search, &fragments, options)?;
    info!(
        "substructure_replace: {} configuration(s) applied, {} atom(s) in the result",
        configs.len(),
        result.num_atoms()
    );
    Ok(result)
}

fn build_fragment(
    search: &Search,
    replacement: &Crystal,
    loc: usize,
    ori: OrientationChoice,
) -> Result<ReplacementFragment, XtalError> {
    let location = &search.locations[loc];
    let orientation_indices: Vec<usize> = match ori {
        OrientationChoice::Explicit(idx) => vec![idx],
        OrientationChoice::Optimal => (0..location.orientations.len()).collect(),
    };

    let mut best: Option<(f64, ReplacementFragment)> = None;
    for &ori_idx in &orientation_indices {
        let iso = &location.orientations[ori_idx];
        if let Some((score, fragment)) = align_replacement(search, replacement, iso)? {
            let better = best
                .as_ref()
                .map(|(best_score, _)| score < *best_score)
                .unwrap_or(true);
            if better {
                best = Some((score, fragment));
            }
        }
    }

    match best {
        Some((_, fragment)) => Ok(fragment),
        None => {
            warn!(
                "substructure_replace: replacement has no unmasked-query isomorphism at location {loc}; deleting the match without inserting a fragment"
            );
            let iso = location.orientations[orientation_indices[0]].clone();
            let nq = search.query.num_atoms();
            Ok(ReplacementFragment {
                xrm: None,
                iso,
                u2r: vec![None; nq],
                keep_replacement: Vec::new(),
                anchor_for_masked: Vec::new(),
            })
        }
    }
}

/// Try to align `replacement` onto the parent subset named by `iso`. Returns
/// `None` if the replacement has no unmasked-query isomorphism (null
/// mapping); otherwise the RMSD-minimizing transformed fragment among every
/// candidate unmasked-query -> replacement map found.
fn align_replacement(
    search: &Search,
    replacement: &Crystal,
    iso: &[usize],
) -> Result<Option<(f64, ReplacementFragment)>, XtalError> {
    let query = &search.query;
    let parent = &search.parent;

    let parent_frac: Vec<_> = iso.iter().map(|&p| parent.atoms[p].frac_coords).collect();
    let parent_frac_adjusted = geometry::adjust_for_pbc(&parent_frac)?;

    let unmasked_query_indices: Vec<usize> = (0..query.num_atoms())
        .filter(|&i| !query.atoms[i].masked)
        .collect();
    let unmasked_query = query.select(&unmasked_query_indices);

    // The replacement's own masked attachment atom(s) are never inserted, so
    // they are never a valid target for an unmasked query vertex either.
    let keep_replacement: Vec<bool> = (0..replacement.num_atoms())
        .map(|r| !replacement.atoms[r].masked)
        .collect();
    let unmasked_replacement_indices: Vec<usize> = (0..replacement.num_atoms())
        .filter(|&r| keep_replacement[r])
        .collect();
    let unmasked_replacement = replacement.select(&unmasked_replacement_indices);

    let u2r_candidates: Vec<Vec<usize>> =
        find_subgraph_isomorphisms(&unmasked_query, &unmasked_replacement, false)
            .into_iter()
            .map(|local| {
                local
                    .into_iter()
                    .map(|l| unmasked_replacement_indices[l])
                    .collect()
            })
            .collect();
    if u2r_candidates.is_empty() {
        return Ok(None);
    }
    if u2r_candidates.len() > 1 {
        warn!(
            "substructure_replace: {} candidate unmasked-query->replacement isomorphism(s); trying all, keeping the RMSD-minimizing one",
            u2r_candidates.len()
        );
    }

    // Pair masked query vertices with masked replacement vertices, so a
    // dropped masked replacement atom's bonds can reroute to the parent atom
    // its query counterpart maps to (which is retained, not deleted).
    let masked_query_indices: Vec<usize> = (0..query.num_atoms())
        .filter(|&i| query.atoms[i].masked)
        .collect();
    let masked_replacement_indices: Vec<usize> = (0..replacement.num_atoms())
        .filter(|&r| !keep_replacement[r])
        .collect();
    let mut anchor_for_masked: Vec<Option<usize>> = vec![None; replacement.num_atoms()];
    if !masked_query_indices.is_empty() && !masked_replacement_indices.is_empty() {
        let masked_query_sub = query.select(&masked_query_indices);
        let masked_replacement_sub = replacement.select(&masked_replacement_indices);
        let mask_maps =
            find_subgraph_isomorphisms(&masked_query_sub, &masked_replacement_sub, false);
        match mask_maps.first() {
            Some(mask_map) => {
                if mask_maps.len() > 1 {
                    warn!(
                        "substructure_replace: {} candidate masked-attachment map(s); using the first",
                        mask_maps.len()
                    );
                }
                for (local_q, &local_r) in mask_map.iter().enumerate() {
                    let q = masked_query_indices[local_q];
                    let r = masked_replacement_indices[local_r];
                    anchor_for_masked[r] = Some(iso[q]);
                }
            }
            None => warn!(
                "substructure_replace: no attachment map between masked query and replacement atoms; masked replacement atom(s) will be dropped unconnected"
            ),
        }
    }

    let parent_points: Vec<Vector3<f64>> = unmasked_query_indices
        .iter()
        .map(|&qi| parent.lattice.to_cartesian(&parent_frac_adjusted[qi]))
        .collect();
    let parent_centroid = centroid(&parent_points);
    let parent_points_centered: Vec<_> = parent_points.iter().map(|p| p - parent_centroid).collect();

    let mut best: Option<(f64, ReplacementFragment)> = None;
    for u2r_local in &u2r_candidates {
        let replacement_points: Vec<Vector3<f64>> = u2r_local
            .iter()
            .map(|&r| replacement.lattice.to_cartesian(&replacement.atoms[r].frac_coords))
            .collect();
        let replacement_centroid = centroid(&replacement_points);
        let replacement_points_centered: Vec<_> = replacement_points
            .iter()
            .map(|p| p - replacement_centroid)
            .collect();

        let rotation = procrustes_rotation(&replacement_points_centered, &parent_points_centered);

        let mut xrm = replacement.clone();
        for (atom, orig) in xrm.atoms.iter_mut().zip(replacement.atoms.iter()) {
            let cart = replacement.lattice.to_cartesian(&orig.frac_coords);
            let transformed = rotation * (cart - replacement_centroid) + parent_centroid;
            atom.frac_coords = parent.lattice.to_fractional(&transformed);
        }
        xrm.lattice = parent.lattice.clone();

        let xrm_points: Vec<Vector3<f64>> = u2r_local
            .iter()
            .map(|&r| parent.lattice.to_cartesian(&xrm.atoms[r].frac_coords))
            .collect();
        let score = rmsd(&xrm_points, &parent_points);

        let mut u2r = vec![None; query.num_atoms()];
        for (k, &qi) in unmasked_query_indices.iter().enumerate() {
            u2r[qi] = Some(u2r_local[k]);
        }

        let better = best.as_ref().map(|(b, _)| score < *b).unwrap_or(true);
        if better {
            best = Some((
                score,
                ReplacementFragment {
                    xrm: Some(xrm),
                    iso: iso.to_vec(),
                    u2r,
                    keep_replacement: keep_replacement.clone(),
                    anchor_for_masked: anchor_for_masked.clone(),
                },
            ));
        }
    }
    Ok(best)
}

fn assemble(
    search: &Search,
    fragments: &[ReplacementFragment],
    options: &ReplaceOptions,
) -> Result<Crystal, XtalError> {
    let parent = &search.parent;
    let query = &search.query;
    let mut result = parent.clone();
    result.name = options.name.clone();

    let mut deletion_set: BTreeSet<usize> = BTreeSet::new();

    for fragment in fragments {
        // A masked query vertex's parent atom is the attachment anchor: it
        // stays in the crystal rather than being deleted.
        for (query_idx, &p) in fragment.iso.iter().enumerate() {
            if !query.atoms[query_idx].masked {
                deletion_set.insert(p);
            }
        }

        let Some(xrm) = &fragment.xrm else {
            continue;
        };

        let kept_indices: Vec<usize> = (0..xrm.num_atoms())
            .filter(|&r| fragment.keep_replacement[r])
            .collect();
        let xrm_reduced = xrm.select(&kept_indices);
        let offset = result.append(&xrm_reduced);
        let local_index_of: HashMap<usize, usize> = kept_indices
            .iter()
            .enumerate()
            .map(|(new_i, &r)| (r, new_i))
            .collect();

        for (query_idx, &p) in fragment.iso.iter().enumerate() {
            let Some(r_idx) = fragment.u2r[query_idx] else {
                continue;
            };
            let Some(&local) = local_index_of.get(&r_idx) else {
                continue;
            };
            for n in base::neighbors(&parent.bonds, p).collect::<Vec<_>>() {
                if fragment.iso.contains(&n) {
                    continue;
                }
                result.add_bond(n, offset + local)?;
            }
        }

        // Whatever was bonded to a dropped masked attachment atom reconnects
        // directly to the parent atom it stands in for.
        for r in 0..xrm.num_atoms() {
            if fragment.keep_replacement[r] {
                continue;
            }
            let Some(anchor) = fragment.anchor_for_masked[r] else {
                continue;
            };
            for n in base::neighbors(&xrm.bonds, r).collect::<Vec<_>>() {
                if !fragment.keep_replacement[n] {
                    continue;
                }
                if let Some(&local) = local_index_of.get(&n) {
                    result.add_bond(anchor, offset + local)?;
                }
            }
        }
    }

    result.wrap();
    result.recompute_bond_properties()?;

    let keep: Vec<usize> = (0..result.num_atoms())
        .filter(|&i| i >= parent.num_atoms() || !deletion_set.contains(&i))
        .collect();

    Ok(result.select(&keep))
}
