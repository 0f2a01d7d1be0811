//! End-to-end scenarios exercising the public surface: search, the
//! replacement engine, and scheme validation together on small molecules
//! built directly as `Crystal`s.

use nalgebra::{Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_log::test;

use xtal_repl::{
    substructure_replace, substructure_search, Atom, Crystal, CrystalExt, Lattice,
    OrientationChoice, ReplaceOptions, SearchOptions, XtalError,
};

const CELL: f64 = 20.0;

fn large_cubic_lattice() -> Lattice {
    Lattice::new(Matrix3::identity() * CELL)
}

/// A 6-membered aromatic ring (cyclic C-C) with one H pendant on each ring
/// carbon, given the ring carbons' fractional coordinates in discovery
/// order. Bonds: `C_i - C_{i+1 mod 6}` and `C_i - H_i`.
fn benzene(name: &str, ring: [Vector3<f64>; 6]) -> Crystal {
    let mut atoms = Vec::with_capacity(12);
    for c in &ring {
        atoms.push(Atom::new("C", *c));
    }
    for c in &ring {
        atoms.push(Atom::new("H", c + Vector3::new(0.0, 0.02, 0.0)));
    }
    let mut crystal = Crystal::new(name, large_cubic_lattice(), atoms);
    for i in 0..6 {
        crystal.add_bond(i, (i + 1) % 6).unwrap();
    }
    for i in 0..6 {
        crystal.add_bond(i, 6 + i).unwrap();
    }
    crystal
}

/// A regular hexagon of fractional radius `r` around `center`, in the xy
/// plane, vertex 0 pointing along +x.
fn hexagon(center: Vector3<f64>, r: f64) -> [Vector3<f64>; 6] {
    std::array::from_fn(|i| {
        let theta = std::f64::consts::FRAC_PI_3 * i as f64;
        center + Vector3::new(r * theta.cos(), r * theta.sin(), 0.0)
    })
}

#[test]
fn s1_benzene_self_replacement_is_bond_isomorphic() {
    let ring = hexagon(Vector3::new(0.5, 0.5, 0.5), 0.05);
    let parent = benzene("benzene", ring);
    let query = benzene("benzene", ring);
    let replacement = benzene("benzene", ring);

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert_eq!(search.nb_locations(), 1);
    // A fully symmetric necklace graph (6 equivalent ring carbons, each
    // with an equivalent pendant H) has at least the 6 cyclic rotations
    // as automorphisms.
    assert!(search.nb_orientations_at_location(0) >= 6);
    assert_eq!(search.nb_orientations_at_location(0) % 6, 0);

    let mut rng = StdRng::seed_from_u64(7);
    let result =
        substructure_replace(&search, &replacement, &ReplaceOptions::default(), &mut rng).unwrap();

    assert_eq!(result.num_atoms(), parent.num_atoms());
    assert_eq!(result.bonds.edge_count(), parent.bonds.edge_count());
    assert!(result.contains_substructure(&query, &SearchOptions::default()));
}

#[test]
fn s2_biphenyl_methyl_substitution_at_every_aromatic_hydrogen() {
    // Two rings joined by a single C-C bond between their bridgehead
    // carbons (index 0 of each ring); the other 5 carbons of each ring
    // each carry one aromatic H, for 10 aromatic hydrogens total.
    let ring_a = hexagon(Vector3::new(0.30, 0.5, 0.5), 0.05);
    let ring_b = hexagon(Vector3::new(0.45, 0.5, 0.5), 0.05);

    let mut atoms = Vec::new();
    for c in &ring_a {
        atoms.push(Atom::new("C", *c));
    }
    for c in &ring_b {
        atoms.push(Atom::new("C", *c));
    }
    let mut aromatic_h_indices = Vec::new();
    for (ring_offset, ring) in [(0usize, &ring_a), (6, &ring_b)] {
        for i in 1..6 {
            let h_index = atoms.len();
            atoms.push(Atom::new("H", ring[i] + Vector3::new(0.0, 0.02, 0.0)));
            aromatic_h_indices.push((ring_offset + i, h_index));
        }
    }

    let mut parent = Crystal::new("biphenyl", large_cubic_lattice(), atoms);
    for i in 0..6 {
        parent.add_bond(i, (i + 1) % 6).unwrap();
    }
    for i in 0..6 {
        parent.add_bond(6 + i, 6 + (i + 1) % 6).unwrap();
    }
    parent.add_bond(0, 6).unwrap(); // inter-ring bridgehead bond
    for &(ring_c, h) in &aromatic_h_indices {
        parent.add_bond(ring_c, h).unwrap();
    }
    assert_eq!(aromatic_h_indices.len(), 10);

    // Query: the aromatic ring carbon as a masked attachment stub, bonded to
    // its pendant H. The ring carbon is retained at every match (it anchors
    // the new substituent); only the H is deleted.
    let mut query = Crystal::new(
        "aromatic_h",
        large_cubic_lattice(),
        vec![
            Atom::masked("C", Vector3::zeros()),
            Atom::new("H", Vector3::new(0.0, 0.02, 0.0)),
        ],
    );
    query.add_bond(0, 1).unwrap();

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert_eq!(search.nb_locations(), 10);

    // Replacement: methyl, CH3, attachment carbon masked to match the
    // query's masked ring-carbon stub.
    let methyl_atoms = vec![
        Atom::masked("C", Vector3::new(0.0, 0.0, 0.0)),
        Atom::new("H", Vector3::new(0.03, 0.0, 0.0)),
        Atom::new("H", Vector3::new(-0.015, 0.026, 0.0)),
        Atom::new("H", Vector3::new(-0.015, -0.026, 0.0)),
    ];
    let mut methyl = Crystal::new("methyl", large_cubic_lattice(), methyl_atoms);
    methyl.add_bond(0, 1).unwrap();
    methyl.add_bond(0, 2).unwrap();
    methyl.add_bond(0, 3).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let result = substructure_replace(&search, &methyl, &ReplaceOptions::default(), &mut rng).unwrap();

    // Each of the 10 sites deletes 1 atom (the matched H; the masked ring
    // carbon is retained) and inserts the methyl fragment minus its own
    // masked attachment carbon.
    let expected = parent.num_atoms() - 10 + 10 * (methyl.num_atoms() - 1);
    assert_eq!(result.num_atoms(), expected);
}

#[test]
fn s3_benzene_straddling_a_cell_boundary_has_a_cross_boundary_bond() {
    let ring = [
        Vector3::new(0.02, 0.50, 0.50),
        Vector3::new(0.06, 0.54, 0.50),
        Vector3::new(0.10, 0.54, 0.50),
        Vector3::new(0.14, 0.50, 0.50),
        Vector3::new(0.10, 0.46, 0.50),
        Vector3::new(0.95, 0.46, 0.50),
    ];
    let parent = benzene("straddling_benzene", ring);
    let query = benzene("benzene", hexagon(Vector3::new(0.5, 0.5, 0.5), 0.05));

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert_eq!(search.nb_locations(), 1);

    for bond in parent.bonds.edge_weights() {
        assert!(bond.distance.is_finite());
        assert!(bond.distance > 0.0);
    }

    let replacement = benzene("benzene", ring);
    let mut rng = StdRng::seed_from_u64(11);
    let result =
        substructure_replace(&search, &replacement, &ReplaceOptions::default(), &mut rng).unwrap();

    let crossing_exists = result.bonds.edge_weights().any(|bond| bond.cross_boundary);
    assert!(
        crossing_exists,
        "expected at least one cross-boundary bond in the replaced ring"
    );

    for bond in result.bonds.edge_weights() {
        assert!(bond.distance.is_finite());
        assert!(bond.distance > 0.0);
    }
}

#[test]
fn s4_absent_species_query_yields_no_match_and_parent_is_returned_unchanged() {
    let ring = hexagon(Vector3::new(0.5, 0.5, 0.5), 0.05);
    let parent = benzene("benzene", ring);

    let query = Crystal::new(
        "xenon_probe",
        large_cubic_lattice(),
        vec![Atom::new("Xe", Vector3::zeros())],
    );

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert_eq!(search.nb_locations(), 0);

    let replacement = benzene("benzene", ring);
    let mut rng = StdRng::seed_from_u64(1);
    let options = ReplaceOptions {
        name: "unchanged".to_string(),
        ..ReplaceOptions::default()
    };
    let result = substructure_replace(&search, &replacement, &options, &mut rng).unwrap();

    assert_eq!(result.num_atoms(), parent.num_atoms());
    assert_eq!(result.bonds.edge_count(), parent.bonds.edge_count());
    assert_eq!(result.name, "unchanged");
}

#[test]
fn s5_mismatched_loc_and_ori_lengths_is_an_invalid_scheme() {
    let ring_a = hexagon(Vector3::new(0.3, 0.5, 0.5), 0.05);
    let ring_b = hexagon(Vector3::new(0.7, 0.5, 0.5), 0.05);
    let mut parent = benzene("a", ring_a);
    let offset = parent.append(&benzene("b", ring_b));
    assert_eq!(offset, 12);

    let mut query = Crystal::new(
        "ch_pair",
        large_cubic_lattice(),
        vec![Atom::new("C", Vector3::zeros()), Atom::new("H", Vector3::new(0.02, 0.0, 0.0))],
    );
    query.add_bond(0, 1).unwrap();

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert!(search.nb_locations() >= 2);

    let replacement = benzene("r", ring_a);
    let options = ReplaceOptions {
        loc: Some(vec![1, 2]),
        ori: Some(vec![OrientationChoice::Explicit(1)]),
        ..ReplaceOptions::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    let result = substructure_replace(&search, &replacement, &options, &mut rng);
    assert!(matches!(result, Err(XtalError::InvalidScheme(_))));
}

#[test]
fn s6_null_replacement_mapping_deletes_the_match_without_inserting_anything() {
    let ring = hexagon(Vector3::new(0.5, 0.5, 0.5), 0.05);
    let parent = benzene("benzene", ring);
    let query = benzene("benzene", ring);

    // A replacement with no carbon or hydrogen at all: the unmasked query
    // subgraph (the full benzene query, nothing masked) has no isomorphism
    // into it, so every accepted location is a null mapping.
    let replacement = Crystal::new(
        "inert",
        large_cubic_lattice(),
        vec![Atom::new("Ne", Vector3::zeros())],
    );

    let search = substructure_search(&query, &parent, &SearchOptions::default());
    assert_eq!(search.nb_locations(), 1);
    let matched_size = search.locations[0].vertices.len();

    let mut rng = StdRng::seed_from_u64(0);
    let result =
        substructure_replace(&search, &replacement, &ReplaceOptions::default(), &mut rng).unwrap();

    assert_eq!(result.num_atoms(), parent.num_atoms() - matched_size);
}
