use serde::{Deserialize, Serialize};

use crate::base::graph::{self, Bond, BondGraph};
use crate::base::lattice::Lattice;
use crate::base::species::Atom;
use crate::base::XtalError;
use crate::geometry;

/// Atoms with fractional coordinates in a unit cell, plus a bond graph.
///
/// Used both for the parent crystal being searched/modified and for the
/// small query/replacement moieties matched against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    pub name: String,
    pub lattice: Lattice,
    pub atoms: Vec<Atom>,
    pub bonds: BondGraph,
    pub charges: Option<Vec<f64>>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        let bonds = graph::empty_graph(atoms.len());
        Self {
            name: name.into(),
            lattice,
            atoms,
            bonds,
            charges: None,
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn add_bond(&mut self, u: usize, v: usize) -> Result<(), XtalError> {
        let (distance, cross_boundary) = self.bond_properties(u, v)?;
        graph::add_bond(
            &mut self.bonds,
            u,
            v,
            Bond {
                distance,
                cross_boundary,
            },
        );
        Ok(())
    }

    /// Compute the `(distance, cross_boundary)` pair for a would-be bond
    /// between atoms `u` and `v`, without inserting it.
    pub fn bond_properties(&self, u: usize, v: usize) -> Result<(f64, bool), XtalError> {
        let (in_cell, pbc) = geometry::bond_distances(
            &self.lattice.f_to_c,
            &self.atoms[u].frac_coords,
            &self.atoms[v].frac_coords,
        )?;
        Ok((pbc, in_cell != pbc))
    }

    /// Recompute `distance`/`cross_boundary` for every existing bond,
    /// e.g. after atom coordinates have moved (alignment, wrapping).
    pub fn recompute_bond_properties(&mut self) -> Result<(), XtalError> {
        let pairs: Vec<(usize, usize)> = graph::edges(&self.bonds)
            .map(|(u, v, _)| (u, v))
            .collect();
        for (u, v) in pairs {
            let (distance, cross_boundary) = self.bond_properties(u, v)?;
            if let Some(edge) = self.bonds.find_edge(
                petgraph::stable_graph::NodeIndex::new(u),
                petgraph::stable_graph::NodeIndex::new(v),
            ) {
                if let Some(weight) = self.bonds.edge_weight_mut(edge) {
                    weight.distance = distance;
                    weight.cross_boundary = cross_boundary;
                }
            }
        }
        Ok(())
    }

    /// Wrap every atom's fractional coordinates into `[0, 1)^3`. Idempotent.
    pub fn wrap(&mut self) {
        for atom in &mut self.atoms {
            atom.frac_coords = geometry::wrap(&atom.frac_coords);
        }
    }

    /// Select a subset of atoms by index (order preserved as given),
    /// returning a freshly relabeled crystal: bonds among the selected
    /// atoms are carried over and renumbered, bonds to atoms outside the
    /// selection are dropped, charges (if present) are sliced along.
    pub fn select(&self, indices: &[usize]) -> Crystal {
        let atoms: Vec<Atom> = indices.iter().map(|&i| self.atoms[i].clone()).collect();
        let bonds = graph::induce(&self.bonds, indices);
        let charges = self
            .charges
            .as_ref()
            .map(|charges| indices.iter().map(|&i| charges[i]).collect());
        Crystal {
            name: self.name.clone(),
            lattice: self.lattice.clone(),
            atoms,
            bonds,
            charges,
        }
    }

    /// Concatenate `other`'s atoms onto `self`, offsetting `other`'s
    /// internal bonds by `self.num_atoms()`. `other`'s lattice is ignored;
    /// the result keeps `self`'s lattice. Returns the offset at which
    /// `other`'s atoms begin in the result.
    pub fn append(&mut self, other: &Crystal) -> usize {
        let offset = self.num_atoms();
        self.atoms.extend(other.atoms.iter().cloned());
        if let Some(other_charges) = &other.charges {
            let charges = self.charges.get_or_insert_with(|| vec![0.0; offset]);
            charges.extend(other_charges.iter().copied());
        }
        for _ in 0..other.num_atoms() {
            self.bonds.add_node(());
        }
        for (u, v, bond) in graph::edges(&other.bonds) {
            graph::add_bond(&mut self.bonds, offset + u, offset + v, *bond);
        }
        offset
    }
}
