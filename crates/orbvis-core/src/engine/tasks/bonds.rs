use crate::core::data::elements::CovalentRadiusTable;
use crate::core::models::molecule::{canonical_pair, Molecule};
use crate::engine::error::EngineError;
use kiddo::{KdTree, SquaredEuclidean};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Outcome of a manual bond edit. Editing toward the state that already
/// exists is not an error, just a reported no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondChange {
    Applied,
    NoOp,
}

/// Rebuilds the whole bond set from interatomic distances.
///
/// Two atoms bond when `distance ≤ (r_a + r_b)·(1 + tolerance)`, inclusive,
/// with covalent radii from `radii` (ghost atoms use the table's ghost
/// entry). Candidate pairs come from a k-d tree radius query bounded by the
/// largest radius in the model, so the pass stays near-linear for large
/// structures. Manual edits made before the rebuild are discarded.
#[instrument(skip_all, name = "rebuild_bonds")]
pub fn rebuild(molecule: &mut Molecule, radii: &CovalentRadiusTable, tolerance: f64) {
    let mut bonds = BTreeSet::new();

    if molecule.atom_count() >= 2 {
        let positions: Vec<[f64; 3]> = molecule
            .positions()
            .iter()
            .map(|p| [p.x, p.y, p.z])
            .collect();
        let kdtree: KdTree<f64, 3> = (&positions).into();

        let atom_radii: Vec<f64> = molecule
            .atoms()
            .map(|(_, atom)| radii.radius(atom.atomic_number))
            .collect();
        let max_radius = atom_radii.iter().copied().fold(0.0_f64, f64::max);

        for (a, &position) in positions.iter().enumerate() {
            let reach = (atom_radii[a] + max_radius) * (1.0 + tolerance);
            for neighbour in
                kdtree.within_unsorted::<SquaredEuclidean>(&position, reach * reach)
            {
                let b = neighbour.item as usize;
                if b <= a {
                    continue;
                }
                let threshold = (atom_radii[a] + atom_radii[b]) * (1.0 + tolerance);
                if neighbour.distance <= threshold * threshold {
                    bonds.insert(canonical_pair(a, b));
                }
            }
        }
    }

    debug!(
        atoms = molecule.atom_count(),
        bonds = bonds.len(),
        tolerance,
        "Bond inference complete"
    );
    molecule.set_bonds(bonds);
}

/// Adds a bond between two atoms.
///
/// # Errors
///
/// Fails with `InvalidArgument` for a self-bond and `AtomNotFound` for an
/// unknown index. An already-present bond is a reported no-op.
pub fn add(molecule: &mut Molecule, a: usize, b: usize) -> Result<BondChange, EngineError> {
    if a == b {
        return Err(EngineError::invalid_argument(format!(
            "cannot bond atom {a} to itself"
        )));
    }
    check_index(molecule, a)?;
    check_index(molecule, b)?;
    if molecule.insert_bond(a, b) {
        Ok(BondChange::Applied)
    } else {
        Ok(BondChange::NoOp)
    }
}

/// Removes a bond between two atoms.
///
/// # Errors
///
/// Fails with `AtomNotFound` for an unknown index. An absent bond is a
/// reported no-op.
pub fn remove(molecule: &mut Molecule, a: usize, b: usize) -> Result<BondChange, EngineError> {
    check_index(molecule, a)?;
    check_index(molecule, b)?;
    if molecule.remove_bond(a, b) {
        Ok(BondChange::Applied)
    } else {
        Ok(BondChange::NoOp)
    }
}

fn check_index(molecule: &Molecule, index: usize) -> Result<(), EngineError> {
    if index < molecule.atom_count() {
        Ok(())
    } else {
        Err(EngineError::AtomNotFound { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn water() -> Molecule {
        let mut molecule = Molecule::new();
        molecule.add_atom(8, Point3::new(0.0, 0.0, 0.0));
        molecule.add_atom(1, Point3::new(0.757, 0.586, 0.0));
        molecule.add_atom(1, Point3::new(-0.757, 0.586, 0.0));
        molecule
    }

    #[test]
    fn rebuild_finds_covalent_pairs() {
        let mut molecule = water();
        rebuild(&mut molecule, &CovalentRadiusTable::default(), 0.3);
        let bonds: Vec<_> = molecule.bonds().iter().copied().collect();
        assert_eq!(bonds, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn rebuild_threshold_is_inclusive() {
        let mut molecule = Molecule::new();
        molecule.add_atom(1, Point3::origin());
        // Exactly (r_H + r_H)·(1 + 0) apart.
        molecule.add_atom(1, Point3::new(0.64, 0.0, 0.0));
        rebuild(&mut molecule, &CovalentRadiusTable::default(), 0.0);
        assert!(molecule.contains_bond(0, 1));

        molecule.set_position(1, Point3::new(0.6401, 0.0, 0.0));
        rebuild(&mut molecule, &CovalentRadiusTable::default(), 0.0);
        assert!(!molecule.contains_bond(0, 1));
    }

    #[test]
    fn rebuild_replaces_manual_edits() {
        let mut molecule = water();
        rebuild(&mut molecule, &CovalentRadiusTable::default(), 0.3);
        add(&mut molecule, 1, 2).unwrap();
        assert!(molecule.contains_bond(1, 2));

        rebuild(&mut molecule, &CovalentRadiusTable::default(), 0.3);
        assert!(!molecule.contains_bond(1, 2));
    }

    #[test]
    fn rebuild_honors_radius_overrides() {
        let mut molecule = Molecule::new();
        molecule.add_atom(1, Point3::origin());
        molecule.add_atom(1, Point3::new(1.5, 0.0, 0.0));
        let mut radii = CovalentRadiusTable::default();
        rebuild(&mut molecule, &radii, 0.3);
        assert!(molecule.bonds().is_empty());

        radii.set_radius(1, 0.8);
        rebuild(&mut molecule, &radii, 0.3);
        assert!(molecule.contains_bond(0, 1));
    }

    #[test]
    fn self_bonds_are_invalid() {
        let mut molecule = water();
        assert!(matches!(
            add(&mut molecule, 1, 1),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unknown_indices_are_not_found() {
        let mut molecule = water();
        assert!(matches!(
            add(&mut molecule, 0, 9),
            Err(EngineError::AtomNotFound { index: 9 })
        ));
        assert!(matches!(
            remove(&mut molecule, 9, 0),
            Err(EngineError::AtomNotFound { index: 9 })
        ));
    }

    #[test]
    fn repeated_edits_report_no_ops() {
        let mut molecule = water();
        assert_eq!(add(&mut molecule, 0, 1).unwrap(), BondChange::Applied);
        assert_eq!(add(&mut molecule, 1, 0).unwrap(), BondChange::NoOp);
        assert_eq!(remove(&mut molecule, 0, 1).unwrap(), BondChange::Applied);
        assert_eq!(remove(&mut molecule, 0, 1).unwrap(), BondChange::NoOp);
    }
}
