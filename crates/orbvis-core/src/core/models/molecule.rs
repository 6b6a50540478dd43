use super::atom::Atom;
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap};

/// Canonicalizes an atom index pair so that the smaller index comes first.
///
/// Bonds are unordered; storing them canonicalized gives the bond set its
/// set semantics for free.
pub fn canonical_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// The molecular model: atoms, positions, and the bond graph.
///
/// Atoms are stored densely; an atom's index is assigned at load time and is
/// never reused while the model is live (there is no removal operation).
/// Formats that carry their own atom numbering (Molden) additionally record a
/// file-id to index map so lookups by file id resolve to the dense index.
///
/// The model carries a monotonically increasing revision counter. Every
/// geometry, bond, or wavefunction-affecting mutation bumps it; cached scalar
/// fields are keyed by revision so stale data is never served.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: BTreeSet<(usize, usize)>,
    file_ids: HashMap<u32, usize>,
    revision: u64,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an atom and returns its new dense index.
    pub fn add_atom(&mut self, atomic_number: u32, position: Point3<f64>) -> usize {
        let index = self.atoms.len();
        self.atoms.push(Atom::new(atomic_number, position));
        self.revision += 1;
        index
    }

    /// Returns the atom at `index`, or `None` if the index is out of range.
    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    /// Moves an atom to a new position. Returns `false` for unknown indices.
    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> bool {
        match self.atoms.get_mut(index) {
            Some(atom) => {
                atom.position = position;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> impl Iterator<Item = (usize, &Atom)> {
        self.atoms.iter().enumerate()
    }

    /// Collects all atom positions, in index order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Records that the loaded file refers to the atom at `index` by `file_id`.
    pub fn record_file_id(&mut self, file_id: u32, index: usize) {
        self.file_ids.insert(file_id, index);
    }

    /// Resolves a file-local atom id to the dense index.
    ///
    /// Models loaded from formats without their own numbering have an empty
    /// map; in that case the id is interpreted as the index itself.
    pub fn resolve_file_id(&self, file_id: u32) -> Option<usize> {
        if self.file_ids.is_empty() {
            let index = file_id as usize;
            return (index < self.atoms.len()).then_some(index);
        }
        self.file_ids.get(&file_id).copied()
    }

    /// The canonicalized bond set.
    pub fn bonds(&self) -> &BTreeSet<(usize, usize)> {
        &self.bonds
    }

    pub fn contains_bond(&self, a: usize, b: usize) -> bool {
        self.bonds.contains(&canonical_pair(a, b))
    }

    /// Replaces the entire bond set, as a full inference rebuild does.
    pub fn set_bonds(&mut self, bonds: BTreeSet<(usize, usize)>) {
        self.bonds = bonds;
        self.revision += 1;
    }

    /// Inserts a bond, canonicalized. Returns `false` if it was already present.
    ///
    /// Index and self-bond validation is the caller's responsibility; this is
    /// raw storage.
    pub fn insert_bond(&mut self, a: usize, b: usize) -> bool {
        let inserted = self.bonds.insert(canonical_pair(a, b));
        if inserted {
            self.revision += 1;
        }
        inserted
    }

    /// Removes a bond. Returns `false` if the pair was not bonded.
    pub fn remove_bond(&mut self, a: usize, b: usize) -> bool {
        let removed = self.bonds.remove(&canonical_pair(a, b));
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// The current model revision. Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Explicitly bumps the revision, for mutations that live outside the
    /// model itself but invalidate fields derived from it (occupation edits).
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Axis-aligned bounding box over all atom positions.
    ///
    /// Returns `None` for an empty model.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.atoms.first()?.position;
        let mut min = first;
        let mut max = first;
        for atom in &self.atoms[1..] {
            let p = atom.position;
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_atom_model() -> Molecule {
        let mut molecule = Molecule::new();
        molecule.add_atom(6, Point3::new(0.0, 0.0, 0.0));
        molecule.add_atom(8, Point3::new(1.2, 0.0, 0.0));
        molecule
    }

    #[test]
    fn add_atom_returns_dense_indices() {
        let mut molecule = Molecule::new();
        assert_eq!(molecule.add_atom(1, Point3::origin()), 0);
        assert_eq!(molecule.add_atom(6, Point3::origin()), 1);
        assert_eq!(molecule.atom_count(), 2);
        assert_eq!(molecule.atom(1).unwrap().atomic_number, 6);
        assert!(molecule.atom(2).is_none());
    }

    #[test]
    fn bonds_are_canonicalized_and_deduplicated() {
        let mut molecule = two_atom_model();
        assert!(molecule.insert_bond(1, 0));
        assert!(!molecule.insert_bond(0, 1));
        assert!(molecule.contains_bond(0, 1));
        assert!(molecule.contains_bond(1, 0));
        assert_eq!(molecule.bonds().len(), 1);
        assert_eq!(molecule.bonds().iter().next(), Some(&(0, 1)));
    }

    #[test]
    fn remove_bond_reports_whether_it_existed() {
        let mut molecule = two_atom_model();
        molecule.insert_bond(0, 1);
        assert!(molecule.remove_bond(1, 0));
        assert!(!molecule.remove_bond(0, 1));
        assert!(molecule.bonds().is_empty());
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let mut molecule = Molecule::new();
        let r0 = molecule.revision();
        molecule.add_atom(1, Point3::origin());
        let r1 = molecule.revision();
        assert!(r1 > r0);

        molecule.set_position(0, Point3::new(1.0, 0.0, 0.0));
        let r2 = molecule.revision();
        assert!(r2 > r1);

        molecule.add_atom(1, Point3::new(0.7, 0.0, 0.0));
        molecule.insert_bond(0, 1);
        let r3 = molecule.revision();
        assert!(r3 > r2);

        molecule.remove_bond(0, 1);
        assert!(molecule.revision() > r3);
    }

    #[test]
    fn set_position_rejects_unknown_indices() {
        let mut molecule = two_atom_model();
        let revision = molecule.revision();
        assert!(!molecule.set_position(5, Point3::origin()));
        assert_eq!(molecule.revision(), revision);
    }

    #[test]
    fn file_ids_resolve_to_dense_indices() {
        let mut molecule = two_atom_model();
        molecule.record_file_id(7, 0);
        molecule.record_file_id(3, 1);
        assert_eq!(molecule.resolve_file_id(7), Some(0));
        assert_eq!(molecule.resolve_file_id(3), Some(1));
        assert_eq!(molecule.resolve_file_id(4), None);
    }

    #[test]
    fn without_a_file_id_map_ids_are_indices() {
        let molecule = two_atom_model();
        assert_eq!(molecule.resolve_file_id(0), Some(0));
        assert_eq!(molecule.resolve_file_id(1), Some(1));
        assert_eq!(molecule.resolve_file_id(2), None);
    }

    #[test]
    fn bounding_box_encloses_all_atoms() {
        let mut molecule = two_atom_model();
        molecule.add_atom(1, Point3::new(-0.5, 2.0, -1.0));
        let (min, max) = molecule.bounding_box().unwrap();
        assert_eq!(min, Point3::new(-0.5, 0.0, -1.0));
        assert_eq!(max, Point3::new(1.2, 2.0, 0.0));
        assert_eq!(Molecule::new().bounding_box(), None);
    }
}
