use crate::core::data::elements;
use nalgebra::Point3;

/// Represents a single atom (or ghost center) in the loaded structure.
///
/// Atoms carry only their chemical identity and position; display attributes
/// (color, radii, materials) are looked up from the element tables or the
/// session's overridable element properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// The atomic number. Zero denotes a ghost center (e.g., a dummy atom or
    /// an unrecognized species from an XYZ file).
    pub atomic_number: u32,
    /// The 3D coordinates of the atom in Ångström.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new atom at the given position.
    pub fn new(atomic_number: u32, position: Point3<f64>) -> Self {
        Self {
            atomic_number,
            position,
        }
    }

    /// Reports whether this is a ghost center rather than a real element.
    pub fn is_ghost(&self) -> bool {
        self.atomic_number == elements::GHOST
    }

    /// Returns the chemical symbol for this atom's element.
    pub fn symbol(&self) -> &'static str {
        elements::symbol(self.atomic_number)
    }
}
