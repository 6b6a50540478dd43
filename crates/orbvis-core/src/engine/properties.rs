use crate::core::data::elements::{self, ELEMENT_COUNT};
use crate::core::render::shading::Material;

/// Display attributes of one element: the gamma-encoded base color plus the
/// roughness/metallicity pair the surface shader consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementProperties {
    pub color: [f32; 3],
    pub roughness: f64,
    pub metallicity: f64,
}

impl ElementProperties {
    /// The built-in defaults for an element: tabulated color, roughness 0.5,
    /// and full metallicity except for the nonmetal set.
    pub fn default_for(atomic_number: u32) -> Self {
        Self {
            color: elements::base_color(atomic_number),
            roughness: 0.5,
            metallicity: if elements::is_nonmetal(atomic_number) {
                0.0
            } else {
                1.0
            },
        }
    }

    pub fn material(&self) -> Material {
        Material::new(self.color, self.roughness, self.metallicity)
    }
}

/// Per-element display properties, indexed by atomic number and overridable
/// at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPropertyTable {
    entries: Vec<ElementProperties>,
}

impl Default for ElementPropertyTable {
    fn default() -> Self {
        Self {
            entries: (0..ELEMENT_COUNT as u32)
                .map(ElementProperties::default_for)
                .collect(),
        }
    }
}

impl ElementPropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, atomic_number: u32) -> Option<&ElementProperties> {
        self.entries.get(atomic_number as usize)
    }

    /// Replaces one element's properties. Returns `false` beyond the table.
    pub fn set(&mut self, atomic_number: u32, properties: ElementProperties) -> bool {
        match self.entries.get_mut(atomic_number as usize) {
            Some(entry) => {
                *entry = properties;
                true
            }
            None => false,
        }
    }

    /// Materials for the whole table, indexed by atomic number, ready for
    /// scene assembly.
    pub fn materials(&self) -> Vec<Material> {
        self.entries.iter().map(ElementProperties::material).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_whole_element_table() {
        let table = ElementPropertyTable::default();
        assert_eq!(table.len(), ELEMENT_COUNT);
        assert_eq!(table.get(6).unwrap().color, elements::base_color(6));
    }

    #[test]
    fn nonmetals_default_to_zero_metallicity() {
        let table = ElementPropertyTable::default();
        assert_eq!(table.get(8).unwrap().metallicity, 0.0);
        assert_eq!(table.get(26).unwrap().metallicity, 1.0);
        assert_eq!(table.get(0).unwrap().metallicity, 0.0);
    }

    #[test]
    fn overrides_round_trip() {
        let mut table = ElementPropertyTable::default();
        let custom = ElementProperties {
            color: [0.1, 0.2, 0.3],
            roughness: 0.9,
            metallicity: 0.5,
        };
        assert!(table.set(6, custom));
        assert_eq!(table.get(6), Some(&custom));
        assert!(!table.set(500, custom));
        assert!(table.get(500).is_none());
    }

    #[test]
    fn materials_are_indexed_by_atomic_number() {
        let table = ElementPropertyTable::default();
        let materials = table.materials();
        assert_eq!(materials.len(), ELEMENT_COUNT);
        assert_eq!(materials[8], table.get(8).unwrap().material());
    }
}
