use crate::core::data::constants::OCCUPATION_EPSILON;

/// Spin channel of a molecular orbital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Alpha,
    Beta,
}

impl Spin {
    /// Parses the spin labels used by wavefunction files, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("alpha") {
            Some(Spin::Alpha)
        } else if label.eq_ignore_ascii_case("beta") {
            Some(Spin::Beta)
        } else {
            None
        }
    }
}

/// A molecular orbital: metadata plus its LCAO coefficient vector.
///
/// Coefficients are positional over the loaded basis set; missing entries in
/// sparse file formats are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularOrbital {
    /// Display label (symmetry tag or file-assigned name).
    pub label: String,
    /// Orbital energy, in the unit the file provided (typically Hartree).
    pub energy: f64,
    pub occupation: f64,
    pub spin: Spin,
    pub coefficients: Vec<f64>,
}

impl MolecularOrbital {
    /// Whether this orbital contributes to the electron density.
    ///
    /// Near-zero occupations are skipped during density accumulation rather
    /// than multiplied through.
    pub fn is_occupied(&self) -> bool {
        self.occupation.abs() >= OCCUPATION_EPSILON
    }
}

/// The ordered set of molecular orbitals from one wavefunction file.
///
/// Orbital indices are file order and stay stable for the life of the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbitalStore {
    orbitals: Vec<MolecularOrbital>,
}

impl OrbitalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, orbital: MolecularOrbital) {
        self.orbitals.push(orbital);
    }

    pub fn len(&self) -> usize {
        self.orbitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbitals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MolecularOrbital> {
        self.orbitals.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MolecularOrbital> {
        self.orbitals.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MolecularOrbital> {
        self.orbitals.iter()
    }

    /// The highest occupied orbital of the given spin channel: the largest
    /// index whose occupation is non-negligible.
    pub fn homo(&self, spin: Spin) -> Option<usize> {
        self.orbitals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, mo)| mo.spin == spin && mo.is_occupied())
            .map(|(index, _)| index)
    }

    /// The lowest unoccupied orbital across both spin channels: the orbital
    /// of minimum energy among those with occupation below one half.
    pub fn lumo(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, mo) in self.orbitals.iter().enumerate() {
            if mo.occupation < 0.5 {
                match best {
                    Some((_, energy)) if mo.energy >= energy => {}
                    _ => best = Some((index, mo.energy)),
                }
            }
        }
        best.map(|(index, _)| index)
    }
}
