use phf::{Map, phf_map};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Number of tabulated entries: the ghost element (Z = 0) plus H through Og.
pub const ELEMENT_COUNT: usize = 119;

/// Atomic number of the ghost element used for unrecognized species.
pub const GHOST: u32 = 0;

static SYMBOLS: [&str; ELEMENT_COUNT] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg",
    "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

static SYMBOL_NUMBERS: Map<&'static str, u32> = phf_map! {
    "X" => 0,
    "H" => 1, "He" => 2,
    "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9, "Ne" => 10,
    "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15, "S" => 16, "Cl" => 17, "Ar" => 18,
    "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22, "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26,
    "Co" => 27, "Ni" => 28, "Cu" => 29, "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33,
    "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54,
    "Cs" => 55, "Ba" => 56, "La" => 57, "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61,
    "Sm" => 62, "Eu" => 63, "Gd" => 64, "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68,
    "Tm" => 69, "Yb" => 70, "Lu" => 71, "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75,
    "Os" => 76, "Ir" => 77, "Pt" => 78, "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82,
    "Bi" => 83, "Po" => 84, "At" => 85, "Rn" => 86,
    "Fr" => 87, "Ra" => 88, "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92, "Np" => 93,
    "Pu" => 94, "Am" => 95, "Cm" => 96, "Bk" => 97, "Cf" => 98, "Es" => 99, "Fm" => 100,
    "Md" => 101, "No" => 102, "Lr" => 103, "Rf" => 104, "Db" => 105, "Sg" => 106, "Bh" => 107,
    "Hs" => 108, "Mt" => 109, "Ds" => 110, "Rg" => 111, "Cn" => 112, "Nh" => 113, "Fl" => 114,
    "Mc" => 115, "Lv" => 116, "Ts" => 117, "Og" => 118,
};

// Crystallographic van der Waals radii after S. S. Batsanov, Inorg. Mater. 37
// (2001) 871-885. Noble gases and most elements beyond Bi are not covered by
// the source and carry rough estimates.
static VDW_RADII: [f64; ELEMENT_COUNT] = [
    1.00, //
    1.15, 1.30, //
    2.20, 1.90, 1.80, 1.70, 1.60, 1.55, 1.50, 1.50, //
    2.40, 2.20, 2.10, 2.10, 1.95, 1.80, 1.80, 1.80, //
    2.80, 2.40, 2.30, 2.15, 2.05, 2.05, 2.05, 2.05, 2.00, 2.00, 2.00, 2.10, 2.10, 2.10, 2.05,
    1.90, 1.90, 1.90, //
    2.90, 2.55, 2.40, 2.30, 2.15, 2.10, 2.05, 2.05, 2.00, 2.05, 2.10, 2.20, 2.20, 2.25, 2.20,
    2.10, 2.10, 2.10, //
    3.00, 2.70, 2.50, 2.40, 2.40, 2.30, 2.30, 2.30, 2.30, 2.30, 2.30, 2.30, 2.30, 2.30, 2.30,
    2.30, 2.50, 2.25, 2.20, 2.10, 2.05, 2.00, 2.00, 2.05, 2.10, 2.05, 2.20, 2.30, 2.30, 2.20,
    2.20, 2.20, //
    3.10, 2.90, 2.40, 2.40, 2.40, 2.30, 2.30, 2.30, 2.30, 2.30, 2.20, 2.20, 2.20, 2.20, 2.20,
    2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20, 2.20,
    2.20, 2.20,
];

// Single-bond covalent radii after P. Pyykkö and M. Atsumi, Chem. Eur. J. 15
// (2009) 186-197.
static COVALENT_RADII: [f64; ELEMENT_COUNT] = [
    0.80, //
    0.32, 0.46, //
    1.33, 1.02, 0.85, 0.75, 0.71, 0.63, 0.64, 0.67, //
    1.55, 1.39, 1.26, 1.16, 1.11, 1.03, 0.99, 0.96, //
    1.96, 1.71, 1.48, 1.36, 1.34, 1.22, 1.19, 1.16, 1.11, 1.10, 1.12, 1.18, 1.24, 1.21, 1.21,
    1.16, 1.14, 1.17, //
    2.10, 1.85, 1.63, 1.54, 1.47, 1.38, 1.28, 1.25, 1.25, 1.20, 1.28, 1.36, 1.42, 1.40, 1.40,
    1.36, 1.33, 1.31, //
    2.32, 1.96, 1.80, 1.63, 1.76, 1.74, 1.73, 1.72, 1.68, 1.69, 1.68, 1.67, 1.66, 1.65, 1.64,
    1.70, 1.62, 1.52, 1.46, 1.37, 1.31, 1.29, 1.22, 1.23, 1.24, 1.33, 1.44, 1.44, 1.51, 1.45,
    1.47, 1.42, //
    2.23, 2.01, 1.86, 1.75, 1.69, 1.70, 1.71, 1.72, 1.66, 1.66, 1.68, 1.68, 1.65, 1.67, 1.73,
    1.76, 1.61, 1.57, 1.49, 1.43, 1.41, 1.34, 1.29, 1.28, 1.21, 1.22, 1.36, 1.43, 1.62, 1.75,
    1.65, 1.57,
];

static BASE_COLORS: [[f32; 3]; ELEMENT_COUNT] = [
    [0.20, 0.50, 1.00], // X
    [1.00, 1.00, 1.00], // H
    [0.72, 0.94, 1.00], // He
    [0.95, 0.75, 0.88], // Li
    [0.62, 0.98, 0.24], // Be
    [0.92, 0.67, 0.72], // B
    [0.50, 0.50, 0.50], // C
    [0.15, 0.28, 1.00], // N
    [1.00, 0.15, 0.15], // O
    [0.82, 1.00, 0.45], // F
    [0.57, 0.92, 1.00], // Ne
    [0.95, 0.54, 0.83], // Na
    [0.37, 0.76, 0.13], // Mg
    [0.81, 0.64, 0.64], // Al
    [0.84, 0.68, 0.57], // Si
    [0.91, 0.45, 0.14], // P
    [0.88, 0.85, 0.29], // S
    [0.21, 0.88, 0.09], // Cl
    [0.34, 0.83, 0.95], // Ar
    [0.88, 0.28, 0.71], // K
    [0.24, 0.62, 0.09], // Ca
    [0.49, 0.59, 0.71], // Sc
    [0.63, 0.63, 0.63], // Ti
    [0.44, 0.44, 0.44], // V
    [0.41, 0.57, 0.82], // Cr
    [0.65, 0.47, 0.62], // Mn
    [0.90, 0.35, 0.20], // Fe
    [0.95, 0.48, 0.63], // Co
    [0.43, 0.80, 0.45], // Ni
    [0.80, 0.52, 0.37], // Cu
    [0.60, 0.71, 0.79], // Zn
    [0.61, 0.48, 0.48], // Ga
    [0.48, 0.58, 0.63], // Ge
    [0.70, 0.47, 0.71], // As
    [0.67, 0.48, 0.10], // Se
    [0.58, 0.14, 0.11], // Br
    [0.08, 0.69, 0.84], // Kr
    [0.74, 0.14, 0.57], // Rb
    [0.15, 0.47, 0.07], // Sr
    [0.50, 0.63, 0.65], // Y
    [0.27, 0.72, 0.80], // Zr
    [0.32, 0.51, 0.54], // Nb
    [0.15, 0.54, 0.44], // Mo
    [0.60, 0.79, 0.45], // Tc
    [0.51, 0.21, 0.21], // Ru
    [0.41, 0.38, 0.73], // Rh
    [0.22, 0.34, 0.37], // Pd
    [1.00, 1.00, 1.00], // Ag
    [0.81, 0.77, 0.61], // Cd
    [0.44, 0.35, 0.35], // In
    [0.33, 0.40, 0.43], // Sn
    [0.61, 0.39, 0.60], // Sb
    [0.50, 0.36, 0.07], // Te
    [0.55, 0.07, 0.55], // I
    [0.06, 0.48, 0.58], // Xe
    [0.52, 0.10, 0.40], // Cs
    [0.06, 0.36, 0.06], // Ba
    [0.27, 0.43, 0.27], // La
    [0.27, 0.43, 0.27], // Ce
    [0.27, 0.43, 0.27], // Pr
    [0.27, 0.43, 0.27], // Nd
    [0.27, 0.43, 0.27], // Pm
    [0.27, 0.43, 0.27], // Sm
    [0.27, 0.43, 0.27], // Eu
    [0.27, 0.43, 0.27], // Gd
    [0.27, 0.43, 0.27], // Tb
    [0.27, 0.43, 0.27], // Dy
    [0.27, 0.43, 0.27], // Ho
    [0.27, 0.43, 0.27], // Er
    [0.27, 0.43, 0.27], // Tm
    [0.27, 0.43, 0.27], // Yb
    [0.27, 0.43, 0.27], // Lu
    [0.11, 0.31, 0.50], // Hf
    [0.11, 0.31, 0.50], // Ta
    [0.25, 0.35, 0.46], // W
    [0.11, 0.31, 0.50], // Re
    [0.04, 0.18, 0.43], // Os
    [0.23, 0.24, 0.44], // Ir
    [0.73, 0.89, 1.00], // Pt
    [1.00, 0.75, 0.34], // Au
    [0.74, 0.74, 0.74], // Hg
    [0.32, 0.25, 0.25], // Tl
    [0.21, 0.25, 0.27], // Pb
    [0.43, 0.24, 0.44], // Bi
    [0.34, 0.25, 0.05], // Po
    [0.38, 0.24, 0.16], // At
    [0.04, 0.32, 0.39], // Rn
    [0.32, 0.06, 0.25], // Fr
    [0.04, 0.23, 0.04], // Ra
    [0.30, 0.29, 0.74], // Ac
    [0.09, 0.49, 0.86], // Th
    [0.30, 0.29, 0.74], // Pa
    [0.10, 0.27, 0.91], // U
    [0.30, 0.29, 0.74], // Np
    [0.30, 0.29, 0.74], // Pu
    [0.30, 0.29, 0.74], // Am
    [0.30, 0.29, 0.74], // Cm
    [0.30, 0.29, 0.74], // Bk
    [0.30, 0.29, 0.74], // Cf
    [0.30, 0.29, 0.74], // Es
    [0.30, 0.29, 0.74], // Fm
    [0.30, 0.29, 0.74], // Md
    [0.30, 0.29, 0.74], // No
    [0.30, 0.29, 0.74], // Lr
    [0.54, 0.14, 0.29], // Rf
    [0.54, 0.14, 0.29], // Db
    [0.54, 0.14, 0.29], // Sg
    [0.54, 0.14, 0.29], // Bh
    [0.54, 0.14, 0.29], // Hs
    [0.54, 0.14, 0.29], // Mt
    [0.54, 0.14, 0.29], // Ds
    [0.54, 0.14, 0.29], // Rg
    [0.54, 0.14, 0.29], // Cn
    [0.25, 0.20, 0.20], // Nh
    [0.14, 0.16, 0.18], // Fl
    [0.27, 0.15, 0.28], // Mc
    [0.17, 0.12, 0.03], // Lv
    [0.25, 0.14, 0.10], // Ts
    [0.03, 0.20, 0.24], // Og
];

fn entry(atomic_number: u32) -> usize {
    let index = atomic_number as usize;
    if index < ELEMENT_COUNT { index } else { 0 }
}

/// Returns the chemical symbol for an atomic number.
///
/// Unknown atomic numbers fall back to the ghost entry `"X"`.
pub fn symbol(atomic_number: u32) -> &'static str {
    SYMBOLS[entry(atomic_number)]
}

/// Resolves a chemical symbol to its atomic number.
///
/// Matching is exact and case-sensitive; `"X"` resolves to the ghost element.
pub fn atomic_number(symbol: &str) -> Option<u32> {
    SYMBOL_NUMBERS.get(symbol).copied()
}

/// Returns the tabulated van der Waals radius in Ångström.
pub fn vdw_radius(atomic_number: u32) -> f64 {
    VDW_RADII[entry(atomic_number)]
}

/// Returns the tabulated single-bond covalent radius in Ångström.
pub fn covalent_radius(atomic_number: u32) -> f64 {
    COVALENT_RADII[entry(atomic_number)]
}

/// Returns the default display color for an element as linear-intent sRGB.
pub fn base_color(atomic_number: u32) -> [f32; 3] {
    BASE_COLORS[entry(atomic_number)]
}

/// Reports whether an element is shaded as a nonmetal (zero metallicity).
pub fn is_nonmetal(atomic_number: u32) -> bool {
    matches!(
        atomic_number,
        0 | 1 | 2 | 5 | 6 | 7 | 8 | 9 | 10 | 14 | 15 | 16 | 17 | 18 | 33 | 34 | 35 | 36 | 52 | 53
            | 54 | 85 | 86
    )
}

#[derive(Debug, Error)]
pub enum RadiusTableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Unknown element symbol '{symbol}' in '{path}'")]
    UnknownElement { path: String, symbol: String },
    #[error("Non-positive radius {radius} for element '{symbol}' in '{path}'")]
    InvalidRadius {
        path: String,
        symbol: String,
        radius: f64,
    },
}

#[derive(Debug, Deserialize)]
struct RadiusRecord {
    symbol: String,
    radius: f64,
}

/// Covalent radii used by bond inference, overridable per element.
///
/// The table starts from the built-in Pyykkö-Atsumi values; individual
/// entries can be replaced programmatically or from a two-column CSV file
/// (`symbol,radius`, radii in Ångström).
#[derive(Debug, Clone)]
pub struct CovalentRadiusTable {
    radii: [f64; ELEMENT_COUNT],
}

impl Default for CovalentRadiusTable {
    fn default() -> Self {
        Self {
            radii: COVALENT_RADII,
        }
    }
}

impl CovalentRadiusTable {
    /// Returns the covalent radius in Ångström for an atomic number.
    ///
    /// Unknown atomic numbers fall back to the ghost entry.
    pub fn radius(&self, atomic_number: u32) -> f64 {
        self.radii[entry(atomic_number)]
    }

    /// Replaces the radius of a single element.
    ///
    /// Unknown atomic numbers are ignored.
    pub fn set_radius(&mut self, atomic_number: u32, radius: f64) {
        let index = atomic_number as usize;
        if index < ELEMENT_COUNT {
            self.radii[index] = radius;
        }
    }

    /// Loads per-element overrides from a CSV file on top of the built-ins.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a record fails to parse,
    /// a symbol is not a known element, or a radius is not positive.
    pub fn load_overrides(path: &Path) -> Result<Self, RadiusTableError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| RadiusTableError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut table = Self::default();
        for result in reader.deserialize::<RadiusRecord>() {
            let record = result.map_err(|e| RadiusTableError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            let number = atomic_number(record.symbol.trim()).ok_or_else(|| {
                RadiusTableError::UnknownElement {
                    path: path.to_string_lossy().to_string(),
                    symbol: record.symbol.clone(),
                }
            })?;
            if record.radius <= 0.0 {
                return Err(RadiusTableError::InvalidRadius {
                    path: path.to_string_lossy().to_string(),
                    symbol: record.symbol.clone(),
                    radius: record.radius,
                });
            }
            table.radii[number as usize] = record.radius;
        }
        Ok(table)
    }
}
