/// Bohr radius in Ångström (CODATA 2018).
///
/// All geometry inside the engine is expressed in Ångström; wavefunction
/// formats that store atomic units are converted at the parsing boundary
/// using this factor.
pub const BOHR_RADIUS_ANGSTROM: f64 = 0.529177210903;

/// Occupations smaller than this are treated as zero when accumulating
/// electron density and when locating frontier orbitals.
pub const OCCUPATION_EPSILON: f64 = 1e-3;
