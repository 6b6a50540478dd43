//! # IO Module
//!
//! Wavefunction file loaders: Molden, AIM WFX, plain XYZ, and Gaussian cube.
//! Each format has its own parser module with a typed error enum; all of them
//! implement the [`traits::WavefunctionFile`] interface. Parsers convert every
//! quantity to the engine's internal units (Ångström) on load.

pub mod cube;
pub mod molden;
pub mod traits;
pub mod wfx;
pub mod xyz;

use crate::core::models::basis::BasisSet;
use crate::core::models::molecule::Molecule;
use crate::core::models::orbital::OrbitalStore;

/// Everything a wavefunction format yields: geometry, basis set, and the
/// molecular orbitals expanded over it.
#[derive(Debug, Clone, Default)]
pub struct WavefunctionData {
    pub molecule: Molecule,
    pub basis: BasisSet,
    pub orbitals: OrbitalStore,
}
