//! # Data Module
//!
//! Static chemical reference data and physical constants: element symbols,
//! covalent and van der Waals radii, default display colors, and the unit
//! conversion factors used at the parsing boundary.

pub mod constants;
pub mod elements;
