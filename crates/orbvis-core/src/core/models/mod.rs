//! # Models Module
//!
//! In-memory representations of the loaded chemistry: atoms and the bond graph
//! ([`molecule::Molecule`]), atom-centered basis functions ([`basis`]), and
//! molecular orbitals with their LCAO coefficient vectors ([`orbital`]).

pub mod atom;
pub mod basis;
pub mod molecule;
pub mod orbital;
