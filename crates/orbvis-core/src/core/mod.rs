//! # Core Module
//!
//! Foundational, stateless building blocks of the engine: chemical reference
//! data, molecular and wavefunction models, scalar-field evaluation, rendering
//! primitives, geometric utilities, and wavefunction file I/O.

pub mod data;
pub mod field;
pub mod io;
pub mod models;
pub mod render;
pub mod utils;
