//! # Field Module
//!
//! Scalar-field machinery: point evaluation of wavefunction expansions
//! ([`evaluator`]) and the discretized 3D sample grid ([`grid`]).

pub mod evaluator;
pub mod grid;

pub use evaluator::{FieldEvaluator, FieldTarget};
pub use grid::ScalarField;
