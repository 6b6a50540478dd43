//! # Utils Module
//!
//! Small geometric helpers shared across the engine.

pub mod geometry;
