//! # orbvis Core Library
//!
//! A high-performance library for visualizing molecular structure and electronic
//! structure computed by quantum-chemistry packages: it reconstructs geometry and
//! bonding from wavefunction output, evaluates basis-set expansions over 3D space,
//! and ray-marches the resulting scalar fields into isosurface and volumetric imagery.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Molecule`,
//!   `BasisSet`, `OrbitalStore`), pure numerical machinery (field evaluation,
//!   ray/primitive intersection, shading), and wavefunction file I/O.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the pipeline.
//!   It owns the [`engine::session::Session`] object, render settings, bond inference, the
//!   interchangeable cubemap generation strategies, the field cache, and the frame
//!   rendering task.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It ties
//!   the `engine` and `core` together into complete load-generate-render pipelines
//!   and provides a simple entry point for end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
