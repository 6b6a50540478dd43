//! # Engine Module
//!
//! Orchestration around the core machinery: the [`session::Session`] object,
//! the render settings record, bond inference, cubemap generation, frame
//! rendering, the field cache, progress reporting, and cancellation.

pub mod cache;
pub mod cancel;
pub mod error;
pub mod progress;
pub mod properties;
pub mod session;
pub mod settings;
pub mod tasks;
