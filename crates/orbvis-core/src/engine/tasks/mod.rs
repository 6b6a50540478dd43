//! Long-running engine tasks: bond inference, cubemap generation, and frame
//! rendering. Each task takes read-only snapshots of the model, reports
//! progress through a callback, and is abortable between work batches.

pub mod bonds;
pub mod cubemap;
pub mod frame;
