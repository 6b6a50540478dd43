//! # Workflows Module
//!
//! High-level entry points tying the `core` and `engine` layers into complete
//! pipelines. A workflow owns its session internally: callers hand it a file
//! path and configuration and get back a finished artifact.
//!
//! - **Snapshot** ([`snapshot`]) - the full load, generate, render pipeline
//!   producing one frame of a model, with automatic camera framing when no
//!   explicit camera is given.
//! - **Inspection** ([`inspect`]) - loads a file and summarizes its contents
//!   (atoms, bonds, orbital table) without rendering anything.

pub mod inspect;
pub mod snapshot;

use std::path::Path;

use crate::engine::error::EngineError;
use crate::engine::session::Session;

/// The wavefunction and structure formats the workflows recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Molden,
    Wfx,
    Xyz,
    Cube,
}

impl InputFormat {
    /// Guesses the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "molden" | "mold" => Some(InputFormat::Molden),
            "wfx" => Some(InputFormat::Wfx),
            "xyz" => Some(InputFormat::Xyz),
            "cube" | "cub" => Some(InputFormat::Cube),
            _ => None,
        }
    }
}

/// Loads `path` into the session, guessing the format from the extension when
/// none is given explicitly.
///
/// # Errors
///
/// Fails with `InvalidArgument` for an unrecognizable extension and with the
/// format's parse error on malformed input.
pub(crate) fn load_model(
    session: &mut Session,
    path: &Path,
    format: Option<InputFormat>,
) -> Result<InputFormat, EngineError> {
    let format = format
        .or_else(|| InputFormat::from_path(path))
        .ok_or_else(|| {
            EngineError::invalid_argument(format!(
                "cannot guess the input format of '{}'; specify it explicitly",
                path.display()
            ))
        })?;
    match format {
        InputFormat::Molden => session.load_molden_path(path)?,
        InputFormat::Wfx => session.load_wfx_path(path)?,
        InputFormat::Xyz => session.load_xyz_path(path)?,
        InputFormat::Cube => session.load_cube_path(path)?,
    }
    Ok(format)
}
