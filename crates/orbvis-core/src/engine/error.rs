use crate::engine::settings::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Atom index {index} is out of range")]
    AtomNotFound { index: usize },

    #[error("Orbital index {index} is out of range")]
    OrbitalNotFound { index: usize },

    #[error("Atomic number {atomic_number} is beyond the element table")]
    ElementNotFound { atomic_number: u32 },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    #[error(
        "Grid of {samples} samples exceeds the memory ceiling of {limit_bytes} bytes"
    )]
    ResourceExceeded { samples: usize, limit_bytes: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No volumetric field is loaded")]
    NoField,

    #[error("Covalent radius table error: {0}")]
    RadiusTable(#[from] crate::core::data::elements::RadiusTableError),

    #[error("Molden read failed: {0}")]
    Molden(#[from] crate::core::io::molden::MoldenError),

    #[error("WFX read failed: {0}")]
    Wfx(#[from] crate::core::io::wfx::WfxError),

    #[error("XYZ read failed: {0}")]
    Xyz(#[from] crate::core::io::xyz::XyzError),

    #[error("Cube read failed: {0}")]
    Cube(#[from] crate::core::io::cube::CubeError),
}

impl EngineError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            message: message.into(),
        }
    }
}
