use std::path::Path;

use tracing::instrument;

use super::{load_model, InputFormat};
use crate::core::models::orbital::Spin;
use crate::engine::error::EngineError;
use crate::engine::session::Session;

/// One row of the orbital table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalSummary {
    pub index: usize,
    pub label: String,
    pub energy: f64,
    pub occupation: f64,
    pub spin: Spin,
}

/// What a loaded file contains, without rendering anything.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub format: InputFormat,
    pub atoms: usize,
    pub bonds: usize,
    pub orbitals: Vec<OrbitalSummary>,
    pub homo: Option<usize>,
    pub lumo: Option<usize>,
    /// Whether the file carried a pre-sampled grid (cube input).
    pub has_field: bool,
}

/// Loads `path` and summarizes the model.
///
/// # Errors
///
/// Fails with `InvalidArgument` for an unrecognizable format and with the
/// format's parse error on malformed input.
#[instrument(skip_all, name = "inspect_workflow", fields(path = %path.display()))]
pub fn run(path: &Path, format: Option<InputFormat>) -> Result<ModelSummary, EngineError> {
    let mut session = Session::new();
    let format = load_model(&mut session, path, format)?;

    let orbitals = (0..session.mo_count())
        .map(|index| {
            let orbital = session.mo_info(index)?;
            Ok(OrbitalSummary {
                index,
                label: orbital.label.clone(),
                energy: orbital.energy,
                occupation: orbital.occupation,
                spin: orbital.spin,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let homo = session
        .homo(Spin::Alpha)
        .into_iter()
        .chain(session.homo(Spin::Beta))
        .max();

    Ok(ModelSummary {
        format,
        atoms: session.atom_count(),
        bonds: session.bonds().len(),
        orbitals,
        homo,
        lumo: session.lumo(),
        has_field: session.current_field().is_some(),
    })
}
