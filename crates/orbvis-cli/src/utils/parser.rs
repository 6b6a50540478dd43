use crate::error::{CliError, Result};
use orbvis::workflows::snapshot::FieldSelection;

/// Parses a comma-separated 'x,y,z' triple of floats.
pub fn parse_triple(text: &str) -> Result<[f64; 3]> {
    let components: Vec<f64> = text
        .split(',')
        .map(|token| token.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| CliError::Argument(format!("expected 'x,y,z', got '{text}'")))?;
    match components.as_slice() {
        &[x, y, z] => Ok([x, y, z]),
        _ => Err(CliError::Argument(format!(
            "expected exactly three components, got '{text}'"
        ))),
    }
}

/// Parses a comma-separated 'nx,ny,nz' triple of positive counts.
pub fn parse_dims(text: &str) -> Result<[usize; 3]> {
    let components: Vec<usize> = text
        .split(',')
        .map(|token| token.trim().parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| CliError::Argument(format!("expected 'nx,ny,nz', got '{text}'")))?;
    match components.as_slice() {
        &[x, y, z] if x > 0 && y > 0 && z > 0 => Ok([x, y, z]),
        &[_, _, _] => Err(CliError::Argument(
            "grid resolution must be positive on every axis".to_string(),
        )),
        _ => Err(CliError::Argument(format!(
            "expected exactly three components, got '{text}'"
        ))),
    }
}

/// Parses the orbital selection: an index, 'homo', 'lumo', or 'density'.
pub fn parse_selection(text: &str) -> Result<FieldSelection> {
    let lowered = text.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "homo" => Ok(FieldSelection::Homo),
        "lumo" => Ok(FieldSelection::Lumo),
        "density" => Ok(FieldSelection::Density),
        other => other
            .parse::<usize>()
            .map(FieldSelection::Orbital)
            .map_err(|_| {
                CliError::Argument(format!(
                    "expected an orbital index, 'homo', 'lumo', or 'density', got '{text}'"
                ))
            }),
    }
}
