use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading wavefunction and structure file formats.
///
/// Implementors handle format-specific parsing; each declares what it yields
/// (geometry only, a full wavefunction, or a pre-sampled grid) through the
/// associated `Output` type.
pub trait WavefunctionFile {
    /// The parsed result for this format.
    type Output;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads and parses the format from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Output, Self::Error>;

    /// Reads and parses the format from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Output, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
