use crate::core::data::elements;
use crate::core::io::traits::WavefunctionFile;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: XyzParseErrorKind,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count (value: '{value}')")]
    InvalidCount { value: String },
    #[error("Invalid coordinate (value: '{value}')")]
    InvalidCoordinate { value: String },
    #[error("Atom line is incomplete")]
    IncompleteAtom,
    #[error("File is too short for an XYZ header")]
    MissingHeader,
}

/// Reader for plain XYZ structure files.
///
/// Line one is the atom count, line two a comment; atom lines follow as
/// `symbol x y z` in Å. Reading stops at the first line that does not start
/// with an element-like symbol, so trailing trajectory frames are ignored.
/// Unrecognized symbols load as ghost centers.
pub struct XyzFile;

impl WavefunctionFile for XyzFile {
    type Output = Molecule;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Output, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        if lines.len() < 3 {
            return Err(XyzError::Parse {
                line: lines.len(),
                kind: XyzParseErrorKind::MissingHeader,
            });
        }

        let count_token = lines[0].trim();
        let declared: usize = count_token.parse().map_err(|_| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidCount {
                value: count_token.to_string(),
            },
        })?;

        let mut molecule = Molecule::new();
        for (index, line) in lines.iter().enumerate().skip(2) {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
                break;
            }

            let mut tokens = trimmed.split_whitespace();
            let symbol = tokens.next().ok_or(XyzError::Parse {
                line: line_no,
                kind: XyzParseErrorKind::IncompleteAtom,
            })?;
            let atomic_number = elements::atomic_number(symbol).unwrap_or(elements::GHOST);

            let mut coordinates = [0.0; 3];
            for slot in &mut coordinates {
                let token = tokens.next().ok_or(XyzError::Parse {
                    line: line_no,
                    kind: XyzParseErrorKind::IncompleteAtom,
                })?;
                *slot = token.parse().map_err(|_| XyzError::Parse {
                    line: line_no,
                    kind: XyzParseErrorKind::InvalidCoordinate {
                        value: token.to_string(),
                    },
                })?;
            }

            molecule.add_atom(
                atomic_number,
                Point3::new(coordinates[0], coordinates[1], coordinates[2]),
            );
            if molecule.atom_count() == declared {
                break;
            }
        }

        Ok(molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Molecule, XyzError> {
        XyzFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn water_loads_with_symbols_resolved() {
        let text = "3\nwater\nO 0.0 0.0 0.0\nH 0.0 0.76 0.59\nH 0.0 -0.76 0.59\n";
        let molecule = parse(text).unwrap();
        assert_eq!(molecule.atom_count(), 3);
        assert_eq!(molecule.atom(0).unwrap().atomic_number, 8);
        assert_eq!(molecule.atom(1).unwrap().atomic_number, 1);
        assert!((molecule.atom(2).unwrap().position.y + 0.76).abs() < 1e-12);
    }

    #[test]
    fn unknown_symbols_become_ghost_atoms() {
        let text = "1\ncomment\nQq 1.0 2.0 3.0\n";
        let molecule = parse(text).unwrap();
        assert!(molecule.atom(0).unwrap().is_ghost());
    }

    #[test]
    fn reading_stops_after_the_declared_count() {
        let text = "1\nframe 1\nH 0.0 0.0 0.0\nH 0.0 0.0 1.0\n";
        let molecule = parse(text).unwrap();
        assert_eq!(molecule.atom_count(), 1);
    }

    #[test]
    fn invalid_headers_are_rejected() {
        assert!(matches!(
            parse("H 0 0 0\n"),
            Err(XyzError::Parse {
                kind: XyzParseErrorKind::MissingHeader,
                ..
            })
        ));
        assert!(matches!(
            parse("abc\ncomment\nH 0 0 0\n"),
            Err(XyzError::Parse {
                kind: XyzParseErrorKind::InvalidCount { .. },
                ..
            })
        ));
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        let text = "1\ncomment\nH 0.0 zero 0.0\n";
        assert!(matches!(
            parse(text),
            Err(XyzError::Parse {
                line: 3,
                kind: XyzParseErrorKind::InvalidCoordinate { .. },
            })
        ));
    }
}
