use crate::core::data::constants::BOHR_RADIUS_ANGSTROM;
use crate::core::io::traits::WavefunctionFile;
use crate::core::io::WavefunctionData;
use crate::core::models::basis::{BasisFunction, GaussianPrimitive};
use crate::core::models::orbital::{MolecularOrbital, Spin};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WfxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Missing section <{0}>")]
    MissingSection(String),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: WfxParseErrorKind,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum WfxParseErrorKind {
    #[error("Invalid integer (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Invalid float (value: '{value}')")]
    InvalidFloat { value: String },
    #[error("Value out of range (value: {value}, limit: {limit})")]
    OutOfRange { value: i64, limit: usize },
    #[error("Invalid spin entry")]
    InvalidSpin,
    #[error("Section holds {found} values, expected {expected}")]
    WrongCount { expected: usize, found: usize },
}

fn parse_error(line: usize, kind: WfxParseErrorKind) -> WfxError {
    WfxError::Parse { line, kind }
}

/// One token with the 1-based line it came from.
type Token<'a> = (usize, &'a str);

/// Locates `<tag>` and returns the content line range up to `</tag>`.
fn section_range(lines: &[String], tag: &str) -> Option<(usize, usize)> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = lines.iter().position(|l| l.trim() == open)? + 1;
    let end = lines[start..]
        .iter()
        .position(|l| l.trim() == close)
        .map(|offset| start + offset)
        .unwrap_or(lines.len());
    Some((start, end))
}

/// Whitespace-separated tokens of a section, with line numbers.
fn section_tokens<'a>(lines: &'a [String], tag: &str) -> Result<Vec<Token<'a>>, WfxError> {
    let (start, end) = section_range(lines, tag)
        .ok_or_else(|| WfxError::MissingSection(tag.to_string()))?;
    let mut tokens = Vec::new();
    for (index, line) in lines[start..end].iter().enumerate() {
        for token in line.split_whitespace() {
            tokens.push((start + index + 1, token));
        }
    }
    Ok(tokens)
}

fn parse_ints(tokens: &[Token], expected: usize) -> Result<Vec<i64>, WfxError> {
    check_count(tokens, expected)?;
    tokens
        .iter()
        .map(|&(line, token)| {
            token.parse().map_err(|_| {
                parse_error(
                    line,
                    WfxParseErrorKind::InvalidInt {
                        value: token.to_string(),
                    },
                )
            })
        })
        .collect()
}

fn parse_floats(tokens: &[Token], expected: usize) -> Result<Vec<f64>, WfxError> {
    check_count(tokens, expected)?;
    tokens
        .iter()
        .map(|&(line, token)| {
            token.replace(['D', 'd'], "E").parse().map_err(|_| {
                parse_error(
                    line,
                    WfxParseErrorKind::InvalidFloat {
                        value: token.to_string(),
                    },
                )
            })
        })
        .collect()
}

fn check_count(tokens: &[Token], expected: usize) -> Result<(), WfxError> {
    if tokens.len() != expected {
        let line = tokens.last().map(|&(l, _)| l).unwrap_or(0);
        return Err(parse_error(
            line,
            WfxParseErrorKind::WrongCount {
                expected,
                found: tokens.len(),
            },
        ));
    }
    Ok(())
}

/// Cartesian powers for the 56 WFX primitive types (s through h).
const PRIMITIVE_TYPES: [[u32; 3]; 56] = [
    // s, p
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [0, 0, 1],
    // d, f
    [2, 0, 0],
    [0, 2, 0],
    [0, 0, 2],
    [1, 1, 0],
    [1, 0, 1],
    [0, 1, 1],
    [3, 0, 0],
    [0, 3, 0],
    [0, 0, 3],
    [2, 1, 0],
    [2, 0, 1],
    [0, 2, 1],
    [1, 2, 0],
    [1, 0, 2],
    [0, 1, 2],
    [1, 1, 1],
    // g, h
    [4, 0, 0],
    [0, 4, 0],
    [0, 0, 4],
    [3, 1, 0],
    [3, 0, 1],
    [0, 3, 1],
    [1, 3, 0],
    [1, 0, 3],
    [0, 1, 3],
    [2, 2, 0],
    [2, 0, 2],
    [0, 2, 2],
    [2, 1, 1],
    [1, 2, 1],
    [1, 1, 2],
    [0, 0, 5],
    [0, 1, 4],
    [0, 2, 4],
    [0, 3, 2],
    [0, 4, 1],
    [0, 5, 0],
    [1, 0, 4],
    [1, 1, 3],
    [1, 2, 2],
    [1, 3, 1],
    [1, 4, 0],
    [2, 0, 3],
    [2, 1, 2],
    [2, 2, 1],
    [2, 3, 0],
    [3, 0, 2],
    [3, 1, 1],
    [3, 2, 0],
    [4, 0, 1],
    [4, 1, 0],
    [5, 0, 0],
];

/// Reader for the AIM WFX format.
///
/// WFX stores one uncontracted primitive per basis slot, in atomic units,
/// with the primitive normalization folded into the MO coefficients. On load
/// the exponents convert to Å⁻² and each primitive's coefficient becomes the
/// ratio of the Å-unit to the a.u. normalization constant, which makes the
/// file's coefficients valid against Ångström geometry unchanged.
pub struct WfxFile;

impl WavefunctionFile for WfxFile {
    type Output = WavefunctionData;
    type Error = WfxError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Output, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        let bohr_squared = BOHR_RADIUS_ANGSTROM * BOHR_RADIUS_ANGSTROM;
        let mut data = WavefunctionData::default();

        let atom_count = single_int(&lines, "Number of Nuclei")?;
        let numbers = parse_ints(&section_tokens(&lines, "Atomic Numbers")?, atom_count)?;
        let coordinates = parse_floats(
            &section_tokens(&lines, "Nuclear Cartesian Coordinates")?,
            3 * atom_count,
        )?;
        for (index, chunk) in coordinates.chunks_exact(3).enumerate() {
            let position = Point3::new(
                chunk[0] * BOHR_RADIUS_ANGSTROM,
                chunk[1] * BOHR_RADIUS_ANGSTROM,
                chunk[2] * BOHR_RADIUS_ANGSTROM,
            );
            data.molecule
                .add_atom(numbers[index].max(0) as u32, position);
        }

        let primitive_count = single_int(&lines, "Number of Primitives")?;
        let centers = parse_ints(&section_tokens(&lines, "Primitive Centers")?, primitive_count)?;
        let types = parse_ints(&section_tokens(&lines, "Primitive Types")?, primitive_count)?;
        let exponents = parse_floats(
            &section_tokens(&lines, "Primitive Exponents")?,
            primitive_count,
        )?;

        for index in 0..primitive_count {
            let center = centers[index];
            let atom = data
                .molecule
                .atom((center - 1).max(-1) as usize)
                .ok_or_else(|| {
                    parse_error(
                        0,
                        WfxParseErrorKind::OutOfRange {
                            value: center,
                            limit: atom_count,
                        },
                    )
                })?;

            let kind = types[index];
            if !(1..=56).contains(&kind) {
                return Err(parse_error(
                    0,
                    WfxParseErrorKind::OutOfRange {
                        value: kind,
                        limit: 56,
                    },
                ));
            }
            let powers = PRIMITIVE_TYPES[(kind - 1) as usize];

            let alpha = exponents[index];
            let au_norm = GaussianPrimitive::new(alpha, powers, 1.0).coefficient;
            let mut function = BasisFunction::new(atom.position);
            function.gaussians.push(GaussianPrimitive::new(
                alpha / bohr_squared,
                powers,
                1.0 / au_norm,
            ));
            data.basis.push(function);
        }

        let energies = parse_floats_all(&lines, "Molecular Orbital Energies")?;
        let orbital_count = energies.len();
        let occupations = parse_floats(
            &section_tokens(&lines, "Molecular Orbital Occupation Numbers")?,
            orbital_count,
        )?;
        let spins = parse_spins(&lines, orbital_count)?;

        for index in 0..orbital_count {
            data.orbitals.push(MolecularOrbital {
                label: (index + 1).to_string(),
                energy: energies[index],
                occupation: occupations[index],
                spin: spins[index],
                coefficients: vec![0.0; primitive_count],
            });
        }

        read_coefficients(&lines, &mut data, primitive_count)?;
        Ok(data)
    }
}

fn single_int(lines: &[String], tag: &str) -> Result<usize, WfxError> {
    let tokens = section_tokens(lines, tag)?;
    let values = parse_ints(&tokens, 1)?;
    Ok(values[0].max(0) as usize)
}

fn parse_floats_all(lines: &[String], tag: &str) -> Result<Vec<f64>, WfxError> {
    let tokens = section_tokens(lines, tag)?;
    let count = tokens.len();
    parse_floats(&tokens, count)
}

/// Spin entries: `Alpha`, `Beta`, or `Alpha and Beta` (doubly occupied,
/// treated as the alpha channel).
fn parse_spins(lines: &[String], expected: usize) -> Result<Vec<Spin>, WfxError> {
    let (start, end) = section_range(lines, "Molecular Orbital Spin Types")
        .ok_or_else(|| WfxError::MissingSection("Molecular Orbital Spin Types".to_string()))?;
    let mut spins = Vec::new();
    for (index, line) in lines[start..end].iter().enumerate() {
        let line_no = start + index + 1;
        let mut rest = line.trim();
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("Alpha and Beta") {
                spins.push(Spin::Alpha);
                rest = tail.trim_start();
            } else if let Some(tail) = rest.strip_prefix("Alpha") {
                spins.push(Spin::Alpha);
                rest = tail.trim_start();
            } else if let Some(tail) = rest.strip_prefix("Beta") {
                spins.push(Spin::Beta);
                rest = tail.trim_start();
            } else {
                return Err(parse_error(line_no, WfxParseErrorKind::InvalidSpin));
            }
        }
    }
    if spins.len() != expected {
        return Err(parse_error(
            end,
            WfxParseErrorKind::WrongCount {
                expected,
                found: spins.len(),
            },
        ));
    }
    Ok(spins)
}

/// Fills the per-orbital coefficient vectors from the `<MO Number>` blocks
/// inside the primitive-coefficients section.
fn read_coefficients(
    lines: &[String],
    data: &mut WavefunctionData,
    primitive_count: usize,
) -> Result<(), WfxError> {
    let (start, end) = section_range(lines, "Molecular Orbital Primitive Coefficients")
        .ok_or_else(|| {
            WfxError::MissingSection("Molecular Orbital Primitive Coefficients".to_string())
        })?;

    let mut i = start;
    while i < end {
        if lines[i].trim() != "<MO Number>" {
            i += 1;
            continue;
        }
        let number_line = i + 1;
        let token = lines
            .get(number_line)
            .map(|l| l.trim())
            .unwrap_or_default();
        let number: i64 = token.parse().map_err(|_| {
            parse_error(
                number_line + 1,
                WfxParseErrorKind::InvalidInt {
                    value: token.to_string(),
                },
            )
        })?;
        let orbital = data
            .orbitals
            .get_mut((number - 1).max(-1) as usize)
            .ok_or_else(|| {
                parse_error(
                    number_line + 1,
                    WfxParseErrorKind::OutOfRange {
                        value: number,
                        limit: primitive_count,
                    },
                )
            })?;

        // Skip past "</MO Number>", then read the coefficient block.
        i = number_line + 2;
        let mut filled = 0;
        while i < end && filled < primitive_count {
            let line_no = i + 1;
            for token in lines[i].split_whitespace() {
                if filled >= primitive_count {
                    break;
                }
                let value: f64 = token.replace(['D', 'd'], "E").parse().map_err(|_| {
                    parse_error(
                        line_no,
                        WfxParseErrorKind::InvalidFloat {
                            value: token.to_string(),
                        },
                    )
                })?;
                orbital.coefficients[filled] = value;
                filled += 1;
            }
            i += 1;
        }
        if filled < primitive_count {
            return Err(parse_error(
                i,
                WfxParseErrorKind::WrongCount {
                    expected: primitive_count,
                    found: filled,
                },
            ));
        }
    }
    Ok(())
}
