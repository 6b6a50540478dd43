use crate::core::data::constants::BOHR_RADIUS_ANGSTROM;
use crate::core::io::traits::WavefunctionFile;
use crate::core::io::WavefunctionData;
use crate::core::models::basis::{spherical_gaussians, BasisFunction, GaussianPrimitive, SlaterPrimitive};
use crate::core::models::orbital::{MolecularOrbital, Spin};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoldenError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: MoldenParseErrorKind,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum MoldenParseErrorKind {
    #[error("Invalid integer (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Invalid float (value: '{value}')")]
    InvalidFloat { value: String },
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("Atom number {id} is not defined in [Atoms]")]
    UnknownAtomId { id: u32 },
    #[error("Unsupported shell label '{label}'")]
    UnsupportedShell { label: String },
    #[error("Expected keyword '{keyword}'")]
    ExpectedKeyword { keyword: &'static str },
    #[error("Spin must be Alpha or Beta (value: '{value}')")]
    InvalidSpin { value: String },
    #[error("LCAO coefficient index {index} exceeds the basis set size")]
    CoefficientIndexOutOfBounds { index: usize },
    #[error("File ended inside a definition")]
    UnexpectedEnd,
}

fn parse_error(line: usize, kind: MoldenParseErrorKind) -> MoldenError {
    MoldenError::Parse { line, kind }
}

/// Parses an integer token, 1-based line number for diagnostics.
fn parse_int(token: &str, line: usize) -> Result<i64, MoldenError> {
    token.parse().map_err(|_| {
        parse_error(
            line,
            MoldenParseErrorKind::InvalidInt {
                value: token.to_string(),
            },
        )
    })
}

/// Parses a float token, accepting Fortran 'D' exponents.
fn parse_float(token: &str, line: usize) -> Result<f64, MoldenError> {
    let normalized = token.replace(['D', 'd'], "E");
    normalized.parse().map_err(|_| {
        parse_error(
            line,
            MoldenParseErrorKind::InvalidFloat {
                value: token.to_string(),
            },
        )
    })
}

fn next_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
    line: usize,
) -> Result<&'a str, MoldenError> {
    tokens
        .next()
        .ok_or_else(|| parse_error(line, MoldenParseErrorKind::MissingField { field }))
}

/// The value after a `Key=` prefix, if the line carries it.
fn keyword_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword).map(str::trim)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Search,
    Atoms,
    Gto,
    Sto,
    Mo,
}

#[derive(Debug, Clone, Copy, Default)]
struct SphericalFlags {
    d: bool,
    f: bool,
    g: bool,
}

/// The pure-spherical-harmonics flag lines. `[5D]` and `[5D7F]` switch both d
/// and f shells; `[5D10F]` switches d only.
fn spherical_flags_for(line: &str) -> Option<SphericalFlags> {
    match line {
        "[5D]" | "[5D7F]" => Some(SphericalFlags {
            d: true,
            f: true,
            g: false,
        }),
        "[5D10F]" => Some(SphericalFlags {
            d: true,
            f: false,
            g: false,
        }),
        "[7F]" => Some(SphericalFlags {
            d: false,
            f: true,
            g: false,
        }),
        "[9G]" => Some(SphericalFlags {
            d: false,
            f: false,
            g: true,
        }),
        _ => None,
    }
}

/// Cartesian shell component orders, as Molden writes them.
const CARTESIAN_P: &[[u32; 3]] = &[[1, 0, 0], [0, 1, 0], [0, 0, 1]];
const CARTESIAN_D: &[[u32; 3]] = &[
    [2, 0, 0],
    [0, 2, 0],
    [0, 0, 2],
    [1, 1, 0],
    [1, 0, 1],
    [0, 1, 1],
];
const CARTESIAN_F: &[[u32; 3]] = &[
    [3, 0, 0],
    [0, 3, 0],
    [0, 0, 3],
    [1, 2, 0],
    [2, 1, 0],
    [2, 0, 1],
    [1, 0, 2],
    [0, 1, 2],
    [0, 2, 1],
    [1, 1, 1],
];
const CARTESIAN_G: &[[u32; 3]] = &[
    [4, 0, 0],
    [0, 4, 0],
    [0, 0, 4],
    [3, 1, 0],
    [3, 0, 1],
    [1, 3, 0],
    [0, 3, 1],
    [1, 0, 3],
    [0, 1, 3],
    [2, 2, 0],
    [2, 0, 2],
    [0, 2, 2],
    [2, 1, 1],
    [1, 2, 1],
    [1, 1, 2],
];

/// Spherical shell component orders (m values), as Molden writes them.
const SPHERICAL_D: &[i32] = &[0, 1, -1, 2, -2];
const SPHERICAL_F: &[i32] = &[0, 1, -1, 2, -2, 3, -3];
const SPHERICAL_G: &[i32] = &[0, 1, -1, 2, -2, 3, -3, 4, -4];

/// Appends the basis functions of one contracted shell, in component order.
///
/// `contractions` are (exponent in Å⁻², coefficient) pairs. Spherical
/// components expand into their Cartesian combinations; Cartesian components
/// get one normalized primitive per contraction.
fn expand_shell(
    data: &mut WavefunctionData,
    contractions: &[(f64, f64)],
    l: u32,
    flags: SphericalFlags,
    center: Point3<f64>,
) {
    let spherical = match l {
        2 => flags.d,
        3 => flags.f,
        4 => flags.g,
        _ => false,
    };

    if spherical {
        let order = match l {
            2 => SPHERICAL_D,
            3 => SPHERICAL_F,
            _ => SPHERICAL_G,
        };
        for &m in order {
            let mut function = BasisFunction::new(center);
            for &(alpha, c) in contractions {
                let mut primitives = spherical_gaussians(alpha, l as i32, m);
                for p in &mut primitives {
                    p.coefficient *= c;
                }
                function.gaussians.extend(primitives);
            }
            data.basis.push(function);
        }
    } else {
        let components: &[[u32; 3]] = match l {
            0 => &[[0, 0, 0]],
            1 => CARTESIAN_P,
            2 => CARTESIAN_D,
            3 => CARTESIAN_F,
            _ => CARTESIAN_G,
        };
        for &powers in components {
            let mut function = BasisFunction::new(center);
            for &(alpha, c) in contractions {
                function
                    .gaussians
                    .push(GaussianPrimitive::new(alpha, powers, c));
            }
            data.basis.push(function);
        }
    }
}

/// Reader for the Molden file format.
///
/// Recognized sections: `[Atoms]` (with the `AU` unit flag), `[GTO]`, `[STO]`,
/// and `[MO]`; the `[5D]`-family flags toggle spherical shell expansion
/// wherever they appear in the file. Positions in atomic units and Gaussian
/// exponents (always bohr⁻²) convert to Å on load. Orbital energies stay in
/// the unit the file uses.
pub struct MoldenFile;

impl WavefunctionFile for MoldenFile {
    type Output = WavefunctionData;
    type Error = MoldenError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Output, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

        // Flags apply file-wide, so collect them before parsing any shell.
        let mut flags = SphericalFlags::default();
        for line in &lines {
            if let Some(found) = spherical_flags_for(line.trim()) {
                flags.d |= found.d;
                flags.f |= found.f;
                flags.g |= found.g;
            }
        }

        let bohr_squared = BOHR_RADIUS_ANGSTROM * BOHR_RADIUS_ANGSTROM;
        let mut data = WavefunctionData::default();
        let mut positions: HashMap<u32, Point3<f64>> = HashMap::new();
        let mut section = Section::Search;
        let mut atomic_units = false;
        let mut i = 0;

        while i < lines.len() {
            let line_no = i + 1;
            let trimmed = lines[i].trim();

            if trimmed.is_empty() {
                i += 1;
                continue;
            }

            if trimmed.starts_with('[') {
                if spherical_flags_for(trimmed).is_some() {
                    // Already collected.
                } else if let Some(rest) = keyword_value(trimmed, "[Atoms]") {
                    section = Section::Atoms;
                    atomic_units = rest.starts_with("AU");
                } else if trimmed.starts_with("[GTO]") {
                    section = Section::Gto;
                } else if trimmed.starts_with("[STO]") {
                    section = Section::Sto;
                } else if trimmed.starts_with("[MO]") {
                    section = Section::Mo;
                } else {
                    section = Section::Search;
                }
                i += 1;
                continue;
            }

            match section {
                Section::Search => {
                    i += 1;
                }
                Section::Atoms => {
                    let mut tokens = trimmed.split_whitespace();
                    let _element = next_token(&mut tokens, "element name", line_no)?;
                    let id = parse_int(next_token(&mut tokens, "atom number", line_no)?, line_no)?;
                    let z = parse_int(next_token(&mut tokens, "atomic number", line_no)?, line_no)?;
                    let x = parse_float(next_token(&mut tokens, "x", line_no)?, line_no)?;
                    let y = parse_float(next_token(&mut tokens, "y", line_no)?, line_no)?;
                    let z_coord = parse_float(next_token(&mut tokens, "z", line_no)?, line_no)?;

                    let scale = if atomic_units {
                        BOHR_RADIUS_ANGSTROM
                    } else {
                        1.0
                    };
                    let position = Point3::new(x * scale, y * scale, z_coord * scale);
                    let index = data.molecule.add_atom(z.max(0) as u32, position);
                    data.molecule.record_file_id(id.max(0) as u32, index);
                    positions.insert(id.max(0) as u32, position);
                    i += 1;
                }
                Section::Gto => {
                    let mut tokens = trimmed.split_whitespace();
                    let id = parse_int(next_token(&mut tokens, "atom number", line_no)?, line_no)?
                        .max(0) as u32;
                    let center = *positions.get(&id).ok_or_else(|| {
                        parse_error(line_no, MoldenParseErrorKind::UnknownAtomId { id })
                    })?;
                    i += 1;

                    // Shells until the blank line that ends this atom's block.
                    while i < lines.len() {
                        let shell_line_no = i + 1;
                        let shell_line = lines[i].trim();
                        if shell_line.is_empty() {
                            i += 1;
                            break;
                        }
                        if shell_line.starts_with('[') {
                            break;
                        }

                        let mut tokens = shell_line.split_whitespace();
                        let label = next_token(&mut tokens, "shell label", shell_line_no)?;
                        let l = match label {
                            "s" | "S" => 0,
                            "p" | "P" => 1,
                            "d" | "D" => 2,
                            "f" | "F" => 3,
                            "g" | "G" => 4,
                            other => {
                                return Err(parse_error(
                                    shell_line_no,
                                    MoldenParseErrorKind::UnsupportedShell {
                                        label: other.to_string(),
                                    },
                                ));
                            }
                        };
                        let count = parse_int(
                            next_token(&mut tokens, "primitive count", shell_line_no)?,
                            shell_line_no,
                        )?
                        .max(0) as usize;
                        i += 1;

                        let mut contractions = Vec::with_capacity(count);
                        for _ in 0..count {
                            let line_no = i + 1;
                            let primitive = lines.get(i).map(|l| l.trim()).ok_or_else(|| {
                                parse_error(line_no, MoldenParseErrorKind::UnexpectedEnd)
                            })?;
                            let mut tokens = primitive.split_whitespace();
                            let alpha = parse_float(
                                next_token(&mut tokens, "exponent", line_no)?,
                                line_no,
                            )?;
                            let c = parse_float(
                                next_token(&mut tokens, "contraction coefficient", line_no)?,
                                line_no,
                            )?;
                            contractions.push((alpha / bohr_squared, c));
                            i += 1;
                        }
                        expand_shell(&mut data, &contractions, l, flags, center);
                    }
                }
                Section::Sto => {
                    let mut tokens = trimmed.split_whitespace();
                    let id = parse_int(next_token(&mut tokens, "atom number", line_no)?, line_no)?
                        .max(0) as u32;
                    let kx = parse_int(next_token(&mut tokens, "kx", line_no)?, line_no)?;
                    let ky = parse_int(next_token(&mut tokens, "ky", line_no)?, line_no)?;
                    let kz = parse_int(next_token(&mut tokens, "kz", line_no)?, line_no)?;
                    let kr = parse_int(next_token(&mut tokens, "kr", line_no)?, line_no)?;
                    let alpha =
                        parse_float(next_token(&mut tokens, "exponent", line_no)?, line_no)?;
                    let coeff =
                        parse_float(next_token(&mut tokens, "coefficient", line_no)?, line_no)?;

                    let center = *positions.get(&id).ok_or_else(|| {
                        parse_error(line_no, MoldenParseErrorKind::UnknownAtomId { id })
                    })?;
                    let mut function = BasisFunction::new(center);
                    function.slaters.push(SlaterPrimitive::new(
                        alpha,
                        kr.max(0) as u32,
                        [kx.max(0) as u32, ky.max(0) as u32, kz.max(0) as u32],
                        coeff,
                    ));
                    data.basis.push(function);
                    i += 1;
                }
                Section::Mo => {
                    let label = keyword_value(trimmed, "Sym=")
                        .ok_or_else(|| {
                            parse_error(
                                line_no,
                                MoldenParseErrorKind::ExpectedKeyword { keyword: "Sym=" },
                            )
                        })?
                        .to_string();

                    let read_keyword_line =
                        |i: usize, keyword: &'static str| -> Result<(usize, String), MoldenError> {
                            let line_no = i + 1;
                            let line = lines.get(i).map(|l| l.trim()).ok_or_else(|| {
                                parse_error(line_no, MoldenParseErrorKind::UnexpectedEnd)
                            })?;
                            let value = keyword_value(line, keyword).ok_or_else(|| {
                                parse_error(
                                    line_no,
                                    MoldenParseErrorKind::ExpectedKeyword { keyword },
                                )
                            })?;
                            Ok((line_no, value.to_string()))
                        };

                    let (energy_line, energy) = read_keyword_line(i + 1, "Ene=")?;
                    let energy = parse_float(&energy, energy_line)?;
                    let (spin_line, spin) = read_keyword_line(i + 2, "Spin=")?;
                    let spin = Spin::parse(&spin).ok_or_else(|| {
                        parse_error(spin_line, MoldenParseErrorKind::InvalidSpin { value: spin })
                    })?;
                    let (occup_line, occupation) = read_keyword_line(i + 3, "Occup=")?;
                    let occupation = parse_float(&occupation, occup_line)?;
                    i += 4;

                    // Sparse LCAO coefficient lines: "index value", 1-based.
                    let mut coefficients = vec![0.0; data.basis.len()];
                    while i < lines.len() {
                        let line_no = i + 1;
                        let line = lines[i].trim();
                        if !line.starts_with(|c: char| c.is_ascii_digit()) {
                            break;
                        }
                        let mut tokens = line.split_whitespace();
                        let index =
                            parse_int(next_token(&mut tokens, "AO index", line_no)?, line_no)?;
                        let value = parse_float(
                            next_token(&mut tokens, "LCAO coefficient", line_no)?,
                            line_no,
                        )?;
                        let slot = (index - 1).max(-1) as usize;
                        let target = coefficients.get_mut(slot).ok_or_else(|| {
                            parse_error(
                                line_no,
                                MoldenParseErrorKind::CoefficientIndexOutOfBounds {
                                    index: index.max(0) as usize,
                                },
                            )
                        })?;
                        *target = value;
                        i += 1;
                    }

                    data.orbitals.push(MolecularOrbital {
                        label,
                        energy,
                        occupation,
                        spin,
                        coefficients,
                    });
                }
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TOLERANCE: f64 = 1e-12;

    fn parse(text: &str) -> Result<WavefunctionData, MoldenError> {
        MoldenFile::read_from(&mut Cursor::new(text))
    }

    fn water_fragment() -> String {
        "[Molden Format]\n\
         [Atoms] Angs\n\
         O 1 8 0.0 0.0 0.0\n\
         H 2 1 0.0 0.0 0.96\n\
         [GTO]\n\
         1 0\n\
         s 2 1.00\n\
         1.0 0.6\n\
         0.3 0.5\n\
         p 1 1.00\n\
         0.8 1.0\n\
         \n\
         2 0\n\
         s 1 1.00\n\
         0.5 1.0\n\
         \n\
         [MO]\n\
         Sym= A1\n\
         Ene= -0.5\n\
         Spin= Alpha\n\
         Occup= 2.0\n\
         1 0.9\n\
         5 -0.2\n"
            .to_string()
    }

    #[test]
    fn atoms_and_file_ids_load() {
        let data = parse(&water_fragment()).unwrap();
        assert_eq!(data.molecule.atom_count(), 2);
        assert_eq!(data.molecule.atom(0).unwrap().atomic_number, 8);
        assert_eq!(data.molecule.resolve_file_id(2), Some(1));
        assert!(
            (data.molecule.atom(1).unwrap().position.z - 0.96).abs() < TOLERANCE
        );
    }

    #[test]
    fn atomic_unit_positions_scale_to_angstrom() {
        let text = "[Atoms] AU\nO 1 8 0.0 0.0 2.0\n";
        let data = parse(text).unwrap();
        let z = data.molecule.atom(0).unwrap().position.z;
        assert!((z - 2.0 * BOHR_RADIUS_ANGSTROM).abs() < TOLERANCE);
    }

    #[test]
    fn shells_expand_in_component_order() {
        let data = parse(&water_fragment()).unwrap();
        // s + (px, py, pz) on oxygen, s on hydrogen.
        assert_eq!(data.basis.len(), 5);
        assert_eq!(data.basis.get(0).unwrap().gaussians.len(), 2);
        assert_eq!(data.basis.get(1).unwrap().gaussians[0].powers, [1, 0, 0]);
        assert_eq!(data.basis.get(2).unwrap().gaussians[0].powers, [0, 1, 0]);
        assert_eq!(data.basis.get(3).unwrap().gaussians[0].powers, [0, 0, 1]);
        assert_eq!(data.basis.get(4).unwrap().center.z, 0.96);
    }

    #[test]
    fn gaussian_exponents_convert_from_bohr() {
        let data = parse(&water_fragment()).unwrap();
        let alpha = data.basis.get(0).unwrap().gaussians[0].exponent;
        let expected = 1.0 / (BOHR_RADIUS_ANGSTROM * BOHR_RADIUS_ANGSTROM);
        assert!((alpha - expected).abs() < 1e-9);
    }

    #[test]
    fn sparse_mo_coefficients_fill_the_right_slots() {
        let data = parse(&water_fragment()).unwrap();
        assert_eq!(data.orbitals.len(), 1);
        let mo = data.orbitals.get(0).unwrap();
        assert_eq!(mo.label, "A1");
        assert_eq!(mo.spin, Spin::Alpha);
        assert!((mo.energy + 0.5).abs() < TOLERANCE);
        assert!((mo.occupation - 2.0).abs() < TOLERANCE);
        assert_eq!(mo.coefficients, vec![0.9, 0.0, 0.0, 0.0, -0.2]);
    }

    #[test]
    fn five_d_flag_switches_d_shells_to_spherical() {
        let text = "[Atoms] Angs\n\
                    C 1 6 0.0 0.0 0.0\n\
                    [5D]\n\
                    [GTO]\n\
                    1 0\n\
                    d 1 1.00\n\
                    1.0 1.0\n\
                    \n";
        let data = parse(text).unwrap();
        assert_eq!(data.basis.len(), 5);
        // The m = 0 component mixes three Cartesians.
        assert_eq!(data.basis.get(0).unwrap().gaussians.len(), 3);
        let cartesian = parse(&text.replace("[5D]\n", "")).unwrap();
        assert_eq!(cartesian.basis.len(), 6);
    }

    #[test]
    fn sto_definitions_load_verbatim() {
        let text = "[Atoms] Angs\n\
                    He 1 2 0.0 0.0 0.0\n\
                    [STO]\n\
                    1 0 0 1 2 1.5 0.75\n";
        let data = parse(text).unwrap();
        assert_eq!(data.basis.len(), 1);
        let sto = data.basis.get(0).unwrap().slaters[0];
        assert_eq!(sto.powers, [0, 0, 1]);
        assert_eq!(sto.radial_power, 2);
        assert!((sto.exponent - 1.5).abs() < TOLERANCE);
        assert!((sto.coefficient - 0.75).abs() < TOLERANCE);
    }

    #[test]
    fn sp_shells_are_rejected() {
        let text = "[Atoms] Angs\n\
                    C 1 6 0.0 0.0 0.0\n\
                    [GTO]\n\
                    1 0\n\
                    sp 2 1.00\n\
                    1.0 0.5 0.5\n";
        match parse(text) {
            Err(MoldenError::Parse {
                kind: MoldenParseErrorKind::UnsupportedShell { label },
                ..
            }) => assert_eq!(label, "sp"),
            other => panic!("expected unsupported shell error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_gto_atom_number_is_an_error() {
        let text = "[Atoms] Angs\n\
                    C 1 6 0.0 0.0 0.0\n\
                    [GTO]\n\
                    7 0\n\
                    s 1 1.00\n\
                    1.0 1.0\n";
        match parse(text) {
            Err(MoldenError::Parse {
                kind: MoldenParseErrorKind::UnknownAtomId { id },
                ..
            }) => assert_eq!(id, 7),
            other => panic!("expected unknown atom error, got {other:?}"),
        }
    }

    #[test]
    fn coefficient_index_out_of_bounds_is_an_error() {
        let mut text = water_fragment();
        text.push_str("Sym= A2\nEne= 0.1\nSpin= Beta\nOccup= 0.0\n9 1.0\n");
        assert!(matches!(
            parse(&text),
            Err(MoldenError::Parse {
                kind: MoldenParseErrorKind::CoefficientIndexOutOfBounds { .. },
                ..
            })
        ));
    }
}
