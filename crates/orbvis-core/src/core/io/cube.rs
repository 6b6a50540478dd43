use crate::core::data::constants::BOHR_RADIUS_ANGSTROM;
use crate::core::field::grid::ScalarField;
use crate::core::io::traits::WavefunctionFile;
use crate::core::models::molecule::Molecule;
use nalgebra::{Point3, Vector3};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CubeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CubeParseErrorKind,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CubeParseErrorKind {
    #[error("Invalid integer (value: '{value}')")]
    InvalidInt { value: String },
    #[error("Invalid float (value: '{value}')")]
    InvalidFloat { value: String },
    #[error("Grid axes must be axis-aligned")]
    NonAxisAlignedAxes,
    #[error("Not enough data for the declared resolution")]
    TooFewValues,
    #[error("Declared grid of {dims:?} samples is too large to allocate")]
    OversizedGrid { dims: [usize; 3] },
    #[error("File ended inside the header")]
    UnexpectedEnd,
}

/// What a cube file yields: geometry plus, when the file carries one, the
/// pre-sampled volumetric grid.
#[derive(Debug, Clone)]
pub struct CubeData {
    pub molecule: Molecule,
    pub field: Option<ScalarField>,
}

/// Sequential token stream with line numbers for diagnostics.
struct Tokens<'a> {
    tokens: Vec<(usize, &'a str)>,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    fn new(lines: &'a [String], skip_lines: usize) -> Self {
        let tokens = lines
            .iter()
            .enumerate()
            .skip(skip_lines)
            .flat_map(|(index, line)| {
                line.split_whitespace().map(move |token| (index + 1, token))
            })
            .collect();
        Self { tokens, cursor: 0 }
    }

    fn next(&mut self) -> Result<(usize, &'a str), CubeError> {
        let token = self.tokens.get(self.cursor).copied();
        self.cursor += 1;
        token.ok_or(CubeError::Parse {
            line: 0,
            kind: CubeParseErrorKind::UnexpectedEnd,
        })
    }

    fn int(&mut self) -> Result<i64, CubeError> {
        let (line, token) = self.next()?;
        token.parse().map_err(|_| CubeError::Parse {
            line,
            kind: CubeParseErrorKind::InvalidInt {
                value: token.to_string(),
            },
        })
    }

    fn float(&mut self) -> Result<f64, CubeError> {
        let (line, token) = self.next()?;
        token.replace(['D', 'd'], "E").parse().map_err(|_| {
            CubeError::Parse {
                line,
                kind: CubeParseErrorKind::InvalidFloat {
                    value: token.to_string(),
                },
            }
        })
    }
}

/// Reader for Gaussian cube files.
///
/// All header quantities are in atomic units and convert to Å on load. Atoms
/// keep their true Cartesian positions; the grid keeps its own origin, so no
/// re-centering happens. Only axis-aligned grids are supported. A negative
/// atom count marks an orbital-list cube; its geometry loads but the data
/// block is skipped, as the per-orbital layout is not supported.
pub struct CubeFile;

/// Hard cap on declared grid samples, an f32 each. 2^28 samples is 1 GiB,
/// far past any real cube file.
const MAX_GRID_SAMPLES: usize = 1 << 28;

impl WavefunctionFile for CubeFile {
    type Output = CubeData;
    type Error = CubeError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Output, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        // Two comment lines precede the header.
        let mut tokens = Tokens::new(&lines, 2);

        let declared_atoms = tokens.int()?;
        let atom_count = declared_atoms.unsigned_abs() as usize;
        let origin = Point3::new(
            tokens.float()? * BOHR_RADIUS_ANGSTROM,
            tokens.float()? * BOHR_RADIUS_ANGSTROM,
            tokens.float()? * BOHR_RADIUS_ANGSTROM,
        );

        let mut dims = [0usize; 3];
        let mut spacing = Vector3::zeros();
        for axis in 0..3 {
            dims[axis] = tokens.int()?.max(0) as usize;
            let mut step = [0.0; 3];
            for slot in &mut step {
                *slot = tokens.float()? * BOHR_RADIUS_ANGSTROM;
            }
            for (component, &value) in step.iter().enumerate() {
                if component != axis && value.abs() > 1e-9 {
                    return Err(CubeError::Parse {
                        line: 4 + axis,
                        kind: CubeParseErrorKind::NonAxisAlignedAxes,
                    });
                }
            }
            spacing[axis] = step[axis];
        }

        dims[0]
            .checked_mul(dims[1])
            .and_then(|n| n.checked_mul(dims[2]))
            .filter(|&samples| samples <= MAX_GRID_SAMPLES)
            .ok_or(CubeError::Parse {
                line: 6,
                kind: CubeParseErrorKind::OversizedGrid { dims },
            })?;

        let mut molecule = Molecule::new();
        for _ in 0..atom_count {
            let z = tokens.int()?.max(0) as u32;
            let _charge = tokens.float()?;
            let position = Point3::new(
                tokens.float()? * BOHR_RADIUS_ANGSTROM,
                tokens.float()? * BOHR_RADIUS_ANGSTROM,
                tokens.float()? * BOHR_RADIUS_ANGSTROM,
            );
            molecule.add_atom(z, position);
        }

        if declared_atoms < 0 {
            return Ok(CubeData {
                molecule,
                field: None,
            });
        }

        // Cube data is written x-outer, z-inner; the grid stores x fastest.
        // Values convert from a.u. wavefunction amplitude by 1/a₀^1.5.
        let amplitude_norm = BOHR_RADIUS_ANGSTROM.powf(1.5);
        let mut field = ScalarField::zeroed(origin, spacing, dims);
        let (nx, ny, nz) = (dims[0], dims[1], dims[2]);
        for ix in 0..nx {
            for iy in 0..ny {
                for iz in 0..nz {
                    let value = tokens.float().map_err(|error| match error {
                        CubeError::Parse {
                            kind: CubeParseErrorKind::UnexpectedEnd,
                            line,
                        } => CubeError::Parse {
                            line,
                            kind: CubeParseErrorKind::TooFewValues,
                        },
                        other => other,
                    })?;
                    field.set(ix, iy, iz, (value / amplitude_norm) as f32);
                }
            }
        }

        Ok(CubeData {
            molecule,
            field: Some(field),
        })
    }
}
