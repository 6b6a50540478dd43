use crate::core::field::evaluator::{finite_or_zero, FieldEvaluator, FieldTarget};
use crate::core::field::grid::ScalarField;
use crate::core::models::basis::BasisSet;
use crate::core::models::molecule::Molecule;
use crate::core::models::orbital::OrbitalStore;
use crate::engine::cancel::CancelToken;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{Point3, Vector3};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default ceiling on generated grids: 2 GiB of f32 samples.
pub const DEFAULT_MEMORY_CEILING_BYTES: usize = 2 << 30;

/// Grids below this per-axis sample count lose the isosurface entirely.
const MIN_AXIS_SAMPLES: usize = 4;

/// The sampling lattice of one cubemap: where sample (0, 0, 0) sits, the
/// per-axis step, and the per-axis count. Samples lie at cell centers of the
/// covered box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub origin: Point3<f64>,
    pub spacing: Vector3<f64>,
    pub dims: [usize; 3],
}

impl GridSpec {
    /// Derives the lattice from the model: the atom bounding box expanded by
    /// `clearance` on every side, sampled at `density` points per Å with a
    /// floor of four samples per axis.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for an empty model.
    pub fn derive(
        molecule: &Molecule,
        clearance: f64,
        density: f64,
    ) -> Result<Self, EngineError> {
        let (min, max) = Self::padded_bounds(molecule, clearance)?;
        let extent = max - min;
        let dims = [
            ((extent.x * density) as usize).max(MIN_AXIS_SAMPLES),
            ((extent.y * density) as usize).max(MIN_AXIS_SAMPLES),
            ((extent.z * density) as usize).max(MIN_AXIS_SAMPLES),
        ];
        Ok(Self::over_bounds(min, max, dims))
    }

    /// Builds the lattice over the same padded bounding box but with an
    /// explicit per-axis resolution.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for an empty model or a zero count.
    pub fn with_resolution(
        molecule: &Molecule,
        clearance: f64,
        dims: [usize; 3],
    ) -> Result<Self, EngineError> {
        if dims.iter().any(|&n| n == 0) {
            return Err(EngineError::invalid_argument(
                "cubemap resolution must be positive on every axis",
            ));
        }
        let (min, max) = Self::padded_bounds(molecule, clearance)?;
        Ok(Self::over_bounds(min, max, dims))
    }

    fn padded_bounds(
        molecule: &Molecule,
        clearance: f64,
    ) -> Result<(Point3<f64>, Point3<f64>), EngineError> {
        let (min, max) = molecule.bounding_box().ok_or_else(|| {
            EngineError::invalid_argument("cannot derive a sampling grid for an empty model")
        })?;
        let pad = Vector3::repeat(clearance);
        Ok((min - pad, max + pad))
    }

    fn over_bounds(min: Point3<f64>, max: Point3<f64>, dims: [usize; 3]) -> Self {
        let extent = max - min;
        let spacing = Vector3::new(
            extent.x / dims[0] as f64,
            extent.y / dims[1] as f64,
            extent.z / dims[2] as f64,
        );
        Self {
            origin: min + 0.5 * spacing,
            spacing,
            dims,
        }
    }

    pub fn samples(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }
}

/// One way of filling a grid from the wavefunction. The two implementations
/// mirror the CPU and GPU formulations of the original renderer and must
/// agree within floating-point tolerance; the session picks one from the
/// `cubemap_use_gpu` setting.
pub trait CubemapStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Fills `field` with the target and returns the number of degenerate
    /// (non-finite, clamped to zero) samples encountered.
    fn fill(
        &self,
        basis: &BasisSet,
        orbitals: &OrbitalStore,
        target: FieldTarget,
        field: &mut ScalarField,
        slab_depth: usize,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<u64, EngineError>;
}

/// Point-major path: every grid point evaluates the full target through the
/// field evaluator.
pub struct PointMajorStrategy;

/// Primitive-major path, the formulation a rasterizing GPU uses: zero the
/// grid, then accumulate each basis function over the pruned neighborhood of
/// its support radius. Accumulation runs in f64 scratch so both strategies
/// sum identical terms in identical order.
pub struct BatchedStrategy;

/// Selects the strategy for the `cubemap_use_gpu` flag.
pub fn strategy_for(use_batched: bool) -> &'static dyn CubemapStrategy {
    if use_batched {
        &BatchedStrategy
    } else {
        &PointMajorStrategy
    }
}

impl CubemapStrategy for PointMajorStrategy {
    fn name(&self) -> &'static str {
        "point-major"
    }

    fn fill(
        &self,
        basis: &BasisSet,
        orbitals: &OrbitalStore,
        target: FieldTarget,
        field: &mut ScalarField,
        slab_depth: usize,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<u64, EngineError> {
        let evaluator = FieldEvaluator::new(basis, orbitals);
        let origin = field.origin();
        let spacing = field.spacing();
        let [nx, ny, _] = field.dims();
        let slab_len = nx * ny * slab_depth.max(1);
        let degenerate = AtomicU64::new(0);

        let slabs: Vec<(usize, &mut [f32])> =
            field.data_mut().chunks_mut(slab_len).enumerate().collect();
        reporter.report(Progress::TaskStart {
            total: slabs.len() as u64,
        });

        #[cfg(feature = "parallel")]
        let slab_iter = slabs.into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let slab_iter = slabs.into_iter();

        slab_iter.try_for_each(|(slab, data)| -> Result<(), EngineError> {
            cancel.check()?;
            let base = slab * slab_len;
            for (offset, sample) in data.iter_mut().enumerate() {
                let flat = base + offset;
                let iz = flat / (nx * ny);
                let iy = flat % (nx * ny) / nx;
                let ix = flat % nx;
                let point = Point3::new(
                    origin.x + ix as f64 * spacing.x,
                    origin.y + iy as f64 * spacing.y,
                    origin.z + iz as f64 * spacing.z,
                );
                let value = evaluator.evaluate(target, &point).unwrap_or(0.0);
                let (value, clamped) = finite_or_zero(value);
                if clamped {
                    degenerate.fetch_add(1, Ordering::Relaxed);
                }
                *sample = value as f32;
            }
            reporter.report(Progress::TaskIncrement { amount: 1 });
            Ok(())
        })?;

        reporter.report(Progress::TaskFinish);
        Ok(degenerate.load(Ordering::Relaxed))
    }
}

impl CubemapStrategy for BatchedStrategy {
    fn name(&self) -> &'static str {
        "batched"
    }

    fn fill(
        &self,
        basis: &BasisSet,
        orbitals: &OrbitalStore,
        target: FieldTarget,
        field: &mut ScalarField,
        slab_depth: usize,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<u64, EngineError> {
        let spec = GridSpec {
            origin: field.origin(),
            spacing: field.spacing(),
            dims: field.dims(),
        };
        let slab_depth = slab_depth.max(1);
        let mut scratch = vec![0.0_f64; spec.samples()];

        match target {
            FieldTarget::Orbital(index) => {
                let orbital = orbitals
                    .get(index)
                    .ok_or(EngineError::OrbitalNotFound { index })?;
                let slab_count = scratch.len().div_ceil(spec.dims[0] * spec.dims[1] * slab_depth);
                reporter.report(Progress::TaskStart {
                    total: slab_count as u64,
                });
                accumulate_orbital(
                    basis,
                    &orbital.coefficients,
                    &spec,
                    &mut scratch,
                    slab_depth,
                    cancel,
                    &|| reporter.report(Progress::TaskIncrement { amount: 1 }),
                )?;
            }
            FieldTarget::Density => {
                let occupied: Vec<_> = orbitals.iter().filter(|mo| mo.is_occupied()).collect();
                reporter.report(Progress::TaskStart {
                    total: occupied.len() as u64,
                });
                let mut psi = vec![0.0_f64; spec.samples()];
                for orbital in occupied {
                    cancel.check()?;
                    psi.fill(0.0);
                    accumulate_orbital(
                        basis,
                        &orbital.coefficients,
                        &spec,
                        &mut psi,
                        slab_depth,
                        cancel,
                        &|| {},
                    )?;
                    for (total, value) in scratch.iter_mut().zip(&psi) {
                        *total += orbital.occupation * value * value;
                    }
                    reporter.report(Progress::TaskIncrement { amount: 1 });
                }
            }
        }

        let mut degenerate = 0;
        for (sample, value) in field.data_mut().iter_mut().zip(&scratch) {
            let (value, clamped) = finite_or_zero(*value);
            if clamped {
                degenerate += 1;
            }
            *sample = value as f32;
        }
        reporter.report(Progress::TaskFinish);
        Ok(degenerate)
    }
}

/// Accumulates `Σ c_i · φ_i` over the grid, primitive-major: each basis
/// function touches only the samples inside its support sphere. Slabs of
/// `slab_depth` z-layers are independent and run in parallel.
fn accumulate_orbital(
    basis: &BasisSet,
    coefficients: &[f64],
    spec: &GridSpec,
    scratch: &mut [f64],
    slab_depth: usize,
    cancel: &CancelToken,
    on_slab: &(dyn Fn() + Sync),
) -> Result<(), EngineError> {
    let [nx, ny, _] = spec.dims;
    let slab_len = nx * ny * slab_depth;
    let slabs: Vec<(usize, &mut [f64])> = scratch.chunks_mut(slab_len).enumerate().collect();

    #[cfg(feature = "parallel")]
    let slab_iter = slabs.into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let slab_iter = slabs.into_iter();

    slab_iter.try_for_each(|(slab, data)| -> Result<(), EngineError> {
        cancel.check()?;
        let z_start = slab * slab_depth;
        let z_end = z_start + data.len() / (nx * ny);

        for (index, function) in basis.iter().enumerate() {
            let coefficient = match coefficients.get(index) {
                Some(&c) if c != 0.0 => c,
                _ => continue,
            };
            let radius = function.support_radius();
            let radius_squared = radius * radius;
            let center = function.center;

            let xs = axis_range(spec.origin.x, spec.spacing.x, nx, center.x, radius);
            let ys = axis_range(spec.origin.y, spec.spacing.y, ny, center.y, radius);
            let zs = axis_range(spec.origin.z, spec.spacing.z, spec.dims[2], center.z, radius);
            let (z_lo, z_hi) = (zs.0.max(z_start), zs.1.min(z_end));

            for iz in z_lo..z_hi {
                for iy in ys.0..ys.1 {
                    for ix in xs.0..xs.1 {
                        let point = Point3::new(
                            spec.origin.x + ix as f64 * spec.spacing.x,
                            spec.origin.y + iy as f64 * spec.spacing.y,
                            spec.origin.z + iz as f64 * spec.spacing.z,
                        );
                        if (point - center).norm_squared() > radius_squared {
                            continue;
                        }
                        let local = (iz - z_start) * nx * ny + iy * nx + ix;
                        data[local] += coefficient * function.evaluate(&point);
                    }
                }
            }
        }
        on_slab();
        Ok(())
    })
}

/// The half-open sample index range of one axis intersecting
/// `[center - radius, center + radius]`.
fn axis_range(origin: f64, spacing: f64, count: usize, center: f64, radius: f64) -> (usize, usize) {
    let lo = ((center - radius - origin) / spacing).ceil().max(0.0) as usize;
    let hi = ((center + radius - origin) / spacing).floor().min(count as f64 - 1.0);
    if hi < 0.0 || lo as f64 > hi {
        (0, 0)
    } else {
        (lo, hi as usize + 1)
    }
}

/// Generates one scalar field over `spec`.
///
/// # Errors
///
/// Fails with `OrbitalNotFound` for an out-of-range orbital target,
/// `ResourceExceeded` when the grid would outgrow `memory_ceiling`, and
/// `Cancelled` when the token is set between slabs.
#[instrument(skip_all, name = "generate_cubemap", fields(samples = spec.samples()))]
pub fn generate(
    basis: &BasisSet,
    orbitals: &OrbitalStore,
    target: FieldTarget,
    spec: &GridSpec,
    use_batched: bool,
    slab_depth: usize,
    memory_ceiling: usize,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<ScalarField, EngineError> {
    if let FieldTarget::Orbital(index) = target {
        if index >= orbitals.len() {
            return Err(EngineError::OrbitalNotFound { index });
        }
    }
    let samples = spec.samples();
    if samples.saturating_mul(std::mem::size_of::<f32>()) > memory_ceiling {
        return Err(EngineError::ResourceExceeded {
            samples,
            limit_bytes: memory_ceiling,
        });
    }
    cancel.check()?;

    let strategy = strategy_for(use_batched);
    info!(
        strategy = strategy.name(),
        nx = spec.dims[0],
        ny = spec.dims[1],
        nz = spec.dims[2],
        "Generating cubemap"
    );
    reporter.report(Progress::PhaseStart { name: "cubemap" });

    let mut field = ScalarField::zeroed(spec.origin, spec.spacing, spec.dims);
    let degenerate = strategy.fill(
        basis,
        orbitals,
        target,
        &mut field,
        slab_depth,
        reporter,
        cancel,
    )?;
    if degenerate > 0 {
        warn!(count = degenerate, "Degenerate samples clamped to zero");
    }

    reporter.report(Progress::PhaseFinish);
    Ok(field)
}
