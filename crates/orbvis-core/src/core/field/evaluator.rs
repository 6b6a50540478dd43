use crate::core::models::basis::BasisSet;
use crate::core::models::orbital::{MolecularOrbital, OrbitalStore};
use nalgebra::Point3;

/// What a scalar field holds: one orbital's wavefunction, or the total
/// electron density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    Orbital(usize),
    Density,
}

/// Replaces a non-finite sample with zero, reporting whether it did.
///
/// Grids and images must never carry NaN or infinity; degenerate samples are
/// counted by the caller and surfaced as a diagnostic.
#[inline]
pub fn finite_or_zero(value: f64) -> (f64, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (0.0, true)
    }
}

/// Point evaluator over a basis set and orbital store.
///
/// Deterministic and side-effect-free; support radii are precomputed once so
/// basis functions far from the query point are pruned without touching their
/// primitives.
pub struct FieldEvaluator<'a> {
    basis: &'a BasisSet,
    orbitals: &'a OrbitalStore,
    radii_squared: Vec<f64>,
}

impl<'a> FieldEvaluator<'a> {
    pub fn new(basis: &'a BasisSet, orbitals: &'a OrbitalStore) -> Self {
        let radii_squared = basis
            .iter()
            .map(|f| {
                let r = f.support_radius();
                r * r
            })
            .collect();
        Self {
            basis,
            orbitals,
            radii_squared,
        }
    }

    /// Whether the target refers to data this evaluator holds.
    pub fn supports(&self, target: FieldTarget) -> bool {
        match target {
            FieldTarget::Orbital(index) => index < self.orbitals.len(),
            FieldTarget::Density => true,
        }
    }

    /// Evaluates the target at a point. Returns `None` for an orbital index
    /// outside the store.
    pub fn evaluate(&self, target: FieldTarget, point: &Point3<f64>) -> Option<f64> {
        match target {
            FieldTarget::Orbital(index) => {
                self.orbitals.get(index).map(|mo| self.orbital_value(mo, point))
            }
            FieldTarget::Density => Some(self.density(point)),
        }
    }

    /// ψ(point) for one orbital: contraction of the coefficient vector with
    /// the basis-function values, pruned by support radius.
    pub fn orbital_value(&self, orbital: &MolecularOrbital, point: &Point3<f64>) -> f64 {
        let mut psi = 0.0;
        for (index, function) in self.basis.iter().enumerate() {
            let coefficient = match orbital.coefficients.get(index) {
                Some(&c) if c != 0.0 => c,
                _ => continue,
            };
            if (point - function.center).norm_squared() > self.radii_squared[index] {
                continue;
            }
            psi += coefficient * function.evaluate(point);
        }
        psi
    }

    /// Total electron density at a point: Σ occupation·ψ² over occupied
    /// orbitals of both spin channels, in file order.
    pub fn density(&self, point: &Point3<f64>) -> f64 {
        let mut density = 0.0;
        for orbital in self.orbitals.iter() {
            if !orbital.is_occupied() {
                continue;
            }
            let psi = self.orbital_value(orbital, point);
            density += orbital.occupation * psi * psi;
        }
        density
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::basis::{BasisFunction, GaussianPrimitive};
    use crate::core::models::orbital::Spin;
    use nalgebra::Point3;

    fn s_function(center: Point3<f64>, alpha: f64) -> BasisFunction {
        let mut function = BasisFunction::new(center);
        function
            .gaussians
            .push(GaussianPrimitive::new(alpha, [0, 0, 0], 1.0));
        function
    }

    fn two_center_setup() -> (BasisSet, OrbitalStore) {
        let mut basis = BasisSet::new();
        basis.push(s_function(Point3::new(-0.5, 0.0, 0.0), 1.0));
        basis.push(s_function(Point3::new(0.5, 0.0, 0.0), 1.0));

        let mut orbitals = OrbitalStore::new();
        orbitals.push(MolecularOrbital {
            label: "1".into(),
            energy: -0.6,
            occupation: 2.0,
            spin: Spin::Alpha,
            coefficients: vec![0.7, 0.7],
        });
        orbitals.push(MolecularOrbital {
            label: "2".into(),
            energy: 0.2,
            occupation: 0.0,
            spin: Spin::Alpha,
            coefficients: vec![0.7, -0.7],
        });
        (basis, orbitals)
    }

    #[test]
    fn orbital_evaluation_contracts_coefficients() {
        let (basis, orbitals) = two_center_setup();
        let evaluator = FieldEvaluator::new(&basis, &orbitals);

        let point = Point3::origin();
        let expected = 0.7 * basis.get(0).unwrap().evaluate(&point)
            + 0.7 * basis.get(1).unwrap().evaluate(&point);
        let value = evaluator
            .evaluate(FieldTarget::Orbital(0), &point)
            .unwrap();
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn antibonding_orbital_has_a_nodal_plane() {
        let (basis, orbitals) = two_center_setup();
        let evaluator = FieldEvaluator::new(&basis, &orbitals);
        let value = evaluator
            .evaluate(FieldTarget::Orbital(1), &Point3::origin())
            .unwrap();
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn unknown_orbital_index_yields_none() {
        let (basis, orbitals) = two_center_setup();
        let evaluator = FieldEvaluator::new(&basis, &orbitals);
        assert_eq!(evaluator.evaluate(FieldTarget::Orbital(5), &Point3::origin()), None);
        assert!(!evaluator.supports(FieldTarget::Orbital(5)));
        assert!(evaluator.supports(FieldTarget::Density));
    }

    #[test]
    fn density_sums_occupied_orbitals_only() {
        let (basis, orbitals) = two_center_setup();
        let evaluator = FieldEvaluator::new(&basis, &orbitals);
        let point = Point3::new(0.3, 0.1, 0.0);
        let psi = evaluator
            .evaluate(FieldTarget::Orbital(0), &point)
            .unwrap();
        let density = evaluator.evaluate(FieldTarget::Density, &point).unwrap();
        assert!((density - 2.0 * psi * psi).abs() < 1e-12);
    }

    #[test]
    fn density_skips_negligible_occupations() {
        let (basis, mut orbitals) = two_center_setup();
        orbitals.get_mut(1).unwrap().occupation = 1e-4;
        let evaluator = FieldEvaluator::new(&basis, &orbitals);
        let point = Point3::new(0.3, 0.0, 0.0);
        let psi0 = evaluator
            .evaluate(FieldTarget::Orbital(0), &point)
            .unwrap();
        let density = evaluator.evaluate(FieldTarget::Density, &point).unwrap();
        assert!((density - 2.0 * psi0 * psi0).abs() < 1e-12);
    }

    #[test]
    fn far_points_are_pruned_to_zero() {
        let (basis, orbitals) = two_center_setup();
        let evaluator = FieldEvaluator::new(&basis, &orbitals);
        let value = evaluator
            .evaluate(FieldTarget::Orbital(0), &Point3::new(100.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn finite_or_zero_clamps_non_finite_samples() {
        assert_eq!(finite_or_zero(1.5), (1.5, false));
        assert_eq!(finite_or_zero(f64::NAN), (0.0, true));
        assert_eq!(finite_or_zero(f64::INFINITY), (0.0, true));
    }
}
