use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Integer power by repeated multiplication.
///
/// Angular-momentum exponents are tiny (≤ 5), so this beats `f64::powi` in the
/// innermost evaluation loops and is exactly reproducible.
#[inline]
pub fn int_pow(x: f64, exponent: u32) -> f64 {
    let mut result = 1.0;
    for _ in 0..exponent {
        result *= x;
    }
    result
}

/// A primitive Cartesian Gaussian, `c · x^i y^j z^k · exp(-α r²)`.
///
/// The stored coefficient folds the primitive normalization constant together
/// with the contraction coefficient at construction time, so evaluation is a
/// single multiply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPrimitive {
    /// The radial exponent α in Å⁻².
    pub exponent: f64,
    /// Cartesian angular-momentum powers (i, j, k).
    pub powers: [u32; 3],
    /// Normalization × contraction coefficient.
    pub coefficient: f64,
}

impl GaussianPrimitive {
    /// Creates a normalized primitive.
    ///
    /// The normalization constant is
    /// `(2α/π)^¾ · √((8α)^(i+j+k) · i!j!k! / ((2i)!(2j)!(2k)!))`,
    /// folded into the stored coefficient together with `contraction`.
    pub fn new(exponent: f64, powers: [u32; 3], contraction: f64) -> Self {
        let total: u32 = powers.iter().sum();
        let mut n = int_pow(8.0 * exponent, total);
        for &p in &powers {
            for q in (p + 1)..=(2 * p) {
                n /= q as f64;
            }
        }
        let coefficient = (2.0 * exponent / PI).powf(0.75) * n.sqrt() * contraction;
        Self {
            exponent,
            powers,
            coefficient,
        }
    }

    /// Creates a primitive with the coefficient taken verbatim (no
    /// normalization fold), for formats that pre-normalize their data.
    pub fn raw(exponent: f64, powers: [u32; 3], coefficient: f64) -> Self {
        Self {
            exponent,
            powers,
            coefficient,
        }
    }

    /// Radius beyond which this primitive's contribution is negligible.
    pub fn support_radius(&self) -> f64 {
        let max_power = *self.powers.iter().max().unwrap_or(&0);
        2.5 / self.exponent.sqrt() + max_power as f64
    }
}

/// A primitive Slater-type function, `c · r^n · x^i y^j z^k · exp(-α r)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlaterPrimitive {
    /// The radial exponent α in Å⁻¹.
    pub exponent: f64,
    /// The radial power n.
    pub radial_power: u32,
    /// Cartesian angular-momentum powers (i, j, k).
    pub powers: [u32; 3],
    /// Coefficient, taken verbatim from the file.
    pub coefficient: f64,
}

impl SlaterPrimitive {
    pub fn new(exponent: f64, radial_power: u32, powers: [u32; 3], coefficient: f64) -> Self {
        Self {
            exponent,
            radial_power,
            powers,
            coefficient,
        }
    }

    /// Radius beyond which this primitive's contribution is negligible.
    pub fn support_radius(&self) -> f64 {
        let max_power = *self.powers.iter().max().unwrap_or(&0);
        2.5 / self.exponent + (max_power * self.radial_power) as f64
    }
}

/// One atom-centered basis function: a contracted expansion of Gaussian
/// and/or Slater primitives sharing a center. Immutable after parse.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFunction {
    /// The center in Ångström (the position of the owning atom).
    pub center: Point3<f64>,
    pub gaussians: Vec<GaussianPrimitive>,
    pub slaters: Vec<SlaterPrimitive>,
}

impl BasisFunction {
    pub fn new(center: Point3<f64>) -> Self {
        Self {
            center,
            gaussians: Vec::new(),
            slaters: Vec::new(),
        }
    }

    /// The largest support radius over all primitives.
    ///
    /// Evaluation at points farther than this from the center may be pruned
    /// to zero without visible error.
    pub fn support_radius(&self) -> f64 {
        let gaussian = self
            .gaussians
            .iter()
            .map(GaussianPrimitive::support_radius)
            .fold(0.0_f64, f64::max);
        let slater = self
            .slaters
            .iter()
            .map(SlaterPrimitive::support_radius)
            .fold(0.0_f64, f64::max);
        gaussian.max(slater)
    }

    /// Evaluates the contracted expansion at a point in space.
    ///
    /// The displacement from the center is hoisted once; polynomial terms are
    /// built by repeated multiplication.
    pub fn evaluate(&self, point: &Point3<f64>) -> f64 {
        let d: Vector3<f64> = point - self.center;
        let r_squared = d.norm_squared();
        let mut psi = 0.0;

        for p in &self.gaussians {
            let radial = (-p.exponent * r_squared).exp();
            psi += p.coefficient
                * radial
                * int_pow(d.x, p.powers[0])
                * int_pow(d.y, p.powers[1])
                * int_pow(d.z, p.powers[2]);
        }

        if !self.slaters.is_empty() {
            let r = r_squared.sqrt();
            for p in &self.slaters {
                let radial = (-p.exponent * r).exp();
                psi += p.coefficient
                    * radial
                    * int_pow(r, p.radial_power)
                    * int_pow(d.x, p.powers[0])
                    * int_pow(d.y, p.powers[1])
                    * int_pow(d.z, p.powers[2]);
            }
        }

        psi
    }
}

/// Expands a real spherical harmonic Gaussian shell component into its
/// Cartesian primitive combination, each primitive normalized.
///
/// Supported up to g shells (l = 4); the coefficient tables follow the
/// standard real solid-harmonic decomposition. Unsupported (l, m) pairs
/// return an empty expansion.
pub fn spherical_gaussians(exponent: f64, l: i32, m: i32) -> Vec<GaussianPrimitive> {
    let g = |powers: [u32; 3], c: f64| GaussianPrimitive::new(exponent, powers, c);
    match (l, m) {
        (0, 0) => vec![g([0, 0, 0], 1.0)],

        (1, -1) => vec![g([1, 0, 0], 1.0)],
        (1, 0) => vec![g([0, 0, 1], 1.0)],
        (1, 1) => vec![g([0, 1, 0], 1.0)],

        (2, -2) => vec![g([1, 1, 0], 1.0)],
        (2, -1) => vec![g([0, 1, 1], 1.0)],
        (2, 0) => vec![g([0, 0, 2], 1.0), g([2, 0, 0], -0.5), g([0, 2, 0], -0.5)],
        (2, 1) => vec![g([1, 0, 1], 1.0)],
        (2, 2) => vec![
            g([2, 0, 0], 0.75_f64.sqrt()),
            g([0, 2, 0], -(0.75_f64.sqrt())),
        ],

        (3, -3) => vec![
            g([0, 3, 0], -(5.0_f64 / 8.0).sqrt()),
            g([2, 1, 0], (9.0_f64 / 8.0).sqrt()),
        ],
        (3, -2) => vec![g([1, 1, 1], 1.0)],
        (3, -1) => vec![
            g([0, 1, 2], 1.2_f64.sqrt()),
            g([0, 3, 0], -(3.0_f64 / 8.0).sqrt()),
            g([2, 1, 0], -(3.0_f64 / 40.0).sqrt()),
        ],
        (3, 0) => vec![
            g([0, 0, 3], 1.0),
            g([2, 0, 1], -1.5 / 5.0_f64.sqrt()),
            g([0, 2, 1], -1.5 / 5.0_f64.sqrt()),
        ],
        (3, 1) => vec![
            g([1, 0, 2], 1.2_f64.sqrt()),
            g([3, 0, 0], -(3.0_f64 / 8.0).sqrt()),
            g([1, 2, 0], -(3.0_f64 / 40.0).sqrt()),
        ],
        (3, 2) => vec![
            g([2, 0, 1], 0.75_f64.sqrt()),
            g([0, 2, 1], -(0.75_f64.sqrt())),
        ],
        (3, 3) => vec![
            g([3, 0, 0], (5.0_f64 / 8.0).sqrt()),
            g([1, 2, 0], -(9.0_f64 / 8.0).sqrt()),
        ],

        (4, -4) => vec![
            g([3, 1, 0], (5.0_f64 / 4.0).sqrt()),
            g([1, 3, 0], -(5.0_f64 / 4.0).sqrt()),
        ],
        (4, -3) => vec![
            g([0, 3, 1], -(5.0_f64 / 8.0).sqrt()),
            g([2, 1, 1], (9.0_f64 / 8.0).sqrt()),
        ],
        (4, -2) => vec![
            g([1, 1, 2], (9.0_f64 / 7.0).sqrt()),
            g([3, 1, 0], -(5.0_f64 / 28.0).sqrt()),
            g([1, 3, 0], -(5.0_f64 / 28.0).sqrt()),
        ],
        (4, -1) => vec![
            g([0, 1, 3], (10.0_f64 / 7.0).sqrt()),
            g([0, 3, 1], -(45.0_f64 / 56.0).sqrt()),
            g([2, 1, 1], -(9.0_f64 / 56.0).sqrt()),
        ],
        (4, 0) => vec![
            g([0, 0, 4], 1.0),
            g([4, 0, 0], (9.0_f64 / 64.0).sqrt()),
            g([0, 4, 0], (9.0_f64 / 64.0).sqrt()),
            g([2, 0, 2], -(27.0_f64 / 35.0).sqrt()),
            g([0, 2, 2], -(27.0_f64 / 35.0).sqrt()),
            g([2, 2, 0], (1.0_f64 / 16.0).sqrt()),
        ],
        (4, 1) => vec![
            g([1, 0, 3], (10.0_f64 / 7.0).sqrt()),
            g([3, 0, 1], -(45.0_f64 / 56.0).sqrt()),
            g([1, 2, 1], -(9.0_f64 / 56.0).sqrt()),
        ],
        (4, 2) => vec![
            g([2, 0, 2], (27.0_f64 / 28.0).sqrt()),
            g([0, 2, 2], -(27.0_f64 / 28.0).sqrt()),
            g([4, 0, 0], -(5.0_f64 / 16.0).sqrt()),
            g([0, 4, 0], (5.0_f64 / 16.0).sqrt()),
        ],
        (4, 3) => vec![
            g([3, 0, 1], (5.0_f64 / 8.0).sqrt()),
            g([1, 2, 1], -(9.0_f64 / 8.0).sqrt()),
        ],
        (4, 4) => vec![
            g([4, 0, 0], 35.0_f64.sqrt() / 8.0),
            g([0, 4, 0], 35.0_f64.sqrt() / 8.0),
            g([2, 2, 0], -(27.0_f64 / 16.0).sqrt()),
        ],

        _ => Vec::new(),
    }
}

/// The full basis set of the loaded wavefunction, in file order.
///
/// MO coefficient vectors index into this set positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasisSet {
    functions: Vec<BasisFunction>,
}

impl BasisSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, function: BasisFunction) {
        self.functions.push(function);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BasisFunction> {
        self.functions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BasisFunction> {
        self.functions.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasisFunction> {
        self.functions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BasisFunction> {
        self.functions.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn s_primitive_normalization_is_two_alpha_over_pi_to_three_quarters() {
        let alpha = 1.7;
        let p = GaussianPrimitive::new(alpha, [0, 0, 0], 1.0);
        let expected = (2.0 * alpha / PI).powf(0.75);
        assert!((p.coefficient - expected).abs() < TOLERANCE);
    }

    #[test]
    fn p_primitive_normalization_includes_angular_factor() {
        let alpha = 0.9;
        let p = GaussianPrimitive::new(alpha, [1, 0, 0], 1.0);
        // N² = (8α)¹ · 1!/(2·1)! = 8α/2 = 4α.
        let expected = (2.0 * alpha / PI).powf(0.75) * (4.0 * alpha).sqrt();
        assert!((p.coefficient - expected).abs() < TOLERANCE);
    }

    #[test]
    fn contraction_coefficient_is_folded_in() {
        let single = GaussianPrimitive::new(1.2, [0, 1, 1], 1.0);
        let scaled = GaussianPrimitive::new(1.2, [0, 1, 1], -0.25);
        assert!((scaled.coefficient + 0.25 * single.coefficient).abs() < TOLERANCE);
    }

    #[test]
    fn gaussian_evaluation_matches_analytic_form() {
        let mut function = BasisFunction::new(Point3::new(1.0, 0.0, 0.0));
        function
            .gaussians
            .push(GaussianPrimitive::new(0.5, [1, 0, 0], 1.0));

        let point = Point3::new(2.0, 1.0, 0.0);
        let dx = 1.0;
        let r_squared: f64 = 2.0;
        let expected =
            GaussianPrimitive::new(0.5, [1, 0, 0], 1.0).coefficient * dx * (-0.5 * r_squared).exp();
        assert!((function.evaluate(&point) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn slater_evaluation_matches_analytic_form() {
        let mut function = BasisFunction::new(Point3::origin());
        function
            .slaters
            .push(SlaterPrimitive::new(1.5, 2, [0, 0, 1], 0.8));

        let point = Point3::new(0.0, 0.0, 2.0);
        let r: f64 = 2.0;
        let expected = 0.8 * r * r * 2.0 * (-1.5 * r).exp();
        assert!((function.evaluate(&point) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn p_orbital_is_antisymmetric_about_its_center() {
        let mut function = BasisFunction::new(Point3::origin());
        function
            .gaussians
            .push(GaussianPrimitive::new(1.0, [1, 0, 0], 1.0));
        let plus = function.evaluate(&Point3::new(0.7, 0.1, -0.2));
        let minus = function.evaluate(&Point3::new(-0.7, 0.1, -0.2));
        assert!((plus + minus).abs() < TOLERANCE);
        assert!(plus > 0.0);
    }

    #[test]
    fn support_radius_covers_the_widest_primitive() {
        let mut function = BasisFunction::new(Point3::origin());
        function
            .gaussians
            .push(GaussianPrimitive::new(4.0, [0, 0, 0], 1.0));
        function
            .gaussians
            .push(GaussianPrimitive::new(0.25, [2, 0, 0], 1.0));
        // Diffuse primitive dominates: 2.5/√0.25 + 2 = 7.
        assert!((function.support_radius() - 7.0).abs() < TOLERANCE);

        function.slaters.push(SlaterPrimitive::new(0.2, 1, [0, 0, 1], 1.0));
        // Slater: 2.5/0.2 + 1·1 = 13.5.
        assert!((function.support_radius() - 13.5).abs() < TOLERANCE);
    }

    #[test]
    fn evaluation_beyond_the_support_radius_is_negligible() {
        let mut function = BasisFunction::new(Point3::origin());
        function
            .gaussians
            .push(GaussianPrimitive::new(1.0, [0, 0, 0], 1.0));
        let radius = function.support_radius();
        let value = function.evaluate(&Point3::new(radius, 0.0, 0.0));
        assert!(value.abs() < 1e-2 * function.evaluate(&Point3::origin()));
    }

    #[test]
    fn d_zero_shell_expands_to_three_cartesians() {
        let shell = spherical_gaussians(1.0, 2, 0);
        assert_eq!(shell.len(), 3);
        assert_eq!(shell[0].powers, [0, 0, 2]);
        assert_eq!(shell[1].powers, [2, 0, 0]);
        assert_eq!(shell[2].powers, [0, 2, 0]);
        // 2z² − x² − y² must vanish on the diagonal x = y = z.
        let mut function = BasisFunction::new(Point3::origin());
        function.gaussians = shell;
        let value = function.evaluate(&Point3::new(0.5, 0.5, 0.5));
        assert!(value.abs() < 1e-10);
    }

    #[test]
    fn unsupported_shells_expand_to_nothing() {
        assert!(spherical_gaussians(1.0, 5, 0).is_empty());
        assert!(spherical_gaussians(1.0, 2, 3).is_empty());
    }
}
