use nalgebra::{Point3, Vector3};

/// A discretized scalar field over a regular axis-aligned grid.
///
/// `origin` is the position of sample (0, 0, 0); samples sit at cell centers,
/// so the covered box extends half a spacing beyond the outermost samples on
/// each side. Data is stored x-fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    origin: Point3<f64>,
    spacing: Vector3<f64>,
    dims: [usize; 3],
    data: Vec<f32>,
}

impl ScalarField {
    /// Allocates a zero-filled field. The caller is responsible for checking
    /// the sample count against any memory ceiling beforehand.
    pub fn zeroed(origin: Point3<f64>, spacing: Vector3<f64>, dims: [usize; 3]) -> Self {
        let len = dims[0] * dims[1] * dims[2];
        Self {
            origin,
            spacing,
            dims,
            data: vec![0.0; len],
        }
    }

    /// Wraps already-sampled data (e.g. from a cube file).
    ///
    /// Returns `None` if the data length does not match the dimensions.
    pub fn from_data(
        origin: Point3<f64>,
        spacing: Vector3<f64>,
        dims: [usize; 3],
        data: Vec<f32>,
    ) -> Option<Self> {
        if data.len() != dims[0] * dims[1] * dims[2] {
            return None;
        }
        Some(Self {
            origin,
            spacing,
            dims,
            data,
        })
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn spacing(&self) -> Vector3<f64> {
        self.spacing
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Flat index of a sample, x fastest.
    #[inline]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + self.dims[0] * (iy + self.dims[1] * iz)
    }

    #[inline]
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> f32 {
        self.data[self.index(ix, iy, iz)]
    }

    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, iz: usize, value: f32) {
        let index = self.index(ix, iy, iz);
        self.data[index] = value;
    }

    /// World position of a sample.
    pub fn sample_position(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + ix as f64 * self.spacing.x,
            self.origin.y + iy as f64 * self.spacing.y,
            self.origin.z + iz as f64 * self.spacing.z,
        )
    }

    /// The axis-aligned box covered by the field, half a spacing beyond the
    /// outermost samples.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let min = self.origin - 0.5 * self.spacing;
        let extent = Vector3::new(
            self.dims[0] as f64 * self.spacing.x,
            self.dims[1] as f64 * self.spacing.y,
            self.dims[2] as f64 * self.spacing.z,
        );
        (min, min + extent)
    }

    /// Trilinearly interpolated value at a world position; zero outside the
    /// sampled region.
    pub fn sample(&self, point: &Point3<f64>) -> f64 {
        let gx = (point.x - self.origin.x) / self.spacing.x;
        let gy = (point.y - self.origin.y) / self.spacing.y;
        let gz = (point.z - self.origin.z) / self.spacing.z;

        let (ix, fx) = Self::split(gx, self.dims[0]);
        let (iy, fy) = Self::split(gy, self.dims[1]);
        let (iz, fz) = Self::split(gz, self.dims[2]);
        let (ix, iy, iz) = match (ix, iy, iz) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => return 0.0,
        };

        let c000 = self.get(ix, iy, iz) as f64;
        let c100 = self.get(ix + 1, iy, iz) as f64;
        let c010 = self.get(ix, iy + 1, iz) as f64;
        let c110 = self.get(ix + 1, iy + 1, iz) as f64;
        let c001 = self.get(ix, iy, iz + 1) as f64;
        let c101 = self.get(ix + 1, iy, iz + 1) as f64;
        let c011 = self.get(ix, iy + 1, iz + 1) as f64;
        let c111 = self.get(ix + 1, iy + 1, iz + 1) as f64;

        let c00 = c000 + (c100 - c000) * fx;
        let c10 = c010 + (c110 - c010) * fx;
        let c01 = c001 + (c101 - c001) * fx;
        let c11 = c011 + (c111 - c011) * fx;
        let c0 = c00 + (c10 - c00) * fy;
        let c1 = c01 + (c11 - c01) * fy;
        c0 + (c1 - c0) * fz
    }

    /// Field gradient at a world position by central differences of the
    /// trilinear interpolant, one spacing apart per axis.
    pub fn gradient(&self, point: &Point3<f64>) -> Vector3<f64> {
        let hx = Vector3::new(self.spacing.x, 0.0, 0.0);
        let hy = Vector3::new(0.0, self.spacing.y, 0.0);
        let hz = Vector3::new(0.0, 0.0, self.spacing.z);
        Vector3::new(
            (self.sample(&(point + hx)) - self.sample(&(point - hx))) / (2.0 * self.spacing.x),
            (self.sample(&(point + hy)) - self.sample(&(point - hy))) / (2.0 * self.spacing.y),
            (self.sample(&(point + hz)) - self.sample(&(point - hz))) / (2.0 * self.spacing.z),
        )
    }

    /// Clamps a fractional grid coordinate into a valid lower cell corner and
    /// its interpolation weight. Returns `None` outside the sampled region.
    fn split(g: f64, n: usize) -> (Option<usize>, f64) {
        if !g.is_finite() || g < -0.5 || g > n as f64 - 0.5 {
            return (None, 0.0);
        }
        let clamped = g.clamp(0.0, (n - 1) as f64);
        let mut cell = clamped.floor() as usize;
        if cell + 1 >= n {
            cell = n.saturating_sub(2);
        }
        if n < 2 {
            return (None, 0.0);
        }
        ((cell + 1 < n).then_some(cell), clamped - cell as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_field() -> ScalarField {
        // Value equals the x sample index, on a 4x3x3 unit grid.
        let dims = [4, 3, 3];
        let mut field = ScalarField::zeroed(
            Point3::origin(),
            Vector3::new(1.0, 1.0, 1.0),
            dims,
        );
        for iz in 0..dims[2] {
            for iy in 0..dims[1] {
                for ix in 0..dims[0] {
                    field.set(ix, iy, iz, ix as f32);
                }
            }
        }
        field
    }

    #[test]
    fn indexing_is_x_fastest() {
        let field = ScalarField::zeroed(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), [4, 3, 2]);
        assert_eq!(field.index(1, 0, 0), 1);
        assert_eq!(field.index(0, 1, 0), 4);
        assert_eq!(field.index(0, 0, 1), 12);
        assert_eq!(field.len(), 24);
    }

    #[test]
    fn from_data_rejects_mismatched_lengths() {
        let data = vec![0.0; 5];
        assert!(
            ScalarField::from_data(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), [2, 2, 2], data)
                .is_none()
        );
    }

    #[test]
    fn bounds_extend_half_a_spacing_past_the_samples() {
        let field = ScalarField::zeroed(
            Point3::new(1.0, 0.0, 0.0),
            Vector3::new(0.5, 1.0, 2.0),
            [4, 2, 3],
        );
        let (min, max) = field.bounds();
        assert_eq!(min, Point3::new(0.75, -0.5, -1.0));
        assert_eq!(max, Point3::new(2.75, 1.5, 5.0));
    }

    #[test]
    fn trilinear_sampling_reproduces_a_linear_ramp() {
        let field = ramp_field();
        let value = field.sample(&Point3::new(1.25, 1.0, 1.0));
        assert!((value - 1.25).abs() < 1e-12);
        // Exactly on a sample.
        assert!((field.sample(&Point3::new(2.0, 1.0, 1.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sampling_outside_the_region_is_zero() {
        let field = ramp_field();
        assert_eq!(field.sample(&Point3::new(10.0, 0.0, 0.0)), 0.0);
        assert_eq!(field.sample(&Point3::new(0.0, -2.0, 0.0)), 0.0);
    }

    #[test]
    fn gradient_of_a_ramp_points_along_x() {
        let field = ramp_field();
        let g = field.gradient(&Point3::new(1.5, 1.0, 1.0));
        assert!((g.x - 1.0).abs() < 1e-12);
        assert!(g.y.abs() < 1e-12);
        assert!(g.z.abs() < 1e-12);
    }
}
