use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Unit, UnitQuaternion, Vector3};

/// Vectors shorter than this are treated as zero when building frames.
const DEGENERACY_EPSILON: f64 = 1e-9;

/// A right-handed orthonormal frame: an anchor point and two perpendicular
/// unit directions (the third axis is their cross product).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub anchor: Point3<f64>,
    pub u: Unit<Vector3<f64>>,
    pub v: Unit<Vector3<f64>>,
}

impl Frame {
    /// Builds the frame spanned by three points: anchored at the first,
    /// `u` toward the second, `v` the Gram-Schmidt remainder toward the third.
    ///
    /// Returns `None` for coincident or collinear points.
    pub fn from_points(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) -> Option<Self> {
        Self::from_directions(p0, p1 - p0, p2 - p0)
    }

    /// Builds the frame from an anchor and two spanning directions,
    /// orthonormalized. Returns `None` for zero or parallel directions.
    pub fn from_directions(
        anchor: Point3<f64>,
        d1: Vector3<f64>,
        d2: Vector3<f64>,
    ) -> Option<Self> {
        let u = Unit::try_new(d1, DEGENERACY_EPSILON)?;
        let rejected = d2 - d2.dot(&u) * u.into_inner();
        let v = Unit::try_new(rejected, DEGENERACY_EPSILON)?;
        Some(Self { anchor, u, v })
    }

    /// The third, implied axis.
    pub fn w(&self) -> Unit<Vector3<f64>> {
        Unit::new_unchecked(self.u.cross(&self.v))
    }

    /// Column matrix of the three axes.
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.u.into_inner(), self.v.into_inner(), self.w().into_inner()])
    }

    /// The rigid map carrying this frame onto `target`: anchor to anchor,
    /// axes to axes.
    pub fn rigid_map_to(&self, target: &Frame) -> Isometry3<f64> {
        let rotation = Rotation3::from_matrix_unchecked(target.basis() * self.basis().transpose());
        let rotation = UnitQuaternion::from_rotation_matrix(&rotation);
        let translation = target.anchor - rotation * self.anchor;
        Isometry3::from_parts(translation.into(), rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn assert_point_eq(a: Point3<f64>, b: Point3<f64>) {
        assert!((a - b).norm() < TOLERANCE, "{a:?} != {b:?}");
    }

    #[test]
    fn frame_axes_are_orthonormal() {
        let frame = Frame::from_points(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 3.0),
        )
        .unwrap();
        assert!((frame.u.norm() - 1.0).abs() < TOLERANCE);
        assert!((frame.v.norm() - 1.0).abs() < TOLERANCE);
        assert!(frame.u.dot(&frame.v).abs() < TOLERANCE);
        assert!((frame.w().norm() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn degenerate_point_sets_are_rejected() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(Frame::from_points(p, p, Point3::new(0.0, 0.0, 1.0)).is_none());
        // Collinear.
        assert!(
            Frame::from_points(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            )
            .is_none()
        );
    }

    #[test]
    fn parallel_target_directions_are_rejected() {
        let d = Vector3::new(0.0, 3.0, 0.0);
        assert!(Frame::from_directions(Point3::origin(), d, 2.0 * d).is_none());
        assert!(Frame::from_directions(Point3::origin(), Vector3::zeros(), d).is_none());
    }

    #[test]
    fn rigid_map_carries_anchor_and_axes() {
        let source = Frame::from_points(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        let target = Frame::from_directions(
            Point3::new(3.0, -1.0, 2.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, -1.0, 1.0),
        )
        .unwrap();

        let map = source.rigid_map_to(&target);
        assert_point_eq(map * source.anchor, target.anchor);
        assert!((map * source.u.into_inner() - target.u.into_inner()).norm() < TOLERANCE);
        assert!((map * source.v.into_inner() - target.v.into_inner()).norm() < TOLERANCE);
    }

    #[test]
    fn rigid_map_preserves_distances() {
        let source = Frame::from_points(
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(1.5, 0.5, 0.0),
            Point3::new(0.5, 2.0, 0.5),
        )
        .unwrap();
        let target = Frame::from_directions(
            Point3::new(-2.0, 0.0, 1.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let map = source.rigid_map_to(&target);

        let a = Point3::new(0.3, -0.7, 1.2);
        let b = Point3::new(-1.0, 0.4, 0.8);
        let before = (a - b).norm();
        let after = (map * a - map * b).norm();
        assert!((before - after).abs() < TOLERANCE);
    }
}
