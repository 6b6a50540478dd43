use nalgebra::{Point3, Unit, Vector3};

/// A view ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Unit<Vector3<f64>>) -> Self {
        Self { origin, direction }
    }

    /// The point at parameter `t` along the ray.
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + t * self.direction.into_inner()
    }
}

/// Pure camera state: a position and a normalized view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Camera {
    /// Returns `None` for a zero view direction.
    pub fn new(position: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let direction = Unit::try_new(direction, 1e-12)?;
        Some(Self {
            position,
            direction,
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, -10.0, 0.0),
            direction: Unit::new_unchecked(Vector3::new(0.0, 1.0, 0.0)),
        }
    }
}

/// Projection mode of the ray generator.
///
/// Perspective takes the vertical field of view in degrees; orthographic
/// interprets the same setting as the frame height in Å (the width is
/// `height·aspect`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_degrees: f64 },
    Orthographic { height: f64 },
}

/// Generates primary rays for a frame.
///
/// The view basis uses world +Z as up, falling back to +Y when the view
/// direction is near-parallel to the Z axis.
#[derive(Debug, Clone)]
pub struct RayGenerator {
    position: Point3<f64>,
    forward: Vector3<f64>,
    right: Vector3<f64>,
    up: Vector3<f64>,
    projection: Projection,
    aspect: f64,
    width: f64,
    height: f64,
}

impl RayGenerator {
    pub fn new(camera: &Camera, projection: Projection, width: u32, height: u32) -> Self {
        let forward = camera.direction.into_inner();
        let world_up = if forward.z.abs() > 0.999 {
            Vector3::new(0.0, 1.0, 0.0)
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };
        let right = forward.cross(&world_up).normalize();
        let up = right.cross(&forward);
        Self {
            position: camera.position,
            forward,
            right,
            up,
            projection,
            aspect: width as f64 / height as f64,
            width: width as f64,
            height: height as f64,
        }
    }

    /// The ray through a continuous pixel coordinate; `(0, 0)` is the top-left
    /// corner, so callers pass `x + 0.5` style offsets for pixel centers.
    pub fn ray_through(&self, x: f64, y: f64) -> Ray {
        let sx = 2.0 * x / self.width - 1.0;
        let sy = 1.0 - 2.0 * y / self.height;
        match self.projection {
            Projection::Perspective { fov_degrees } => {
                let half_tan = (fov_degrees.to_radians() * 0.5).tan();
                let direction = self.forward
                    + sx * self.aspect * half_tan * self.right
                    + sy * half_tan * self.up;
                Ray::new(self.position, Unit::new_normalize(direction))
            }
            Projection::Orthographic { height } => {
                let origin = self.position
                    + sx * 0.5 * height * self.aspect * self.right
                    + sy * 0.5 * height * self.up;
                Ray::new(origin, Unit::new_unchecked(self.forward))
            }
        }
    }

    /// View-space depth of a world point: its distance along the forward axis.
    pub fn depth_of(&self, point: &Point3<f64>) -> f64 {
        (point - self.position).dot(&self.forward)
    }
}
