use super::camera::Ray;
use nalgebra::{Point3, Unit, Vector3};

/// Hits closer than this are ignored, so secondary rays do not re-hit the
/// surface they start on.
pub const HIT_EPSILON: f64 = 1e-9;

/// A ray/surface intersection: parameter, point, and outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub t: f64,
    pub point: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
}

/// Nearest intersection with a sphere.
pub fn ray_sphere(ray: &Ray, center: &Point3<f64>, radius: f64) -> Option<SurfaceHit> {
    let oc = ray.origin - center;
    let half_b = oc.dot(&ray.direction);
    let c = oc.norm_squared() - radius * radius;
    let discriminant = half_b * half_b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t = if -half_b - sqrt_d > HIT_EPSILON {
        -half_b - sqrt_d
    } else if -half_b + sqrt_d > HIT_EPSILON {
        -half_b + sqrt_d
    } else {
        return None;
    };
    let point = ray.at(t);
    Some(SurfaceHit {
        t,
        point,
        normal: Unit::new_normalize(point - center),
    })
}

/// Nearest intersection with a finite open cylinder (no end caps) between
/// `a` and `b`.
pub fn ray_cylinder(ray: &Ray, a: &Point3<f64>, b: &Point3<f64>, radius: f64) -> Option<SurfaceHit> {
    let axis = b - a;
    let length = axis.norm();
    if length < HIT_EPSILON {
        return None;
    }
    let axis = axis / length;

    let d = ray.direction.into_inner();
    let oc = ray.origin - a;
    let d_perp = d - d.dot(&axis) * axis;
    let oc_perp = oc - oc.dot(&axis) * axis;

    let quadratic = d_perp.norm_squared();
    if quadratic < HIT_EPSILON * HIT_EPSILON {
        // Ray parallel to the axis never crosses the lateral surface.
        return None;
    }
    let half_b = oc_perp.dot(&d_perp);
    let c = oc_perp.norm_squared() - radius * radius;
    let discriminant = half_b * half_b - quadratic * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();

    for t in [(-half_b - sqrt_d) / quadratic, (-half_b + sqrt_d) / quadratic] {
        if t <= HIT_EPSILON {
            continue;
        }
        let point = ray.at(t);
        let s = (point - a).dot(&axis);
        if (0.0..=length).contains(&s) {
            let foot = a + s * axis;
            return Some(SurfaceHit {
                t,
                point,
                normal: Unit::new_normalize(point - foot),
            });
        }
    }
    None
}

/// Nearest intersection with a capsule (cylinder with hemispherical caps).
pub fn ray_capsule(ray: &Ray, a: &Point3<f64>, b: &Point3<f64>, radius: f64) -> Option<SurfaceHit> {
    let mut best: Option<SurfaceHit> = None;
    for hit in [
        ray_cylinder(ray, a, b, radius),
        ray_sphere(ray, a, radius),
        ray_sphere(ray, b, radius),
    ]
    .into_iter()
    .flatten()
    {
        if best.map_or(true, |current| hit.t < current.t) {
            best = Some(hit);
        }
    }
    best
}

/// Entry and exit parameters of a ray through an axis-aligned box, by the
/// slab method. `None` when the ray misses or the box is entirely behind the
/// origin; the entry parameter is clamped to zero for origins inside.
pub fn ray_box(ray: &Ray, min: &Point3<f64>, max: &Point3<f64>) -> Option<(f64, f64)> {
    let mut t_entry = 0.0_f64;
    let mut t_exit = f64::INFINITY;
    for axis in 0..3 {
        let direction = ray.direction[axis];
        let origin = ray.origin[axis];
        if direction.abs() < 1e-15 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let t0 = (min[axis] - origin) * inv;
        let t1 = (max[axis] - origin) * inv;
        let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        t_entry = t_entry.max(near);
        t_exit = t_exit.min(far);
        if t_entry > t_exit {
            return None;
        }
    }
    Some((t_entry, t_exit))
}
