use super::camera::Ray;
use super::intersect::SurfaceHit;
use super::shading::Lighting;
use crate::core::field::grid::ScalarField;
use nalgebra::{Point3, Unit, Vector3};

/// An isosurface crossing: the refined surface hit plus which signed lobe
/// was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoHit {
    pub hit: SurfaceHit,
    pub positive: bool,
}

/// Marches a ray through the field between `t0` and `t1` looking for the
/// first crossing of `+isovalue` or `-isovalue`.
///
/// The crossing parameter is refined by linear interpolation between the two
/// bracketing samples; the normal comes from the field gradient, flipped to
/// face the ray origin.
pub fn march_isosurface(
    field: &ScalarField,
    ray: &Ray,
    t0: f64,
    t1: f64,
    steps: u32,
    isovalue: f64,
) -> Option<IsoHit> {
    if t1 <= t0 {
        return None;
    }
    let steps = steps.max(1);
    let dt = (t1 - t0) / steps as f64;
    let mut prev_t = t0;
    let mut prev = field.sample(&ray.at(t0));

    for step in 1..=steps {
        let t = t0 + step as f64 * dt;
        let value = field.sample(&ray.at(t));

        let mut crossing: Option<(f64, bool)> = None;
        for (level, positive) in [(isovalue, true), (-isovalue, false)] {
            let f0 = prev - level;
            let f1 = value - level;
            if (f0 <= 0.0) != (f1 <= 0.0) {
                let fraction = f0 / (f0 - f1);
                if crossing.map_or(true, |(best, _)| fraction < best) {
                    crossing = Some((fraction, positive));
                }
            }
        }

        if let Some((fraction, positive)) = crossing {
            let t_hit = prev_t + fraction * dt;
            let point = ray.at(t_hit);
            let gradient = field.gradient(&point);
            let mut normal = if gradient.norm_squared() > 1e-24 {
                gradient.normalize()
            } else {
                -ray.direction.into_inner()
            };
            if normal.dot(&ray.direction) > 0.0 {
                normal = -normal;
            }
            return Some(IsoHit {
                hit: SurfaceHit {
                    t: t_hit,
                    point,
                    normal: Unit::new_unchecked(normal),
                },
                positive,
            });
        }

        prev = value;
        prev_t = t;
    }
    None
}

/// Knobs of the emission/absorption march.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumetricParams {
    pub steps: u32,
    /// Extinction per unit of |field value| per Å.
    pub density: f64,
    /// Transmittance early-out threshold.
    pub cutoff: f64,
    /// 0 = flat emission, 1 = fully gradient-shaded.
    pub gradient: f64,
    pub light_steps: u32,
    pub light_distance: f64,
    /// Pure emission instead of sun-lit scattering.
    pub emissive: bool,
    /// Single-color density mode instead of signed two-color mode.
    pub density_mode: bool,
    pub positive_color: Vector3<f64>,
    pub negative_color: Vector3<f64>,
}

/// Accumulated in-scattered radiance plus the transmittance left for
/// whatever lies behind the volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumetricSample {
    pub color: Vector3<f64>,
    pub transmittance: f64,
}

/// Secondary march toward the sun estimating volume self-shadowing.
pub fn light_transmittance(
    field: &ScalarField,
    point: &Point3<f64>,
    sun_direction: &Unit<Vector3<f64>>,
    params: &VolumetricParams,
) -> f64 {
    if params.light_steps == 0 || params.light_distance <= 0.0 {
        return 1.0;
    }
    let dt = params.light_distance / params.light_steps as f64;
    let mut optical_depth = 0.0;
    for step in 0..params.light_steps {
        let sample = point + (step as f64 + 0.5) * dt * sun_direction.into_inner();
        optical_depth += field.sample(&sample).abs() * params.density * dt;
    }
    (-optical_depth).exp()
}

/// Emission/absorption march between `t0` and `t1`.
///
/// `sun_blocked` reports whether solid geometry occludes the sun from a
/// point (always `false` when the solid shadow map is disabled).
pub fn march_volume(
    field: &ScalarField,
    ray: &Ray,
    t0: f64,
    t1: f64,
    params: &VolumetricParams,
    lighting: &Lighting,
    sun_blocked: &dyn Fn(&Point3<f64>) -> bool,
) -> VolumetricSample {
    let mut result = VolumetricSample {
        color: Vector3::zeros(),
        transmittance: 1.0,
    };
    if t1 <= t0 || params.steps == 0 {
        return result;
    }

    let dt = (t1 - t0) / params.steps as f64;
    for step in 0..params.steps {
        let t = t0 + (step as f64 + 0.5) * dt;
        let point = ray.at(t);
        let value = field.sample(&point);
        let extinction = value.abs() * params.density;
        if extinction <= 0.0 {
            continue;
        }

        let absorbed = (-extinction * dt).exp();
        let albedo = if params.density_mode || value >= 0.0 {
            params.positive_color
        } else {
            params.negative_color
        };

        // Gradient shading darkens faces turned away from the sun.
        let mut shade = 1.0;
        if params.gradient > 0.0 {
            let gradient = field.gradient(&point);
            if gradient.norm_squared() > 1e-24 {
                let lambert = gradient.normalize().dot(&lighting.sun_direction).abs();
                shade = 1.0 + params.gradient * (lambert - 1.0);
            }
        }

        let incoming = if params.emissive {
            Vector3::repeat(shade)
        } else {
            let sun = if sun_blocked(&point) {
                Vector3::zeros()
            } else {
                lighting.sun_color
                    * light_transmittance(field, &point, &lighting.sun_direction, params)
                    * shade
            };
            lighting.ambient_color + sun
        };

        result.color +=
            albedo.component_mul(&incoming) * result.transmittance * (1.0 - absorbed);
        result.transmittance *= absorbed;
        if result.transmittance < params.cutoff {
            result.transmittance = 0.0;
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn x_ramp_field() -> ScalarField {
        // Value = x sample index − 3: crosses −iso and +iso along +x.
        let dims = [8, 4, 4];
        let mut field = ScalarField::zeroed(
            Point3::origin(),
            Vector3::new(1.0, 1.0, 1.0),
            dims,
        );
        for iz in 0..dims[2] {
            for iy in 0..dims[1] {
                for ix in 0..dims[0] {
                    field.set(ix, iy, iz, ix as f32 - 3.0);
                }
            }
        }
        field
    }

    fn x_ray() -> Ray {
        Ray::new(
            Point3::new(0.0, 1.5, 1.5),
            Unit::new_normalize(Vector3::new(1.0, 0.0, 0.0)),
        )
    }

    fn params() -> VolumetricParams {
        VolumetricParams {
            steps: 200,
            density: 1.0,
            cutoff: 1e-5,
            gradient: 0.0,
            light_steps: 0,
            light_distance: 0.0,
            emissive: true,
            density_mode: false,
            positive_color: Vector3::new(1.0, 0.0, 0.0),
            negative_color: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    fn lighting() -> Lighting {
        Lighting {
            sun_direction: Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)),
            sun_color: Vector3::repeat(1.0),
            ambient_color: Vector3::repeat(0.1),
        }
    }

    #[test]
    fn isosurface_crossing_is_refined_between_samples() {
        let field = x_ramp_field();
        // Field value along the ray: f(x) = x − 3; +0.5 crossing at x = 3.5.
        let hit = march_isosurface(&field, &x_ray(), 3.0, 7.0, 40, 0.5).unwrap();
        assert!(hit.positive);
        assert!((hit.hit.t - 3.5).abs() < 1e-6);
    }

    #[test]
    fn negative_lobe_crossings_are_flagged() {
        let field = x_ramp_field();
        // Walking from x=0 (f=−3) the first crossing is −0.5 at x = 2.5.
        let hit = march_isosurface(&field, &x_ray(), 0.0, 7.0, 70, 0.5).unwrap();
        assert!(!hit.positive);
        assert!((hit.hit.t - 2.5).abs() < 1e-6);
    }

    #[test]
    fn isosurface_normal_faces_the_ray_origin() {
        let field = x_ramp_field();
        let hit = march_isosurface(&field, &x_ray(), 0.0, 7.0, 70, 0.5).unwrap();
        assert!(hit.hit.normal.x < 0.0);
    }

    #[test]
    fn empty_interval_yields_no_crossing() {
        let field = x_ramp_field();
        assert!(march_isosurface(&field, &x_ray(), 5.0, 5.0, 10, 0.5).is_none());
        assert!(march_isosurface(&field, &x_ray(), 0.0, 1.0, 10, 0.5).is_none());
    }

    #[test]
    fn volume_march_attenuates_transmittance() {
        let field = x_ramp_field();
        let sample = march_volume(
            &field,
            &x_ray(),
            0.0,
            7.0,
            &params(),
            &lighting(),
            &|_| false,
        );
        assert!(sample.transmittance < 1.0);
        assert!(sample.color.norm() > 0.0);
    }

    #[test]
    fn signed_mode_uses_both_colors() {
        let field = x_ramp_field();
        // March only through the negative region.
        let negative = march_volume(
            &field,
            &x_ray(),
            0.0,
            2.0,
            &params(),
            &lighting(),
            &|_| false,
        );
        assert!(negative.color.z > 0.0);
        assert_eq!(negative.color.x, 0.0);

        // Density mode paints everything with the positive color.
        let mut density_params = params();
        density_params.density_mode = true;
        let flat = march_volume(
            &field,
            &x_ray(),
            0.0,
            2.0,
            &density_params,
            &lighting(),
            &|_| false,
        );
        assert!(flat.color.x > 0.0);
        assert_eq!(flat.color.z, 0.0);
    }

    #[test]
    fn cutoff_terminates_dense_marches() {
        let field = x_ramp_field();
        let mut dense = params();
        dense.density = 100.0;
        let sample = march_volume(
            &field,
            &x_ray(),
            0.0,
            7.0,
            &dense,
            &lighting(),
            &|_| false,
        );
        assert_eq!(sample.transmittance, 0.0);
    }
}
