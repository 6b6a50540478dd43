use nalgebra::{Unit, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Display gamma. Input colors decode through this before shading and encode
/// back on output.
pub const GAMMA: f64 = 2.2;

/// Fixed seed for the ambient-occlusion sample set; frames are reproducible.
pub const AO_SAMPLE_SEED: u64 = 0x6f72_6276_6973;

/// Decodes a gamma-encoded color into linear space.
pub fn linearize(color: [f32; 3]) -> Vector3<f64> {
    Vector3::new(
        (color[0] as f64).max(0.0).powf(GAMMA),
        (color[1] as f64).max(0.0).powf(GAMMA),
        (color[2] as f64).max(0.0).powf(GAMMA),
    )
}

/// Encodes a linear color channel for display.
#[inline]
pub fn encode_channel(value: f64) -> f32 {
    value.max(0.0).powf(1.0 / GAMMA) as f32
}

/// Surface material: linear-space albedo plus the roughness/metallicity pair.
///
/// Metals tint their specular lobe by the albedo and carry no diffuse term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vector3<f64>,
    pub roughness: f64,
    pub metallicity: f64,
}

impl Material {
    pub fn new(color: [f32; 3], roughness: f64, metallicity: f64) -> Self {
        Self {
            albedo: linearize(color),
            roughness,
            metallicity,
        }
    }
}

/// The frame's light rig: one directional sun plus a constant ambient term,
/// both already linearized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub sun_direction: Unit<Vector3<f64>>,
    pub sun_color: Vector3<f64>,
    pub ambient_color: Vector3<f64>,
}

/// Shades a surface point.
///
/// `sun_visibility` scales the direct term (0 in full shadow), and
/// `ambient_scale` carries the ambient-occlusion attenuation.
pub fn shade_surface(
    material: &Material,
    normal: &Unit<Vector3<f64>>,
    view: &Unit<Vector3<f64>>,
    lighting: &Lighting,
    sun_visibility: f64,
    ambient_scale: f64,
) -> Vector3<f64> {
    let n_dot_l = normal.dot(&lighting.sun_direction).max(0.0);
    let diffuse = material.albedo * n_dot_l * (1.0 - material.metallicity);

    let half = Unit::new_normalize(lighting.sun_direction.into_inner() + view.into_inner());
    let n_dot_h = normal.dot(&half).max(0.0);
    let shininess = 2.0 / (material.roughness * material.roughness).max(1e-4);
    let tint = Vector3::repeat(1.0).lerp(&material.albedo, material.metallicity);
    let strength = 0.04 + 0.96 * material.metallicity;
    let specular = tint * strength * n_dot_h.powf(shininess) * (shininess + 2.0) / 8.0;

    lighting
        .sun_color
        .component_mul(&(diffuse + specular))
        .scale(sun_visibility)
        + lighting
            .ambient_color
            .component_mul(&material.albedo)
            .scale(ambient_scale)
}

/// Generates the hemisphere sample set for ambient occlusion, in tangent
/// space with +Z as the surface normal.
///
/// Rejection-sampled from the upper unit half-ball with a square-root radial
/// warp that biases samples toward the shell, so few samples still probe the
/// full radius.
pub fn ambient_occlusion_samples(count: usize) -> Vec<Vector3<f64>> {
    let mut rng = StdRng::seed_from_u64(AO_SAMPLE_SEED);
    let mut samples = Vec::with_capacity(count);
    while samples.len() < count {
        let candidate: Vector3<f64> = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.0..1.0),
        );
        let warped = candidate * candidate.norm().sqrt();
        if warped.norm() <= 1.0 {
            samples.push(warped);
        }
    }
    samples
}

/// An orthonormal tangent basis around a normal, for orienting the AO
/// hemisphere.
pub fn tangent_basis(normal: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if normal.z.abs() > 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 0.0, 1.0)
    };
    let tangent = normal.cross(&helper).normalize();
    let bitangent = normal.cross(&tangent);
    (tangent, bitangent)
}
