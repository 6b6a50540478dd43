use crate::core::data::constants::BOHR_RADIUS_ANGSTROM;
use crate::core::field::grid::ScalarField;
use crate::core::models::molecule::Molecule;
use crate::core::render::camera::{Camera, Projection, Ray, RayGenerator};
use crate::core::render::framebuffer::Framebuffer;
use crate::core::render::intersect::SurfaceHit;
use crate::core::render::raymarch::{
    light_transmittance, march_isosurface, march_volume, VolumetricParams,
};
use crate::core::render::scene::{GeometryStyle, Scene};
use crate::core::render::shading::{
    ambient_occlusion_samples, encode_channel, linearize, shade_surface, tangent_basis, Lighting,
    Material,
};
use crate::engine::cancel::CancelToken;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::settings::RenderSettings;
use nalgebra::{Point3, Unit, Vector3};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Shadow and occlusion rays start this far off the surface.
const SURFACE_EPSILON: f64 = 1e-4;

/// View-depth difference treated as a silhouette edge by the outline pass.
const OUTLINE_DEPTH_STEP: f64 = 0.3;

/// Everything one frame reads. All references are immutable snapshots; the
/// task never mutates engine state.
pub struct FrameInputs<'a> {
    pub molecule: &'a Molecule,
    /// Materials indexed by atomic number, covering the element table.
    pub materials: &'a [Material],
    pub settings: &'a RenderSettings,
    pub camera: &'a Camera,
    pub field: Option<&'a ScalarField>,
}

/// Renders one frame.
///
/// # Errors
///
/// Fails with `InvalidArgument` for a degenerate frame size or sun position
/// and `Cancelled` when the token is set between row batches.
#[instrument(skip_all, name = "render_frame", fields(width = width, height = height))]
pub fn render(
    inputs: &FrameInputs,
    width: u32,
    height: u32,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<Framebuffer, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::invalid_argument(
            "frame dimensions must be positive",
        ));
    }
    let renderer = PixelRenderer::new(inputs, width, height)?;
    cancel.check()?;

    info!(
        width,
        height,
        atoms = inputs.molecule.atom_count(),
        with_field = inputs.field.is_some(),
        "Rendering frame"
    );
    reporter.report(Progress::PhaseStart { name: "render" });
    reporter.report(Progress::TaskStart {
        total: height as u64,
    });

    let mut framebuffer = Framebuffer::new(width, height);
    {
        let rows: Vec<(u32, &mut [[f32; 4]], &mut [f64])> = framebuffer.rows_mut().collect();

        #[cfg(feature = "parallel")]
        let row_iter = rows.into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let row_iter = rows.into_iter();

        row_iter.try_for_each(|(y, colors, depths)| -> Result<(), EngineError> {
            cancel.check()?;
            for x in 0..width {
                let (color, depth) = renderer.render_pixel(x, y);
                colors[x as usize] = color;
                depths[x as usize] = depth;
            }
            reporter.report(Progress::TaskIncrement { amount: 1 });
            Ok(())
        })?;
    }

    apply_outline(&mut framebuffer, inputs.settings.outline_radius);

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    Ok(framebuffer)
}

/// Immutable per-frame state shared by every pixel.
struct PixelRenderer<'a> {
    scene: Scene,
    generator: RayGenerator,
    lighting: Lighting,
    volumetric: VolumetricParams,
    field: Option<&'a ScalarField>,
    settings: &'a RenderSettings,
    iso_positive: Material,
    iso_negative: Material,
    /// The isovalue converted from atomic units to engine field units.
    iso_level: f64,
    ao_samples: Vec<Vector3<f64>>,
    jitter: Vec<(f64, f64)>,
}

impl<'a> PixelRenderer<'a> {
    fn new(inputs: &FrameInputs<'a>, width: u32, height: u32) -> Result<Self, EngineError> {
        let settings = inputs.settings;

        let style = GeometryStyle {
            size_factor: settings.size_factor,
            bond_thickness: settings.bond_thickness,
            smooth_bonds: settings.smooth_bonds,
        };
        let scene = Scene::build(inputs.molecule, inputs.materials, &style);

        let projection = if settings.orthographic {
            Projection::Orthographic {
                height: settings.fov,
            }
        } else {
            Projection::Perspective {
                fov_degrees: settings.fov,
            }
        };
        let generator = RayGenerator::new(inputs.camera, projection, width, height);

        let sun_direction = Unit::try_new(
            Vector3::new(
                settings.sun_position[0],
                settings.sun_position[1],
                settings.sun_position[2],
            ),
            1e-12,
        )
        .ok_or_else(|| EngineError::invalid_argument("sun_position must be non-zero"))?;
        let lighting = Lighting {
            sun_direction,
            sun_color: linearize(settings.sun_color),
            ambient_color: linearize(settings.ambient_color),
        };

        let volumetric = VolumetricParams {
            steps: settings.volumetric_iterations,
            density: settings.volumetric_density,
            cutoff: settings.volumetric_cutoff,
            gradient: settings.volumetric_gradient,
            light_steps: settings.volumetric_light_iterations,
            light_distance: settings.volumetric_light_distance,
            emissive: settings.emissive_volume,
            density_mode: settings.volumetric_color_mode,
            positive_color: linearize(settings.mo_color_0),
            negative_color: linearize(settings.mo_color_1),
        };

        let ao_enabled =
            settings.ao_iterations > 0 && settings.ao_intensity > 0.0 && settings.ao_radius > 0.0;
        let ao_samples = if ao_enabled {
            ambient_occlusion_samples(settings.ao_iterations as usize)
        } else {
            Vec::new()
        };

        let n = settings.aa_quality.max(1);
        let mut jitter = Vec::with_capacity((n * n) as usize);
        for jy in 0..n {
            for jx in 0..n {
                jitter.push((
                    (jx as f64 + 0.5) / n as f64 - 0.5,
                    (jy as f64 + 0.5) / n as f64 - 0.5,
                ));
            }
        }

        Ok(Self {
            scene,
            generator,
            lighting,
            volumetric,
            field: inputs.field,
            settings,
            iso_positive: Material::new(
                settings.mo_color_0,
                settings.isosurface_roughness,
                settings.isosurface_metallicity,
            ),
            iso_negative: Material::new(
                settings.mo_color_1,
                settings.isosurface_roughness,
                settings.isosurface_metallicity,
            ),
            iso_level: settings.isovalue / BOHR_RADIUS_ANGSTROM.powf(1.5),
            ao_samples,
            jitter,
        })
    }

    fn render_pixel(&self, x: u32, y: u32) -> ([f32; 4], f64) {
        let mut color = Vector3::zeros();
        let mut alpha = 0.0;
        let mut depth = f64::INFINITY;

        for &(dx, dy) in &self.jitter {
            let ray = self
                .generator
                .ray_through(x as f64 + 0.5 + dx, y as f64 + 0.5 + dy);
            let (sample_color, sample_alpha, sample_depth) = self.trace(&ray);
            color += sample_color;
            alpha += sample_alpha;
            depth = depth.min(sample_depth);
        }
        let samples = self.jitter.len() as f64;
        color /= samples;
        alpha /= samples;

        (
            finalize_pixel(
                color,
                alpha,
                self.settings.clear_color,
                self.settings.brightness,
                self.settings.premultiply_color,
            ),
            depth,
        )
    }

    /// Traces one sample: nearest solid or isosurface hit, shaded, with the
    /// volumetric march composited in front. Returns linear color, coverage,
    /// and view depth.
    fn trace(&self, ray: &Ray) -> (Vector3<f64>, f64, f64) {
        let mut surface: Option<(SurfaceHit, Material)> = self
            .scene
            .nearest_hit(ray)
            .filter(|(hit, _)| hit.t >= self.settings.z_near && hit.t <= self.settings.z_far)
            .map(|(hit, material)| (hit, *material));

        let interval = self.field.and_then(|field| {
            let (min, max) = field.bounds();
            slab_interval(ray, &min, &max)
        });

        if let (Some(field), Some((enter, exit))) = (self.field, interval) {
            let t0 = enter.max(self.settings.z_near);
            let mut t1 = exit.min(self.settings.z_far);
            if let Some((hit, _)) = &surface {
                t1 = t1.min(hit.t);
            }
            if let Some(iso) = march_isosurface(
                field,
                ray,
                t0,
                t1,
                self.settings.volumetric_iterations,
                self.iso_level,
            ) {
                let material = if iso.positive {
                    self.iso_positive
                } else {
                    self.iso_negative
                };
                surface = Some((iso.hit, material));
            }
        }

        let (mut color, mut alpha, depth) = match &surface {
            Some((hit, material)) => {
                let view = Unit::new_normalize(-ray.direction.into_inner());
                let sun_visibility = self.sun_visibility(&hit.point, &hit.normal);
                let ambient_scale = self.ambient_scale(&hit.point, &hit.normal);
                let shaded = shade_surface(
                    material,
                    &hit.normal,
                    &view,
                    &self.lighting,
                    sun_visibility,
                    ambient_scale,
                );
                (shaded, 1.0, self.generator.depth_of(&hit.point))
            }
            None => (Vector3::zeros(), 0.0, f64::INFINITY),
        };

        if let (Some(field), Some((enter, exit))) = (self.field, interval) {
            let t0 = enter.max(self.settings.z_near);
            let mut t1 = exit.min(self.settings.z_far);
            if let Some((hit, _)) = &surface {
                t1 = t1.min(hit.t);
            }
            let volume = march_volume(
                field,
                ray,
                t0,
                t1,
                &self.volumetric,
                &self.lighting,
                &|point| {
                    self.settings.volumetric_shadowmap
                        && self.scene.occluded(
                            point,
                            &self.lighting.sun_direction,
                            self.settings.z_far,
                        )
                },
            );
            color = volume.color + color * volume.transmittance;
            alpha = 1.0 - (1.0 - alpha) * volume.transmittance;
        }

        (color, alpha, depth)
    }

    /// Direct-light factor at a surface point: zero behind solid geometry,
    /// otherwise the transmittance of the volume toward the sun.
    fn sun_visibility(&self, point: &Point3<f64>, normal: &Unit<Vector3<f64>>) -> f64 {
        let offset = point + SURFACE_EPSILON * normal.into_inner();
        if self
            .scene
            .occluded(&offset, &self.lighting.sun_direction, self.settings.z_far)
        {
            return 0.0;
        }
        match self.field {
            Some(field) => light_transmittance(
                field,
                &offset,
                &self.lighting.sun_direction,
                &self.volumetric,
            ),
            None => 1.0,
        }
    }

    /// Ambient attenuation by hemisphere occlusion sampling.
    fn ambient_scale(&self, point: &Point3<f64>, normal: &Unit<Vector3<f64>>) -> f64 {
        if self.ao_samples.is_empty() {
            return 1.0;
        }
        let offset = point + SURFACE_EPSILON * normal.into_inner();
        let (tangent, bitangent) = tangent_basis(normal);

        let mut occluded = 0;
        for sample in &self.ao_samples {
            let reach = sample.norm();
            if reach < 1e-12 {
                continue;
            }
            let direction = Unit::new_normalize(
                tangent * sample.x + bitangent * sample.y + normal.into_inner() * sample.z,
            );
            if self
                .scene
                .occluded(&offset, &direction, self.settings.ao_radius * reach)
            {
                occluded += 1;
            }
        }
        let fraction = occluded as f64 / self.ao_samples.len() as f64;
        (1.0 - self.settings.ao_intensity * fraction.powf(self.settings.ao_exponent))
            .clamp(0.0, 1.0)
    }
}

/// Converts one averaged sample into a stored pixel: brightness, optional
/// un-premultiply, and the gamma encode. Uncovered pixels carry the clear
/// color verbatim with alpha zero.
fn finalize_pixel(
    color: Vector3<f64>,
    alpha: f64,
    clear_color: [f32; 3],
    brightness: f64,
    premultiply: bool,
) -> [f32; 4] {
    if alpha <= 0.0 {
        return [clear_color[0], clear_color[1], clear_color[2], 0.0];
    }
    let mut rgb = color * brightness;
    if !premultiply {
        rgb /= alpha;
    }
    [
        encode_channel(rgb.x),
        encode_channel(rgb.y),
        encode_channel(rgb.z),
        alpha as f32,
    ]
}

/// The parameter interval where a ray overlaps an axis-aligned box, clamped
/// to the forward half of the ray.
fn slab_interval(ray: &Ray, min: &Point3<f64>, max: &Point3<f64>) -> Option<(f64, f64)> {
    let mut t0 = 0.0_f64;
    let mut t1 = f64::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction.abs() < 1e-12 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let a = (min[axis] - origin) / direction;
        let b = (max[axis] - origin) / direction;
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        t0 = t0.max(near);
        t1 = t1.min(far);
    }
    (t0 <= t1).then_some((t0, t1))
}

/// Screen-space silhouette darkening from the depth buffer. Pixels with a
/// markedly closer neighbor within `radius` are darkened, strongest at the
/// edge and fading outward; affected background pixels gain the outline's
/// coverage so it survives compositing.
fn apply_outline(framebuffer: &mut Framebuffer, radius: u32) {
    if radius == 0 {
        return;
    }
    let width = framebuffer.width();
    let height = framebuffer.height();
    let r = radius as i64;

    let depths: Vec<f64> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| framebuffer.depth_at(x, y))
        .collect();
    let depth_at = |x: i64, y: i64| depths[y as usize * width as usize + x as usize];

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let depth = depth_at(x, y);
            let mut strength = 0.0_f64;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    let distance = ((dx * dx + dy * dy) as f64).sqrt();
                    if distance > radius as f64 {
                        continue;
                    }
                    if depth_at(nx, ny) < depth - OUTLINE_DEPTH_STEP {
                        let falloff = 1.0 - (distance - 1.0).max(0.0) / radius as f64;
                        strength = strength.max(falloff);
                    }
                }
            }
            if strength > 0.0 {
                let pixel = framebuffer.color_at(x as u32, y as u32);
                let fade = (1.0 - strength) as f32;
                framebuffer.set_color(
                    x as u32,
                    y as u32,
                    [
                        pixel[0] * fade,
                        pixel[1] * fade,
                        pixel[2] * fade,
                        pixel[3].max(strength as f32),
                    ],
                );
            }
        }
    }
}
