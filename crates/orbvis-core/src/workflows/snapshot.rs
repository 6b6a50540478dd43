use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{info, instrument};

use super::{load_model, InputFormat};
use crate::core::field::evaluator::FieldTarget;
use crate::core::models::orbital::Spin;
use crate::core::render::framebuffer::Framebuffer;
use crate::engine::cancel::CancelToken;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::session::Session;
use crate::engine::settings::RenderSettings;

/// Clearance added around the bounding sphere when framing automatically.
const AUTO_FRAME_MARGIN: f64 = 2.0;

/// Which scalar field the snapshot shows, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelection {
    /// Geometry only; a grid loaded from a cube file is still shown.
    None,
    Orbital(usize),
    /// The highest occupied orbital across both spin channels.
    Homo,
    /// The first unoccupied orbital.
    Lumo,
    /// The total electron density.
    Density,
}

/// Everything the snapshot pipeline needs beyond the input file.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub width: u32,
    pub height: u32,
    pub selection: FieldSelection,
    pub settings: RenderSettings,
    /// Explicit camera placement; `None` frames the model automatically.
    pub camera: Option<(Point3<f64>, Vector3<f64>)>,
    /// Explicit grid resolution; `None` derives it from `cubemap_density`.
    pub resolution: Option<[usize; 3]>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            selection: FieldSelection::None,
            settings: RenderSettings::default(),
            camera: None,
            resolution: None,
        }
    }
}

/// The finished snapshot plus what it ended up showing.
#[derive(Debug)]
pub struct SnapshotResult {
    pub frame: Framebuffer,
    pub format: InputFormat,
    pub target: Option<FieldTarget>,
}

/// Runs the full pipeline: load the file, generate the selected field, frame
/// the camera, and render one image.
///
/// # Errors
///
/// Fails with the loader's parse error on malformed input, `InvalidArgument`
/// for an unrecognizable format or an unresolvable orbital selection, and any
/// generation or render error.
#[instrument(skip_all, name = "snapshot_workflow", fields(path = %path.display()))]
pub fn run(
    path: &Path,
    format: Option<InputFormat>,
    config: &SnapshotConfig,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<SnapshotResult, EngineError> {
    let mut session = Session::new();
    session.update_settings(config.settings.clone())?;

    let format = load_model(&mut session, path, format)?;
    info!(?format, atoms = session.atom_count(), "Model loaded");

    if let Some([x, y, z]) = config.resolution {
        session.set_cubemap_resolution(x, y, z)?;
    }

    let target = resolve_selection(&session, config.selection)?;
    if let Some(target) = target {
        session.generate_cubemap_with(target, reporter, cancel)?;
    }

    match config.camera {
        Some((position, direction)) => session.set_camera(position, direction)?,
        None => {
            if let Some((position, direction)) = frame_camera(&session) {
                session.set_camera(position, direction)?;
            }
        }
    }

    let frame = session.render_with(config.width, config.height, reporter, cancel)?;
    Ok(SnapshotResult {
        frame,
        format,
        target,
    })
}

/// Resolves the symbolic orbital selection against the loaded model.
fn resolve_selection(
    session: &Session,
    selection: FieldSelection,
) -> Result<Option<FieldTarget>, EngineError> {
    match selection {
        FieldSelection::None => Ok(None),
        FieldSelection::Orbital(index) => Ok(Some(FieldTarget::Orbital(index))),
        FieldSelection::Homo => {
            let index = session
                .homo(Spin::Alpha)
                .into_iter()
                .chain(session.homo(Spin::Beta))
                .max()
                .ok_or_else(|| {
                    EngineError::invalid_argument("the model has no occupied orbital")
                })?;
            Ok(Some(FieldTarget::Orbital(index)))
        }
        FieldSelection::Lumo => {
            let index = session.lumo().ok_or_else(|| {
                EngineError::invalid_argument("the model has no unoccupied orbital")
            })?;
            Ok(Some(FieldTarget::Orbital(index)))
        }
        FieldSelection::Density => Ok(Some(FieldTarget::Density)),
    }
}

/// Places the camera on the -Y axis so the model's bounding sphere fits the
/// vertical extent of the frame. Empty models keep the default camera.
fn frame_camera(session: &Session) -> Option<(Point3<f64>, Vector3<f64>)> {
    let (min, max) = session.bounding_box()?;
    let center = min + 0.5 * (max - min);
    let radius = 0.5 * (max - min).norm() + AUTO_FRAME_MARGIN;

    let settings = session.settings();
    let distance = if settings.orthographic {
        radius + settings.z_near
    } else {
        radius / (settings.fov.to_radians() * 0.5).tan()
    };
    Some((center - distance * Vector3::y(), Vector3::y()))
}
