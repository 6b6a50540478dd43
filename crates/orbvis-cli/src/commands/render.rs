use crate::cli::RenderArgs;
use crate::error::Result;
use crate::utils::parser::{parse_dims, parse_selection, parse_triple};
use crate::utils::progress::CliProgressHandler;
use image::{Rgba, RgbaImage};
use nalgebra::{Point3, Vector3};
use orbvis::core::render::framebuffer::Framebuffer;
use orbvis::engine::cancel::CancelToken;
use orbvis::engine::progress::ProgressReporter;
use orbvis::engine::settings::RenderSettings;
use orbvis::workflows::snapshot::{self, FieldSelection, SnapshotConfig};
use tracing::info;

pub fn run(args: RenderArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => {
            info!("Loading render settings from {:?}", path);
            RenderSettings::load_from_path(path)?
        }
        None => RenderSettings::default(),
    };

    let selection = match &args.orbital {
        Some(text) => parse_selection(text)?,
        None => FieldSelection::None,
    };
    let camera = match (&args.camera_position, &args.camera_direction) {
        (Some(position), Some(direction)) => Some((
            Point3::from(parse_triple(position)?),
            Vector3::from(parse_triple(direction)?),
        )),
        _ => None,
    };
    let resolution = args.resolution.as_deref().map(parse_dims).transpose()?;

    let config = SnapshotConfig {
        width: args.width,
        height: args.height,
        selection,
        settings,
        camera,
        resolution,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the snapshot workflow for {:?}", &args.input);
    let result = snapshot::run(
        &args.input,
        args.format.map(Into::into),
        &config,
        &reporter,
        &CancelToken::new(),
    )?;

    encode_image(&result.frame).save(&args.output)?;
    match result.target {
        Some(target) => println!(
            "✓ {:?} rendered to: {}",
            target,
            args.output.display()
        ),
        None => println!("✓ Structure rendered to: {}", args.output.display()),
    }
    Ok(())
}

/// Quantizes the gamma-encoded f32 framebuffer to 8-bit RGBA.
fn encode_image(frame: &Framebuffer) -> RgbaImage {
    RgbaImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b, a] = frame.color_at(x, y);
        Rgba([to_byte(r), to_byte(g), to_byte(b), to_byte(a)])
    })
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_quantize_with_clamping() {
        assert_eq!(to_byte(0.0), 0);
        assert_eq!(to_byte(1.0), 255);
        assert_eq!(to_byte(1.7), 255);
        assert_eq!(to_byte(-0.2), 0);
        assert_eq!(to_byte(0.5), 128);
    }

    #[test]
    fn framebuffers_encode_pixel_for_pixel() {
        let mut frame = Framebuffer::new(2, 1);
        frame.set_pixel(0, 0, [1.0, 0.5, 0.0, 1.0], 1.0);
        frame.set_pixel(1, 0, [0.0, 0.0, 0.0, 0.0], f64::INFINITY);

        let image = encode_image(&frame);
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [255, 128, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }
}
