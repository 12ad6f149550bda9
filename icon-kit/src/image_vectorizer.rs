use anyhow::{Context, Result};
use image::{imageops, DynamicImage, ImageBuffer, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use visioncortex::PathSimplifyMode;
use vtracer::{convert_image_to_svg, ColorMode, Config, Hierarchical};

use crate::color::Color;
use crate::error::IconError;

/// Mean luminance below this marks an image as dark
pub const DARK_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    /// Flatten onto this color before tracing; `None` keeps transparency
    pub background: Option<Color>,
}

#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// Traced SVG inside the working directory
    pub svg_path: PathBuf,
    pub svg: String,
    /// The source was dark and got traced inverted
    pub inverted: bool,
}

/// Mean grayscale luminance in [0, 1]. Alpha is ignored.
pub fn mean_luminance(image: &DynamicImage) -> f64 {
    let gray = image.to_luma8();
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return 1.0;
    }
    let total: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
    total as f64 / (count as f64 * 255.0)
}

pub fn is_dark(image: &DynamicImage) -> bool {
    mean_luminance(image) < DARK_THRESHOLD
}

/// Negate the color channels and keep alpha untouched.
pub fn invert_rgb(image: &DynamicImage) -> RgbaImage {
    let mut out = image.to_rgba8();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([255 - r, 255 - g, 255 - b, a]);
    }
    out
}

/// Composite `image` over a solid `background`.
pub fn flatten(image: &RgbaImage, background: Color) -> RgbaImage {
    let mut canvas: RgbaImage = ImageBuffer::from_pixel(image.width(), image.height(), background.into());
    imageops::overlay(&mut canvas, image, 0, 0);
    canvas
}

/// Build the raster handed to the tracer and report whether it was inverted.
pub fn prepare_trace_input(source: &DynamicImage, background: Option<Color>) -> (RgbaImage, bool) {
    let luminance = mean_luminance(source);
    let inverted = luminance < DARK_THRESHOLD;

    let image = if inverted {
        info!("Image is dark (mean luminance {:.3}), tracing an inverted copy", luminance);
        invert_rgb(source)
    } else {
        source.to_rgba8()
    };

    let image = match background {
        Some(color) => {
            debug!("Flattening onto {}", color.to_hex());
            flatten(&image, color)
        }
        None => image,
    };

    (image, inverted)
}

/// Trace `source` to an SVG inside `workdir`.
pub fn trace_to_svg(source: &DynamicImage, opts: &TraceOptions, workdir: &Path) -> Result<TraceOutcome> {
    let (prepared, inverted) = prepare_trace_input(source, opts.background);

    // vtracer works from files
    let input_path = workdir.join("trace_input.png");
    prepared
        .save_with_format(&input_path, image::ImageFormat::Png)
        .context("Failed to save tracer input")?;

    let svg_path = workdir.join("traced.svg");

    convert_image_to_svg(&input_path, &svg_path, tracer_config())
        .map_err(|e| IconError::TraceFailure(format!("vtracer: {}", e)))?;

    let svg = std::fs::read_to_string(&svg_path)
        .context("Failed to read generated SVG")?;

    debug!("Traced {} bytes of SVG", svg.len());

    Ok(TraceOutcome { svg_path, svg, inverted })
}

/// Full-color tracing with smooth curves, tuned for flat icon artwork
fn tracer_config() -> Config {
    Config {
        color_mode: ColorMode::Color,
        hierarchical: Hierarchical::Stacked,
        mode: PathSimplifyMode::Spline,
        filter_speckle: 4, // Remove small artifacts
        color_precision: 6,
        layer_difference: 16,
        corner_threshold: 60,
        length_threshold: 4.0,
        max_iterations: 10,
        splice_threshold: 45,
        path_precision: Some(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(16, 16, Rgba(rgba)))
    }

    /// Transparent black background with an opaque white square in the middle
    fn dark_logo() -> DynamicImage {
        let img = ImageBuffer::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) {
                Rgba([255u8, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_mean_luminance_bounds() {
        assert_eq!(mean_luminance(&solid([0, 0, 0, 255])), 0.0);
        assert_eq!(mean_luminance(&solid([255, 255, 255, 255])), 1.0);
        assert!(is_dark(&solid([20, 20, 20, 255])));
        assert!(!is_dark(&solid([200, 200, 200, 255])));
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let inverted = invert_rgb(&solid([10, 100, 250, 77]));
        assert!(inverted.pixels().all(|p| *p == Rgba([245, 155, 5, 77])));
    }

    #[test]
    fn test_dark_image_without_background_keeps_transparency() {
        let (prepared, inverted) = prepare_trace_input(&dark_logo(), None);

        assert!(inverted);
        assert_eq!(prepared.get_pixel(0, 0), &Rgba([255, 255, 255, 0]));
        assert_eq!(prepared.get_pixel(32, 32), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_background_flattens_before_tracing() {
        let (prepared, inverted) = prepare_trace_input(&dark_logo(), Some(Color([0, 0, 255, 255])));

        assert!(inverted);
        assert_eq!(prepared.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(prepared.get_pixel(32, 32), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_light_image_is_not_inverted() {
        let (prepared, inverted) = prepare_trace_input(&solid([250, 250, 250, 255]), None);
        assert!(!inverted);
        assert_eq!(prepared.get_pixel(3, 3), &Rgba([250, 250, 250, 255]));
    }

    #[test]
    fn test_trace_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = trace_to_svg(&dark_logo(), &TraceOptions::default(), dir.path()).unwrap();

        assert!(outcome.inverted);
        assert!(outcome.svg_path.exists());
        assert!(outcome.svg.contains("<svg"));
        assert!(outcome.svg.contains("<path"));
    }
}
