use anyhow::Result;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageBuffer, RgbaImage};
use tracing::debug;

use crate::background::infer_background;
use crate::color::Color;
use crate::error::IconError;
use crate::scale::ScalePercent;

/// Largest side, in pixels, an intermediate image may reach while fitting or scaling
pub const MAX_SIDE: u32 = 16384;

/// Placement of a source image on a fixed W×H canvas
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    pub width: u32,
    pub height: u32,
    /// Extra uniform scale applied after fitting
    pub scale: ScalePercent,
    /// Horizontal displacement in pixels, positive moves right
    pub h_shift: i32,
    /// Vertical displacement in pixels, positive moves down
    pub v_shift: i32,
    /// Canvas fill; inferred from the source when `None`
    pub background: Option<Color>,
}

impl ComposeOptions {
    pub fn new(width: u32, height: u32) -> Self {
        ComposeOptions {
            width,
            height,
            scale: ScalePercent::IDENTITY,
            h_shift: 0,
            v_shift: 0,
            background: None,
        }
    }
}

/// Compose `source` onto a `width`×`height` canvas.
///
/// 1. Landscape targets (W > H) resize the source to the canvas height and
///    leave any horizontal overflow for the canvas to clip. Square and portrait
///    targets get a cover resize followed by a center crop to W×H.
/// 2. A non-identity `scale` resizes the fitted image again, uniformly.
/// 3. The result is centered on a background-filled canvas, then moved by the
///    shift offsets. Pixels that land outside the canvas are dropped.
///
/// An intermediate image wider or taller than [`MAX_SIDE`] is a usage error.
pub fn compose(source: &DynamicImage, opts: &ComposeOptions) -> Result<RgbaImage> {
    if opts.width == 0 || opts.height == 0 {
        return Err(IconError::InvalidSize(format!("{}x{}", opts.width, opts.height)).into());
    }
    if source.width() == 0 || source.height() == 0 {
        anyhow::bail!("source image is empty");
    }

    let fitted = fit_to_canvas(source, opts.width, opts.height)?;
    let scaled = apply_scale(fitted, opts.scale)?;

    let background = opts.background.unwrap_or_else(|| infer_background(source));

    // Center first, then shift; floor division keeps odd leftovers on the right/bottom
    let x = (i64::from(opts.width) - i64::from(scaled.width())).div_euclid(2) + i64::from(opts.h_shift);
    let y = (i64::from(opts.height) - i64::from(scaled.height())).div_euclid(2) + i64::from(opts.v_shift);

    debug!(
        "Compositing {}x{} onto {}x{} canvas at ({}, {}) over {}",
        scaled.width(),
        scaled.height(),
        opts.width,
        opts.height,
        x,
        y,
        background.to_hex()
    );

    let mut canvas: RgbaImage = ImageBuffer::from_pixel(opts.width, opts.height, background.into());
    imageops::overlay(&mut canvas, &scaled, x, y);

    Ok(canvas)
}

fn fit_to_canvas(source: &DynamicImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_w, src_h) = source.dimensions();

    if width > height {
        let factor = f64::from(height) / f64::from(src_h);
        let (fit_w, fit_h) = within_limit(scaled_dim(src_w, factor), height)?;
        return Ok(resize_to(source, fit_w, fit_h));
    }

    // Cover: the larger factor guarantees both sides reach the target
    let factor = (f64::from(width) / f64::from(src_w)).max(f64::from(height) / f64::from(src_h));
    let (cover_w, cover_h) = within_limit(
        scaled_dim(src_w, factor).max(width),
        scaled_dim(src_h, factor).max(height),
    )?;
    let covered = resize_to(source, cover_w, cover_h);

    if (cover_w, cover_h) == (width, height) {
        return Ok(covered);
    }
    let x = (cover_w - width) / 2;
    let y = (cover_h - height) / 2;
    Ok(imageops::crop_imm(&covered, x, y, width, height).to_image())
}

fn apply_scale(image: RgbaImage, scale: ScalePercent) -> Result<RgbaImage> {
    if scale.is_identity() {
        return Ok(image);
    }
    let factor = scale.factor();
    let (new_w, new_h) = within_limit(
        scaled_dim(image.width(), factor),
        scaled_dim(image.height(), factor),
    )
    .map_err(|_| {
        IconError::Usage(format!(
            "scale {}% would make a {}x{} image larger than {} px per side",
            scale.percent(),
            image.width(),
            image.height(),
            MAX_SIDE
        ))
    })?;
    Ok(imageops::resize(&image, new_w, new_h, FilterType::Lanczos3))
}

fn within_limit(width: u32, height: u32) -> Result<(u32, u32), IconError> {
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(IconError::Usage(format!(
            "{}x{} exceeds the {} px per side limit",
            width, height, MAX_SIDE
        )));
    }
    Ok((width, height))
}

fn resize_to(source: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        return source.to_rgba8();
    }
    source
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgba8()
}

fn scaled_dim(dim: u32, factor: f64) -> u32 {
    ((f64::from(dim) * factor).round() as u32).max(1)
}
