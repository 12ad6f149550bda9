use image::{DynamicImage, GenericImageView};

use crate::color::Color;

/// Pick the canvas background from the source's top-left pixel.
///
/// A fully transparent sample carries no usable color, so White is used
/// instead. Any other sample is returned as-is, alpha included.
pub fn infer_background(source: &DynamicImage) -> Color {
    if source.width() == 0 || source.height() == 0 {
        return Color::WHITE;
    }

    let sample = Color::from(source.get_pixel(0, 0));
    if sample.alpha() == 0 {
        Color::WHITE
    } else {
        sample
    }
}
