use anyhow::Result;
use image::Rgba;

use crate::error::IconError;

/// RGBA color used for canvas backgrounds and flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `r,g,b`, `r,g,b,a`
    /// or one of a handful of color names.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let parsed = if let Some(hex) = value.strip_prefix('#') {
            parse_hex(hex)
        } else if value.contains(',') {
            parse_csv(value)
        } else {
            parse_named(value)
        };

        parsed
            .map(Color)
            .ok_or_else(|| IconError::Usage(format!("unrecognized color '{}'", value)).into())
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba(color.0)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        Color(pixel.0)
    }
}

impl std::str::FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    // Byte slicing below assumes one byte per digit
    if !hex.is_ascii() {
        return None;
    }

    let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some([short(0)?, short(1)?, short(2)?, 255]),
        4 => Some([short(0)?, short(1)?, short(2)?, short(3)?]),
        6 => Some([long(0)?, long(2)?, long(4)?, 255]),
        8 => Some([long(0)?, long(2)?, long(4)?, long(6)?]),
        _ => None,
    }
}

fn parse_csv(value: &str) -> Option<[u8; 4]> {
    let parts: Vec<u8> = value
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [r, g, b] => Some([*r, *g, *b, 255]),
        [r, g, b, a] => Some([*r, *g, *b, *a]),
        _ => None,
    }
}

fn parse_named(value: &str) -> Option<[u8; 4]> {
    let rgba = match value.to_ascii_lowercase().as_str() {
        "white" => Color::WHITE.0,
        "black" => Color::BLACK.0,
        "transparent" | "none" => Color::TRANSPARENT.0,
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "lime" => [0, 255, 0, 255],
        "blue" => [0, 0, 255, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        _ => return None,
    };
    Some(rgba)
}
