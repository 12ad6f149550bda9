use anyhow::{Context, Result};
use image::ImageFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::color::Color;
use crate::error::IconError;
use crate::image_compositor::{compose, ComposeOptions};
use crate::scale::ScalePercent;

/// One fixed-size raster asset of the icon set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconTarget {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl IconTarget {
    pub fn file_name(&self) -> String {
        format!("{}_{}x{}.png", self.name, self.width, self.height)
    }
}

pub const BANNER: IconTarget = IconTarget { name: "banner", width: 320, height: 180 };
pub const LAUNCHER: IconTarget = IconTarget { name: "launcher", width: 108, height: 108 };

/// Options shared by every target of the set
#[derive(Debug, Clone, Default)]
pub struct IconSetOptions {
    pub scale: ScalePercent,
    pub h_shift: i32,
    pub v_shift: i32,
    pub background: Option<Color>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedIcon {
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Write `banner_320x180.png` and `launcher_108x108.png` into `out_dir`.
pub fn generate_icon_set(input: &Path, out_dir: &Path, opts: &IconSetOptions) -> Result<Vec<GeneratedIcon>> {
    if !input.exists() {
        return Err(IconError::InputNotFound(input.to_path_buf()).into());
    }

    let source = image::open(input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut generated = Vec::new();
    for target in [BANNER, LAUNCHER] {
        let compose_opts = ComposeOptions {
            width: target.width,
            height: target.height,
            scale: opts.scale,
            h_shift: opts.h_shift,
            v_shift: opts.v_shift,
            background: opts.background,
        };
        let canvas = compose(&source, &compose_opts)?;

        let path = out_dir.join(target.file_name());
        canvas
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Generated {}", path.display());
        generated.push(GeneratedIcon {
            name: target.name.to_string(),
            path,
            width: target.width,
            height: target.height,
        });
    }

    Ok(generated)
}
