use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::color::Color;
use crate::converter::VectorConverter;
use crate::error::IconError;
use crate::image_vectorizer::{trace_to_svg, TraceOptions};
use crate::size::TargetSize;
use crate::vector_drawable::{annotate_file, VectorDocument};

/// One run of the raster to Vector Drawable conversion
#[derive(Debug, Clone)]
pub struct VectorJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub size: Option<TargetSize>,
    /// Also keep the traced SVG next to the output
    pub keep_svg: bool,
    pub background: Option<Color>,
    /// Where the per-run working directory is created; the system temp dir when `None`
    pub scratch_parent: Option<PathBuf>,
    /// Checked between steps; a stop request ends the run with `IconError::Interrupted`
    pub cancel: CancelFlag,
}

impl VectorJob {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        VectorJob {
            input,
            output,
            size: None,
            keep_svg: false,
            background: None,
            scratch_parent: None,
            cancel: CancelFlag::default(),
        }
    }

    fn svg_path(&self) -> PathBuf {
        self.output.with_extension("svg")
    }
}

#[derive(Debug, Clone)]
pub struct VectorReport {
    pub output: PathBuf,
    pub svg: Option<PathBuf>,
    pub inverted: bool,
}

/// Trace `job.input`, convert it with `converter` and write `job.output`.
///
/// Intermediate files live in a temporary directory that is removed however
/// this returns, including a stop through `job.cancel`. `job.output` is only
/// written once conversion succeeded; the size annotation then edits it in
/// place.
pub fn run_vector_job(job: &VectorJob, converter: &dyn VectorConverter) -> Result<VectorReport> {
    if !job.input.exists() {
        return Err(IconError::InputNotFound(job.input.clone()).into());
    }
    if job.keep_svg && job.svg_path() == job.output {
        return Err(IconError::Usage(format!(
            "{} would be overwritten by the drawable; use an output name that does not end in .svg with --svg",
            job.output.display()
        ))
        .into());
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("vector-drawable-");
    let workdir = match &job.scratch_parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
    .context("Failed to create working directory")?;
    debug!("Working in {}", workdir.path().display());

    let source = image::open(&job.input)
        .with_context(|| format!("Failed to decode {}", job.input.display()))?;
    job.cancel.check()?;

    info!("Tracing {} ({}x{})", job.input.display(), source.width(), source.height());

    let opts = TraceOptions { background: job.background };
    let traced = trace_to_svg(&source, &opts, workdir.path())?;
    job.cancel.check()?;

    let converted = workdir.path().join("drawable.xml");
    converter.convert(&traced.svg_path, &converted)?;
    job.cancel.check()?;

    let svg = if job.keep_svg {
        let svg_path = job.svg_path();
        std::fs::copy(&traced.svg_path, &svg_path)
            .with_context(|| format!("Failed to save {}", svg_path.display()))?;
        info!("Saved traced SVG to {}", svg_path.display());
        Some(svg_path)
    } else {
        None
    };

    let mut doc = VectorDocument::read(&converted)?;
    if traced.inverted {
        doc = doc.recolor_black_fills()?;
    }
    doc.write(&job.output)?;

    if let Some(size) = &job.size {
        annotate_output(&job.output, size)?;
    }

    info!("Wrote {}", job.output.display());

    Ok(VectorReport {
        output: job.output.clone(),
        svg,
        inverted: traced.inverted,
    })
}

fn annotate_output(output: &Path, size: &TargetSize) -> Result<()> {
    let result = annotate_file(
        output,
        &size.width.to_string(),
        &size.height.to_string(),
        size.usage.as_deref(),
    );
    if result.is_err() {
        warn!("{} was written but could not be annotated", output.display());
    }
    result
}
