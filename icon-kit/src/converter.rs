use anyhow::{Context, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cancel::CancelFlag;
use crate::error::IconError;
use crate::tools::resolve_program;

/// Default SVG to Vector Drawable converter (svg2vectordrawable's CLI)
pub const DEFAULT_CONVERTER: &str = "s2v";

/// Turns an SVG file into an Android Vector Drawable file.
pub trait VectorConverter {
    fn convert(&self, svg: &Path, output: &Path) -> Result<()>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `<program> -i <svg> -o <output>` and waits for it.
///
/// The wait polls a [`CancelFlag`]; a stop request kills the child and the
/// conversion fails with `IconError::Interrupted`.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: PathBuf,
    cancel: CancelFlag,
}

impl ExternalConverter {
    /// Locate `program` up front so a missing tool fails before any work starts.
    pub fn locate(program: &Path) -> Result<Self> {
        let program = resolve_program(program)?;
        debug!("Using vector converter {}", program.display());
        Ok(ExternalConverter { program, cancel: CancelFlag::default() })
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        loop {
            if self.cancel.is_cancelled() {
                warn!("Stopping {}", self.program.display());
                // The child may already have exited on the same signal
                let _ = child.kill();
                let _ = child.wait();
                return Err(IconError::Interrupted.into());
            }
            let status = child
                .try_wait()
                .with_context(|| format!("Failed to wait for {}", self.program.display()))?;
            if let Some(status) = status {
                return Ok(status);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl VectorConverter for ExternalConverter {
    fn convert(&self, svg: &Path, output: &Path) -> Result<()> {
        // Captured through files so a chatty converter never blocks on a full pipe
        let mut stdout = tempfile::tempfile().context("Failed to capture converter output")?;
        let mut stderr = tempfile::tempfile().context("Failed to capture converter output")?;

        let spawned = Command::new(&self.program)
            .arg("-i")
            .arg(svg)
            .arg("-o")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(stdout.try_clone()?)
            .stderr(stderr.try_clone()?)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IconError::ToolMissing(self.program.display().to_string()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to run {}", self.program.display()));
            }
        };

        let status = self.wait(&mut child)?;
        self.cancel.check()?;

        if !status.success() {
            let stderr = read_captured(&mut stderr)?;
            let stdout = read_captured(&mut stdout)?;
            let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            return Err(IconError::TraceFailure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status,
                detail
            ))
            .into());
        }

        if !output.exists() {
            return Err(IconError::TraceFailure(format!(
                "{} reported success but wrote no {}",
                self.program.display(),
                output.display()
            ))
            .into());
        }

        Ok(())
    }
}

fn read_captured(file: &mut File) -> Result<String> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
