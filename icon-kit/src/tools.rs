use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::IconError;

/// Resolve an external program either as an explicit path or through `PATH`.
pub fn resolve_program(program: &Path) -> Result<PathBuf> {
    let has_separator = program.components().count() > 1;
    if has_separator || program.is_absolute() {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(IconError::ToolMissing(program.display().to_string()).into());
    }

    program
        .to_str()
        .and_then(find_in_path)
        .ok_or_else(|| IconError::ToolMissing(format!("{} (not found in PATH)", program.display())).into())
}

pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    ["", ".exe", ".cmd", ".bat"]
        .iter()
        .map(|ext| dir.join(format!("{}{}", program, ext)))
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("s2v");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        assert_eq!(resolve_program(&tool).unwrap(), tool);

        let err = resolve_program(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(IconError::find(&err), Some(IconError::ToolMissing(_))));
    }

    #[test]
    fn test_unknown_program_is_missing() {
        let err = resolve_program(Path::new("definitely-not-a-real-tool-7f3a")).unwrap_err();
        assert!(matches!(IconError::find(&err), Some(IconError::ToolMissing(_))));
    }
}
