use std::fmt;
use std::path::PathBuf;

/// Failure kinds the command line tools report with their own exit codes.
///
/// Operations return these wrapped in `anyhow::Error`, so callers further up
/// can keep adding context. Use [`IconError::find`] to get the kind back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    /// Bad or missing argument value
    Usage(String),
    /// Input image path does not exist
    InputNotFound(PathBuf),
    /// A required external program is not available
    ToolMissing(String),
    /// Width/height is not a non-negative integer, or a size string is malformed
    InvalidSize(String),
    /// Tracing or vector conversion reported failure
    TraceFailure(String),
    /// Stopped by SIGINT/SIGTERM before finishing
    Interrupted,
}

impl IconError {
    /// Locate the first `IconError` anywhere in an error chain.
    pub fn find(err: &anyhow::Error) -> Option<&IconError> {
        err.chain().find_map(|cause| cause.downcast_ref::<IconError>())
    }
}

impl fmt::Display for IconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconError::Usage(msg) => write!(f, "usage error: {}", msg),
            IconError::InputNotFound(path) => write!(f, "input not found: {}", path.display()),
            IconError::ToolMissing(tool) => write!(f, "required tool missing: {}", tool),
            IconError::InvalidSize(value) => write!(f, "invalid size: {}", value),
            IconError::TraceFailure(msg) => write!(f, "tracing failed: {}", msg),
            IconError::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for IconError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_find_through_context() {
        let err: anyhow::Result<()> = Err(IconError::InvalidSize("12a".to_string()).into());
        let err = err.context("annotating drawable").unwrap_err();

        assert_eq!(
            IconError::find(&err),
            Some(&IconError::InvalidSize("12a".to_string()))
        );
    }

    #[test]
    fn test_find_returns_none_for_foreign_errors() {
        let err = anyhow::anyhow!("disk full");
        assert!(IconError::find(&err).is_none());
    }
}
