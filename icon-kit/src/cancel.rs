use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::IconError;

/// Shared stop request, set from a signal handler and polled by the pipeline.
///
/// Clones share one flag. Once set it stays set for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `IconError::Interrupted` once a stop was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(IconError::Interrupted.into());
        }
        Ok(())
    }
}
