//! Progress reporting and cancellation

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BakeError, Result};

/// Shared cancellation flag
///
/// Clones observe the same flag, so a token handed to a bake can be cancelled
/// from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(BakeError::Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BakeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Top-level step a progress report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BakeStage {
    Meshes,
    Animations,
}

impl fmt::Display for BakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meshes => write!(f, "Baking meshes"),
            Self::Animations => write!(f, "Baking animations"),
        }
    }
}

/// Receives `(current, total)` progress per stage
///
/// `current` counts finished items. Reports may arrive from worker threads.
pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: BakeStage, current: usize, total: usize, label: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(BakeStage, usize, usize, &str) + Send + Sync,
{
    fn report(&self, stage: BakeStage, current: usize, total: usize, label: &str) {
        self(stage, current, total, label);
    }
}

/// Discards all reports
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _stage: BakeStage, _current: usize, _total: usize, _label: &str) {}
}
