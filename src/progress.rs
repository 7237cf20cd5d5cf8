//! Progress-callback trait for report generation events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as the run moves through its stages. The library itself never
//! prints; the CLI turns these events into a spinner and status lines.
//!
//! # Example
//!
//! ```rust
//! use cti_report::{ReportConfig, ReportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct AttemptCounter {
//!     attempts: AtomicU32,
//! }
//!
//! impl ReportProgressCallback for AttemptCounter {
//!     fn on_attempt(&self, attempt: u32, max_attempts: u32) {
//!         self.attempts.store(attempt, Ordering::SeqCst);
//!         eprintln!("attempt {attempt}/{max_attempts}");
//!     }
//! }
//!
//! let counter = Arc::new(AttemptCounter { attempts: AtomicU32::new(0) });
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ReportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Coarse stages of a report run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadInstructions,
    LoadSource,
    Generate,
    Convert,
    Write,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::LoadInstructions => "Loading instructions",
            Stage::LoadSource => "Loading source",
            Stage::Generate => "Generating analysis",
            Stage::Convert => "Structuring report",
            Stage::Write => "Writing outputs",
        }
    }
}

/// Called by the report pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReportProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called before each generation attempt.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt number
    /// * `max_attempts` — total attempt budget
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// Called after a transient failure, before sleeping.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed attempt that just failed
    /// * `delay`   — how long the pipeline will wait
    /// * `error`   — human-readable failure description
    fn on_retry(&self, attempt: u32, delay: Duration, error: &str) {
        let _ = (attempt, delay, error);
    }

    /// Called after an output file has been written.
    fn on_written(&self, path: &Path) {
        let _ = path;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;
