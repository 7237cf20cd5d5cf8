//! Error types for the cti-report library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ReportError`] — **Fatal**: the run cannot proceed at all (missing
//!   instruction file, corrupt `.docx`, no API key, generation failed).
//!   Returned as `Err(ReportError)` from the top-level `report` functions,
//!   always before any output file is created.
//!
//! * [`GenerationError`] — a single call to the generation service failed.
//!   Transient variants are retried with backoff; the rest surface as
//!   [`ReportError::Generation`].
//!
//! * [`TableError`] — **Non-fatal**: one table in the generated text could
//!   not be materialised. The converter renders it as an inline marker
//!   paragraph and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix shared by every terminal generation-failure message.
///
/// Callers that only hold the rendered text (logs, the plain-text output of
/// an older run) can recognise a failure with [`is_failure_text`].
pub const FAILURE_PREFIX: &str = "API ";

/// Returns `true` when `text` follows the generation-failure prefix convention.
pub fn is_failure_text(text: &str) -> bool {
    text.starts_with(FAILURE_PREFIX)
}

/// All fatal errors returned by the cti-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `.docx` input exists but is not a readable Word document.
    #[error("DOCX file at '{path}' is invalid or corrupt: {detail}")]
    MalformedSource { path: PathBuf, detail: String },

    /// The input was read but contains no usable text.
    #[error("Input '{path}' is empty")]
    EmptyInput { path: PathBuf },

    // ── Generation errors ─────────────────────────────────────────────────
    /// No API key was configured or found in the environment.
    #[error("No API key configured.\nSet GEMINI_API_KEY or pass --api-key.")]
    ApiKeyMissing,

    /// The generation service failed terminally.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a call to the generation service.
///
/// Display strings keep the [`FAILURE_PREFIX`] convention so a failure can
/// never be mistaken for a generated analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// HTTP 429/500/503 or a network-level error. Worth retrying.
    #[error("API transient failure{}: {detail}", status_suffix(.status))]
    Transient { status: Option<u16>, detail: String },

    /// Any other HTTP error. Retrying will not help.
    #[error("API Failed (HTTP Error): {status}")]
    Permanent { status: u16, body: String },

    /// Every attempt in the budget failed with a transient error.
    #[error("API call failed after maximum retries.")]
    RetriesExhausted { attempts: u32, last: String },

    /// The service answered 2xx but the body was not valid JSON.
    #[error("API response could not be decoded: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Whether the retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Transient { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// A table in the generated text that could not be materialised.
///
/// Never propagated: the converter renders it in place via
/// [`TableError::marker`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    /// The header row produced no cells (e.g. a bare `|`).
    #[error("header row has no cells")]
    NoColumns,

    /// The header is wider than a Word table can be.
    #[error("{columns} columns exceeds the limit of {max}")]
    TooManyColumns { columns: usize, max: usize },
}

impl TableError {
    /// The visible placeholder text rendered instead of the table.
    pub fn marker(&self) -> String {
        format!("--- Table Error: {self} ---")
    }
}
