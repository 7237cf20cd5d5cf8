//! # cti-report
//!
//! Turn a threat-intelligence article into a structured analysis report.
//!
//! A generation model reads the article under an analyst's system
//! instruction and answers in loose, markdown-like text: numbered section
//! headings, `Label: value` lines, bullets and pipe tables. This crate
//! calls the model with retry/backoff, classifies that answer line by line
//! into a typed [`Document`], and writes it as a Word report next to a
//! verbatim text copy.
//!
//! ## Pipeline Overview
//!
//! ```text
//! instructions (.docx/.txt) ─┐
//!                            ├─ 1. Load     read files, HTML → article text
//! article (.html/.txt) ──────┘
//!                               2. Generate  Gemini call, exponential backoff
//!                               3. Clean     strip fences / invisible chars
//!                               4. Convert   line classifier → Document
//!                               5. Write     .docx report + verbatim .md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cti_report::{run_report, ReportConfig, ReportPaths};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY
//!     let config = ReportConfig::default();
//!     let paths = ReportPaths::default();
//!     let (output, written) = run_report(&paths, &config).await?;
//!     written.into_result()?;
//!     eprintln!("{} tables", output.stats.tables);
//!     Ok(())
//! }
//! ```
//!
//! The converter is usable on its own, without any network access:
//!
//! ```rust
//! use cti_report::{convert, Element};
//!
//! let doc = convert("1. Executive Summary\nActor: APT-NOVEMBER");
//! assert_eq!(doc.elements()[0], Element::heading("Executive Summary", 1));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cti-report` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cti-report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReportConfig, ReportConfigBuilder, ReportPaths};
pub use document::{Document, Element, Run, Table};
pub use error::{is_failure_text, GenerationError, ReportError, TableError};
pub use pipeline::client::{generate_with_retry, GeminiClient, GenerationClient};
pub use pipeline::html::html_to_plain_text;
pub use pipeline::source::read_source;
pub use pipeline::structure::{convert, Converter};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback, Stage};
pub use report::{
    generate_report, run_report, run_report_sync, write_outputs, ReportOutput, ReportStats,
    WriteOutcome,
};
pub use writer::docx::write_docx;
pub use writer::text::write_text;
