//! End-to-end report entry points.
//!
//! [`generate_report`] does everything that can fail before an output file
//! exists: load the instruction and article, call the generation service,
//! and structure the answer. [`write_outputs`] then persists the two
//! outputs independently. [`run_report`] chains both and is what the CLI
//! calls.

use crate::config::{ReportConfig, ReportPaths};
use crate::document::{Document, Element};
use crate::error::{ReportError, TableError};
use crate::pipeline::client::{generate_with_retry, GeminiClient, GenerationClient};
use crate::pipeline::{html, postprocess, source, structure};
use crate::progress::Stage;
use crate::prompts::build_user_query;
use crate::writer;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportStats {
    /// Characters of article text sent to the service.
    pub source_chars: usize,
    /// Characters in the raw response.
    pub response_chars: usize,
    /// Elements in the structured document, title included.
    pub elements: usize,
    /// Tables materialised.
    pub tables: usize,
    /// Tables replaced by an inline error marker.
    pub table_errors: usize,
    /// Wall-clock time spent in the generation call, retries included.
    pub generation_ms: u64,
    /// Wall-clock time for the whole run.
    pub total_ms: u64,
}

/// Everything a run produced, before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Verbatim response of the generation service.
    pub raw: String,
    /// Structured report.
    pub document: Document,
    /// Tables that could not be materialised.
    #[serde(skip)]
    pub table_errors: Vec<TableError>,
    pub stats: ReportStats,
}

/// Result of writing each output; one failing does not undo the other.
#[derive(Debug)]
pub struct WriteOutcome {
    pub docx: Result<(), ReportError>,
    pub text: Result<(), ReportError>,
}

impl WriteOutcome {
    /// Both files were written.
    pub fn is_complete(&self) -> bool {
        self.docx.is_ok() && self.text.is_ok()
    }

    /// The first failure, if any.
    pub fn into_result(self) -> Result<(), ReportError> {
        self.docx?;
        self.text
    }
}

/// Structure a raw response into a titled document.
///
/// Applies the configured cleanup first; the raw text is not modified.
pub fn structure_response(raw: &str, config: &ReportConfig) -> (Document, Vec<TableError>) {
    let mut document = Document::new();
    if !config.report_title.is_empty() {
        document.push(Element::heading(&config.report_title, 0));
    }

    let content = if config.clean_response {
        postprocess::clean_response(raw)
    } else {
        raw.to_string()
    };
    structure::convert_with_errors(document, &content)
}

/// Load inputs, call the generation service and structure the answer.
///
/// # Errors
/// Any [`ReportError`] here is fatal and occurs before an output file is
/// touched: missing or corrupt inputs, no API key, or a generation failure
/// (permanent, or transient after the retry budget).
pub async fn generate_report(
    paths: &ReportPaths,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    let stage = |s: Stage| {
        if let Some(ref cb) = config.progress {
            cb.on_stage(s);
        }
    };

    // ── Step 1: System instruction ───────────────────────────────────────
    stage(Stage::LoadInstructions);
    let instructions = source::read_source(&paths.instructions)?;

    // ── Step 2: Article text ─────────────────────────────────────────────
    stage(Stage::LoadSource);
    let raw_source = source::read_source(&paths.source)?;
    let source_text = if source::is_html(&paths.source) {
        html::html_to_plain_text(&raw_source)
    } else {
        raw_source
    };
    if source_text.trim().is_empty() {
        return Err(ReportError::EmptyInput {
            path: paths.source.clone(),
        });
    }
    debug!("Source text: {} chars", source_text.len());

    // ── Step 3: Generation ───────────────────────────────────────────────
    stage(Stage::Generate);
    let client = resolve_client(config)?;
    let llm_start = Instant::now();
    let raw = generate_with_retry(
        client.as_ref(),
        &instructions,
        &build_user_query(&source_text),
        config.max_retries,
        Duration::from_millis(config.retry_base_ms),
        config.progress.as_ref(),
    )
    .await?;
    let generation_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Structure ────────────────────────────────────────────────
    stage(Stage::Convert);
    let (document, table_errors) = structure_response(&raw, config);
    if !table_errors.is_empty() {
        warn!("{} table(s) rendered as error markers", table_errors.len());
    }

    let stats = ReportStats {
        source_chars: source_text.len(),
        response_chars: raw.len(),
        elements: document.len(),
        tables: document.tables().count(),
        table_errors: table_errors.len(),
        generation_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Report structured: {} elements, {} tables, {}ms",
        stats.elements, stats.tables, stats.total_ms
    );

    Ok(ReportOutput {
        raw,
        document,
        table_errors,
        stats,
    })
}

/// Write the `.docx` report and the verbatim text copy, independently.
pub fn write_outputs(output: &ReportOutput, paths: &ReportPaths, config: &ReportConfig) -> WriteOutcome {
    if let Some(ref cb) = config.progress {
        cb.on_stage(Stage::Write);
    }
    let notify = |path: &Path, result: &Result<(), ReportError>| match result {
        Ok(()) => {
            if let Some(ref cb) = config.progress {
                cb.on_written(path);
            }
        }
        Err(e) => warn!("{}", e),
    };

    let docx = writer::docx::write_docx(&output.document, &paths.docx_output);
    notify(&paths.docx_output, &docx);

    let text = writer::text::write_text(&output.raw, &paths.text_output);
    notify(&paths.text_output, &text);

    WriteOutcome { docx, text }
}

/// Generate the report and write both outputs.
///
/// Fatal errors abort before any file is written. Write failures are
/// returned per file in the [`WriteOutcome`].
pub async fn run_report(
    paths: &ReportPaths,
    config: &ReportConfig,
) -> Result<(ReportOutput, WriteOutcome), ReportError> {
    let output = generate_report(paths, config).await?;
    let outcome = write_outputs(&output, paths, config);
    Ok((output, outcome))
}

/// Synchronous wrapper around [`run_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_report_sync(
    paths: &ReportPaths,
    config: &ReportConfig,
) -> Result<(ReportOutput, WriteOutcome), ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(run_report(paths, config))
}

/// The configured client, or the Gemini HTTP client built from `config`.
fn resolve_client(config: &ReportConfig) -> Result<Arc<dyn GenerationClient>, ReportError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    Ok(Arc::new(GeminiClient::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Run;

    #[test]
    fn structure_response_prepends_title() {
        let config = ReportConfig::default();
        let (doc, errors) = structure_response("1. Executive Summary\nActor: X", &config);
        assert!(errors.is_empty());
        assert_eq!(doc.elements()[0], Element::heading("Gemini CTI Analysis Report", 0));
        assert_eq!(doc.elements()[1], Element::heading("Executive Summary", 1));
        assert_eq!(doc.elements()[2], Element::spacer());
        assert_eq!(
            doc.elements()[3],
            Element::Paragraph {
                runs: vec![Run::emphasized("Actor"), Run::plain(": X")]
            }
        );
    }

    #[test]
    fn structure_response_without_title_or_cleanup() {
        let config = ReportConfig::builder()
            .report_title("")
            .clean_response(false)
            .build()
            .unwrap();
        let (doc, _) = structure_response("```markdown\nBody\n```", &config);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.elements()[0], Element::text("```markdown"));
    }

    #[test]
    fn cleanup_strips_outer_fence() {
        let (doc, _) = structure_response("```markdown\nBody\n```", &ReportConfig::default());
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.elements()[1], Element::text("Body"));
    }

    #[test]
    fn write_outcome_reports_first_failure() {
        let outcome = WriteOutcome {
            docx: Ok(()),
            text: Err(ReportError::Internal("boom".into())),
        };
        assert!(!outcome.is_complete());
        assert!(outcome.into_result().is_err());
    }
}
