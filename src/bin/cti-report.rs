//! CLI binary for cti-report.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReportConfig` / `ReportPaths` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use cti_report::{
    run_report, ProgressCallback, ReportConfig, ReportError, ReportOutput, ReportPaths,
    ReportProgressCallback, Stage, WriteOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const ERROR_RULE: &str = "==============================================";

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the current stage, with
/// attempt / retry / written lines printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        self.bar.set_prefix(stage.label());
        self.bar.set_message("");
    }

    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        self.bar.println(format!(
            "{} Attempting API call (Attempt {attempt}/{max_attempts})...",
            cyan("◆")
        ));
        self.bar.set_message(format!("attempt {attempt}/{max_attempts}"));
    }

    fn on_retry(&self, _attempt: u32, delay: Duration, error: &str) {
        // Keep long service bodies from flooding the terminal.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {}", red("✗"), red(&msg)));
        self.bar.println(format!(
            "  {}",
            dim(&format!("Retrying in {} seconds...", delay.as_secs_f64()))
        ));
        self.bar.set_message("waiting");
    }

    fn on_written(&self, path: &Path) {
        self.bar.println(format!(
            "{} [SUCCESS] Output saved to {}",
            green("✔"),
            bold(&path.display().to_string())
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Defaults: instructions_threat_analysis.docx + article.html in the
  # current directory, outputs "threat analysis_output.{docx,md}"
  cti-report

  # Explicit inputs and outputs
  cti-report analyst_prompt.docx saved_page.html \
      --docx-output report.docx --md-output report.md

  # Plain-text article, faster model, no search grounding
  cti-report prompt.txt article.txt --model gemini-2.5-flash-lite --no-search

  # Machine-readable summary on stdout
  cti-report --json > run.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (required)
  CTI_REPORT_MODEL        Override model ID
  CTI_REPORT_API_BASE     Override REST base URL
  RUST_LOG                Override log filter (e.g. cti_report=debug)

RETRIES:
  HTTP 429, 500, 503 and network errors are retried with exponential
  backoff (1s, 2s, 4s, 8s with the defaults). Any other HTTP error stops
  the run immediately and no output files are written.
"#;

/// Generate a structured threat-analysis report from an article.
#[derive(Parser, Debug)]
#[command(
    name = "cti-report",
    version,
    about = "Generate a structured threat-analysis report (.docx + .md) from an article",
    long_about = "Send a threat-intelligence article to Google Gemini under an analyst's system \
instruction, then structure the answer into a Word report (headings, labelled fields, bullets, \
tables) and keep the raw answer as a Markdown file.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// System instruction file (.docx or plain text).
    #[arg(default_value = "instructions_threat_analysis.docx", env = "CTI_REPORT_INSTRUCTIONS")]
    instructions: PathBuf,

    /// Source article (.html/.htm is text-extracted; anything else is used as-is).
    #[arg(default_value = "article.html", env = "CTI_REPORT_SOURCE")]
    source: PathBuf,

    /// Rich-document output path.
    #[arg(long, env = "CTI_REPORT_DOCX_OUTPUT", default_value = "threat analysis_output.docx")]
    docx_output: PathBuf,

    /// Verbatim Markdown output path.
    #[arg(long, env = "CTI_REPORT_MD_OUTPUT", default_value = "threat analysis_output.md")]
    md_output: PathBuf,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (e.g. gemini-2.5-flash, gemini-2.5-pro).
    #[arg(long, env = "CTI_REPORT_MODEL")]
    model: Option<String>,

    /// REST base URL of the generation service.
    #[arg(long, env = "CTI_REPORT_API_BASE")]
    api_base: Option<String>,

    /// Total attempt budget for the generation call.
    #[arg(long, env = "CTI_REPORT_MAX_RETRIES", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_retries: u32,

    /// Base retry delay in milliseconds (doubles each attempt).
    #[arg(long, env = "CTI_REPORT_RETRY_BASE_MS", default_value_t = 1000)]
    retry_base_ms: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "CTI_REPORT_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Do not attach the google_search grounding tool.
    #[arg(long, env = "CTI_REPORT_NO_SEARCH")]
    no_search: bool,

    /// Title at the top of the .docx report.
    #[arg(long, env = "CTI_REPORT_TITLE")]
    title: Option<String>,

    /// Structure the answer exactly as received (no fence / invisible-char cleanup).
    #[arg(long, env = "CTI_REPORT_NO_CLEAN")]
    no_clean: bool,

    /// Print run statistics as JSON on stdout.
    #[arg(long, env = "CTI_REPORT_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "CTI_REPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CTI_REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CTI_REPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the user-facing feedback; library INFO logs
    // would interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(code) => code,
        Err(e) => {
            print_error_block(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<ExitCode> {
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(cli, progress.clone().map(|cb| cb as ProgressCallback))?;
    let paths = ReportPaths {
        instructions: cli.instructions.clone(),
        source: cli.source.clone(),
        docx_output: cli.docx_output.clone(),
        text_output: cli.md_output.clone(),
    };

    let result = run_report(&paths, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let (output, outcome) = result.context("Report generation failed")?;

    let complete = outcome.is_complete();
    report_writes(cli, &paths, &outcome, show_progress);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        print_summary(&output, complete);
    }

    Ok(if complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `ReportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .max_retries(cli.max_retries)
        .retry_base_ms(cli.retry_base_ms)
        .request_timeout_secs(cli.timeout)
        .google_search(!cli.no_search)
        .clean_response(!cli.no_clean);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(ref title) = cli.title {
        builder = builder.report_title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Each output is reported on its own; one failing does not hide the other.
fn report_writes(cli: &Cli, paths: &ReportPaths, outcome: &WriteOutcome, show_progress: bool) {
    let entries: [(&Path, &Result<(), ReportError>); 2] = [
        (&paths.docx_output, &outcome.docx),
        (&paths.text_output, &outcome.text),
    ];
    for (path, result) in entries {
        match result {
            // The progress callback already printed the success line.
            Ok(()) if show_progress || cli.quiet => {}
            Ok(()) => eprintln!(
                "{} [SUCCESS] Output saved to {}",
                green("✔"),
                bold(&path.display().to_string())
            ),
            Err(e) => eprintln!("{} {}", red("✘"), red(&e.to_string())),
        }
    }
}

fn print_summary(output: &ReportOutput, complete: bool) {
    let s = &output.stats;
    eprintln!(
        "{}  {} elements  {} tables{}  {}ms",
        if complete { green("✔") } else { cyan("⚠") },
        s.elements,
        s.tables,
        if s.table_errors > 0 {
            red(&format!(" ({} malformed)", s.table_errors))
        } else {
            String::new()
        },
        s.total_ms,
    );
    eprintln!(
        "   {} chars in  /  {} chars out  —  {}ms generation",
        dim(&s.source_chars.to_string()),
        dim(&s.response_chars.to_string()),
        s.generation_ms,
    );
}

fn print_error_block(message: &str) {
    eprintln!("{ERROR_RULE}");
    eprintln!("           GEMINI ANALYSIS ERROR");
    eprintln!("{ERROR_RULE}");
    eprintln!("{}", red(message));
    eprintln!("{ERROR_RULE}");
}
