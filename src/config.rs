//! Configuration types for report generation.
//!
//! All behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. Every knob lives in one struct so a run can be
//! logged and two runs diffed to understand why their outputs differ.

use crate::error::ReportError;
use crate::pipeline::client::GenerationClient;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default REST base of the generation service.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for one report run.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use cti_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .model("gemini-2.5-pro")
///     .max_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// API key for the generation service. If None, read from `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// Model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// REST base URL, without a trailing slash.
    pub api_base: String,

    /// Total attempt budget for one generation call. Default: 5.
    ///
    /// Only transient failures (429, 500, 503, network errors) consume more
    /// than one attempt; any other HTTP error ends the call immediately.
    pub max_retries: u32,

    /// Base retry delay in milliseconds. Default: 1000.
    ///
    /// The wait after attempt `n` (0-indexed) is `retry_base_ms * 2^n`:
    /// 1 s → 2 s → 4 s → 8 s with the defaults.
    pub retry_base_ms: u64,

    /// Per-request HTTP timeout in seconds. Default: 120.
    ///
    /// Grounded answers routinely take tens of seconds.
    pub request_timeout_secs: u64,

    /// Attach the `google_search` grounding tool to the request. Default: true.
    pub google_search: bool,

    /// Level-0 title at the top of the DOCX report.
    pub report_title: String,

    /// Strip fences and invisible characters before structuring. Default: true.
    pub clean_response: bool,

    /// Pre-constructed client. Takes precedence over the HTTP client.
    pub client: Option<Arc<dyn GenerationClient>>,

    /// Optional progress callback.
    pub progress: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_retries: 5,
            retry_base_ms: 1000,
            request_timeout_secs: 120,
            google_search: true,
            report_title: "Gemini CTI Analysis Report".to_string(),
            clean_response: true,
            client: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("max_retries", &self.max_retries)
            .field("retry_base_ms", &self.retry_base_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("google_search", &self.google_search)
            .field("report_title", &self.report_title)
            .field("clean_response", &self.clean_response)
            .field("client", &self.client.as_ref().map(|_| "<dyn GenerationClient>"))
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Result<String, ReportError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty() && k != "YOUR_API_KEY_HERE")
            .ok_or(ReportError::ApiKeyMissing)
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_base_ms(mut self, ms: u64) -> Self {
        self.config.retry_base_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn google_search(mut self, v: bool) -> Self {
        self.config.google_search = v;
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.config.report_title = title.into();
        self
    }

    pub fn clean_response(mut self, v: bool) -> Self {
        self.config.clean_response = v;
        self
    }

    pub fn client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.max_retries == 0 {
            return Err(ReportError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Where a run reads its inputs and writes its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// System instruction file (`.docx` or plain text).
    pub instructions: PathBuf,
    /// Source article (`.html`/`.htm` is text-extracted; anything else is used as-is).
    pub source: PathBuf,
    /// Rich-document output.
    pub docx_output: PathBuf,
    /// Verbatim plain-text output.
    pub text_output: PathBuf,
}

impl Default for ReportPaths {
    fn default() -> Self {
        Self {
            instructions: PathBuf::from("instructions_threat_analysis.docx"),
            source: PathBuf::from("article.html"),
            docx_output: PathBuf::from("threat analysis_output.docx"),
            text_output: PathBuf::from("threat analysis_output.md"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ReportConfig::default();
        assert_eq!(c.model, "gemini-2.5-flash");
        assert_eq!(c.max_retries, 5);
        assert_eq!(c.retry_base_ms, 1000);
        assert!(c.google_search);
        assert!(c.clean_response);
        assert_eq!(c.report_title, "Gemini CTI Analysis Report");
    }

    #[test]
    fn builder_rejects_zero_retries() {
        let err = ReportConfig::builder().max_retries(0).build().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_model() {
        assert!(ReportConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let c = ReportConfig::builder()
            .api_base("http://localhost:8080/v1beta/")
            .build()
            .unwrap();
        assert_eq!(c.api_base, "http://localhost:8080/v1beta");
    }

    #[test]
    fn explicit_key_wins() {
        let c = ReportConfig::builder().api_key("k-123").build().unwrap();
        assert_eq!(c.resolve_api_key().unwrap(), "k-123");
    }

    #[test]
    fn placeholder_key_is_rejected() {
        let c = ReportConfig::builder()
            .api_key("YOUR_API_KEY_HERE")
            .build()
            .unwrap();
        assert!(matches!(c.resolve_api_key(), Err(ReportError::ApiKeyMissing)));
    }

    #[test]
    fn debug_redacts_key() {
        let c = ReportConfig::builder().api_key("secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
