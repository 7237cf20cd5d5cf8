//! Generation-service interaction: one request type, one retry loop.
//!
//! [`GenerationClient`] is the seam between the pipeline and the network.
//! [`GeminiClient`] is the production implementation; tests and callers
//! with their own middleware plug in anything else through
//! [`crate::config::ReportConfig::client`].
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 500 / 503 and network-level errors are transient. The wait
//! after attempt `n` (0-indexed) is `retry_base_ms * 2^n`; with the 1 s
//! default and a budget of 5 attempts the sequence is 1 s → 2 s → 4 s → 8 s.
//! Any other HTTP status is permanent and returned at once. The delay is
//! computed by the pure [`backoff_delay`] so it can be tested without
//! sleeping.

use crate::config::ReportConfig;
use crate::error::{GenerationError, ReportError};
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Text returned when the service answers without any candidate text.
pub const NO_CONTENT: &str = "No content generated.";

/// A single-attempt call to a text-generation backend.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for one system instruction and one user turn.
    ///
    /// Implementations make exactly one attempt; retrying is the caller's job.
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, GenerationError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Delay to wait after the 0-indexed `attempt` failed.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Map a non-success HTTP status to a generation error.
pub fn classify_status(status: u16, body: String) -> GenerationError {
    match status {
        429 | 500 | 503 => GenerationError::Transient {
            status: Some(status),
            detail: body,
        },
        _ => GenerationError::Permanent { status, body },
    }
}

/// Call `client` until it succeeds, fails permanently, or the budget runs out.
///
/// Sleeps only between attempts, never after the last one.
pub async fn generate_with_retry(
    client: &dyn GenerationClient,
    system_instruction: &str,
    user_text: &str,
    max_attempts: u32,
    base_delay: Duration,
    progress: Option<&ProgressCallback>,
) -> Result<String, GenerationError> {
    let start = Instant::now();
    let mut last_err: Option<String> = None;

    for attempt in 0..max_attempts {
        if let Some(cb) = progress {
            cb.on_attempt(attempt + 1, max_attempts);
        }
        info!(
            "Calling {} (attempt {}/{})",
            client.name(),
            attempt + 1,
            max_attempts
        );

        match client.generate(system_instruction, user_text).await {
            Ok(text) => {
                debug!(
                    "{}: {} chars generated in {:?}",
                    client.name(),
                    text.len(),
                    start.elapsed()
                );
                return Ok(text);
            }
            Err(e) if e.is_retryable() => {
                let err_msg = e.to_string();
                warn!("Attempt {} failed — {}", attempt + 1, err_msg);
                if attempt + 1 < max_attempts {
                    let delay = backoff_delay(attempt, base_delay);
                    if let Some(cb) = progress {
                        cb.on_retry(attempt + 1, delay, &err_msg);
                    }
                    sleep(delay).await;
                }
                last_err = Some(err_msg);
            }
            Err(e) => {
                warn!("Attempt {} failed permanently — {}", attempt + 1, e);
                return Err(e);
            }
        }
    }

    Err(GenerationError::RetriesExhausted {
        attempts: max_attempts,
        last: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

// ── Gemini REST client ───────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first candidate, its text parts concatenated in order.
fn extract_text(response: GenerateResponse) -> String {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        NO_CONTENT.to_string()
    } else {
        text
    }
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    google_search: bool,
}

impl GeminiClient {
    /// Build a client from the run configuration.
    ///
    /// Fails with [`ReportError::ApiKeyMissing`] before any request is made
    /// when no key is configured.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        let api_key = config.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ReportError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{}/models/{}:generateContent", config.api_base, config.model),
            api_key,
            google_search: config.google_search,
        })
    }

    fn request_body<'a>(&self, system_instruction: &'a str, user_text: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: user_text }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: system_instruction,
                }],
            },
            tools: if self.google_search {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            } else {
                Vec::new()
            },
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, GenerationError> {
        let body = self.request_body(system_instruction, user_text);

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transient {
                status: None,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        Ok(extract_text(parsed))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of outcomes, one per call.
    struct Scripted {
        outcomes: Mutex<Vec<Result<String, GenerationError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<String, GenerationError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationClient for Scripted {
        async fn generate(&self, _: &str, _: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(classify_status(503, "exhausted script".into())))
        }
    }

    fn transient() -> Result<String, GenerationError> {
        Err(classify_status(503, "overloaded".into()))
    }

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        let delays: Vec<u64> = (0..5).map(|a| backoff_delay(a, base).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(
            backoff_delay(40, Duration::from_secs(1)),
            Duration::from_secs(u64::from(u32::MAX))
        );
        assert_eq!(backoff_delay(3, Duration::MAX), Duration::MAX);
    }

    #[test]
    fn status_classification() {
        for s in [429, 500, 503] {
            assert!(classify_status(s, String::new()).is_retryable(), "{s}");
        }
        for s in [400, 401, 403, 404, 502] {
            assert!(!classify_status(s, String::new()).is_retryable(), "{s}");
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let client = Scripted::new(vec![transient(), transient(), Ok("analysis".into())]);
        let out = generate_with_retry(&client, "sys", "user", 5, TICK, None).await;
        assert_eq!(out.unwrap(), "analysis");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let client = Scripted::new(vec![Err(classify_status(403, "denied".into()))]);
        let out = generate_with_retry(&client, "sys", "user", 5, TICK, None).await;
        assert_eq!(
            out.unwrap_err(),
            GenerationError::Permanent {
                status: 403,
                body: "denied".into()
            }
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_is_respected() {
        let client = Scripted::new(vec![]);
        let out = generate_with_retry(&client, "sys", "user", 3, TICK, None).await;
        assert!(matches!(
            out,
            Err(GenerationError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn request_body_shape() {
        let client = GeminiClient {
            http: reqwest::Client::new(),
            endpoint: String::new(),
            api_key: String::new(),
            google_search: true,
        };
        let json = serde_json::to_value(client.request_body("SYS", "USER")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "USER");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "SYS");
        assert!(json["tools"][0]["google_search"].is_object());
    }

    #[test]
    fn request_body_without_search_omits_tools() {
        let client = GeminiClient {
            http: reqwest::Client::new(),
            endpoint: String::new(),
            api_key: String::new(),
            google_search: false,
        };
        let json = serde_json::to_value(client.request_body("SYS", "USER")).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn extract_text_joins_parts_of_first_candidate() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"1. Summary\n"},{"text":"Body"}]}},
                              {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(resp), "1. Summary\nBody");
    }

    #[test]
    fn extract_text_defaults_when_empty() {
        let resp: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(resp), NO_CONTENT);
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(extract_text(resp), NO_CONTENT);
    }

    #[test]
    fn from_config_requires_key() {
        let config = ReportConfig::builder()
            .api_key("YOUR_API_KEY_HERE")
            .build()
            .unwrap();
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(ReportError::ApiKeyMissing)
        ));
    }

    #[test]
    fn from_config_builds_endpoint() {
        let config = ReportConfig::builder()
            .api_key("k")
            .api_base("http://localhost:9999/v1beta")
            .model("gemini-test")
            .build()
            .unwrap();
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(
            client.endpoint,
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }
}
