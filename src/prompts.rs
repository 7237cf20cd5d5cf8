//! Text framing for generation requests.
//!
//! The analyst-authored system instruction is loaded from disk at runtime
//! (see [`crate::pipeline::source`]); only the fixed user-turn framing lives
//! here so it can be inspected in tests without a live service.

/// Lead-in placed before the extracted article text in the user turn.
pub const USER_QUERY_PREAMBLE: &str =
    "Perform the requested threat intelligence analysis on the following raw text data:";

/// Build the user turn sent alongside the system instruction.
pub fn build_user_query(source_text: &str) -> String {
    format!("{USER_QUERY_PREAMBLE}\n\n---\n\n{source_text}")
}
