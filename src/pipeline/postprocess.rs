//! Response cleanup applied before structuring.
//!
//! Even well-instructed models occasionally wrap the whole answer in a
//! ```` ```markdown ```` fence, answer with Windows line endings, or leak
//! zero-width characters copied from the source article. None of that is
//! content, and all of it confuses line classification.
//!
//! These rules only touch the text handed to the converter. The plain-text
//! copy of the response is always written verbatim.
//!
//! ## Rule Order
//!
//! Fences are stripped first so the fence regex sees the raw response;
//! line endings are normalised before invisible characters are removed so
//! a stray `\r` never survives inside a line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw generation response.
///
/// Rules (applied in order):
/// 1. Strip an outer markdown fence
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
pub fn clean_response(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n1. Summary\nText\n```";
        assert_eq!(strip_markdown_fences(input), "1. Summary\nText");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n1. Summary\n```";
        assert_eq!(strip_markdown_fences(input), "1. Summary");
    }

    #[test]
    fn test_inner_code_block_untouched() {
        let input = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "APT\u{200B}-NOVEMBER\u{FEFF}";
        assert_eq!(remove_invisible_chars(input), "APT-NOVEMBER");
    }

    #[test]
    fn test_clean_response_full_pipeline() {
        let input = "```markdown\r\n1. Executive Summary\r\nActor:\u{200B} X\r\n```";
        assert_eq!(clean_response(input), "1. Executive Summary\nActor: X");
    }
}
