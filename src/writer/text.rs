//! Verbatim plain-text copy of the generation response.
//!
//! The response is already Markdown-flavoured, so it is saved as-is: no
//! cleanup, no re-wrapping. It is the portable copy of the analysis.

use crate::error::ReportError;
use std::io::Write;
use std::path::Path;

/// Write `raw` to `path` byte for byte.
pub fn write_text(raw: &str, path: impl AsRef<Path>) -> Result<(), ReportError> {
    super::write_atomic(path.as_ref(), |f| f.write_all(raw.as_bytes()))
}
