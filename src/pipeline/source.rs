//! Source loading: read instruction and article files from disk.
//!
//! Analysts keep their system instruction in Word; articles are saved web
//! pages. A `.docx` is opened as the ZIP archive it is and the paragraph
//! text of `word/document.xml` is read with a streaming XML reader; every
//! other file is read as UTF-8 text. All failures are fatal and reported
//! before any service call is made.

use crate::error::ReportError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Whether the path names a Word document.
pub fn is_docx(path: &Path) -> bool {
    has_extension(path, &["docx"])
}

/// Whether the path names a saved web page.
pub fn is_html(path: &Path) -> bool {
    has_extension(path, &["html", "htm"])
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Read a source file as text (`.docx` paragraphs joined with `\n`).
///
/// # Errors
/// - [`ReportError::FileNotFound`] / [`ReportError::PermissionDenied`]
/// - [`ReportError::MalformedSource`] for a corrupt `.docx`
/// - [`ReportError::ReadFailed`] for unreadable or non-UTF-8 text files
/// - [`ReportError::EmptyInput`] when the file holds only whitespace
pub fn read_source(path: impl AsRef<Path>) -> Result<String, ReportError> {
    let path = path.as_ref();
    let text = if is_docx(path) {
        read_docx_text(path)?
    } else {
        std::fs::read_to_string(path).map_err(|e| io_error(path, e))?
    };

    if text.trim().is_empty() {
        return Err(ReportError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    info!("Loaded {} ({} chars)", path.display(), text.len());
    Ok(text)
}

fn io_error(path: &Path, e: std::io::Error) -> ReportError {
    let path = path.to_path_buf();
    match e.kind() {
        ErrorKind::NotFound => ReportError::FileNotFound { path },
        ErrorKind::PermissionDenied => ReportError::PermissionDenied { path },
        _ => ReportError::ReadFailed { path, source: e },
    }
}

fn malformed(path: &Path, detail: impl Into<String>) -> ReportError {
    ReportError::MalformedSource {
        path: PathBuf::from(path),
        detail: detail.into(),
    }
}

/// Extract paragraph text from a `.docx` file.
pub fn read_docx_text(path: &Path) -> Result<String, ReportError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| malformed(path, format!("not a ZIP archive: {e}")))?;

    let xml = {
        let mut document_xml = archive
            .by_name("word/document.xml")
            .map_err(|e| malformed(path, format!("missing word/document.xml: {e}")))?;
        let mut content = String::new();
        document_xml
            .read_to_string(&mut content)
            .map_err(|e| malformed(path, format!("unreadable word/document.xml: {e}")))?;
        content
    };

    let paragraphs = paragraphs_from_document_xml(&xml).map_err(|e| malformed(path, e))?;
    debug!("{}: {} paragraphs", path.display(), paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Walk `word/document.xml` and collect the text of each `w:p`.
///
/// Runs (`w:t`) are concatenated; `w:tab` becomes a tab and `w:br` a newline.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\t');
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                if let Some(p) = current.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
