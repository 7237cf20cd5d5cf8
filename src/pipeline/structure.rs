//! Structuring: one pass over the generated text, one [`Document`] out.
//!
//! The generator emits a small, loosely-followed subset of Markdown:
//! numbered section titles, `*`/`-` bullets, `Label: value` lines and GFM
//! pipe tables. This module recognises exactly that subset, line by line,
//! and degrades to plain paragraphs on anything else.
//!
//! ## Classification order
//!
//! 1. separator row (`| :--- |`, `|---|`, `:---`) → enter a table
//! 2. inside a table, line starts with `|` → buffer a row
//! 3. inside a table, anything else → close the table, then re-classify
//! 4. `<digits>. <Uppercase>…` → level-1 heading plus a spacer paragraph
//! 5. `* ` / `- ` → bullet item
//! 6. blank → nothing
//! 7. otherwise → label paragraph or plain paragraph
//!
//! A pipe line seen outside a table is held for one line: if a separator
//! follows, it becomes the table header; otherwise it is released as an
//! ordinary paragraph and the current line is classified normally.

use crate::document::{Document, Element, Run};
use crate::error::TableError;
use crate::pipeline::table::TableAccumulator;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+[A-Z].+").unwrap());

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());

static RE_SEPARATOR_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*:?-{3,}:?\s*$").unwrap());

/// What a single stripped line is, independent of table state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Separator,
    PipeRow,
    Heading(&'a str),
    Bullet(&'a str),
    Blank,
    Text(&'a str),
}

/// Classify one stripped line.
pub fn classify(line: &str) -> LineKind<'_> {
    if is_separator(line) {
        LineKind::Separator
    } else if line.starts_with('|') {
        LineKind::PipeRow
    } else if let Some(title) = heading_text(line) {
        LineKind::Heading(title)
    } else if let Some(item) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
        LineKind::Bullet(item)
    } else if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Text(line)
    }
}

/// A separator row: `:---…`, or a pipe row whose every cell is `:?---+:?`.
///
/// Rows like `| - | - |` are data (empty-cell placeholders), not separators.
pub fn is_separator(line: &str) -> bool {
    if line.starts_with(":---") {
        return true;
    }
    line.starts_with('|')
        && line
            .trim_matches('|')
            .split('|')
            .all(|cell| RE_SEPARATOR_CELL.is_match(cell))
}

/// Title of a numbered section heading with its `N.` prefix removed.
///
/// Only an ASCII-uppercase first letter qualifies.
pub fn heading_text(line: &str) -> Option<&str> {
    if !RE_HEADING.is_match(line) {
        return None;
    }
    line.split_once('.').map(|(_, rest)| rest.trim())
}

/// Format one prose line as a paragraph, bolding a leading `Label:`.
///
/// The split happens at the first colon only, so values containing colons
/// (timestamps, URLs) stay intact. Lines starting with `*` or `-` and
/// numbered lines are never split.
pub fn label_paragraph(line: &str) -> Element {
    let line = line.trim();
    let is_label = !line.starts_with(['*', '-']) && !RE_NUMBERED.is_match(line);
    match line.split_once(':') {
        Some((label, value)) if is_label => Element::Paragraph {
            runs: vec![
                Run::emphasized(label.trim()),
                Run::plain(format!(": {}", value.trim())),
            ],
        },
        _ => Element::text(line),
    }
}

/// Converter state between two lines.
#[derive(Debug, Default)]
enum Mode {
    #[default]
    Scanning,
    /// A pipe line that becomes the header if a separator follows.
    HeaderCandidate(String),
    InTable(TableAccumulator),
}

/// Single-pass converter from generated text to a [`Document`].
#[derive(Debug, Default)]
pub struct Converter {
    mode: Mode,
    document: Document,
    table_errors: Vec<TableError>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document (e.g. one that already holds a title).
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    /// Whether a table is currently open.
    pub fn in_table(&self) -> bool {
        matches!(self.mode, Mode::InTable(_))
    }

    /// Tables that failed to materialise so far.
    pub fn table_errors(&self) -> &[TableError] {
        &self.table_errors
    }

    /// Feed one line.
    pub fn push_line(&mut self, raw: &str) {
        let line = raw.trim();
        let kind = classify(line);

        match (std::mem::take(&mut self.mode), kind) {
            (Mode::InTable(acc), LineKind::Separator) => {
                debug!("Ignoring separator row inside table");
                self.mode = Mode::InTable(acc);
            }
            (Mode::HeaderCandidate(header), LineKind::Separator) => {
                self.mode = Mode::InTable(TableAccumulator::with_header(&header));
            }
            (Mode::Scanning, LineKind::Separator) => {
                self.mode = Mode::InTable(TableAccumulator::begin());
            }
            (Mode::InTable(mut acc), LineKind::PipeRow) => {
                acc.append_row(line);
                self.mode = Mode::InTable(acc);
            }
            (Mode::InTable(acc), kind) => {
                self.close_table(acc);
                self.emit(line, kind);
            }
            (Mode::HeaderCandidate(held), kind) => {
                self.emit(&held, LineKind::Text(&held));
                self.emit(line, kind);
            }
            (Mode::Scanning, kind) => self.emit(line, kind),
        }
    }

    /// Flush any open state and return the finished document.
    pub fn finish(self) -> Document {
        self.finish_with_errors().0
    }

    /// Like [`Converter::finish`], also returning the tables that failed.
    pub fn finish_with_errors(mut self) -> (Document, Vec<TableError>) {
        match std::mem::take(&mut self.mode) {
            Mode::InTable(acc) => self.close_table(acc),
            Mode::HeaderCandidate(held) => self.emit(&held, LineKind::Text(&held)),
            Mode::Scanning => {}
        }
        (self.document, self.table_errors)
    }

    /// Handle a line while scanning (no table open, nothing held).
    fn emit(&mut self, line: &str, kind: LineKind<'_>) {
        match kind {
            LineKind::PipeRow => self.mode = Mode::HeaderCandidate(line.to_string()),
            LineKind::Heading(title) => {
                self.document.push(Element::heading(title, 1));
                self.document.push(Element::spacer());
            }
            LineKind::Bullet(item) => self.document.push(Element::bullet(item)),
            LineKind::Blank => {}
            LineKind::Text(text) => self.document.push(label_paragraph(text)),
            LineKind::Separator => self.mode = Mode::InTable(TableAccumulator::begin()),
        }
    }

    fn close_table(&mut self, acc: TableAccumulator) {
        match acc.end() {
            Some(Ok(table)) => self.document.push(Element::Table(table)),
            Some(Err(e)) => {
                warn!("Table could not be built: {}", e);
                self.document.push(Element::text(e.marker()));
                self.table_errors.push(e);
            }
            None => {}
        }
    }
}

/// Convert generated analysis text into a structured [`Document`].
///
/// Deterministic: identical input always yields an identical document.
pub fn convert(content: &str) -> Document {
    convert_into(Document::new(), content)
}

/// Like [`convert`], appending to an existing document.
pub fn convert_into(document: Document, content: &str) -> Document {
    convert_with_errors(document, content).0
}

/// Convert onto `document`, also returning the tables that failed.
pub fn convert_with_errors(document: Document, content: &str) -> (Document, Vec<TableError>) {
    let mut converter = Converter::with_document(document);
    for line in content.trim().lines() {
        converter.push_line(line);
    }
    converter.finish_with_errors()
}
