//! The structured report produced by the converter.
//!
//! A [`Document`] is an append-only, ordered list of [`Element`]s. Every
//! element kind is one variant of a closed sum type, so writers match
//! exhaustively and a new kind cannot be silently ignored by one of them.

use serde::{Deserialize, Serialize};

/// A span of text, optionally rendered bold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub emphasized: bool,
}

impl Run {
    /// A plain (non-emphasized) run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    /// A bold run.
    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

/// A materialised table. Every row has the same number of cells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<Run>>,
}

impl Table {
    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (taken from the header row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// The header row, if any.
    pub fn header(&self) -> Option<&[Run]> {
        self.rows.first().map(Vec::as_slice)
    }
}

/// One block of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// Section title. Level 0 is the document title.
    Heading { text: String, level: u8 },
    /// Ordered runs; an empty run list is a spacer paragraph.
    Paragraph { runs: Vec<Run> },
    /// One bullet-list item.
    BulletItem { text: String },
    Table(Table),
}

impl Element {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Element::Heading {
            text: text.into(),
            level,
        }
    }

    /// A single-run plain paragraph.
    pub fn text(text: impl Into<String>) -> Self {
        Element::Paragraph {
            runs: vec![Run::plain(text)],
        }
    }

    /// An empty paragraph used for vertical spacing.
    pub fn spacer() -> Self {
        Element::Paragraph { runs: Vec::new() }
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Element::BulletItem { text: text.into() }
    }

    /// Plain text of the element, runs and cells concatenated.
    pub fn plain_text(&self) -> String {
        match self {
            Element::Heading { text, .. } | Element::BulletItem { text } => text.clone(),
            Element::Paragraph { runs } => runs.iter().map(|r| r.text.as_str()).collect(),
            Element::Table(table) => table
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|c| c.text.as_str())
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// The output document: elements in the order they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the tables only.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }
}

impl Extend<Element> for Document {
    fn extend<T: IntoIterator<Item = Element>>(&mut self, iter: T) {
        self.elements.extend(iter);
    }
}
