//! Word (`.docx`) rendering of a [`Document`].
//!
//! Mapping:
//!
//! | Element | Word |
//! |---------|------|
//! | `Heading { level: 0 }` | paragraph, style `Title` |
//! | `Heading { level: n }` | paragraph, style `Heading{n}` (capped at 6) |
//! | `Paragraph` | one run per [`Run`], bold when emphasized |
//! | `BulletItem` | paragraph bound to the bullet numbering definition |
//! | `Table` | table, header cells bold, followed by an empty paragraph |

use crate::document::{Document, Element, Run, Table};
use crate::error::ReportError;
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, SpecialIndentType, Start, Style, StyleType, TableCell, TableRow,
};
use std::path::Path;
use tracing::info;

const BULLET_NUMBERING: usize = 1;

const MAX_HEADING_LEVEL: u8 = 6;

/// Style id for a heading level.
pub fn heading_style(level: u8) -> String {
    match level {
        0 => "Title".to_string(),
        n => format!("Heading{}", n.min(MAX_HEADING_LEVEL)),
    }
}

/// Build the in-memory Word document.
pub fn build_docx(document: &Document) -> Docx {
    let mut docx = with_styles(Docx::new());

    for element in document.elements() {
        docx = match element {
            Element::Heading { text, level } => docx.add_paragraph(
                Paragraph::new()
                    .add_run(docx_rs::Run::new().add_text(text))
                    .style(&heading_style(*level)),
            ),
            Element::Paragraph { runs } => docx.add_paragraph(paragraph(runs)),
            Element::BulletItem { text } => docx.add_paragraph(
                Paragraph::new()
                    .add_run(docx_rs::Run::new().add_text(text))
                    .style("ListBullet")
                    .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0)),
            ),
            Element::Table(table) => docx.add_table(docx_table(table)).add_paragraph(Paragraph::new()),
        };
    }

    docx
}

/// Render `document` to a `.docx` file at `path`.
pub fn write_docx(document: &Document, path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    let docx = build_docx(document);
    super::write_atomic(path, |file| {
        docx.build()
            .pack(file)
            .map_err(|e| std::io::Error::other(e.to_string()))
    })?;
    info!(
        "Wrote {} elements to {}",
        document.len(),
        path.display()
    );
    Ok(())
}

fn with_styles(docx: Docx) -> Docx {
    let mut docx = docx
        .add_style(Style::new("Title", StyleType::Paragraph).name("Title").size(56))
        .add_style(
            Style::new("ListBullet", StyleType::Paragraph).name("List Bullet"),
        )
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )
                .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));

    for level in 1..=MAX_HEADING_LEVEL {
        // 16pt for level 1 down to 11pt, in half-points.
        let size = 34usize.saturating_sub(2 * level as usize).max(22);
        docx = docx.add_style(
            Style::new(&heading_style(level), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(size)
                .bold(),
        );
    }
    docx
}

fn paragraph(runs: &[Run]) -> Paragraph {
    runs.iter().fold(Paragraph::new(), |p, run| {
        let r = docx_rs::Run::new().add_text(&run.text);
        p.add_run(if run.emphasized { r.bold() } else { r })
    })
}

fn docx_table(table: &Table) -> docx_rs::Table {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| TableCell::new().add_paragraph(paragraph(std::slice::from_ref(cell))))
                    .collect(),
            )
        })
        .collect();
    docx_rs::Table::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::read_docx_text;
    use tempfile::TempDir;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.push(Element::heading("Gemini CTI Analysis Report", 0));
        doc.push(Element::heading("Executive Summary", 1));
        doc.push(Element::spacer());
        doc.push(Element::Paragraph {
            runs: vec![Run::emphasized("Actor"), Run::plain(": APT-NOVEMBER")],
        });
        doc.push(Element::bullet("Indicator: 45.33.12.9"));
        doc.push(Element::Table(Table {
            rows: vec![
                vec![Run::emphasized("Type"), Run::emphasized("Value")],
                vec![Run::plain("IP"), Run::plain("45.33.12.9")],
            ],
        }));
        doc
    }

    #[test]
    fn heading_styles() {
        assert_eq!(heading_style(0), "Title");
        assert_eq!(heading_style(1), "Heading1");
        assert_eq!(heading_style(9), "Heading6");
    }

    #[test]
    fn written_docx_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        write_docx(&sample(), &path).unwrap();

        let text = read_docx_text(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        for expected in [
            "Gemini CTI Analysis Report",
            "Executive Summary",
            "Actor: APT-NOVEMBER",
            "Indicator: 45.33.12.9",
            "Type",
            "45.33.12.9",
        ] {
            assert!(lines.contains(&expected), "missing {expected:?} in {lines:?}");
        }
    }

    #[test]
    fn empty_document_still_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.docx");
        write_docx(&Document::new(), &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
