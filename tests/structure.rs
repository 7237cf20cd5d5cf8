//! Converter behaviour on realistic generated analyses.
//!
//! Pure tests: no network, no filesystem.

use cti_report::{convert, Converter, Document, Element, Run, TableError};

const ANALYSIS: &str = "\
1. Executive Summary
Actor: APT-NOVEMBER operates from Eastern Europe
The campaign has been active since early 2024.

2. Indicators of Compromise
- Indicator: 45.33.12.9
* Domain: update-check.example
| Type | Value | Confidence |
| :--- | :--- | :--- |
| IP | 45.33.12.9 | High |
| **Domain** | update-check.example | Medium |
| Hash | abc123 |
3. Recommendations
Block the listed infrastructure at the perimeter.
";

fn tables(doc: &Document) -> Vec<&cti_report::Table> {
    doc.tables().collect()
}

#[test]
fn full_analysis_structure() {
    let doc = convert(ANALYSIS);
    let els = doc.elements();

    assert_eq!(els[0], Element::heading("Executive Summary", 1));
    assert_eq!(els[1], Element::spacer());
    assert_eq!(
        els[2],
        Element::Paragraph {
            runs: vec![
                Run::emphasized("Actor"),
                Run::plain(": APT-NOVEMBER operates from Eastern Europe"),
            ]
        }
    );
    assert_eq!(els[3], Element::text("The campaign has been active since early 2024."));
    assert_eq!(els[4], Element::heading("Indicators of Compromise", 1));
    assert_eq!(els[5], Element::spacer());
    assert_eq!(els[6], Element::bullet("Indicator: 45.33.12.9"));
    assert_eq!(els[7], Element::bullet("Domain: update-check.example"));
    assert!(matches!(els[8], Element::Table(_)));
    assert_eq!(els[9], Element::heading("Recommendations", 1));
    assert_eq!(els[10], Element::spacer());
    assert_eq!(
        els[11],
        Element::text("Block the listed infrastructure at the perimeter.")
    );
    assert_eq!(els.len(), 12);
}

#[test]
fn table_keeps_header_and_well_formed_rows() {
    let doc = convert(ANALYSIS);
    let tables = tables(&doc);
    assert_eq!(tables.len(), 1);

    let table = tables[0];
    // Header plus two body rows; the two-cell "Hash" row is ragged.
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_count(), 3);
    assert!(table.header().unwrap().iter().all(|c| c.emphasized));
    assert_eq!(table.rows[1][1], Run::plain("45.33.12.9"));
    // Bold markers are stripped from cells.
    assert_eq!(table.rows[2][0], Run::plain("Domain"));
}

#[test]
fn header_plus_n_rows_gives_n_plus_one() {
    for n in 0..5 {
        let mut text = String::from("| A | B |\n|---|---|\n");
        for i in 0..n {
            text.push_str(&format!("| a{i} | b{i} |\n"));
        }
        let doc = convert(&text);
        let tables = tables(&doc);
        assert_eq!(tables.len(), 1, "n = {n}");
        assert_eq!(tables[0].row_count(), n + 1, "n = {n}");
    }
}

#[test]
fn table_at_end_of_input_is_flushed() {
    let doc = convert("Intro\n| K | V |\n| --- | --- |\n| a | 1 |");
    assert_eq!(doc.len(), 2);
    assert!(matches!(doc.elements()[1], Element::Table(_)));
}

#[test]
fn no_pipes_means_no_tables() {
    let doc = convert("1. Overview\nSome text\n- a bullet\nKey: value");
    assert_eq!(tables(&doc).len(), 0);
}

#[test]
fn pipe_line_without_separator_is_a_paragraph() {
    let doc = convert("| not | a table |\nAfter");
    assert_eq!(
        doc.elements(),
        &[Element::text("| not | a table |"), Element::text("After")]
    );
}

#[test]
fn lowercase_numbered_line_is_not_a_heading() {
    let doc = convert("1. see above");
    assert_eq!(doc.elements(), &[Element::text("1. see above")]);
}

#[test]
fn values_with_colons_split_at_first_colon() {
    let doc = convert("First seen: 2024-03-01 12:30 UTC");
    assert_eq!(
        doc.elements()[0],
        Element::Paragraph {
            runs: vec![
                Run::emphasized("First seen"),
                Run::plain(": 2024-03-01 12:30 UTC"),
            ]
        }
    );
}

#[test]
fn bare_pipe_header_becomes_error_marker() {
    let mut converter = Converter::new();
    for line in ["|", "|---|", "Next"] {
        converter.push_line(line);
    }
    let (doc, errors) = converter.finish_with_errors();
    assert_eq!(errors, vec![TableError::NoColumns]);
    assert_eq!(doc.elements()[0], Element::text(TableError::NoColumns.marker()));
    assert_eq!(doc.elements()[1], Element::text("Next"));
}

#[test]
fn conversion_is_deterministic() {
    assert_eq!(convert(ANALYSIS), convert(ANALYSIS));
}

#[test]
fn empty_and_blank_input_yield_empty_document() {
    assert!(convert("").is_empty());
    assert!(convert("\n\n   \n").is_empty());
}

#[test]
fn crlf_input_is_handled() {
    let doc = convert("1. Summary\r\nActor: X\r\n");
    assert_eq!(doc.elements()[0], Element::heading("Summary", 1));
    assert_eq!(
        doc.elements()[2],
        Element::Paragraph {
            runs: vec![Run::emphasized("Actor"), Run::plain(": X")]
        }
    );
}

#[test]
fn dash_placeholder_body_row_is_kept() {
    let doc = convert(
        "| Technique | Sub-technique |\n|---|---|\n| T1566 | Phishing |\n| - | - |\n| T1059 | PowerShell |",
    );
    let tables = tables(&doc);
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].row_count(), 4);
    assert_eq!(tables[0].rows[2], vec![Run::plain("-"), Run::plain("-")]);
    assert_eq!(tables[0].rows[3][0], Run::plain("T1059"));
}

#[test]
fn lone_dash_pipe_line_stays_a_paragraph() {
    let doc = convert("Intro\n| - |\nAfter");
    assert_eq!(
        doc.elements(),
        &[
            Element::text("Intro"),
            Element::text("| - |"),
            Element::text("After"),
        ]
    );
}
