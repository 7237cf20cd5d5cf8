//! Table accumulation: pipe rows in, one rectangular [`Table`] out.
//!
//! Tables written by a generation model are not guaranteed well-formed:
//! ragged rows, stray pipes and bold markers inside cells are common. The
//! accumulator buffers raw cell rows while the converter is inside a table
//! and materialises a best-effort grid when the table ends. Rows whose width
//! differs from the header are dropped; a table that cannot be built at all
//! becomes a [`TableError`] which the caller renders in place.

use crate::document::{Run, Table};
use crate::error::TableError;
use tracing::{debug, warn};

/// Widest table a Word document can hold.
pub const MAX_COLUMNS: usize = 63;

/// Split one pipe-delimited line into cleaned cell strings.
///
/// The first and last split segments are the artefacts of the leading and
/// trailing `|` and are discarded. Each remaining cell has `**` markers
/// removed and surrounding whitespace trimmed.
pub fn split_row(line: &str) -> Vec<String> {
    let segments: Vec<&str> = line.split('|').collect();
    if segments.len() < 2 {
        return Vec::new();
    }
    segments[1..segments.len() - 1]
        .iter()
        .map(|cell| cell.replace("**", "").trim().to_string())
        .collect()
}

/// Row buffer for the table currently being read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableAccumulator {
    rows: Vec<Vec<String>>,
}

impl TableAccumulator {
    /// Start an empty table (a separator row with no header before it).
    pub fn begin() -> Self {
        Self::default()
    }

    /// Start a table whose header line was seen just before the separator.
    pub fn with_header(header_line: &str) -> Self {
        let mut acc = Self::begin();
        acc.append_row(header_line);
        acc
    }

    /// Buffer one pipe row.
    pub fn append_row(&mut self, line: &str) {
        self.rows.push(split_row(line));
    }

    /// Number of buffered rows, malformed ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Materialise the buffered rows, consuming the buffer.
    ///
    /// Returns `None` when nothing was buffered. Row 0 fixes the column count
    /// and is emphasized; later rows with a different cell count are skipped.
    pub fn end(self) -> Option<Result<Table, TableError>> {
        let mut rows = self.rows.into_iter();
        let header = rows.next()?;

        let columns = header.len();
        if columns == 0 {
            return Some(Err(TableError::NoColumns));
        }
        if columns > MAX_COLUMNS {
            return Some(Err(TableError::TooManyColumns {
                columns,
                max: MAX_COLUMNS,
            }));
        }

        let mut table = Table {
            rows: vec![header.into_iter().map(Run::emphasized).collect()],
        };
        for (i, row) in rows.enumerate() {
            if row.len() != columns {
                warn!(
                    "Table row {} has {} cells, header has {}; skipping",
                    i + 1,
                    row.len(),
                    columns
                );
                continue;
            }
            table.rows.push(row.into_iter().map(Run::plain).collect());
        }

        debug!("Materialised {}x{} table", table.row_count(), columns);
        Some(Ok(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_outer_segments_and_bold() {
        assert_eq!(
            split_row("| **IP** | 45.33.12.9 |"),
            vec!["IP".to_string(), "45.33.12.9".to_string()]
        );
    }

    #[test]
    fn split_without_trailing_pipe_loses_last_cell() {
        assert_eq!(split_row("| a | b"), vec!["a".to_string()]);
    }

    #[test]
    fn split_bare_pipe_is_empty() {
        assert!(split_row("|").is_empty());
        assert!(split_row("no pipes").is_empty());
    }

    #[test]
    fn split_keeps_empty_inner_cells() {
        assert_eq!(split_row("| a || c |"), vec!["a", "", "c"]);
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert!(TableAccumulator::begin().end().is_none());
    }

    #[test]
    fn header_is_emphasized_body_is_not() {
        let mut acc = TableAccumulator::with_header("| Name | Type |");
        acc.append_row("| APT-NOVEMBER | Actor |");
        let table = acc.end().unwrap().unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.rows[0].iter().all(|c| c.emphasized));
        assert!(table.rows[1].iter().all(|c| !c.emphasized));
    }

    #[test]
    fn ragged_rows_are_skipped() {
        let mut acc = TableAccumulator::with_header("| A | B |");
        acc.append_row("| 1 | 2 |");
        acc.append_row("| only one |");
        acc.append_row("| 3 | 4 | 5 |");
        acc.append_row("| 6 | 7 |");
        assert_eq!(acc.len(), 5);
        let table = acc.end().unwrap().unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[2][0].text, "6");
    }

    #[test]
    fn zero_column_header_is_an_error() {
        let acc = TableAccumulator::with_header("|");
        assert_eq!(acc.end(), Some(Err(TableError::NoColumns)));
    }

    #[test]
    fn too_wide_header_is_an_error() {
        let line = format!("|{}", " x |".repeat(MAX_COLUMNS + 1));
        let acc = TableAccumulator::with_header(&line);
        assert!(matches!(
            acc.end(),
            Some(Err(TableError::TooManyColumns { columns, .. })) if columns == MAX_COLUMNS + 1
        ));
    }
}
