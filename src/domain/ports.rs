use crate::domain::model::{CellValue, ClientRecord, ImportRow};
use crate::domain::query::{Filter, GroupCount, GroupQuery, RecordQuery};
use crate::utils::error::Result;
use std::collections::HashMap;

/// Persistent client table.
pub trait RecordStore {
    /// Inserts `rows` as one unit; identities are assigned by the store.
    fn insert_many(&mut self, rows: &[ImportRow]) -> Result<()>;
    fn group_counts(&self, query: &GroupQuery) -> Result<Vec<GroupCount>>;
    fn fetch(&self, query: &RecordQuery) -> Result<Vec<ClientRecord>>;
    fn count(&self, filters: &[Filter]) -> Result<u64>;
}

/// Cells of one row keyed by zero-based column position.
pub type Row = HashMap<usize, CellValue>;

/// Rows `start_row..=end_row` (1-based) of a tabular source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowWindow {
    pub start_row: usize,
    pub rows: Vec<Row>,
}

impl RowWindow {
    pub fn blank(start_row: usize, end_row: usize) -> Self {
        Self {
            start_row,
            rows: vec![Row::new(); (end_row + 1).saturating_sub(start_row)],
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        row.checked_sub(self.start_row)
            .and_then(|idx| self.rows.get(idx))
            .and_then(|r| r.get(&column))
            .unwrap_or(&EMPTY)
    }

    pub fn end_row(&self) -> usize {
        self.start_row + self.rows.len().saturating_sub(1)
    }
}

/// Sequential, range-filtered reader over a spreadsheet.
///
/// Rows past the real extent of the source come back blank rather than as
/// an error, so callers cannot learn the row count from a window.
pub trait SpreadsheetSource {
    fn load_header_row(&mut self) -> Result<Vec<(usize, CellValue)>>;
    fn load_row_window(&mut self, start_row: usize, end_row: usize) -> Result<RowWindow>;
}
