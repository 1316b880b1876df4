//! Windowed spreadsheet import.
//!
//! The source is read in fixed windows of `chunk_size` rows starting at row 2.
//! Its length is never asked for: the import stops once `max_empty_windows`
//! windows in a row produced nothing to insert.

use crate::core::column_mapper::ColumnMapping;
use crate::domain::model::{CellValue, Field, ImportRow};
use crate::domain::ports::{RecordStore, RowWindow, SpreadsheetSource};
use crate::utils::error::{RegistryError, Result};
use crate::utils::validation::{validate_range, Validate};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_MAX_EMPTY_WINDOWS: usize = 3;

/// Upper bounds keeping one window and one batch affordable in memory.
pub const MAX_CHUNK_SIZE: usize = 1_000_000;
pub const MAX_BATCH_SIZE: usize = 1_000_000;
pub const MAX_EMPTY_WINDOWS_LIMIT: usize = 1_000;

/// First data row; row 1 holds the header.
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Rows requested from the source per window.
    pub chunk_size: usize,
    /// Rows per bulk insert.
    pub batch_size: usize,
    pub max_empty_windows: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_empty_windows: DEFAULT_MAX_EMPTY_WINDOWS,
        }
    }
}

impl Validate for ImportSettings {
    fn validate(&self) -> Result<()> {
        validate_range("import.chunk_size", self.chunk_size, 1, MAX_CHUNK_SIZE)?;
        validate_range("import.batch_size", self.batch_size, 1, MAX_BATCH_SIZE)?;
        validate_range(
            "import.max_empty_windows",
            self.max_empty_windows,
            1,
            MAX_EMPTY_WINDOWS_LIMIT,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub windows_read: usize,
    pub batches_flushed: usize,
    /// Last row position covered by a window.
    pub last_row: usize,
}

/// Rows waiting for the next bulk insert.
#[derive(Debug)]
struct ImportBatch {
    rows: Vec<ImportRow>,
    threshold: usize,
}

impl ImportBatch {
    fn new(threshold: usize) -> Self {
        Self {
            rows: Vec::with_capacity(threshold),
            threshold,
        }
    }

    fn push(&mut self, row: ImportRow) {
        self.rows.push(row);
    }

    fn is_full(&self) -> bool {
        self.rows.len() >= self.threshold
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts every pending row and returns how many went in.
    fn flush<S: RecordStore>(&mut self, store: &mut S) -> Result<usize> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        store.insert_many(&self.rows)?;
        let flushed = self.rows.len();
        self.rows.clear();
        Ok(flushed)
    }
}

/// Builds the field map of one row; `None` when every mapped value is falsy.
pub fn normalize_row(
    window: &RowWindow,
    row: usize,
    mapping: &ColumnMapping,
) -> Option<BTreeMap<Field, CellValue>> {
    let fields: BTreeMap<Field, CellValue> = mapping
        .iter()
        .map(|(position, field)| (field, window.cell(row, position).normalized()))
        .collect();

    if fields.values().all(CellValue::is_falsy) {
        None
    } else {
        Some(fields)
    }
}

/// Last row of the window of `chunk_size` rows starting at `start_row`.
fn window_end(start_row: usize, chunk_size: usize) -> Result<usize> {
    start_row
        .checked_add(chunk_size - 1)
        .ok_or_else(|| RegistryError::InvalidConfigValueError {
            field: "import.chunk_size".to_string(),
            value: chunk_size.to_string(),
            reason: format!("Window starting at row {} runs past the last addressable row", start_row),
        })
}

pub struct ChunkedImporter<'a, S: RecordStore> {
    store: &'a mut S,
    settings: ImportSettings,
}

impl<'a, S: RecordStore> ChunkedImporter<'a, S> {
    pub fn new(store: &'a mut S, settings: ImportSettings) -> Self {
        Self { store, settings }
    }

    pub fn run<R: SpreadsheetSource + ?Sized>(
        &mut self,
        source: &mut R,
        mapping: &ColumnMapping,
        started_at: DateTime<Utc>,
    ) -> Result<ImportSummary> {
        self.run_with_progress(source, mapping, started_at, |_| {})
    }

    /// Runs the import, calling `on_window` with the running totals after
    /// every window.
    ///
    /// `started_at` stamps `created_at` and `updated_at` of every row.
    pub fn run_with_progress<R, F>(
        &mut self,
        source: &mut R,
        mapping: &ColumnMapping,
        started_at: DateTime<Utc>,
        mut on_window: F,
    ) -> Result<ImportSummary>
    where
        R: SpreadsheetSource + ?Sized,
        F: FnMut(&ImportSummary),
    {
        self.settings.validate()?;
        let ImportSettings {
            chunk_size,
            batch_size,
            max_empty_windows,
        } = self.settings;

        let mut summary = ImportSummary::default();
        let mut batch = ImportBatch::new(batch_size);
        let mut empty_windows_in_a_row = 0;
        let mut start_row = FIRST_DATA_ROW;

        while empty_windows_in_a_row < max_empty_windows {
            let end_row = window_end(start_row, chunk_size)?;
            let window = source.load_row_window(start_row, end_row)?;
            let mut window_has_data = false;

            for row in start_row..=end_row {
                let Some(fields) = normalize_row(&window, row, mapping) else {
                    continue;
                };

                window_has_data = true;
                batch.push(ImportRow {
                    fields,
                    created_at: started_at,
                    updated_at: started_at,
                });

                if batch.is_full() {
                    summary.imported += batch.flush(self.store)?;
                    summary.batches_flushed += 1;
                }
            }

            if !batch.is_empty() {
                summary.imported += batch.flush(self.store)?;
                summary.batches_flushed += 1;
            }

            if window_has_data {
                empty_windows_in_a_row = 0;
            } else {
                empty_windows_in_a_row += 1;
            }

            summary.windows_read += 1;
            summary.last_row = end_row;
            tracing::info!("Progress: {} rows imported...", summary.imported);
            tracing::debug!(
                "Window {}-{} done (data: {}, empty windows in a row: {})",
                start_row,
                end_row,
                window_has_data,
                empty_windows_in_a_row
            );
            on_window(&summary);

            // Row right after this window
            start_row = window_end(end_row, 2)?;
        }

        Ok(summary)
    }
}
