// Spreadsheet workbooks (ods, xlsx, xlsm, xlsb, xls) read through calamine.
//
// xlsx and xlsm sheets are streamed cell by cell: a window reopens the file
// and keeps only the cells of its own rows, stopping at the first cell past
// the window. The other formats have no cell reader, so each window parses
// the first sheet into a range and copies out the requested rows.

use crate::domain::model::CellValue;
use crate::domain::ports::{Row, RowWindow, SpreadsheetSource};
use crate::utils::error::{RegistryError, Result};
use calamine::{open_workbook, open_workbook_auto, Data, Range, Reader, Xlsx};
use std::path::{Path, PathBuf};

const STREAMED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

pub struct WorkbookSource {
    path: PathBuf,
    streamed: bool,
}

impl WorkbookSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let streamed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| STREAMED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        // Fail early on unreadable files instead of at the first window
        if streamed {
            open_workbook::<Xlsx<_>, _>(&path).map_err(calamine::Error::Xlsx)?;
        } else {
            open_workbook_auto(&path)?;
        }
        Ok(Self { path, streamed })
    }

    fn empty_workbook(&self) -> RegistryError {
        RegistryError::EmptyWorkbook {
            path: self.path.display().to_string(),
        }
    }

    /// Fills `window` from the first sheet's cell stream.
    fn stream_window(&self, window: &mut RowWindow, end_row: usize) -> Result<()> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(calamine::Error::Xlsx)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| self.empty_workbook())?;
        let mut cells = workbook
            .worksheet_cells_reader(&sheet)
            .map_err(calamine::Error::Xlsx)?;

        while let Some(cell) = cells.next_cell().map_err(calamine::Error::Xlsx)? {
            let (row, col) = cell.get_position();
            let row = row as usize + 1;
            if row < window.start_row {
                continue;
            }
            // Cells come in row order
            if row > end_row {
                break;
            }
            let value = to_cell_value(&Data::from(cell.get_value().clone()));
            if value != CellValue::Empty {
                window.rows[row - window.start_row].insert(col as usize, value);
            }
        }
        Ok(())
    }

    fn first_sheet(&self) -> Result<Range<Data>> {
        let mut workbook = open_workbook_auto(&self.path)?;
        match workbook.worksheet_range_at(0) {
            Some(range) => Ok(range?),
            None => Err(self.empty_workbook()),
        }
    }

    fn range_window(&self, window: &mut RowWindow, end_row: usize) -> Result<()> {
        let range = self.first_sheet()?;
        let last_row = range.end().map(|(r, _)| r as usize + 1).unwrap_or(0);

        for (slot, row) in window.rows.iter_mut().zip(window.start_row..=end_row) {
            if row > last_row {
                break;
            }
            *slot = Self::copy_row(&range, row);
        }
        Ok(())
    }

    /// Copies `row` (1-based) out of the range; missing cells are skipped.
    fn copy_row(range: &Range<Data>, row: usize) -> Row {
        let mut cells = Row::new();
        let Some((_, end_col)) = range.end() else {
            return cells;
        };
        let Ok(abs_row) = u32::try_from(row - 1) else {
            return cells;
        };

        for col in 0..=end_col {
            if let Some(data) = range.get_value((abs_row, col)) {
                let value = to_cell_value(data);
                if value != CellValue::Empty {
                    cells.insert(col as usize, value);
                }
            }
        }
        cells
    }
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(n) => CellValue::Float(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        // Serial day number, as the sheet stores it
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

impl SpreadsheetSource for WorkbookSource {
    fn load_header_row(&mut self) -> Result<Vec<(usize, CellValue)>> {
        let window = self.load_row_window(1, 1)?;
        let mut header: Vec<(usize, CellValue)> = window
            .rows
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .collect();
        header.sort_by_key(|(position, _)| *position);
        Ok(header)
    }

    fn load_row_window(&mut self, start_row: usize, end_row: usize) -> Result<RowWindow> {
        let mut window = RowWindow::blank(start_row, end_row);
        if self.streamed {
            self.stream_window(&mut window, end_row)?;
        } else {
            self.range_window(&mut window, end_row)?;
        }
        Ok(window)
    }
}
