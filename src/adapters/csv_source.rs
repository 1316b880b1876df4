use crate::domain::model::CellValue;
use crate::domain::ports::{Row, RowWindow, SpreadsheetSource};
use crate::utils::error::Result;
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Streams a delimited text file one window at a time.
///
/// The reader stays open between windows, so sequential windows never re-read
/// earlier rows. Asking for a window that starts before the cursor reopens
/// the file.
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    reader: Reader<File>,
    /// 1-based number of the row the next read returns.
    next_row: usize,
    exhausted: bool,
}

impl CsvSource {
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = Self::reader(&path, delimiter)?;
        Ok(Self {
            path,
            delimiter,
            reader,
            next_row: 1,
            exhausted: false,
        })
    }

    fn reader(path: &Path, delimiter: u8) -> Result<Reader<File>> {
        Ok(ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_path(path)?)
    }

    fn rewind(&mut self) -> Result<()> {
        tracing::debug!("Reopening {} to read backwards", self.path.display());
        self.reader = Self::reader(&self.path, self.delimiter)?;
        self.next_row = 1;
        self.exhausted = false;
        Ok(())
    }

    fn read_next(&mut self, record: &mut StringRecord) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.reader.read_record(record)? {
            self.next_row += 1;
            Ok(true)
        } else {
            self.exhausted = true;
            Ok(false)
        }
    }

    fn to_row(record: &StringRecord) -> Row {
        record
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_empty())
            .map(|(position, value)| (position, CellValue::Text(value.to_string())))
            .collect()
    }
}

impl SpreadsheetSource for CsvSource {
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
        if start_row < self.next_row {
            self.rewind()?;
        }

        let mut record = StringRecord::new();
        while self.next_row < start_row {
            if !self.read_next(&mut record)? {
                break;
            }
        }

        let mut window = RowWindow::blank(start_row, end_row);
        for slot in window.rows.iter_mut() {
            if !self.read_next(&mut record)? {
                break;
            }
            *slot = Self::to_row(&record);
        }
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_header_row_keeps_positions() {
        let file = csv_file("nom_entreprise,,courriel\nAcme,x,a@x.com\n");
        let mut source = CsvSource::open(file.path(), b',').unwrap();

        let header = source.load_header_row().unwrap();
        assert_eq!(
            header,
            vec![
                (0, CellValue::Text("nom_entreprise".into())),
                (2, CellValue::Text("courriel".into())),
            ]
        );
    }

    #[test]
    fn test_windows_past_the_end_are_blank() {
        let file = csv_file("h1;h2\na;b\nc;d\n");
        let mut source = CsvSource::open(file.path(), b';').unwrap();
        source.load_header_row().unwrap();

        let window = source.load_row_window(2, 4).unwrap();
        assert_eq!(window.rows.len(), 3);
        assert_eq!(window.cell(2, 0), &CellValue::Text("a".into()));
        assert_eq!(window.cell(3, 1), &CellValue::Text("d".into()));
        assert_eq!(window.cell(4, 0), &CellValue::Empty);

        let after = source.load_row_window(5, 7).unwrap();
        assert!(after.rows.iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_skipped_and_repeated_windows() {
        let file = csv_file("h\nr2\nr3\nr4\nr5\n");
        let mut source = CsvSource::open(file.path(), b',').unwrap();

        let window = source.load_row_window(4, 5).unwrap();
        assert_eq!(window.cell(4, 0), &CellValue::Text("r4".into()));
        assert_eq!(window.cell(5, 0), &CellValue::Text("r5".into()));

        let again = source.load_row_window(2, 2).unwrap();
        assert_eq!(again.cell(2, 0), &CellValue::Text("r2".into()));
    }

    #[test]
    fn test_ragged_rows_are_accepted() {
        let file = csv_file("a,b,c\n1\n1,2,3,4\n");
        let mut source = CsvSource::open(file.path(), b',').unwrap();

        let window = source.load_row_window(2, 3).unwrap();
        assert_eq!(window.rows[0].len(), 1);
        assert_eq!(window.cell(3, 3), &CellValue::Text("4".into()));
    }
}
