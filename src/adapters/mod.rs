// Adapters layer: concrete implementations of the domain ports.

pub mod csv_source;
pub mod sqlite_store;
pub mod workbook_source;

use crate::domain::ports::SpreadsheetSource;
use crate::utils::error::{RegistryError, Result};
use std::path::Path;

pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["ods", "xlsx", "xlsm", "xlsb", "xls"];
pub const TEXT_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

/// Picks a source by file extension. `.tsv` always uses a tab delimiter.
pub fn open_source(path: &Path, csv_delimiter: u8) -> Result<Box<dyn SpreadsheetSource>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        ext if WORKBOOK_EXTENSIONS.contains(&ext) => {
            Ok(Box::new(workbook_source::WorkbookSource::open(path)?))
        }
        "csv" => Ok(Box::new(csv_source::CsvSource::open(path, csv_delimiter)?)),
        "tsv" => Ok(Box::new(csv_source::CsvSource::open(path, b'\t')?)),
        _ => Err(RegistryError::UnsupportedSource {
            path: path.display().to_string(),
        }),
    }
}
