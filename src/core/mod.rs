pub mod column_mapper;
pub mod duplicates;
pub mod import_job;
pub mod importer;
pub mod listing;

pub use crate::domain::model::{CellValue, ClientRecord, DuplicateGroup, Field, ImportRow};
pub use crate::domain::ports::{RecordStore, SpreadsheetSource};
pub use crate::utils::error::Result;
