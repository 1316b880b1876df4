use crate::adapters::open_source;
use crate::adapters::sqlite_store::SqliteStore;
use crate::config::RegistryConfig;
use crate::core::column_mapper::ColumnMapping;
use crate::core::importer::{ChunkedImporter, ImportSettings, ImportSummary};
use crate::domain::model::Field;
use crate::domain::ports::{RecordStore, SpreadsheetSource};
use crate::utils::error::{RegistryError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::path::Path;

/// One import run from a file into the store: preconditions, import, report.
pub struct ImportJob<'a, S: RecordStore> {
    store: &'a mut S,
    settings: ImportSettings,
    csv_delimiter: u8,
    monitor: SystemMonitor,
}

impl<'a, S: RecordStore> ImportJob<'a, S> {
    pub fn new(store: &'a mut S, settings: ImportSettings) -> Self {
        Self::new_with_monitoring(store, settings, false)
    }

    pub fn new_with_monitoring(store: &'a mut S, settings: ImportSettings, monitor: bool) -> Self {
        Self {
            store,
            settings,
            csv_delimiter: b',',
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Imports `path`. A missing file or an unrecognized header fails before
    /// anything is written.
    pub fn run(&mut self, path: &Path) -> Result<ImportSummary> {
        ensure_source_exists(path)?;

        tracing::info!("Importing clients from: {}", path.display());
        let mut source = open_source(path, self.csv_delimiter)?;
        self.run_source(source.as_mut())
    }

    pub fn run_source<R: SpreadsheetSource + ?Sized>(&mut self, source: &mut R) -> Result<ImportSummary> {
        let header = source.load_header_row()?;
        let mapping = ColumnMapping::require_from_header(&header, &Field::ALL)?;
        tracing::info!("Recognized columns: {}", mapping.describe());

        // One instant for every row of this run
        let started_at = Utc::now();
        let monitor = &mut self.monitor;
        monitor.log_stats("Import start");

        let summary = ChunkedImporter::new(&mut *self.store, self.settings).run_with_progress(
            source,
            &mapping,
            started_at,
            |progress| {
                monitor.log_stats(&format!("Rows {}", progress.last_row));
            },
        )?;

        if summary.imported == 0 {
            tracing::warn!(
                "⚠️ No row imported. Check that the first sheet holds data and that row 1 has the expected headers."
            );
        } else {
            tracing::info!(
                "✅ {} clients imported successfully ({} windows, {} batches)",
                summary.imported,
                summary.windows_read,
                summary.batches_flushed
            );
        }
        monitor.log_final_stats();

        Ok(summary)
    }
}

fn ensure_source_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    tracing::error!("❌ Source file {} not found", path.display());
    Err(RegistryError::SourceNotFound {
        path: path.display().to_string(),
    })
}

/// Imports `import.source_path` into the configured database.
///
/// The database is opened only once the source is known to exist and to
/// have a supported extension, so a failed precondition leaves no file behind.
pub fn import_into_database(config: &RegistryConfig) -> Result<ImportSummary> {
    config.validate_import_source()?;
    let source_path = Path::new(&config.import.source_path);
    ensure_source_exists(source_path)?;
    let delimiter = config.csv_delimiter()?;

    let mut store = SqliteStore::open(&config.database.path)?;
    ImportJob::new_with_monitoring(&mut store, config.import_settings(), config.monitoring_enabled())
        .with_csv_delimiter(delimiter)
        .run(source_path)
}
