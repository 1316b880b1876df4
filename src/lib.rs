pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::RegistryConfig;

pub use adapters::{open_source, sqlite_store::SqliteStore};
pub use crate::core::{
    duplicates::DuplicateDetector, import_job::ImportJob, importer::ChunkedImporter,
    listing::list_clients,
};
pub use utils::error::{RegistryError, Result};
