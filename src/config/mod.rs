pub mod toml_config;

pub use toml_config::RegistryConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "client-registry")]
#[command(about = "Client registry: spreadsheet import and duplicate reports")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database file")]
    pub database: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage during imports")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import clients from a spreadsheet (ods, xlsx, xls, csv, tsv)
    Import {
        #[arg(long, help = "Source file, defaults to public/excel.ods")]
        file: Option<String>,

        #[arg(long, help = "Rows read per window, e.g. 1000")]
        chunk: Option<usize>,

        #[arg(long, help = "Rows per SQL insert, e.g. 500")]
        batch: Option<usize>,

        #[arg(long, help = "CSV delimiter, e.g. ';'")]
        delimiter: Option<String>,
    },
    /// List clients ordered by id, one page at a time
    List {
        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Duplicates by email and by phone
    Duplicates,
    /// Duplicates on company name + phone + email, none blank
    DuplicatesComplets,
    /// Duplicated company name + phone + email tuples with their clients
    DuplicatesCombined,
    /// Clients sharing a company name, a phone or an email
    DuplicatesFields,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// File (or default) configuration with command-line overrides applied.
    pub fn resolve(&self) -> Result<RegistryConfig> {
        let mut config = match &self.config {
            Some(path) => RegistryConfig::from_file(path)?,
            None => RegistryConfig::default(),
        };

        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }

        match &self.command {
            Command::Import {
                file,
                chunk,
                batch,
                delimiter,
            } => {
                if let Some(file) = file {
                    config.import.source_path = file.clone();
                }
                if let Some(chunk) = chunk {
                    config.import.chunk_size = *chunk;
                }
                if let Some(batch) = batch {
                    config.import.batch_size = *batch;
                }
                if let Some(delimiter) = delimiter {
                    config.import.csv_delimiter = delimiter.clone();
                }
            }
            Command::List {
                per_page: Some(per_page),
                ..
            } => {
                config.listing.per_page = *per_page;
            }
            _ => {}
        }

        config.validate()?;
        if matches!(self.command, Command::Import { .. }) {
            config.validate_import_source()?;
        }
        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_import_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "client-registry",
            "--database",
            "test.db",
            "import",
            "--file",
            "clients.csv",
            "--chunk",
            "3",
            "--batch",
            "2",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.database.path, "test.db");
        assert_eq!(config.import.source_path, "clients.csv");
        assert_eq!(config.import.chunk_size, 3);
        assert_eq!(config.import.batch_size, 2);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = CliConfig::parse_from(["client-registry", "duplicates-complets", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::DuplicatesComplets));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = CliConfig::parse_from(["client-registry", "list", "--per-page", "0"]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_chunk_beyond_limit_is_rejected() {
        let cli = CliConfig::parse_from([
            "client-registry",
            "import",
            "--file",
            "clients.csv",
            "--chunk",
            "18446744073709551615",
        ]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_source_extension_only_matters_for_import() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("registry.toml");
        std::fs::write(&config_path, "[import]\nsource_path = \"clients.pdf\"\n").unwrap();
        let config_arg = config_path.to_str().unwrap();

        let list = CliConfig::parse_from(["client-registry", "--config", config_arg, "list"]);
        assert!(list.resolve().is_ok());

        let import = CliConfig::parse_from(["client-registry", "--config", config_arg, "import"]);
        assert!(import.resolve().is_err());
    }
}
