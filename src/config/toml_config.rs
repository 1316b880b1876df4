use crate::adapters::{TEXT_EXTENSIONS, WORKBOOK_EXTENSIONS};
use crate::core::importer::{
    ImportSettings, DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_EMPTY_WINDOWS,
};
use crate::core::listing::DEFAULT_PER_PAGE;
use crate::utils::error::{RegistryError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_file_extension, validate_path, validate_positive_number,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_PER_PAGE: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub listing: ListingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "clients.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub source_path: String,
    pub chunk_size: usize,
    pub batch_size: usize,
    pub max_empty_windows: usize,
    pub csv_delimiter: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_path: "public/excel.ods".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_empty_windows: DEFAULT_MAX_EMPTY_WINDOWS,
            csv_delimiter: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub per_page: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// `compact` or `json`
    pub log_format: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_format: "compact".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Loads the configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RegistryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a TOML string; sections and keys left out take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RegistryError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RegistryError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("database.path", &self.database.path)?;

        self.import_settings().validate()?;
        validate_delimiter("import.csv_delimiter", &self.import.csv_delimiter)?;

        validate_positive_number("listing.per_page", self.listing.per_page, 1)?;
        validate_range("listing.per_page", self.listing.per_page, 1, MAX_PER_PAGE)?;

        match self.monitoring.log_format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(RegistryError::InvalidConfigValueError {
                field: "monitoring.log_format".to_string(),
                value: other.to_string(),
                reason: "Valid formats: compact, json".to_string(),
            }),
        }
    }

    /// Only imports read `import.source_path`, so only they check it.
    pub fn validate_import_source(&self) -> Result<()> {
        validate_path("import.source_path", &self.import.source_path)?;

        let allowed: Vec<&str> = WORKBOOK_EXTENSIONS
            .iter()
            .chain(TEXT_EXTENSIONS.iter())
            .copied()
            .collect();
        validate_file_extension("import.source_path", &self.import.source_path, &allowed)
    }

    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            chunk_size: self.import.chunk_size,
            batch_size: self.import.batch_size,
            max_empty_windows: self.import.max_empty_windows,
        }
    }

    pub fn csv_delimiter(&self) -> Result<u8> {
        validate_delimiter("import.csv_delimiter", &self.import.csv_delimiter)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.log_format == "json"
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
