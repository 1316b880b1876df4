use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Spreadsheet error: {0}")]
    WorkbookError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Source file not found: {path}")]
    SourceNotFound { path: String },

    #[error("Unsupported source file: {path}")]
    UnsupportedSource { path: String },

    #[error("Workbook has no worksheet: {path}")]
    EmptyWorkbook { path: String },

    #[error("No recognized column in header row. Expected columns: {expected}")]
    UnrecognizedHeader { expected: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Storage,
    Source,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::SourceNotFound { .. }
            | RegistryError::UnsupportedSource { .. }
            | RegistryError::EmptyWorkbook { .. }
            | RegistryError::UnrecognizedHeader { .. } => ErrorCategory::Precondition,
            RegistryError::DatabaseError(_) => ErrorCategory::Storage,
            RegistryError::WorkbookError(_) | RegistryError::CsvError(_) => ErrorCategory::Source,
            RegistryError::ConfigError { .. }
            | RegistryError::ConfigValidationError { .. }
            | RegistryError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RegistryError::IoError(_) | RegistryError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition | ErrorCategory::Configuration | ErrorCategory::Source => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RegistryError::SourceNotFound { path } => {
                format!("Check that '{}' exists or pass another file with --file", path)
            }
            RegistryError::UnsupportedSource { .. } => {
                "Use a .ods, .xlsx, .xlsm, .xlsb, .xls, .csv or .tsv file".to_string()
            }
            RegistryError::EmptyWorkbook { .. } | RegistryError::UnrecognizedHeader { .. } => {
                "Make sure the first sheet exists and row 1 holds the expected column names"
                    .to_string()
            }
            RegistryError::DatabaseError(_) => {
                "Check that the database file is writable and not locked; rows flushed before the failure are kept"
                    .to_string()
            }
            RegistryError::WorkbookError(_) | RegistryError::CsvError(_) => {
                "Open the file in a spreadsheet application and save it again".to_string()
            }
            RegistryError::ConfigError { .. }
            | RegistryError::ConfigValidationError { .. }
            | RegistryError::InvalidConfigValueError { .. } => {
                "Review the command-line options and the TOML configuration file".to_string()
            }
            RegistryError::IoError(_) | RegistryError::SerializationError(_) => {
                "Check file permissions and available disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Precondition => format!("Import aborted: {}", self),
            ErrorCategory::Storage => format!("Database operation failed: {}", self),
            ErrorCategory::Source => format!("Could not read the source file: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
