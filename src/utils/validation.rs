use crate::utils::error::{RegistryError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_delimiter(field_name: &str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(*byte),
        _ => Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        }),
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("database.path", "clients.db").is_ok());
        assert!(validate_path("database.path", "").is_err());
        assert!(validate_path("database.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("import.chunk_size", 1000, 1).is_ok());
        assert!(validate_positive_number("import.chunk_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = ["ods", "xlsx", "csv"];
        assert!(validate_file_extension("import.source_path", "public/excel.ods", &allowed).is_ok());
        assert!(validate_file_extension("import.source_path", "CLIENTS.XLSX", &allowed).is_ok());
        assert!(validate_file_extension("import.source_path", "clients.txt", &allowed).is_err());
        assert!(validate_file_extension("import.source_path", "clients", &allowed).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("import.csv_delimiter", ";").unwrap(), b';');
        assert_eq!(validate_delimiter("import.csv_delimiter", "\t").unwrap(), b'\t');
        assert!(validate_delimiter("import.csv_delimiter", ";;").is_err());
        assert!(validate_delimiter("import.csv_delimiter", "").is_err());
        assert!(validate_delimiter("import.csv_delimiter", "é").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("listing.per_page", 500, 1, 10_000).is_ok());
        assert!(validate_range("listing.per_page", 0, 1, 10_000).is_err());
    }
}
