use crate::domain::model::{CellValue, Field};
use crate::utils::error::{RegistryError, Result};
use std::collections::BTreeMap;

/// Column position (zero-based) to the field it feeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    columns: BTreeMap<usize, Field>,
}

impl ColumnMapping {
    /// Keeps header cells whose trimmed text is exactly one of `allowed`.
    ///
    /// Non-text, blank and unknown headers are dropped without complaint.
    pub fn from_header(header: &[(usize, CellValue)], allowed: &[Field]) -> Self {
        let columns = header
            .iter()
            .filter_map(|(position, value)| {
                let name = value.as_text()?.trim();
                if name.is_empty() {
                    return None;
                }
                Field::from_column_name(name)
                    .filter(|field| allowed.contains(field))
                    .map(|field| (*position, field))
            })
            .collect();

        Self { columns }
    }

    /// Same as [`from_header`](Self::from_header) but an empty result is a
    /// precondition failure: nothing could ever be imported.
    pub fn require_from_header(header: &[(usize, CellValue)], allowed: &[Field]) -> Result<Self> {
        let mapping = Self::from_header(header, allowed);
        if mapping.is_empty() {
            let expected = allowed
                .iter()
                .map(|f| f.column_name())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(RegistryError::UnrecognizedHeader { expected });
        }
        Ok(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Field)> + '_ {
        self.columns.iter().map(|(p, f)| (*p, *f))
    }

    /// `A → nom_entreprise, C → courriel`, for logs.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|(position, field)| format!("{} → {}", column_letter(position), field))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Spreadsheet letter of a zero-based column: 0 → `A`, 26 → `AA`.
pub fn column_letter(position: usize) -> String {
    let mut letters = Vec::new();
    let mut n = position + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[CellValue]) -> Vec<(usize, CellValue)> {
        cells.iter().cloned().enumerate().collect()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_maps_recognized_columns_only() {
        let header = header(&[
            text("nom_entreprise"),
            text("notes"),
            text("  courriel "),
            CellValue::Empty,
            text("telephone"),
        ]);

        let mapping = ColumnMapping::from_header(&header, &Field::ALL);
        let mapped: Vec<_> = mapping.iter().collect();

        assert_eq!(
            mapped,
            vec![(0, Field::CompanyName), (2, Field::Email), (4, Field::Phone)]
        );
        assert_eq!(mapping.describe(), "A → nom_entreprise, C → courriel, E → telephone");
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let header = header(&[text("Courriel"), text("TELEPHONE")]);
        assert!(ColumnMapping::from_header(&header, &Field::ALL).is_empty());
    }

    #[test]
    fn test_non_text_headers_are_ignored() {
        let header = header(&[CellValue::Int(1), CellValue::Bool(true), text("ville")]);
        let mapping = ColumnMapping::from_header(&header, &Field::ALL);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.iter().next(), Some((2, Field::City)));
    }

    #[test]
    fn test_allowed_list_restricts_mapping() {
        let header = header(&[text("nom_entreprise"), text("courriel")]);
        let mapping = ColumnMapping::from_header(&header, &[Field::Email]);
        assert_eq!(mapping.iter().collect::<Vec<_>>(), vec![(1, Field::Email)]);
    }

    #[test]
    fn test_empty_mapping_is_a_precondition_failure() {
        let header = header(&[text("name"), text("mail"), text("")]);
        let err = ColumnMapping::require_from_header(&header, &Field::ALL).unwrap_err();

        match err {
            RegistryError::UnrecognizedHeader { expected } => {
                assert!(expected.starts_with("nom_entreprise, adresse_municipale"));
                assert!(expected.ends_with("courriel"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }
}
