use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A recognized client column.
///
/// The external name (`column_name`) is what appears in spreadsheet headers,
/// in the `clients` table and in every JSON report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "nom_entreprise")]
    CompanyName,
    #[serde(rename = "adresse_municipale")]
    StreetAddress,
    #[serde(rename = "ville")]
    City,
    #[serde(rename = "code_postal")]
    PostalCode,
    #[serde(rename = "telephone")]
    Phone,
    #[serde(rename = "courriel")]
    Email,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::CompanyName,
        Field::StreetAddress,
        Field::City,
        Field::PostalCode,
        Field::Phone,
        Field::Email,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Field::CompanyName => "nom_entreprise",
            Field::StreetAddress => "adresse_municipale",
            Field::City => "ville",
            Field::PostalCode => "code_postal",
            Field::Phone => "telephone",
            Field::Email => "courriel",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A row of the `clients` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: i64,
    #[serde(rename = "nom_entreprise")]
    pub company_name: Option<String>,
    #[serde(rename = "adresse_municipale")]
    pub street_address: Option<String>,
    #[serde(rename = "ville")]
    pub city: Option<String>,
    #[serde(rename = "code_postal")]
    pub postal_code: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[serde(rename = "courriel")]
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ClientRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::CompanyName => &self.company_name,
            Field::StreetAddress => &self.street_address,
            Field::City => &self.city,
            Field::PostalCode => &self.postal_code,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
        };
        value.as_deref()
    }
}

/// Raw value of a spreadsheet cell, before it reaches the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Characters trimmed from text cells. Unicode spaces such as U+00A0 are kept.
const TRIMMED: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0B'];

impl CellValue {
    /// Trims text values; every other kind passes through unchanged.
    pub fn normalized(&self) -> CellValue {
        match self {
            CellValue::Text(s) => CellValue::Text(s.trim_matches(&TRIMMED[..]).to_string()),
            other => other.clone(),
        }
    }

    /// Loose truthiness: empty, `""`, `"0"`, zero and `false` are all falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty() || s == "0",
            CellValue::Int(n) => *n == 0,
            CellValue::Float(n) => *n == 0.0,
            CellValue::Bool(b) => !b,
        }
    }

    /// Text stored in the column; `None` maps to SQL NULL.
    pub fn to_column_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Int(n) => Some(n.to_string()),
            CellValue::Float(n) => {
                // Integral floats are written without decimals
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            CellValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A normalized spreadsheet row waiting to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub fields: BTreeMap<Field, CellValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportRow {
    pub fn column_text(&self, field: Field) -> Option<String> {
        self.fields.get(&field).and_then(CellValue::to_column_text)
    }
}

/// Timestamp format used for `created_at` / `updated_at`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Records sharing the same value (or tuple of values) on `criteria`.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub criteria: Vec<Field>,
    pub key: Vec<String>,
    pub members: Vec<ClientRecord>,
}

impl DuplicateGroup {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip_through_lookup() {
        for field in Field::ALL {
            assert_eq!(Field::from_column_name(field.column_name()), Some(field));
        }
        assert_eq!(Field::from_column_name("Courriel"), None);
        assert_eq!(Field::from_column_name(" courriel"), None);
    }

    #[test]
    fn test_falsy_cells() {
        assert!(CellValue::Empty.is_falsy());
        assert!(CellValue::Text(String::new()).is_falsy());
        assert!(CellValue::Text("0".into()).is_falsy());
        assert!(CellValue::Int(0).is_falsy());
        assert!(CellValue::Float(0.0).is_falsy());
        assert!(CellValue::Bool(false).is_falsy());

        assert!(!CellValue::Text("Acme".into()).is_falsy());
        assert!(!CellValue::Text("00".into()).is_falsy());
        assert!(!CellValue::Int(7).is_falsy());
        assert!(!CellValue::Bool(true).is_falsy());
    }

    #[test]
    fn test_normalized_only_trims_text() {
        assert_eq!(
            CellValue::Text("  Acme \t".into()).normalized(),
            CellValue::Text("Acme".into())
        );
        assert_eq!(CellValue::Float(1.5).normalized(), CellValue::Float(1.5));
    }

    #[test]
    fn test_normalized_keeps_non_ascii_spaces() {
        assert_eq!(
            CellValue::Text("\0\x0B Acme\r\n".into()).normalized(),
            CellValue::Text("Acme".into())
        );

        let nbsp = CellValue::Text("\u{a0}".into()).normalized();
        assert_eq!(nbsp, CellValue::Text("\u{a0}".into()));
        assert!(!nbsp.is_falsy());
    }

    #[test]
    fn test_column_text_conversion() {
        assert_eq!(CellValue::Empty.to_column_text(), None);
        assert_eq!(CellValue::Int(42).to_column_text().as_deref(), Some("42"));
        assert_eq!(CellValue::Float(5551111.0).to_column_text().as_deref(), Some("5551111"));
        assert_eq!(CellValue::Float(2.5).to_column_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Bool(true).to_column_text().as_deref(), Some("1"));
    }

    #[test]
    fn test_client_record_serializes_with_column_names() {
        let record = ClientRecord {
            id: 1,
            company_name: Some("Acme".into()),
            street_address: None,
            city: Some("Québec".into()),
            postal_code: None,
            phone: Some("555-1111".into()),
            email: Some("a@x.com".into()),
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["nom_entreprise"], "Acme");
        assert_eq!(json["ville"], "Québec");
        assert_eq!(json["telephone"], "555-1111");
        assert_eq!(json["courriel"], "a@x.com");
        assert!(json["adresse_municipale"].is_null());
        assert_eq!(record.get(Field::Email), Some("a@x.com"));
    }
}
