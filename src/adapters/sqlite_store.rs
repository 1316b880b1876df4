//! `clients` table on SQLite.

use crate::domain::model::{format_timestamp, ClientRecord, Field, ImportRow};
use crate::domain::ports::RecordStore;
use crate::domain::query::{
    Filter, GroupCount, GroupOrder, GroupQuery, Presence, RecordOrder, RecordQuery,
};
use crate::utils::error::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nom_entreprise TEXT,
    adresse_municipale TEXT,
    ville TEXT,
    code_postal TEXT,
    telephone TEXT,
    courriel TEXT,
    created_at TEXT,
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_clients_courriel ON clients (courriel);
CREATE INDEX IF NOT EXISTS idx_clients_telephone ON clients (telephone);
";

const SELECT_CLIENT: &str = "SELECT id, nom_entreprise, adresse_municipale, ville, code_postal, \
     telephone, courriel, created_at, updated_at FROM clients";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path.as_ref())?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<ClientRecord> {
    Ok(ClientRecord {
        id: row.get(0)?,
        company_name: row.get(1)?,
        street_address: row.get(2)?,
        city: row.get(3)?,
        postal_code: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// `WHERE ...` (or nothing) for `filters`, appending bound values to `params`.
fn where_clause(filters: &[Filter], params: &mut Vec<Value>) -> Result<String> {
    let mut clauses = Vec::with_capacity(filters.len());

    for filter in filters {
        match filter {
            Filter::Present(field, Presence::NotNull) => {
                clauses.push(format!("{} IS NOT NULL", field));
            }
            Filter::Present(field, Presence::NotBlank) => {
                clauses.push(format!("{0} IS NOT NULL AND {0} != ''", field));
            }
            Filter::Equals(field, value) => {
                clauses.push(format!("{} = ?", field));
                params.push(Value::Text(value.clone()));
            }
            Filter::KeyIn { keys, .. } if keys.is_empty() => {
                clauses.push("0".to_string());
            }
            Filter::KeyIn { fields, keys } => {
                // Keys travel as one JSON array bound to a single parameter
                let columns = join_columns(fields);
                let extracted = (0..fields.len())
                    .map(|i| format!("json_extract(value, '$[{}]')", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                clauses.push(format!(
                    "({}) IN (SELECT {} FROM json_each(?))",
                    columns, extracted
                ));
                params.push(Value::Text(serde_json::to_string(keys)?));
            }
        }
    }

    if clauses.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

fn join_columns(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RecordStore for SqliteStore {
    fn insert_many(&mut self, rows: &[ImportRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO clients (nom_entreprise, adresse_municipale, ville, code_postal, \
                 telephone, courriel, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.column_text(Field::CompanyName),
                    row.column_text(Field::StreetAddress),
                    row.column_text(Field::City),
                    row.column_text(Field::PostalCode),
                    row.column_text(Field::Phone),
                    row.column_text(Field::Email),
                    format_timestamp(&row.created_at),
                    format_timestamp(&row.updated_at),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!("Inserted batch of {} clients", rows.len());
        Ok(())
    }

    fn group_counts(&self, query: &GroupQuery) -> Result<Vec<GroupCount>> {
        let mut params = Vec::new();
        let filter_sql = where_clause(&query.filters, &mut params)?;
        let columns = join_columns(&query.group_by);
        let order = match query.order {
            GroupOrder::CountDesc => format!("total DESC, {}", columns),
            GroupOrder::Key => columns.clone(),
        };
        params.push(Value::Integer(query.having_count_above as i64));

        let sql = format!(
            "SELECT {cols}, COUNT(*) AS total FROM clients{filter} \
             GROUP BY {cols} HAVING COUNT(*) > ? ORDER BY {order}",
            cols = columns,
            filter = filter_sql,
            order = order,
        );
        tracing::trace!("group_counts: {}", sql);

        let width = query.group_by.len();
        let mut stmt = self.conn.prepare(&sql)?;
        let groups = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let key = (0..width)
                    .map(|i| row.get::<_, Option<String>>(i).map(Option::unwrap_or_default))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                let count: i64 = row.get(width)?;
                Ok(GroupCount {
                    key,
                    count: count as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(groups)
    }

    fn fetch(&self, query: &RecordQuery) -> Result<Vec<ClientRecord>> {
        let mut params = Vec::new();
        let filter_sql = where_clause(&query.filters, &mut params)?;
        let order = match query.order {
            RecordOrder::Id => "id".to_string(),
            RecordOrder::FieldThenId(field) => format!("{}, id", field),
        };

        let mut sql = format!("{}{} ORDER BY {}", SELECT_CLIENT, filter_sql, order);
        if query.limit.is_some() || query.offset > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(query.limit.map(|l| l as i64).unwrap_or(-1)));
            params.push(Value::Integer(query.offset as i64));
        }
        tracing::trace!("fetch: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(params.iter()), client_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn count(&self, filters: &[Filter]) -> Result<u64> {
        let mut params = Vec::new();
        let sql = format!("SELECT COUNT(*) FROM clients{}", where_clause(filters, &mut params)?);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }
}
