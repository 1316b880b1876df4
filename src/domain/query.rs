//! Store-independent query values.
//!
//! The core never builds SQL. It describes what it wants with a
//! [`GroupQuery`] or a [`RecordQuery`] and lets the [`RecordStore`]
//! adapter translate it.
//!
//! [`RecordStore`]: crate::domain::ports::RecordStore

use crate::domain::model::Field;

/// When a grouping field counts as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Only NULL is missing.
    NotNull,
    /// NULL and the empty string are both missing.
    NotBlank,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Present(Field, Presence),
    Equals(Field, String),
    /// The tuple of `fields` must equal one of `keys`.
    KeyIn {
        fields: Vec<Field>,
        keys: Vec<Vec<String>>,
    },
}

impl Filter {
    pub fn present_all(fields: &[Field], presence: Presence) -> Vec<Filter> {
        fields.iter().map(|f| Filter::Present(*f, presence)).collect()
    }

    pub fn equals_key(fields: &[Field], key: &[String]) -> Vec<Filter> {
        fields
            .iter()
            .zip(key)
            .map(|(f, v)| Filter::Equals(*f, v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    #[default]
    Id,
    /// Ascending on the field, then by id.
    FieldThenId(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Largest groups first; equal counts by key ascending.
    #[default]
    CountDesc,
    Key,
}

/// `SELECT group_by.., COUNT(*) .. GROUP BY .. HAVING COUNT(*) > min_count`.
///
/// Every `group_by` field must also carry a `Present` filter: group keys
/// are plain strings and cannot represent NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupQuery {
    pub filters: Vec<Filter>,
    pub group_by: Vec<Field>,
    pub having_count_above: u64,
    pub order: GroupOrder,
}

impl GroupQuery {
    /// Groups on `fields`, all required present, keeping groups of two or more.
    pub fn duplicates_of(fields: &[Field], presence: Presence) -> Self {
        Self {
            filters: Filter::present_all(fields, presence),
            group_by: fields.to_vec(),
            having_count_above: 1,
            order: GroupOrder::CountDesc,
        }
    }

    pub fn order_by(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    pub key: Vec<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordQuery {
    pub filters: Vec<Filter>,
    pub order: RecordOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn order_by(mut self, order: RecordOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}
