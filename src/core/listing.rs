use crate::domain::model::ClientRecord;
use crate::domain::ports::RecordStore;
use crate::domain::query::{RecordOrder, RecordQuery};
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;
use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 500;

/// One page of clients ordered by id, with paginator metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub current_page: usize,
    pub data: Vec<T>,
    pub per_page: usize,
    pub total: u64,
    pub last_page: usize,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Returns page `page` (1-based, 0 read as 1) of `per_page` clients.
pub fn list_clients<S: RecordStore + ?Sized>(
    store: &S,
    page: usize,
    per_page: usize,
) -> Result<Page<ClientRecord>> {
    validate_positive_number("listing.per_page", per_page, 1)?;
    let page = page.max(1);
    let total = store.count(&[])?;
    let offset = (page - 1).saturating_mul(per_page);

    let data = store.fetch(
        &RecordQuery::new()
            .order_by(RecordOrder::Id)
            .page(per_page, offset),
    )?;

    let last_page = (total as usize).div_ceil(per_page).max(1);
    let (from, to) = if data.is_empty() {
        (None, None)
    } else {
        (Some(offset + 1), Some(offset + data.len()))
    };

    Ok(Page {
        current_page: page,
        data,
        per_page,
        total,
        last_page,
        from,
        to,
    })
}
