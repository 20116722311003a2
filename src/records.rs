use crate::errors::DashboardError;
use crate::models::{CrmModule, RecordPage};
use crate::state::AppState;
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 200;

/// One page of a module's records for the record browser.
pub async fn load_records(
    state: &AppState,
    name: &str,
    page: Option<usize>,
    per_page: Option<usize>,
) -> Result<RecordPage, DashboardError> {
    let module = CrmModule::resolve(name)?;
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let records = match state.backend.fetch_records(module, Some((page, per_page))).await {
        Ok(records) => records,
        Err(err) => {
            warn!(module = module.name(), "failed to load records: {err}");
            state
                .raise_error(format!("Failed to load records for {}: {err}", module.name()))
                .await;
            return Err(err);
        }
    };

    let known_count = state
        .modules
        .read()
        .await
        .iter()
        .find(|summary| summary.name == module.name())
        .map(|summary| summary.record_count)
        .filter(|count| *count > 0);
    let total = records
        .total
        .filter(|total| *total > 0)
        .or(known_count)
        .unwrap_or(records.items.len() as u64);

    Ok(RecordPage {
        module: module.name().to_string(),
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page as u64),
        items: page_slice(records.items, page, per_page),
    })
}

/// Backends that ignore the paging parameters send everything; cut the page out
/// locally in that case.
fn page_slice(items: Vec<Value>, page: usize, per_page: usize) -> Vec<Value> {
    if items.len() <= per_page {
        return items;
    }
    items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect()
}
