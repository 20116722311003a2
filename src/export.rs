use crate::errors::DashboardError;
use crate::models::CrmModule;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

/// Fetches every record of `name` and renders it as CSV. Failures are also
/// raised on the banner.
pub async fn export_module(state: &AppState, name: &str) -> Result<CsvExport, DashboardError> {
    surface(state, name, build_export(state, name).await).await
}

/// Passes the backend's own CSV rendering through untouched.
pub async fn export_module_from_backend(
    state: &AppState,
    name: &str,
) -> Result<(String, Vec<u8>), DashboardError> {
    let result = async {
        let module = CrmModule::resolve(name)?;
        let body = state.backend.export_csv(module).await?;
        Ok::<_, DashboardError>((export_filename(module, state.now()), body))
    }
    .await;
    surface(state, name, result).await
}

/// The backend's combined CSV of every module.
pub async fn export_all_from_backend(
    state: &AppState,
) -> Result<(String, Vec<u8>), DashboardError> {
    let result = state
        .backend
        .export_all_csv()
        .await
        .map(|body| (export_all_filename(state.now()), body));
    surface(state, "all modules", result).await
}

async fn surface<T>(
    state: &AppState,
    name: &str,
    result: Result<T, DashboardError>,
) -> Result<T, DashboardError> {
    if let Err(err) = &result {
        warn!(module = name, "export failed: {err}");
        let message = match err {
            DashboardError::EmptyResult(_) => err.to_string(),
            _ => format!("Failed to download {name}: {err}"),
        };
        state.raise_error(message).await;
    }
    result
}

async fn build_export(state: &AppState, name: &str) -> Result<CsvExport, DashboardError> {
    let module = CrmModule::resolve(name)?;
    let records = state.backend.fetch_records(module, None).await?;
    if records.items.is_empty() {
        return Err(DashboardError::EmptyResult(module.name().to_string()));
    }

    let body = render_csv(&records.items);
    if body.is_empty() {
        return Err(DashboardError::Decode(format!(
            "{} records are not JSON objects",
            module.name()
        )));
    }

    let export = CsvExport {
        filename: export_filename(module, state.now()),
        body,
    };
    info!(
        module = module.name(),
        rows = records.items.len(),
        file = %export.filename,
        "module exported"
    );
    Ok(export)
}

pub fn export_filename(module: CrmModule, now: DateTime<Utc>) -> String {
    format!("{}_{}.csv", module.name().to_lowercase(), now.format("%Y-%m-%d"))
}

pub fn export_all_filename(now: DateTime<Utc>) -> String {
    format!("all_modules_{}.csv", now.format("%Y-%m-%d"))
}

/// Columns come from the keys of the first record; every field is quoted.
pub fn render_csv(records: &[Value]) -> String {
    let Some(first) = records.first().and_then(Value::as_object) else {
        return String::new();
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|header| header.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        let row = headers
            .iter()
            .map(|header| quote(&cell_text(record.get(header.as_str()))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
