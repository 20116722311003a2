use crate::errors::AppError;
use crate::export::{CSV_MIME, export_all_from_backend, export_module, export_module_from_backend};
use crate::models::{
    AutoSyncRequest, BackendSyncLog, DashboardQuery, DashboardSnapshot, ExportQuery, ModuleSummary,
    RecordPage, RecordsQuery, SyncLogEntry, SyncTrigger,
};
use crate::records::load_records;
use crate::refresh::refresh_modules;
use crate::state::AppState;
use crate::sync::{TriggerOutcome, trigger_sync};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{error, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config.anchor))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardSnapshot> {
    Json(state.snapshot(query.search.as_deref()).await)
}

pub async fn run_sync(State(state): State<AppState>) -> Result<Json<SyncLogEntry>, AppError> {
    if !state.is_live() {
        return Err(AppError::unavailable("dashboard is shutting down"));
    }

    // detached so a client that disconnects mid-sync does not cancel it
    let task_state = state.clone();
    let outcome = tokio::spawn(async move { trigger_sync(&task_state, SyncTrigger::Manual).await })
        .await
        .map_err(|err| {
            error!("sync task failed: {err}");
            AppError::unavailable("sync task failed")
        })?;

    match outcome {
        TriggerOutcome::Completed(entry) => Ok(Json(entry)),
        TriggerOutcome::AlreadyRunning => Err(AppError::conflict("a sync is already in progress")),
    }
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<Vec<ModuleSummary>>, AppError> {
    state.notices.lock().await.dismiss_banner();
    Ok(Json(refresh_modules(&state).await?))
}

pub async fn set_auto_sync(
    State(state): State<AppState>,
    Json(payload): Json<AutoSyncRequest>,
) -> Json<Value> {
    state.set_auto_sync(payload.enabled);
    info!(enabled = payload.enabled, "automatic sync toggled");
    Json(json!({ "auto_sync_enabled": state.auto_sync_enabled() }))
}

pub async fn get_records(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordPage>, AppError> {
    let page = load_records(&state, &name, query.page, query.per_page).await?;
    Ok(Json(page))
}

pub async fn export(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let (filename, body) = match query.source.as_deref().map(str::trim) {
        None | Some("") | Some("records") => {
            let export = export_module(&state, &name).await?;
            (export.filename, export.body.into_bytes())
        }
        Some("server") => export_module_from_backend(&state, &name).await?,
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "source must be 'records' or 'server', got '{other}'"
            )));
        }
    };

    Ok(csv_download(&filename, body))
}

pub async fn export_all(State(state): State<AppState>) -> Result<Response, AppError> {
    let (filename, body) = export_all_from_backend(&state).await?;
    Ok(csv_download(&filename, body))
}

fn csv_download(filename: &str, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [
            (header::CONTENT_TYPE, CSV_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

pub async fn dismiss_banner(State(state): State<AppState>) -> StatusCode {
    state.notices.lock().await.dismiss_banner();
    StatusCode::NO_CONTENT
}

pub async fn dismiss_toast(State(state): State<AppState>) -> StatusCode {
    state.notices.lock().await.dismiss_toast();
    StatusCode::NO_CONTENT
}

pub async fn backend_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.backend.health().await?))
}

pub async fn backend_status(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.backend.status().await?))
}

pub async fn backend_overview(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.backend.overview().await?))
}

pub async fn backend_sync_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<BackendSyncLog>>, AppError> {
    Ok(Json(state.backend.sync_logs().await?))
}

pub async fn backend_stats(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, u64>>, AppError> {
    Ok(Json(state.backend.stats().await?))
}
