use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/sync", post(handlers::run_sync))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/auto-sync", post(handlers::set_auto_sync))
        .route("/api/modules/:name/records", get(handlers::get_records))
        .route("/api/export-all", get(handlers::export_all))
        .route("/api/export/:name", get(handlers::export))
        .route("/api/notices/banner/dismiss", post(handlers::dismiss_banner))
        .route("/api/notices/toast/dismiss", post(handlers::dismiss_toast))
        .route("/api/backend/health", get(handlers::backend_health))
        .route("/api/backend/status", get(handlers::backend_status))
        .route("/api/backend/overview", get(handlers::backend_overview))
        .route("/api/backend/sync-logs", get(handlers::backend_sync_logs))
        .route("/api/backend/stats", get(handlers::backend_stats))
        .with_state(state)
}
