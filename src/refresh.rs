use crate::errors::DashboardError;
use crate::models::{ModuleSummary, total_records};
use crate::state::AppState;
use tracing::{info, warn};

/// Replaces the module list with what the backend reports now.
///
/// On failure the previous list is left untouched and the error is raised on
/// the banner as well as returned.
pub async fn refresh_modules(state: &AppState) -> Result<Vec<ModuleSummary>, DashboardError> {
    match state.backend.fetch_modules().await {
        Ok(modules) => {
            if state.is_live() {
                info!(
                    modules = modules.len(),
                    records = total_records(&modules),
                    "module list refreshed"
                );
                *state.modules.write().await = modules.clone();
            }
            Ok(modules)
        }
        Err(err) => {
            warn!("failed to load modules: {err}");
            state
                .raise_error(format!("Connection Error: Ensure backend is running. ({err})"))
                .await;
            Err(err)
        }
    }
}
