use crate::config::RetryPolicy;
use crate::errors::DashboardError;
use crate::models::{SyncLogEntry, SyncTrigger};
use crate::notices::ToastKind;
use crate::refresh::refresh_modules;
use crate::state::AppState;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Completed(SyncLogEntry),
    /// Another sync was in flight; nothing happened.
    AlreadyRunning,
}

/// Runs one sync against the backend and records the attempt.
///
/// Failures never escape: they become a failure entry in the log. The module
/// list is refreshed whatever the outcome.
pub async fn trigger_sync(state: &AppState, trigger: SyncTrigger) -> TriggerOutcome {
    let Some(_guard) = state.begin_sync() else {
        info!(?trigger, "sync already in flight; ignoring trigger");
        return TriggerOutcome::AlreadyRunning;
    };

    if state.is_live() {
        state.notices.lock().await.dismiss_banner();
    }
    let started = state.now();
    info!(?trigger, "sync started");

    let entry = match run_sync(state).await {
        Ok(()) => {
            let finished = state.now();
            let duration = (finished - started).num_milliseconds().max(0) as f64 / 1000.0;
            match refresh_modules(state).await {
                Ok(modules) => SyncLogEntry::success(finished, trigger, duration, &modules),
                Err(err) => SyncLogEntry::failure(finished, trigger, err.to_string()),
            }
        }
        Err(err) => {
            let finished = state.now();
            let _ = refresh_modules(state).await;
            SyncLogEntry::failure(finished, trigger, err.to_string())
        }
    };

    if !entry.is_success() {
        match state.config.retry_policy {
            RetryPolicy::None => info!("no retry configured; waiting for the next trigger"),
        }
    }

    record(state, &entry).await;
    TriggerOutcome::Completed(entry)
}

async fn run_sync(state: &AppState) -> Result<(), DashboardError> {
    let reply = state.backend.trigger_sync().await?;
    match reply.reported_failure() {
        Some(message) => Err(DashboardError::Rejected(message)),
        None => Ok(()),
    }
}

async fn record(state: &AppState, entry: &SyncLogEntry) {
    if !state.is_live() {
        warn!("session torn down; discarding sync result");
        return;
    }

    let now = state.now();
    match &entry.error_message {
        None => {
            info!(
                trigger = ?entry.trigger,
                duration_seconds = entry.duration_seconds,
                records = entry.records_updated,
                modules = entry.modules_processed,
                "sync succeeded"
            );
            state.notices.lock().await.show_toast(
                ToastKind::Success,
                format!(
                    "Sync complete: {} records across {} modules",
                    entry.records_updated, entry.modules_processed
                ),
                now,
            );
        }
        Some(message) => {
            error!(trigger = ?entry.trigger, "sync failed: {message}");
            let mut notices = state.notices.lock().await;
            notices.raise_error(message.clone(), now);
            notices.show_toast(ToastKind::Failure, format!("Sync failed: {message}"), now);
        }
    }
    state.log.lock().await.append(entry.clone());
}
