use crate::errors::DashboardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The CRM modules the backend exposes, each served under an identically named
/// endpoint segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrmModule {
    Contacts,
    Accounts,
    Pipelines,
    Calls,
    Events,
    Tasks,
    Notes,
}

impl CrmModule {
    pub const ALL: [CrmModule; 7] = [
        CrmModule::Contacts,
        CrmModule::Accounts,
        CrmModule::Pipelines,
        CrmModule::Calls,
        CrmModule::Events,
        CrmModule::Tasks,
        CrmModule::Notes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CrmModule::Contacts => "Contacts",
            CrmModule::Accounts => "Accounts",
            CrmModule::Pipelines => "Pipelines",
            CrmModule::Calls => "Calls",
            CrmModule::Events => "Events",
            CrmModule::Tasks => "Tasks",
            CrmModule::Notes => "Notes",
        }
    }

    pub fn endpoint(self) -> &'static str {
        self.name()
    }

    /// Looks a module up by name, ignoring ASCII case.
    pub fn resolve(name: &str) -> Result<Self, DashboardError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|module| module.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| DashboardError::NoEndpointMapped(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub name: String,
    pub record_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    InFlight,
}

/// One sync attempt. Built only through [`SyncLogEntry::success`] and
/// [`SyncLogEntry::failure`], so `error_message` is set exactly on failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncLogEntry {
    pub timestamp: DateTime<Utc>,
    pub outcome: SyncOutcome,
    pub duration_seconds: f64,
    pub records_updated: u64,
    pub modules_processed: u64,
    pub error_message: Option<String>,
    pub trigger: SyncTrigger,
}

impl SyncLogEntry {
    pub fn success(
        timestamp: DateTime<Utc>,
        trigger: SyncTrigger,
        duration_seconds: f64,
        modules: &[ModuleSummary],
    ) -> Self {
        Self {
            timestamp,
            outcome: SyncOutcome::Success,
            duration_seconds: duration_seconds.max(0.0),
            records_updated: total_records(modules),
            modules_processed: modules.len() as u64,
            error_message: None,
            trigger,
        }
    }

    pub fn failure(
        timestamp: DateTime<Utc>,
        trigger: SyncTrigger,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            outcome: SyncOutcome::Failure,
            duration_seconds: 0.0,
            records_updated: 0,
            modules_processed: 0,
            error_message: Some(message.into()),
            trigger,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SyncOutcome::Success
    }
}

pub fn total_records(modules: &[ModuleSummary]) -> u64 {
    modules
        .iter()
        .fold(0u64, |sum, module| sum.saturating_add(module.record_count))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownState {
    pub next_anchor: DateTime<Utc>,
    pub remaining_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownParts {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncMetrics {
    pub avg_duration_seconds: Option<f64>,
    pub last_success: Option<DateTime<Utc>>,
    pub error_rate_percent: f64,
}

/// One row of the backend's own sync history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSyncLog {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub records_synced: Option<u64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub module: String,
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
    pub total_pages: u64,
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleInfo {
    pub weekday: String,
    pub time: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub modules: Vec<ModuleSummary>,
    pub total_records: u64,
    pub sync_state: SyncState,
    pub auto_sync_enabled: bool,
    pub countdown: Option<CountdownState>,
    pub countdown_parts: Option<CountdownParts>,
    pub schedule: ScheduleInfo,
    pub log: Vec<SyncLogEntry>,
    pub metrics: SyncMetrics,
    pub banner: Option<crate::notices::Notice>,
    pub toast: Option<crate::notices::Toast>,
}

#[derive(Debug, Deserialize)]
pub struct AutoSyncRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecordsQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub source: Option<String>,
}
