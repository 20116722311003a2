use crate::anchor::seconds_until;
use crate::backend::BackendClient;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::DashboardError;
use crate::models::{
    CountdownParts, CountdownState, DashboardSnapshot, ModuleSummary, ScheduleInfo, SyncState,
    total_records,
};
use crate::notices::Notices;
use crate::synclog::SyncLog;
use chrono::{DateTime, Utc};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// The dashboard session: everything the page shows, alive from mount until
/// [`AppState::teardown`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub backend: BackendClient,
    pub modules: Arc<RwLock<Vec<ModuleSummary>>>,
    pub log: Arc<Mutex<SyncLog>>,
    pub notices: Arc<Mutex<Notices>>,
    pub next_anchor: Arc<RwLock<Option<DateTime<Utc>>>>,
    auto_sync: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, DashboardError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, DashboardError> {
        let backend = BackendClient::new(&config.api_base_url, config.request_timeout)?;
        Ok(Self {
            auto_sync: Arc::new(AtomicBool::new(config.auto_sync_enabled)),
            config: Arc::new(config),
            clock,
            backend,
            modules: Arc::new(RwLock::new(Vec::new())),
            log: Arc::new(Mutex::new(SyncLog::new())),
            notices: Arc::new(Mutex::new(Notices::default())),
            next_anchor: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// False once the session has been torn down; late results are dropped then.
    pub fn is_live(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub fn teardown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn sync_state(&self) -> SyncState {
        if self.in_flight.load(Ordering::SeqCst) {
            SyncState::InFlight
        } else {
            SyncState::Idle
        }
    }

    /// Moves the session to `InFlight`, or returns `None` when a sync already is.
    pub fn begin_sync(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync.load(Ordering::SeqCst)
    }

    pub fn set_auto_sync(&self, enabled: bool) {
        self.auto_sync.store(enabled, Ordering::SeqCst);
    }

    pub async fn raise_error(&self, message: impl Into<String>) {
        if self.is_live() {
            let now = self.now();
            self.notices.lock().await.raise_error(message, now);
        }
    }

    pub async fn countdown(&self) -> Option<CountdownState> {
        let next_anchor = (*self.next_anchor.read().await)?;
        Some(CountdownState {
            next_anchor,
            remaining_seconds: seconds_until(next_anchor, self.now()),
        })
    }

    pub async fn snapshot(&self, search: Option<&str>) -> DashboardSnapshot {
        let modules = self.modules.read().await.clone();
        let total = total_records(&modules);
        let modules = filter_modules(modules, search);

        let (log, metrics) = {
            let log = self.log.lock().await;
            (log.to_vec(), log.metrics())
        };
        let (banner, toast) = {
            let now = self.now();
            let mut notices = self.notices.lock().await;
            (notices.banner().cloned(), notices.toast(now))
        };
        let countdown = self.countdown().await;
        let anchor = &self.config.anchor;

        DashboardSnapshot {
            modules,
            total_records: total,
            sync_state: self.sync_state(),
            auto_sync_enabled: self.auto_sync_enabled(),
            countdown_parts: countdown
                .map(|state| CountdownParts::from_seconds(state.remaining_seconds)),
            countdown,
            schedule: ScheduleInfo {
                weekday: anchor.describe_weekday(),
                time: anchor.describe_time(),
                timezone: anchor.timezone.name().to_string(),
            },
            log,
            metrics,
            banner,
            toast,
        }
    }
}

/// Holds the session in `InFlight`; dropping it always returns to `Idle`.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Case-insensitive substring match on the module name.
pub fn filter_modules(modules: Vec<ModuleSummary>, search: Option<&str>) -> Vec<ModuleSummary> {
    let needle = search.map(str::trim).unwrap_or_default().to_lowercase();
    if needle.is_empty() {
        return modules;
    }
    modules
        .into_iter()
        .filter(|module| module.name.to_lowercase().contains(&needle))
        .collect()
}
