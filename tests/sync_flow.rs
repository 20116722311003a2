use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use sync_dashboard::clock::ManualClock;
use sync_dashboard::errors::DashboardError;
use sync_dashboard::export::{export_all_from_backend, export_module, export_module_from_backend};
use sync_dashboard::models::{SyncOutcome, SyncState, SyncTrigger};
use sync_dashboard::notices::ToastKind;
use sync_dashboard::records::load_records;
use sync_dashboard::{AppState, Config, TriggerOutcome, refresh_modules, spawn_ticker, trigger_sync};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ist(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Kolkata
        .with_ymd_and_hms(2026, 10, d, h, m, s)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn config_for(server: &MockServer, timeout: Duration) -> Config {
    Config {
        api_base_url: server.uri(),
        request_timeout: timeout,
        ..Config::default()
    }
}

fn manual_session(server: &MockServer, start: DateTime<Utc>) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let config = config_for(server, Duration::from_secs(5));
    let state = AppState::with_clock(config, clock.clone()).unwrap();
    (state, clock)
}

fn modules_body() -> serde_json::Value {
    json!({
        "ok": true,
        "modules": [
            {"name": "Contacts", "records": 40},
            {"name": "Calls", "records": 2}
        ]
    })
}

async fn mount_modules(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(modules_body()))
        .mount(server)
        .await;
}

fn completed(outcome: TriggerOutcome) -> sync_dashboard::models::SyncLogEntry {
    match outcome {
        TriggerOutcome::Completed(entry) => entry,
        TriggerOutcome::AlreadyRunning => panic!("sync unexpectedly reported as already running"),
    }
}

#[tokio::test]
async fn successful_sync_records_counts_and_refreshes_modules() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "result": {"Contacts": 40}}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let state = AppState::new(config_for(&server, Duration::from_secs(5))).unwrap();
    let entry = completed(trigger_sync(&state, SyncTrigger::Manual).await);

    assert_eq!(entry.outcome, SyncOutcome::Success);
    assert_eq!(entry.trigger, SyncTrigger::Manual);
    assert!(entry.duration_seconds >= 0.2, "duration {}", entry.duration_seconds);
    assert_eq!(entry.records_updated, 42);
    assert_eq!(entry.modules_processed, 2);
    assert!(entry.error_message.is_none());

    assert_eq!(state.sync_state(), SyncState::Idle);
    assert_eq!(state.modules.read().await.len(), 2);

    let snapshot = state.snapshot(None).await;
    assert_eq!(snapshot.total_records, 42);
    assert_eq!(snapshot.log.len(), 1);
    assert_eq!(snapshot.toast.map(|toast| toast.kind), Some(ToastKind::Success));
    assert!(snapshot.metrics.avg_duration_seconds.is_some());
    assert_eq!(snapshot.metrics.error_rate_percent, 0.0);
}

#[tokio::test]
async fn http_500_becomes_a_failure_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    let entry = completed(trigger_sync(&state, SyncTrigger::Automatic).await);

    assert_eq!(entry.outcome, SyncOutcome::Failure);
    assert_eq!(entry.duration_seconds, 0.0);
    assert_eq!(entry.records_updated, 0);
    assert_eq!(entry.modules_processed, 0);
    let message = entry.error_message.clone().unwrap();
    assert!(message.starts_with("500"), "{message}");
    assert!(message.contains("boom"));
    assert_eq!(state.sync_state(), SyncState::Idle);

    // status is refreshed even though the sync failed
    assert_eq!(state.modules.read().await.len(), 2);

    let snapshot = state.snapshot(None).await;
    assert_eq!(snapshot.log, vec![entry]);
    assert_eq!(snapshot.metrics.error_rate_percent, 100.0);
    assert_eq!(snapshot.toast.map(|toast| toast.kind), Some(ToastKind::Failure));
    assert!(snapshot.banner.is_some());
}

#[tokio::test]
async fn backend_reporting_not_ok_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": false, "error": "token expired"})),
        )
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    let entry = completed(trigger_sync(&state, SyncTrigger::Manual).await);
    assert_eq!(entry.outcome, SyncOutcome::Failure);
    assert!(entry.error_message.unwrap().contains("token expired"));
}

#[tokio::test]
async fn trigger_while_in_flight_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(600)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    let first_state = state.clone();
    let first = tokio::spawn(async move { trigger_sync(&first_state, SyncTrigger::Manual).await });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(state.sync_state(), SyncState::InFlight);

    let second = trigger_sync(&state, SyncTrigger::Automatic).await;
    assert_eq!(second, TriggerOutcome::AlreadyRunning);
    assert_eq!(state.sync_state(), SyncState::InFlight);
    assert!(state.log.lock().await.is_empty());

    completed(first.await.unwrap());
    assert_eq!(state.sync_state(), SyncState::Idle);
    assert_eq!(state.log.lock().await.len(), 1);
}

#[tokio::test]
async fn timed_out_sync_is_a_failure_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let state = AppState::new(config_for(&server, Duration::from_secs(1))).unwrap();
    let entry = completed(trigger_sync(&state, SyncTrigger::Manual).await);

    assert_eq!(entry.outcome, SyncOutcome::Failure);
    assert!(entry.error_message.unwrap().contains("timed out"));
    assert_eq!(state.sync_state(), SyncState::Idle);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_modules() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(modules_body()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modules"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .with_priority(2)
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    assert_eq!(refresh_modules(&state).await.unwrap().len(), 2);

    let err = refresh_modules(&state).await.unwrap_err();
    assert!(matches!(err, DashboardError::Http { status: 503, .. }));
    assert_eq!(state.modules.read().await.len(), 2);
    assert!(state.snapshot(None).await.banner.is_some());
}

#[tokio::test]
async fn refresh_replaces_modules_wholesale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(modules_body()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modules"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "Notes", "records": 3}])),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    refresh_modules(&state).await.unwrap();
    refresh_modules(&state).await.unwrap();

    let modules = state.modules.read().await.clone();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "Notes");
}

#[tokio::test]
async fn results_after_teardown_are_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, _clock) = manual_session(&server, ist(14, 14, 0, 0));
    let task_state = state.clone();
    let pending = tokio::spawn(async move { trigger_sync(&task_state, SyncTrigger::Manual).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    state.teardown();

    completed(pending.await.unwrap());
    assert!(state.log.lock().await.is_empty());
    assert!(state.modules.read().await.is_empty());
    assert_eq!(state.sync_state(), SyncState::Idle);
}

#[tokio::test]
async fn export_of_empty_module_produces_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [], "total": 0})))
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));
    let err = export_module(&state, "Contacts").await.unwrap_err();
    assert!(matches!(err, DashboardError::EmptyResult(ref name) if name == "Contacts"));

    let banner = state.snapshot(None).await.banner.unwrap();
    assert_eq!(banner.message, "No records found to download for Contacts.");
}

#[tokio::test]
async fn export_renders_csv_named_after_module_and_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "name": "Ada \"Countess\" Lovelace"},
                {"id": 2, "name": null}
            ]
        })))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
    let (state, _clock) = manual_session(&server, start);
    let export = export_module(&state, "contacts").await.unwrap();

    assert_eq!(export.filename, "contacts_2026-10-16.csv");
    assert_eq!(
        export.body,
        "id,name\n\"1\",\"Ada \"\"Countess\"\" Lovelace\"\n\"2\",\"\""
    );
}

#[tokio::test]
async fn unknown_module_fails_before_any_request() {
    let server = MockServer::start().await;
    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));

    let err = export_module(&state, "Leads").await.unwrap_err();
    assert!(matches!(err, DashboardError::NoEndpointMapped(_)));

    let err = load_records(&state, "Leads", None, None).await.unwrap_err();
    assert!(matches!(err, DashboardError::NoEndpointMapped(_)));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn records_are_paged_locally_when_backend_sends_everything() {
    let server = MockServer::start().await;
    let items: Vec<_> = (0..45).map(|id| json!({"id": id})).collect();
    Mock::given(method("GET"))
        .and(path("/Calls"))
        .and(query_param("page", "2"))
        .and(query_param("per", "20"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"records": items, "total": 45})),
        )
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));
    let page = load_records(&state, "Calls", Some(2), None).await.unwrap();

    assert_eq!(page.module, "Calls");
    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.items[0], json!({"id": 20}));
}

#[tokio::test]
async fn ticker_fires_automatic_sync_at_the_anchor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, clock) = manual_session(&server, ist(17, 9, 59, 59));
    let ticker = spawn_ticker(state.clone()).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.countdown().await.unwrap().remaining_seconds, 1);
    clock.set(ist(17, 10, 0, 0));

    let mut entry = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(first) = state.log.lock().await.entries().next() {
            entry = Some(first.clone());
            break;
        }
    }
    let entry = entry.expect("automatic sync never ran");
    assert_eq!(entry.trigger, SyncTrigger::Automatic);
    assert_eq!(entry.outcome, SyncOutcome::Success);

    let countdown = state.countdown().await.unwrap();
    assert_eq!(countdown.next_anchor, ist(24, 10, 0, 0));
    assert_eq!(countdown.remaining_seconds, ChronoDuration::days(7).num_seconds() as u64);

    state.teardown();
    ticker.await.unwrap();
}

async fn wait_for_log_len(state: &AppState, len: usize) {
    for _ in 0..50 {
        if state.log.lock().await.len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("log never reached {len} entries");
}

#[tokio::test]
async fn ticker_keeps_running_after_failed_automatic_syncs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(500).set_body_string("crm unavailable"))
        .expect(2)
        .mount(&server)
        .await;
    mount_modules(&server).await;

    let (state, clock) = manual_session(&server, ist(17, 9, 59, 59));
    let ticker = spawn_ticker(state.clone()).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    clock.set(ist(17, 10, 0, 0));
    wait_for_log_len(&state, 1).await;
    assert_eq!(state.countdown().await.unwrap().next_anchor, ist(24, 10, 0, 0));

    clock.set(ist(24, 10, 0, 0));
    wait_for_log_len(&state, 2).await;

    let outcomes: Vec<_> = state.log.lock().await.entries().map(|entry| entry.outcome).collect();
    assert_eq!(outcomes, vec![SyncOutcome::Failure, SyncOutcome::Failure]);
    assert_eq!(state.countdown().await.unwrap().next_anchor, ist(31, 10, 0, 0));
    assert!(!ticker.is_finished());

    state.teardown();
    ticker.await.unwrap();
}

#[tokio::test]
async fn server_rendered_exports_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/export/Contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id,email\n1,ada@example.com"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/export/all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("module,id\nContacts,1"))
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));

    let (filename, body) = export_module_from_backend(&state, "contacts").await.unwrap();
    assert_eq!(filename, "contacts_2026-10-16.csv");
    assert_eq!(body, b"id,email\n1,ada@example.com".to_vec());

    let (filename, body) = export_all_from_backend(&state).await.unwrap();
    assert_eq!(filename, "all_modules_2026-10-16.csv");
    assert_eq!(body, b"module,id\nContacts,1".to_vec());
    assert!(state.snapshot(None).await.banner.is_none());
}

#[tokio::test]
async fn failed_combined_export_raises_the_banner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/export/all"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));
    let err = export_all_from_backend(&state).await.unwrap_err();
    assert!(matches!(err, DashboardError::Http { status: 500, .. }));

    let banner = state.snapshot(None).await.banner.unwrap();
    assert!(banner.message.starts_with("Failed to download all modules: 500"));
}

#[tokio::test]
async fn backend_stats_and_sync_logs_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Contacts": 40, "Calls": "2"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sync_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "module": "Contacts", "status": "success", "records_synced": 40,
             "started_at": "2026-10-10T04:30:00Z", "message": "ok"},
            {"id": 8, "module": "Calls", "status": "error"}
        ])))
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));

    let stats = state.backend.stats().await.unwrap();
    assert_eq!(stats.get("Contacts"), Some(&40));
    assert_eq!(stats.get("Calls"), Some(&2));

    let logs = state.backend.sync_logs().await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].module.as_deref(), Some("Contacts"));
    assert_eq!(logs[0].records_synced, Some(40));
    assert_eq!(logs[1].status.as_deref(), Some("error"));
    assert_eq!(logs[1].records_synced, None);
}

#[tokio::test]
async fn non_object_stats_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let (state, _clock) = manual_session(&server, ist(16, 12, 0, 0));
    let err = state.backend.stats().await.unwrap_err();
    assert!(matches!(err, DashboardError::Decode(_)));
}

#[tokio::test]
async fn paused_auto_sync_rearms_without_syncing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (state, clock) = manual_session(&server, ist(17, 9, 59, 59));
    state.set_auto_sync(false);
    let ticker = spawn_ticker(state.clone()).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    clock.set(ist(17, 10, 0, 0));
    tokio::time::sleep(Duration::from_millis(2_200)).await;

    assert_eq!(state.countdown().await.unwrap().next_anchor, ist(24, 10, 0, 0));
    assert!(state.log.lock().await.is_empty());

    state.teardown();
    ticker.await.unwrap();
}
