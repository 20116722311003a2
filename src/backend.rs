//! HTTP client for the external sync backend plus the normalization of its
//! loosely shaped responses.

use crate::errors::DashboardError;
use crate::models::{BackendSyncLog, CrmModule, ModuleSummary};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tracing::debug;

/// Keys checked, in order, for the record array of a module response.
pub const RECORD_KEYS: [&str; 3] = ["items", "records", "data"];

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
}

/// Body of `POST /sync`. Every field is optional because some backends answer
/// with an empty or non-JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SyncReply {
    pub fn reported_failure(&self) -> Option<String> {
        if self.ok == Some(false) {
            Some(
                self.error
                    .clone()
                    .or_else(|| self.message.clone())
                    .unwrap_or_else(|| "backend reported sync failure".to_string()),
            )
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub items: Vec<Value>,
    pub total: Option<u64>,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DashboardError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub async fn fetch_modules(&self) -> Result<Vec<ModuleSummary>, DashboardError> {
        let body = self.get_json("/modules", &[]).await?;
        Ok(normalize_modules(body))
    }

    pub async fn trigger_sync(&self) -> Result<SyncReply, DashboardError> {
        debug!("POST /sync");
        let response = self
            .http
            .post(self.url("/sync"))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let response = ensure_success(response).await?;
        let text = response.text().await.map_err(|err| self.transport_error(err))?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    /// Records of one module; `page` is `(page, per_page)` and is omitted for
    /// full, unpaginated fetches.
    pub async fn fetch_records(
        &self,
        module: CrmModule,
        page: Option<(usize, usize)>,
    ) -> Result<RecordSet, DashboardError> {
        let query = match page {
            Some((page, per_page)) => {
                vec![("page", page.to_string()), ("per", per_page.to_string())]
            }
            None => Vec::new(),
        };
        let body = self.get_json(&format!("/{}", module.endpoint()), &query).await?;
        Ok(normalize_records(body))
    }

    pub async fn export_csv(&self, module: CrmModule) -> Result<Vec<u8>, DashboardError> {
        self.get_bytes(&format!("/export/{}", module.name())).await
    }

    /// Every module in one CSV, rendered by the backend.
    pub async fn export_all_csv(&self) -> Result<Vec<u8>, DashboardError> {
        self.get_bytes("/export/all").await
    }

    pub async fn sync_logs(&self) -> Result<Vec<BackendSyncLog>, DashboardError> {
        let body = self.get_json("/sync_logs", &[]).await?;
        serde_json::from_value(body).map_err(|err| DashboardError::Decode(err.to_string()))
    }

    pub async fn stats(&self) -> Result<BTreeMap<String, u64>, DashboardError> {
        let body = self.get_json("/stats", &[]).await?;
        let Value::Object(map) = body else {
            return Err(DashboardError::Decode("stats response is not an object".into()));
        };
        Ok(map
            .into_iter()
            .map(|(name, count)| (name, count_value(&count)))
            .collect())
    }

    pub async fn health(&self) -> Result<Value, DashboardError> {
        self.get_json("/health", &[]).await
    }

    pub async fn status(&self) -> Result<Value, DashboardError> {
        self.get_json("/status", &[]).await
    }

    pub async fn overview(&self) -> Result<Value, DashboardError> {
        self.get_json("/overview", &[]).await
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, DashboardError> {
        debug!(%path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let response = ensure_success(response).await?;
        response.json::<Value>().await.map_err(|err| self.transport_error(err))
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, DashboardError> {
        debug!(%path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(|err| self.transport_error(err))?;
        Ok(bytes.to_vec())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> DashboardError {
        DashboardError::from_reqwest(err, self.timeout_secs)
    }
}

async fn ensure_success(response: Response) -> Result<Response, DashboardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DashboardError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body,
    })
}

/// Accepts `{"modules": [...]}` or a bare array. Entries without a name are
/// skipped and repeated names keep their first occurrence.
pub fn normalize_modules(body: Value) -> Vec<ModuleSummary> {
    let list = match body {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("modules") {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut modules: Vec<ModuleSummary> = Vec::with_capacity(list.len());
    for entry in list {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        if modules.iter().any(|module| module.name == name) {
            continue;
        }
        let record_count = entry.get("records").map(count_value).unwrap_or(0);
        modules.push(ModuleSummary {
            name: name.to_string(),
            record_count,
        });
    }
    modules
}

/// Accepts a bare array or an object whose records live under the first
/// present key of [`RECORD_KEYS`]; `total` is read when it is a count.
pub fn normalize_records(body: Value) -> RecordSet {
    match body {
        Value::Array(items) => RecordSet { items, total: None },
        Value::Object(mut map) => {
            let total = map.get("total").and_then(Value::as_u64);
            let items = RECORD_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .unwrap_or_default();
            RecordSet { items, total }
        }
        _ => RecordSet::default(),
    }
}

fn count_value(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n > 0.0).map(|n| n as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
