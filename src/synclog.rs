use crate::models::{SyncLogEntry, SyncMetrics, SyncOutcome};
use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 20;

/// Most recent sync attempts, newest first.
#[derive(Debug, Clone, Default)]
pub struct SyncLog {
    entries: VecDeque<SyncLogEntry>,
}

impl SyncLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY + 1),
        }
    }

    pub fn append(&mut self, entry: SyncLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(LOG_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SyncLogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<SyncLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn metrics(&self) -> SyncMetrics {
        build_metrics(self.entries.iter())
    }
}

fn build_metrics<'a>(entries: impl Iterator<Item = &'a SyncLogEntry> + Clone) -> SyncMetrics {
    let timed: Vec<f64> = entries
        .clone()
        .filter(|entry| entry.is_success() && entry.duration_seconds > 0.0)
        .map(|entry| entry.duration_seconds)
        .collect();
    let avg_duration_seconds = if timed.is_empty() {
        None
    } else {
        Some(timed.iter().sum::<f64>() / timed.len() as f64)
    };

    let last_success = entries
        .clone()
        .find(|entry| entry.is_success())
        .map(|entry| entry.timestamp);

    let (total, failures) = entries.fold((0usize, 0usize), |(total, failures), entry| {
        let failed = usize::from(entry.outcome == SyncOutcome::Failure);
        (total + 1, failures + failed)
    });
    let error_rate_percent = if total == 0 {
        0.0
    } else {
        round_one_decimal(100.0 * failures as f64 / total as f64)
    };

    SyncMetrics {
        avg_duration_seconds,
        last_success,
        error_rate_percent,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
