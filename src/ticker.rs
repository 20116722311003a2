//! Countdown to the weekly anchor and the 1-second task that drives it.

use crate::anchor::{WeeklyAnchor, seconds_until};
use crate::models::{CountdownState, SyncTrigger};
use crate::state::AppState;
use crate::sync::trigger_sync;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Waiting(u64),
    /// The anchor was reached; the countdown already points at the next one.
    Due,
}

/// Remaining time is always recomputed from the clock against a fixed anchor,
/// never decremented, so a late or skipped tick cannot drift the countdown.
#[derive(Debug, Clone)]
pub struct Countdown {
    anchor: WeeklyAnchor,
    next_anchor: DateTime<Utc>,
}

impl Countdown {
    pub fn start(anchor: WeeklyAnchor, now: DateTime<Utc>) -> Self {
        Self {
            next_anchor: anchor.next_after(now),
            anchor,
        }
    }

    pub fn next_anchor(&self) -> DateTime<Utc> {
        self.next_anchor
    }

    pub fn state(&self, now: DateTime<Utc>) -> CountdownState {
        CountdownState {
            next_anchor: self.next_anchor,
            remaining_seconds: seconds_until(self.next_anchor, now),
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        match seconds_until(self.next_anchor, now) {
            0 => {
                // re-arm from the anchor just reached so it cannot fire twice
                let from = self.next_anchor.max(now);
                self.next_anchor = self.anchor.next_after(from);
                Tick::Due
            }
            remaining => Tick::Waiting(remaining),
        }
    }
}

/// Arms the countdown for `state` and starts its task. The task stops once the
/// session is torn down.
pub async fn spawn_ticker(state: AppState) -> JoinHandle<()> {
    let countdown = Countdown::start(state.config.anchor, state.now());
    *state.next_anchor.write().await = Some(countdown.next_anchor());
    info!(next_anchor = %countdown.next_anchor(), "countdown started");
    tokio::spawn(run_ticker(state, countdown))
}

async fn run_ticker(state: AppState, mut countdown: Countdown) {
    let shutdown = state.shutdown_token();
    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        match countdown.tick(state.now()) {
            Tick::Waiting(remaining) => debug!(remaining, "tick"),
            Tick::Due => {
                if state.auto_sync_enabled() {
                    info!("automatic sync due");
                    let sync_state = state.clone();
                    tokio::spawn(async move {
                        trigger_sync(&sync_state, SyncTrigger::Automatic).await;
                    });
                } else {
                    info!("automatic sync paused; skipping this anchor");
                }
                *state.next_anchor.write().await = Some(countdown.next_anchor());
                info!(next_anchor = %countdown.next_anchor(), "countdown re-armed");
            }
        }
    }

    info!("countdown stopped");
}
