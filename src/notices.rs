use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How long a sync toast stays up when nobody dismisses it.
pub const TOAST_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// The error banner stays until dismissed or replaced; the toast expires on its own.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    banner: Option<Notice>,
    toast: Option<Toast>,
}

impl Notices {
    pub fn raise_error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.banner = Some(Notice {
            message: message.into(),
            raised_at: now,
        });
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn banner(&self) -> Option<&Notice> {
        self.banner.as_ref()
    }

    pub fn show_toast(&mut self, kind: ToastKind, message: impl Into<String>, now: DateTime<Utc>) {
        self.toast = Some(Toast {
            kind,
            message: message.into(),
            raised_at: now,
        });
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    /// The toast if it is still within its display window, dropping it otherwise.
    pub fn toast(&mut self, now: DateTime<Utc>) -> Option<Toast> {
        let expired = self
            .toast
            .as_ref()
            .is_some_and(|toast| now - toast.raised_at >= Duration::seconds(TOAST_TTL_SECS));
        if expired {
            self.toast = None;
        }
        self.toast.clone()
    }
}
