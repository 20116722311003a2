use crate::anchor::WeeklyAnchor;
use crate::errors::ConfigError;
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use std::{env, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// What happens after a failed sync. Only `None` exists today: a failure is
/// logged and the next anchor is waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    #[default]
    None,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub anchor: WeeklyAnchor,
    pub request_timeout: Duration,
    pub auto_sync_enabled: bool,
    pub retry_policy: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            anchor: WeeklyAnchor::new(DEFAULT_TIMEZONE, Weekday::Sat, default_anchor_time()),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auto_sync_enabled: true,
            retry_policy: RetryPolicy::None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from a variable lookup; unset or blank variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Config::default();

        if let Some(value) = get("PORT") {
            config.port = value
                .parse::<u16>()
                .map_err(|err| ConfigError::invalid("PORT", &value, err.to_string()))?;
        }

        if let Some(value) = get("SYNC_API_BASE_URL") {
            config.api_base_url = parse_base_url(&value)?;
        }

        let timezone = match get("SYNC_ANCHOR_TIMEZONE") {
            Some(value) => value
                .parse::<Tz>()
                .map_err(|err| {
                    ConfigError::invalid("SYNC_ANCHOR_TIMEZONE", &value, err.to_string())
                })?,
            None => config.anchor.timezone,
        };
        let weekday = match get("SYNC_ANCHOR_WEEKDAY") {
            Some(value) => value.parse::<Weekday>().map_err(|_| {
                ConfigError::invalid("SYNC_ANCHOR_WEEKDAY", &value, "expected a weekday name")
            })?,
            None => config.anchor.weekday,
        };
        let time = match get("SYNC_ANCHOR_TIME") {
            Some(value) => NaiveTime::parse_from_str(&value, "%H:%M")
                .map_err(|err| ConfigError::invalid("SYNC_ANCHOR_TIME", &value, err.to_string()))?,
            None => config.anchor.time,
        };
        config.anchor = WeeklyAnchor::new(timezone, weekday, time);

        if let Some(value) = get("SYNC_REQUEST_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|err| {
                ConfigError::invalid("SYNC_REQUEST_TIMEOUT_SECS", &value, err.to_string())
            })?;
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "SYNC_REQUEST_TIMEOUT_SECS",
                    &value,
                    "must be at least 1",
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = get("SYNC_AUTO_ENABLED") {
            config.auto_sync_enabled = parse_flag(&value).ok_or_else(|| {
                ConfigError::invalid("SYNC_AUTO_ENABLED", &value, "expected true or false")
            })?;
        }

        Ok(config)
    }
}

fn default_anchor_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn parse_base_url(value: &str) -> Result<String, ConfigError> {
    let url = reqwest::Url::parse(value)
        .map_err(|err| ConfigError::invalid("SYNC_API_BASE_URL", value, err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "SYNC_API_BASE_URL",
            value,
            "scheme must be http or https",
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
