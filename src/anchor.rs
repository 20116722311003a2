//! Weekly anchor arithmetic: when does "Saturday 10:00 in Asia/Kolkata" next happen?

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;

/// Longest DST gap searched when the anchor lands on a skipped local time.
const MAX_GAP_MINUTES: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyAnchor {
    pub timezone: Tz,
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl WeeklyAnchor {
    /// Seconds and sub-seconds of `time` are dropped.
    pub fn new(timezone: Tz, weekday: Weekday, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self {
            timezone,
            weekday,
            time,
        }
    }

    /// Next instant at or after `now` whose local weekday and time match the anchor.
    ///
    /// Being exactly on the anchor counts as already passed, so the result is
    /// always strictly later than `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.timezone);
        let today = local.weekday().num_days_from_sunday();
        let target = self.weekday.num_days_from_sunday();

        let mut days_to_add = (target + 7 - today) % 7;
        if days_to_add == 0 && local.time() >= self.time {
            days_to_add = 7;
        }

        let date = local.date_naive() + Duration::days(i64::from(days_to_add));
        self.resolve(date.and_time(self.time))
    }

    fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, second) => first.min(second).with_timezone(&Utc),
            LocalResult::None => {
                // skipped by a DST jump: take the first local minute that exists
                for minutes in 1..=MAX_GAP_MINUTES {
                    let shifted = naive + Duration::minutes(minutes);
                    match self.timezone.from_local_datetime(&shifted) {
                        LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                        LocalResult::Ambiguous(first, second) => {
                            return first.min(second).with_timezone(&Utc);
                        }
                        LocalResult::None => continue,
                    }
                }
                Utc.from_utc_datetime(&naive)
            }
        }
    }

    pub fn describe_weekday(&self) -> String {
        weekday_name(self.weekday).to_string()
    }

    pub fn describe_time(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Whole seconds from `now` until `target`, floored and clamped at zero.
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (target - now).num_seconds().max(0) as u64
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
