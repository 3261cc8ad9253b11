use crate::date::{day_key_from_millis, DayKey};
use crate::error::QuestError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

pub type Instant = DateTime<Utc>;

pub fn parse_instant(ts: &str, label: &str) -> Result<Instant, QuestError> {
    let t = ts.trim();
    if t.is_empty() {
        return Err(QuestError::InvalidInstant(format!("{}: (empty)", label)));
    }
    DateTime::parse_from_rfc3339(t)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| QuestError::InvalidInstant(format!("{}: {}", label, ts)))
}

pub fn instant_from_millis(epoch_millis: i64) -> Result<Instant, QuestError> {
    DateTime::<Utc>::from_timestamp_millis(epoch_millis)
        .ok_or_else(|| QuestError::InvalidTimestamp(epoch_millis.to_string()))
}

pub fn format_instant(at: &Instant) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn day_key_of(at: &Instant) -> DayKey {
    day_key_from_millis(at.timestamp_millis())
}

pub fn hours(n: u32) -> Duration {
    Duration::hours(n as i64)
}

pub fn days(n: u32) -> Duration {
    Duration::days(n as i64)
}
