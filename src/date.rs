use crate::error::QuestError;
use std::fmt;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// UTC calendar day, `YYYY-MM-DD`. Ordering is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey {
    y: i32,
    m: u32,
    d: u32,
}

fn is_valid_date(y: i32, m: u32, d: u32) -> bool {
    if !(1..=12).contains(&m) || d < 1 {
        return false;
    }

    let dim = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            let leap = (y % 4 == 0 && y % 100 != 0) || (y % 400 == 0);
            if leap { 29 } else { 28 }
        }
    };

    d <= dim
}

// Howard Hinnant's algorithm: days since 1970-01-01 (Unix epoch)
fn days_from_civil(y: i32, m: u32, d: u32) -> i64 {
    let y = y as i64 - if m <= 2 { 1 } else { 0 };
    let m = m as i64;
    let d = d as i64;
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = m + if m > 2 { -3 } else { 9 };
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

fn civil_from_days(z: i64) -> DayKey {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = doy - (153 * mp + 2) / 5 + 1; // [1, 31]
    let m = mp + if mp < 10 { 3 } else { -9 }; // [1, 12]
    let y = yoe + era * 400 + if m <= 2 { 1 } else { 0 };

    DayKey {
        y: y as i32,
        m: m as u32,
        d: d as u32,
    }
}

impl DayKey {
    pub fn parse(s: &str) -> Result<DayKey, QuestError> {
        let ss = s.trim();
        let invalid = || QuestError::InvalidDayKey(s.to_string());

        let bytes = ss.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(invalid());
        }
        if !ss
            .chars()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let y: i32 = ss[0..4].parse().map_err(|_| invalid())?;
        let m: u32 = ss[5..7].parse().map_err(|_| invalid())?;
        let d: u32 = ss[8..10].parse().map_err(|_| invalid())?;

        if !is_valid_date(y, m, d) {
            return Err(invalid());
        }
        Ok(DayKey { y, m, d })
    }

    /// Days since the Unix epoch.
    pub fn epoch_day(&self) -> i64 {
        days_from_civil(self.y, self.m, self.d)
    }

    pub fn add_days(&self, delta: i32) -> DayKey {
        civil_from_days(self.epoch_day() + delta as i64)
    }

    /// Signed distance in calendar days from `self` to `other`.
    pub fn days_until(&self, other: &DayKey) -> i64 {
        other.epoch_day() - self.epoch_day()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.y, self.m, self.d)
    }
}

impl TryFrom<String> for DayKey {
    type Error = QuestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DayKey::parse(&s)
    }
}

impl From<DayKey> for String {
    fn from(k: DayKey) -> String {
        k.to_string()
    }
}

/// 0000-01-01T00:00:00Z
const MIN_KEY_MILLIS: i64 = -62_167_219_200_000;
/// 9999-12-31T23:59:59.999Z
const MAX_KEY_MILLIS: i64 = 253_402_300_799_999;

/// Maps epoch milliseconds to the UTC calendar day containing them.
///
/// Local time zones never enter the calculation, so the key is the same on
/// every host. Non-finite input is rejected rather than clamped, and so is
/// anything outside years 0000 to 9999, which `YYYY-MM-DD` cannot carry.
pub fn day_key(epoch_millis: f64) -> Result<DayKey, QuestError> {
    if !epoch_millis.is_finite() {
        return Err(QuestError::InvalidTimestamp(epoch_millis.to_string()));
    }
    let ms = epoch_millis.floor();
    if ms < MIN_KEY_MILLIS as f64 || ms > MAX_KEY_MILLIS as f64 {
        return Err(QuestError::InvalidTimestamp(epoch_millis.to_string()));
    }
    Ok(day_key_from_millis(ms as i64))
}

pub fn day_key_from_millis(epoch_millis: i64) -> DayKey {
    civil_from_days(epoch_millis.div_euclid(MILLIS_PER_DAY))
}
