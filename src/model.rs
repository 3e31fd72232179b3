use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes since midnight. The only clock-time unit.
pub type Minutes = u32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time: {0:?} (expected HH:MM)")]
pub struct MalformedTime(pub String);

/// Parse `HH:MM` into minutes since midnight.
///
/// Only the shape is checked: two runs of ASCII digits around a single colon.
/// Hours and minutes are not range-checked, so `25:00` is 1500 and `7:5` is 425.
pub fn to_minutes(time: &str) -> Result<Minutes, MalformedTime> {
    let malformed = || MalformedTime(time.to_string());
    let (hours, minutes) = time.split_once(':').ok_or_else(malformed)?;
    let field = |s: &str| -> Option<Minutes> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    let h = field(hours).ok_or_else(malformed)?;
    let m = field(minutes).ok_or_else(malformed)?;
    h.checked_mul(60)
        .and_then(|h| h.checked_add(m))
        .ok_or_else(malformed)
}

/// True iff `[start_a, start_a + dur_a)` and `[start_b, start_b + dur_b)` share an instant.
///
/// Durations must be positive; callers reject zero durations before getting here.
pub fn intervals_overlap(start_a: ClockTime, dur_a: Minutes, start_b: ClockTime, dur_b: Minutes) -> bool {
    Span::of(start_a, dur_a).overlaps(&Span::of(start_b, dur_b))
}

/// A start-of-booking clock time, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(Minutes);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub const fn from_minutes(minutes: Minutes) -> Self {
        Self(minutes)
    }

    pub const fn hm(hours: u32, minutes: u32) -> Self {
        Self(hours * 60 + minutes)
    }

    pub fn minutes(self) -> Minutes {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = MalformedTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_minutes(s).map(ClockTime)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = MalformedTime;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Half-open minute interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn of(start: ClockTime, duration: Minutes) -> Self {
        Self {
            start: start.minutes(),
            end: start.minutes().saturating_add(duration),
        }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// A reserved interval on the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub duration: Minutes,
    pub price: f64,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn span(&self) -> Span {
        Span::of(self.time, self.duration)
    }

    /// Local wall-clock instant the booking starts at. `00:00` is the start of `date`.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::minutes(i64::from(self.time.minutes())))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Incoming booking request as decoded by the service layer. Absent string fields
/// decode as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: i64,
    /// Explicit price. Present means used, including `0`.
    #[serde(default)]
    pub price: Option<f64>,
}

/// One row of the day view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub time: ClockTime,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
    pub bookings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub rows: Vec<DailyRevenue>,
    pub total: f64,
}

/// Store mutations, flat with no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    Inserted(Booking),
    Deleted { id: Ulid },
    Cleared,
    PurgedBefore { date: NaiveDate },
}
