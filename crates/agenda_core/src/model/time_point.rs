//! Calendar date plus time-of-day value.
//!
//! # Responsibility
//! - Parse the fixed `dd-MM-yyyy` / `HH-mm` text forms strictly.
//! - Provide minute arithmetic with day/month/year rollover.
//!
//! # Invariants
//! - A `TimePoint` always denotes a real calendar day and a time below 24:00.
//! - Ordering is lexicographic on `(date, time)`.
//! - Values are immutable; arithmetic returns a new value.

use crate::model::field::{parse_date, parse_time, FieldKind, ValidationError};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DATE_FORMAT: &str = "%d-%m-%Y";
const TIME_FORMAT: &str = "%H-%M";

/// Immutable calendar date + time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimePoint(NaiveDateTime);

impl TimePoint {
    /// Parses a `dd-MM-yyyy` date and a `HH-mm` time.
    ///
    /// # Errors
    /// - [`FieldKind::Date`] when the date text is malformed or names a day
    ///   that does not exist (e.g. `30-02-2024`).
    /// - [`FieldKind::Time`] when the time text is malformed or out of range.
    pub fn parse(date: &str, time: &str) -> Result<Self, ValidationError> {
        let day = parse_date(date).ok_or_else(|| ValidationError::new(FieldKind::Date, date))?;
        let clock = parse_time(time).ok_or_else(|| ValidationError::new(FieldKind::Time, time))?;
        Ok(Self::from_parts(day, clock))
    }

    pub fn from_parts(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    /// Returns a new value `minutes` later, rolling over hour, day, month and
    /// year boundaries as needed.
    ///
    /// Saturates at the latest representable instant instead of wrapping.
    pub fn plus_minutes(self, minutes: u32) -> Self {
        self.0
            .checked_add_signed(Duration::minutes(i64::from(minutes)))
            .map(Self)
            .unwrap_or(Self(NaiveDateTime::MAX))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// Canonical `dd-MM-yyyy` rendering of the date part.
    pub fn date_text(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }

    /// Canonical `HH-mm` rendering of the time part.
    pub fn time_text(&self) -> String {
        self.0.format(TIME_FORMAT).to_string()
    }
}

impl Display for TimePoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date_text(), self.time_text())
    }
}

impl FromStr for TimePoint {
    type Err = ValidationError;

    /// Parses the combined `dd-MM-yyyy HH-mm` form; any run of whitespace
    /// separates the two parts.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (date, time) = split_date_time(value);
        Self::parse(date, time)
    }
}

impl TryFrom<String> for TimePoint {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimePoint> for String {
    fn from(value: TimePoint) -> Self {
        value.to_string()
    }
}

/// Splits a combined `date time` selector on its first whitespace run.
///
/// Text without whitespace is returned as the date with an empty time, so the
/// time part then fails its own rule instead of being guessed.
pub fn split_date_time(value: &str) -> (&str, &str) {
    let trimmed = value.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((date, rest)) => (date, rest.trim_start()),
        None => (trimmed, ""),
    }
}
