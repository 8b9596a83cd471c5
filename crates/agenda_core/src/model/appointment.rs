//! Appointment value model.
//!
//! # Responsibility
//! - Build appointments only from raw fields that pass the field rule table.
//! - Expose the overlap (compatibility) predicate and search predicates.
//! - Render the canonical one-line record form.
//!
//! # Invariants
//! - `end == start + duration` minutes.
//! - `duration` is the raw digits with leading zeros stripped, 1..=9999.
//! - Appointments are immutable; amending produces a new value.
//! - Deserialization re-runs validation, so no invalid value can be decoded.

use crate::model::field::{validate_all, FieldKind, ValidationError};
use crate::model::time_point::TimePoint;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The five raw inputs of an appointment, exactly as a caller typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFields {
    pub date: String,
    pub time: String,
    pub duration: String,
    pub place: String,
    pub person: String,
}

impl AppointmentFields {
    fn get(&self, field: FieldKind) -> &str {
        match field {
            FieldKind::Date => &self.date,
            FieldKind::Time => &self.time,
            FieldKind::Duration => &self.duration,
            FieldKind::Place => &self.place,
            FieldKind::Person => &self.person,
        }
    }

    fn set(&mut self, field: FieldKind, value: &str) {
        let slot = match field {
            FieldKind::Date => &mut self.date,
            FieldKind::Time => &mut self.time,
            FieldKind::Duration => &mut self.duration,
            FieldKind::Place => &mut self.place,
            FieldKind::Person => &mut self.person,
        };
        *slot = value.to_string();
    }
}

/// A validated, time-bound appointment with a place and a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentFields", into = "AppointmentFields")]
pub struct Appointment {
    start: TimePoint,
    end: TimePoint,
    duration: String,
    place: String,
    person: String,
}

impl Appointment {
    /// Validates the five raw fields and builds the appointment.
    ///
    /// # Errors
    /// - Returns the first failing field in `date, time, duration, place,
    ///   person` order; no value is produced.
    pub fn new(
        date: &str,
        time: &str,
        duration: &str,
        place: &str,
        person: &str,
    ) -> Result<Self, ValidationError> {
        validate_all(date, time, duration, place, person)?;

        let start = TimePoint::parse(date, time)?;
        let duration = duration.trim_start_matches('0').to_string();
        let minutes = duration
            .parse::<u32>()
            .map_err(|_| ValidationError::new(FieldKind::Duration, duration.as_str()))?;

        Ok(Self {
            start,
            end: start.plus_minutes(minutes),
            duration,
            place: place.to_string(),
            person: person.to_string(),
        })
    }

    /// Builds an appointment from a raw field bundle.
    pub fn from_fields(fields: &AppointmentFields) -> Result<Self, ValidationError> {
        Self::new(
            &fields.date,
            &fields.time,
            &fields.duration,
            &fields.place,
            &fields.person,
        )
    }

    /// Returns the raw field bundle this appointment round-trips through.
    pub fn to_fields(&self) -> AppointmentFields {
        AppointmentFields {
            date: self.date(),
            time: self.time(),
            duration: self.duration.clone(),
            place: self.place.clone(),
            person: self.person.clone(),
        }
    }

    /// Rebuilds this appointment with exactly one field replaced.
    ///
    /// The candidate goes through full validation again; `self` is untouched.
    pub fn with_field(&self, field: FieldKind, value: &str) -> Result<Self, ValidationError> {
        let mut fields = self.to_fields();
        fields.set(field, value);
        Self::from_fields(&fields)
    }

    /// Raw text currently stored for `field`.
    pub fn field_text(&self, field: FieldKind) -> String {
        self.to_fields().get(field).to_string()
    }

    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    pub fn date(&self) -> String {
        self.start.date_text()
    }

    pub fn time(&self) -> String {
        self.start.time_text()
    }

    /// Duration digits without leading zeros.
    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn duration_minutes(&self) -> u32 {
        // Digits were validated at construction.
        self.duration.parse().unwrap_or_default()
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn person(&self) -> &str {
        &self.person
    }

    /// Whether this appointment ends at or before `other` starts.
    pub fn is_before(&self, other: &Appointment) -> bool {
        self.end <= other.start
    }

    /// Whether this appointment starts at or after `other` ends.
    pub fn is_after(&self, other: &Appointment) -> bool {
        self.start >= other.end
    }

    /// Two appointments are compatible when they do not partially overlap.
    /// Touching endpoints are compatible.
    pub fn is_compatible(&self, other: &Appointment) -> bool {
        self.is_before(other) || self.is_after(other)
    }

    /// Case-insensitive full-name match.
    pub fn matches_person(&self, query: &str) -> bool {
        self.person.to_lowercase() == query.to_lowercase()
    }

    /// Exact match on the canonical `dd-MM-yyyy` start date.
    pub fn matches_date(&self, date: &str) -> bool {
        self.date() == date
    }

    /// Exact match on the canonical start date and `HH-mm` start time.
    pub fn matches_date_time(&self, date: &str, time: &str) -> bool {
        self.matches_date(date) && self.time() == time
    }

    /// Canonical record line, newline-terminated:
    /// `dd-MM-yyyy|HH-mm|<minutes>min|<place>|<person>`.
    pub fn to_record(&self) -> String {
        format!("{self}\n")
    }
}

impl Display for Appointment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}min|{}|{}",
            self.date(),
            self.time(),
            self.duration,
            self.place,
            self.person
        )
    }
}

impl TryFrom<AppointmentFields> for Appointment {
    type Error = ValidationError;

    fn try_from(value: AppointmentFields) -> Result<Self, Self::Error> {
        Self::from_fields(&value)
    }
}

impl From<Appointment> for AppointmentFields {
    fn from(value: Appointment) -> Self {
        value.to_fields()
    }
}
