//! Agenda: a named, sorted, overlap-free collection of appointments.
//!
//! # Responsibility
//! - Keep appointments sorted by start on every mutation.
//! - Refuse any mutation that would make two appointments overlap.
//! - Track the persisted/dirty flag and a structural generation counter.
//!
//! # Invariants
//! - `appointments` is sorted ascending by start.
//! - Every pair of appointments is mutually compatible.
//! - `persisted` is cleared by every structural change and by rename.
//! - `generation` is bumped by every structural change; detached cursors
//!   compare against it before each step.
//! - Every agenda value (clones included) carries its own instance id, so a
//!   cursor only ever walks the agenda it was opened on.

use crate::model::appointment::Appointment;
use crate::model::field::{FieldKind, ValidationError};
use crate::model::time_point::split_date_time;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Label used when an agenda is created or renamed with an empty name.
pub const DEFAULT_AGENDA_NAME: &str = "Agenda";

/// An appointment was refused because it overlaps one already scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The refused appointment, handed back to the caller.
    pub rejected: Appointment,
    /// The scheduled appointment it overlaps.
    pub existing: Appointment,
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "appointment at {} overlaps the one at {}",
            self.rejected.start(),
            self.existing.start()
        )
    }
}

impl Error for Conflict {}

/// Failure of [`Agenda::add_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddError {
    Invalid(ValidationError),
    Conflict(Conflict),
}

impl Display for AddError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AddError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Conflict(err) => Some(err),
        }
    }
}

impl From<ValidationError> for AddError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<Conflict> for AddError {
    fn from(value: Conflict) -> Self {
        Self::Conflict(value)
    }
}

/// Result of [`Agenda::amend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmendOutcome {
    /// Replacement committed.
    Amended,
    /// No appointment starts at the given date and time.
    NotFound,
    /// The amended appointment would overlap another one.
    Incompatible,
    /// The new value failed its field rule.
    InvalidValue(ValidationError),
    /// The field label is not one of the five known fields.
    UnknownField(String),
}

impl AmendOutcome {
    pub fn is_amended(&self) -> bool {
        matches!(self, Self::Amended)
    }
}

/// The agenda changed structurally while a cursor was walking it.
///
/// Indicates a caller bug; the cursor cannot be resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentModification {
    pub expected_generation: u64,
    pub found_generation: u64,
}

impl Display for ConcurrentModification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "agenda modified during iteration (generation {} -> {})",
            self.expected_generation, self.found_generation
        )
    }
}

impl Error for ConcurrentModification {}

/// Failure of one [`Cursor::next`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    Modified(ConcurrentModification),
    /// The cursor was handed an agenda other than the one it was opened on.
    ForeignAgenda,
}

impl Display for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modified(err) => write!(f, "{err}"),
            Self::ForeignAgenda => f.write_str("cursor used with a different agenda"),
        }
    }
}

impl Error for CursorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Modified(err) => Some(err),
            Self::ForeignAgenda => None,
        }
    }
}

impl From<ConcurrentModification> for CursorError {
    fn from(value: ConcurrentModification) -> Self {
        Self::Modified(value)
    }
}

/// Named, always-sorted, overlap-free appointment collection.
#[derive(Debug)]
pub struct Agenda {
    instance: Uuid,
    name: String,
    appointments: Vec<Appointment>,
    persisted: bool,
    generation: u64,
}

impl Clone for Agenda {
    fn clone(&self) -> Self {
        Self {
            instance: Uuid::new_v4(),
            name: self.name.clone(),
            appointments: self.appointments.clone(),
            persisted: self.persisted,
            generation: self.generation,
        }
    }
}

impl Default for Agenda {
    fn default() -> Self {
        Self::new(DEFAULT_AGENDA_NAME)
    }
}

impl PartialEq for Agenda {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.appointments == other.appointments
    }
}

impl Eq for Agenda {}

impl Agenda {
    /// Creates an empty, not-yet-persisted agenda.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            instance: Uuid::new_v4(),
            name: normalize_name(name.into()),
            appointments: Vec::new(),
            persisted: false,
            generation: 0,
        }
    }

    /// Creates an agenda from a candidate list.
    ///
    /// The list is taken (sorted) only when it is internally consistent;
    /// if any two candidates overlap the agenda starts empty. No attempt is
    /// made to keep a compatible subset.
    pub fn with_appointments(name: impl Into<String>, candidates: Vec<Appointment>) -> Self {
        let mut agenda = Self::new(name);
        if Self::is_consistent(&candidates) {
            agenda.appointments = candidates;
            agenda.appointments.sort_by_key(Appointment::start);
        } else {
            debug!(
                "event=agenda_build module=agenda status=discarded name={} candidates={}",
                agenda.name,
                candidates.len()
            );
        }
        agenda
    }

    /// Whether no two appointments of `candidates` overlap.
    pub fn is_consistent(candidates: &[Appointment]) -> bool {
        let mut sorted: Vec<&Appointment> = candidates.iter().collect();
        sorted.sort_by_key(|appointment| appointment.start());
        sorted.windows(2).all(|pair| pair[0].is_before(pair[1]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the agenda; an empty name resets to [`DEFAULT_AGENDA_NAME`].
    /// Always marks the agenda dirty.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = normalize_name(name.into());
        self.persisted = false;
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// Appointments in ascending start order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Appointment> {
        self.appointments.iter()
    }

    /// Whether the in-memory state matches the last saved/loaded snapshot.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Structural generation; changes on every add/remove/amend.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `candidate` overlaps none of the scheduled appointments.
    pub fn is_compatible(&self, candidate: &Appointment) -> bool {
        self.appointments
            .iter()
            .all(|existing| existing.is_compatible(candidate))
    }

    /// Schedules `appointment`, keeping start order.
    ///
    /// # Errors
    /// - Returns [`Conflict`] (with the appointment handed back) when it
    ///   overlaps any scheduled appointment; the agenda is unchanged.
    pub fn add(&mut self, appointment: Appointment) -> Result<(), Conflict> {
        if let Some(existing) = self
            .appointments
            .iter()
            .find(|existing| !existing.is_compatible(&appointment))
        {
            debug!(
                "event=appointment_add module=agenda status=conflict name={}",
                self.name
            );
            return Err(Conflict {
                existing: existing.clone(),
                rejected: appointment,
            });
        }

        self.insert_sorted(appointment);
        self.touch();
        Ok(())
    }

    /// Validates the raw fields and schedules the resulting appointment.
    pub fn add_fields(
        &mut self,
        date: &str,
        time: &str,
        duration: &str,
        place: &str,
        person: &str,
    ) -> Result<(), AddError> {
        let appointment = Appointment::new(date, time, duration, place, person)?;
        self.add(appointment)?;
        Ok(())
    }

    pub fn search_by_person(&self, person: &str) -> Vec<&Appointment> {
        self.search(|appointment| appointment.matches_person(person))
    }

    pub fn search_by_date(&self, date: &str) -> Vec<&Appointment> {
        self.search(|appointment| appointment.matches_date(date))
    }

    pub fn search_by_date_time(&self, date: &str, time: &str) -> Vec<&Appointment> {
        self.search(|appointment| appointment.matches_date_time(date, time))
    }

    /// Like [`Agenda::search_by_date_time`], for a combined `date time`
    /// selector split on its first whitespace run.
    pub fn search_by_date_time_text(&self, selector: &str) -> Vec<&Appointment> {
        let (date, time) = split_date_time(selector);
        self.search_by_date_time(date, time)
    }

    pub fn contains(&self, appointment: &Appointment) -> bool {
        self.appointments.contains(appointment)
    }

    /// Whether an appointment starts exactly at `date` `time`.
    pub fn contains_at(&self, date: &str, time: &str) -> bool {
        self.find_at(date, time).is_some()
    }

    /// Whether an appointment starts at the combined `date time` selector.
    pub fn contains_at_text(&self, selector: &str) -> bool {
        let (date, time) = split_date_time(selector);
        self.contains_at(date, time)
    }

    /// Removes every appointment with this person. Returns whether any was removed.
    pub fn remove_by_person(&mut self, person: &str) -> bool {
        self.remove_where(|appointment| appointment.matches_person(person))
    }

    /// Removes every appointment on this date. Returns whether any was removed.
    pub fn remove_by_date(&mut self, date: &str) -> bool {
        self.remove_where(|appointment| appointment.matches_date(date))
    }

    /// Removes the appointment starting at `date` `time`, if any.
    pub fn remove_by_date_time(&mut self, date: &str, time: &str) -> bool {
        self.remove_where(|appointment| appointment.matches_date_time(date, time))
    }

    /// Removes the appointment starting at the combined `date time` selector.
    pub fn remove_by_date_time_text(&mut self, selector: &str) -> bool {
        let (date, time) = split_date_time(selector);
        self.remove_by_date_time(date, time)
    }

    /// Clears the agenda. Returns whether anything was removed.
    pub fn remove_all(&mut self) -> bool {
        self.remove_where(|_| true)
    }

    /// Replaces one field of the appointment starting at `date` `time`.
    ///
    /// The candidate is fully re-validated and checked against every other
    /// appointment; on any outcome other than [`AmendOutcome::Amended`] the
    /// agenda, its dirty flag and its generation are untouched.
    pub fn amend(&mut self, date: &str, time: &str, field: &str, new_value: &str) -> AmendOutcome {
        let Some(index) = self.find_at(date, time) else {
            return AmendOutcome::NotFound;
        };
        let Some(kind) = FieldKind::from_label(field) else {
            return AmendOutcome::UnknownField(field.trim().to_string());
        };

        let candidate = match self.appointments[index].with_field(kind, new_value) {
            Ok(candidate) => candidate,
            Err(err) => return AmendOutcome::InvalidValue(err),
        };

        let fits = self
            .appointments
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .all(|(_, other)| other.is_compatible(&candidate));
        if !fits {
            debug!(
                "event=appointment_amend module=agenda status=conflict name={} field={}",
                self.name, kind
            );
            return AmendOutcome::Incompatible;
        }

        self.appointments.remove(index);
        self.insert_sorted(candidate);
        self.touch();
        debug!(
            "event=appointment_amend module=agenda status=ok name={} field={}",
            self.name, kind
        );
        AmendOutcome::Amended
    }

    /// [`Agenda::amend`] addressed by a combined `date time` selector.
    pub fn amend_at(&mut self, selector: &str, field: &str, new_value: &str) -> AmendOutcome {
        let (date, time) = split_date_time(selector);
        self.amend(date, time, field, new_value)
    }

    /// Opens a detached, generation-guarded cursor over the appointments.
    ///
    /// Unlike [`Agenda::iter`], the cursor does not borrow the agenda between
    /// steps, so the caller may mutate it; the next step then fails with
    /// [`CursorError::Modified`].
    pub fn cursor(&self) -> Cursor {
        Cursor {
            agenda: self.instance,
            generation: self.generation,
            index: 0,
            exhausted: false,
        }
    }

    /// Record lines of every appointment with this person.
    pub fn render_by_person(&self, person: &str) -> String {
        render_records(self.search_by_person(person))
    }

    /// Record lines of every appointment on this date.
    pub fn render_by_date(&self, date: &str) -> String {
        render_records(self.search_by_date(date))
    }

    pub(crate) fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }

    fn search(&self, predicate: impl Fn(&Appointment) -> bool) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| predicate(appointment))
            .collect()
    }

    fn find_at(&self, date: &str, time: &str) -> Option<usize> {
        self.appointments
            .iter()
            .position(|appointment| appointment.matches_date_time(date, time))
    }

    fn remove_where(&mut self, predicate: impl Fn(&Appointment) -> bool) -> bool {
        let before = self.appointments.len();
        self.appointments.retain(|appointment| !predicate(appointment));
        let removed = before != self.appointments.len();
        if removed {
            self.touch();
        }
        removed
    }

    fn insert_sorted(&mut self, appointment: Appointment) {
        let start = appointment.start();
        let index = self
            .appointments
            .partition_point(|existing| existing.start() <= start);
        self.appointments.insert(index, appointment);
    }

    fn touch(&mut self) {
        self.persisted = false;
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<'a> IntoIterator for &'a Agenda {
    type Item = &'a Appointment;
    type IntoIter = std::slice::Iter<'a, Appointment>;

    fn into_iter(self) -> Self::IntoIter {
        self.appointments.iter()
    }
}

impl Display for Agenda {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Agenda: {}", self.name)?;
        f.write_str(&render_records(self.appointments.iter()))
    }
}

/// One-shot forward cursor over an [`Agenda`], detached from its borrow.
#[derive(Debug, Clone)]
pub struct Cursor {
    agenda: Uuid,
    generation: u64,
    index: usize,
    exhausted: bool,
}

impl Cursor {
    /// Returns the next appointment in start order.
    ///
    /// # Errors
    /// - [`CursorError::ForeignAgenda`] when `agenda` is not the value the
    ///   cursor was opened on (a clone counts as a different agenda).
    /// - [`CursorError::Modified`] when `agenda` changed structurally since
    ///   the cursor was opened and the cursor is not yet exhausted.
    pub fn next<'a>(
        &mut self,
        agenda: &'a Agenda,
    ) -> Result<Option<&'a Appointment>, CursorError> {
        if agenda.instance != self.agenda {
            return Err(CursorError::ForeignAgenda);
        }
        if self.exhausted {
            return Ok(None);
        }
        if agenda.generation != self.generation {
            return Err(ConcurrentModification {
                expected_generation: self.generation,
                found_generation: agenda.generation,
            }
            .into());
        }

        match agenda.appointments.get(self.index) {
            Some(appointment) => {
                self.index += 1;
                Ok(Some(appointment))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

/// Concatenated record lines, one per appointment.
pub fn render_records<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> String {
    appointments
        .into_iter()
        .map(Appointment::to_record)
        .collect()
}

fn normalize_name(name: String) -> String {
    if name.is_empty() {
        DEFAULT_AGENDA_NAME.to_string()
    } else {
        name
    }
}
