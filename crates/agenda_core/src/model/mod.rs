//! Appointment and agenda domain model.
//!
//! # Responsibility
//! - Define the field rule table and the validated value types built on it.
//! - Keep every agenda sorted and overlap-free across all mutations.
//!
//! # Invariants
//! - An `Appointment` only exists if all five raw fields passed their rule.
//! - No two appointments in one `Agenda` partially overlap.

pub mod agenda;
pub mod appointment;
pub mod field;
pub mod time_point;
