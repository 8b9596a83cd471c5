//! Core domain logic for personal agendas.
//! This crate owns every scheduling invariant; front-ends only call into it.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::agenda::{
    Agenda, AddError, AmendOutcome, ConcurrentModification, Conflict, Cursor, CursorError,
    DEFAULT_AGENDA_NAME,
};
pub use model::appointment::{Appointment, AppointmentFields};
pub use model::field::{FieldKind, ValidationError};
pub use model::time_point::TimePoint;
pub use repo::snapshot::{LineIssue, LoadedSnapshot, MalformedLine, SnapshotError, SnapshotReport};
pub use service::registry::{
    AgendaMut, AgendaRegistry, ExportReport, ImportFailure, ImportReport, RegistryError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
