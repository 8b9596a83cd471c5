//! Snapshot persistence for agendas.
//!
//! # Responsibility
//! - Isolate the text record format and file I/O from the domain model.
//!
//! # Invariants
//! - Loading never aborts on a bad line; only unreadable files fail.

pub mod snapshot;
