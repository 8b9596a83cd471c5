//! Multi-agenda use-case services.
//!
//! # Responsibility
//! - Orchestrate model and snapshot calls into registry-level operations.

pub mod registry;
