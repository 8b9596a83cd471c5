//! Name-keyed agenda registry with bulk import/export.
//!
//! # Responsibility
//! - Own every agenda of a session under a unique, case-sensitive name.
//! - Import/export agendas against the configured snapshot directory.
//!
//! # Invariants
//! - No two agendas share a name; the map key always equals `Agenda::name()`.
//!   Registered agendas are only mutated through [`AgendaMut`], which has no
//!   rename; [`AgendaRegistry::rename`] is the only way to change a name.
//! - Bulk import/export continue past per-item failures and report them.
//! - Directory-level failures (missing/unreadable directory) are returned.

use crate::config::StoreConfig;
use crate::model::agenda::{AddError, Agenda, AmendOutcome, Conflict, DEFAULT_AGENDA_NAME};
use crate::model::appointment::Appointment;
use crate::repo::snapshot::{self, SnapshotError, SnapshotReport};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Marker appended by [`AgendaRegistry::list_names`] to unsaved agendas.
pub const DIRTY_MARKER: char = '*';

/// Registry operation failures.
#[derive(Debug)]
pub enum RegistryError {
    DuplicateName(String),
    NotFound(String),
    Snapshot(SnapshotError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "agenda already exists: {name}"),
            Self::NotFound(name) => write!(f, "agenda not found: {name}"),
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SnapshotError> for RegistryError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// A snapshot file that could not be read during bulk import.
#[derive(Debug)]
pub struct ImportFailure {
    pub file: PathBuf,
    pub error: SnapshotError,
}

/// Outcome of [`AgendaRegistry::import_all`].
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Names of agendas added to the registry.
    pub loaded: Vec<String>,
    /// Names skipped because the registry already held them.
    pub duplicates: Vec<String>,
    /// Files that could not be read.
    pub failed: Vec<ImportFailure>,
    /// Reports of loaded snapshots that had malformed lines.
    pub diagnostics: Vec<SnapshotReport>,
}

impl ImportReport {
    /// Aggregate success flag: every matching file was read and added.
    ///
    /// Skipped lines inside a loaded file do not count as failures; see
    /// [`ImportReport::has_diagnostics`].
    pub fn is_complete(&self) -> bool {
        self.duplicates.is_empty() && self.failed.is_empty()
    }

    /// Whether any loaded snapshot skipped malformed lines.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Outcome of [`AgendaRegistry::export_all`].
#[derive(Debug, Default)]
pub struct ExportReport {
    pub saved: Vec<String>,
    pub failed: Vec<(String, SnapshotError)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Name-keyed collection of agendas.
#[derive(Debug, Default)]
pub struct AgendaRegistry {
    config: StoreConfig,
    agendas: BTreeMap<String, Agenda>,
}

impl AgendaRegistry {
    /// Creates an empty registry bound to a snapshot store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            agendas: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.agendas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agendas.is_empty()
    }

    /// Exact, case-sensitive name lookup.
    pub fn contains(&self, name: &str) -> bool {
        self.agendas.contains_key(name)
    }

    /// Names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agendas.keys().map(String::as_str)
    }

    /// Agendas in alphabetical name order.
    pub fn agendas(&self) -> impl Iterator<Item = &Agenda> {
        self.agendas.values()
    }

    /// Adds an empty agenda; an empty name maps to the default label.
    pub fn add(&mut self, name: &str) -> Result<(), RegistryError> {
        self.insert(Agenda::new(name))
    }

    /// Adds an existing agenda under its own name.
    pub fn insert(&mut self, agenda: Agenda) -> Result<(), RegistryError> {
        if self.contains(agenda.name()) {
            return Err(RegistryError::DuplicateName(agenda.name().to_string()));
        }
        self.agendas.insert(agenda.name().to_string(), agenda);
        Ok(())
    }

    /// Removes and returns the agenda called `name`.
    pub fn remove(&mut self, name: &str) -> Result<Agenda, RegistryError> {
        self.agendas
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Renames `old_name` to `new_name` (empty maps to the default label).
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateName`] when the target name is taken,
    ///   including when it equals `old_name`.
    /// - [`RegistryError::NotFound`] when `old_name` is absent.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), RegistryError> {
        let target = if new_name.is_empty() {
            DEFAULT_AGENDA_NAME
        } else {
            new_name
        };
        if self.contains(target) {
            return Err(RegistryError::DuplicateName(target.to_string()));
        }

        let mut agenda = self.remove(old_name)?;
        agenda.rename(target);
        self.agendas.insert(target.to_string(), agenda);
        Ok(())
    }

    pub fn select(&self, name: &str) -> Result<&Agenda, RegistryError> {
        self.agendas
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Mutable access for add/remove/amend on one agenda.
    pub fn select_mut(&mut self, name: &str) -> Result<AgendaMut<'_>, RegistryError> {
        self.agendas
            .get_mut(name)
            .map(|agenda| AgendaMut { agenda })
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Drops every agenda. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        let removed = !self.agendas.is_empty();
        self.agendas.clear();
        removed
    }

    /// Whether every agenda matches its last snapshot.
    pub fn all_saved(&self) -> bool {
        self.agendas.values().all(Agenda::is_persisted)
    }

    /// Alphabetical names, each followed by [`DIRTY_MARKER`] when unsaved.
    pub fn list_names(&self) -> Vec<String> {
        self.agendas
            .values()
            .map(|agenda| {
                let mut label = agenda.name().to_string();
                if !agenda.is_persisted() {
                    label.push(DIRTY_MARKER);
                }
                label
            })
            .collect()
    }

    /// Saves one agenda regardless of its persisted flag.
    pub fn save(&mut self, name: &str) -> Result<PathBuf, RegistryError> {
        let config = &self.config;
        let agenda = self
            .agendas
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(snapshot::save(agenda, config)?)
    }

    /// Loads `file_name` from the snapshot directory and adds it.
    ///
    /// # Errors
    /// - [`RegistryError::Snapshot`] when the file cannot be read.
    /// - [`RegistryError::DuplicateName`] when an agenda with the same name
    ///   is already present; the registry is unchanged.
    pub fn import_file(&mut self, file_name: &str) -> Result<SnapshotReport, RegistryError> {
        let path = self.config.snapshot_dir.join(file_name);
        let loaded = snapshot::load(&path, &self.config)?;
        self.insert(loaded.agenda)?;
        Ok(loaded.report)
    }

    /// Imports every canonical snapshot file of the snapshot directory.
    ///
    /// Subdirectories and files with other extensions are ignored. Files
    /// are processed in name order; unreadable files and duplicate names are
    /// recorded and skipped so that as many agendas as possible are loaded.
    ///
    /// # Errors
    /// - [`RegistryError::Snapshot`] when the directory itself cannot be
    ///   listed (e.g. it does not exist).
    pub fn import_all(&mut self) -> Result<ImportReport, RegistryError> {
        let dir = self.config.snapshot_dir.clone();
        let entries = std::fs::read_dir(&dir).map_err(|source| SnapshotError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut report = ImportReport::default();
        let files = self.snapshot_files(
            &dir,
            entries.map(|entry| entry.map(|entry| entry.path())),
            &mut report,
        );
        for path in files {
            let loaded = match snapshot::load(&path, &self.config) {
                Ok(loaded) => loaded,
                Err(error) => {
                    report.failed.push(ImportFailure { file: path, error });
                    continue;
                }
            };

            let name = loaded.agenda.name().to_string();
            if self.insert(loaded.agenda).is_err() {
                report.duplicates.push(name);
                continue;
            }
            if !loaded.report.is_clean() {
                report.diagnostics.push(loaded.report);
            }
            report.loaded.push(name);
        }

        let status = if report.is_complete() { "ok" } else { "partial" };
        info!(
            "event=registry_import module=registry status={} dir={} loaded={} duplicates={} failed={} with_malformed_lines={}",
            status,
            dir.display(),
            report.loaded.len(),
            report.duplicates.len(),
            report.failed.len(),
            report.diagnostics.len()
        );
        Ok(report)
    }

    /// Canonical snapshot files among `entries`, sorted by path.
    ///
    /// Entries the directory listing could not read are recorded as
    /// failures against `dir`.
    fn snapshot_files(
        &self,
        dir: &Path,
        entries: impl Iterator<Item = std::io::Result<PathBuf>>,
        report: &mut ImportReport,
    ) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if path.is_file() && self.config.is_canonical(&path) {
                        files.push(path);
                    }
                }
                Err(source) => report.failed.push(ImportFailure {
                    file: dir.to_path_buf(),
                    error: SnapshotError::Io {
                        path: dir.to_path_buf(),
                        source,
                    },
                }),
            }
        }
        files.sort();
        files
    }

    /// Saves every unsaved agenda, continuing past individual failures.
    pub fn export_all(&mut self) -> ExportReport {
        let mut report = ExportReport::default();
        let config = &self.config;
        for agenda in self.agendas.values_mut() {
            if agenda.is_persisted() {
                continue;
            }
            match snapshot::save(agenda, config) {
                Ok(_) => report.saved.push(agenda.name().to_string()),
                Err(err) => {
                    warn!(
                        "event=registry_export module=registry status=error agenda={} error={}",
                        agenda.name(),
                        err
                    );
                    report.failed.push((agenda.name().to_string(), err));
                }
            }
        }

        info!(
            "event=registry_export module=registry status={} saved={} failed={}",
            if report.is_complete() { "ok" } else { "partial" },
            report.saved.len(),
            report.failed.len()
        );
        report
    }
}

/// Mutable view of a registered agenda.
///
/// Derefs to [`Agenda`] for reads and forwards every content mutation, but
/// not [`Agenda::rename`]: the name is the registry key.
///
/// ```compile_fail
/// let mut registry = agenda_core::AgendaRegistry::default();
/// registry.add("Casa").unwrap();
/// registry.select_mut("Casa").unwrap().rename("Lavoro");
/// ```
#[derive(Debug)]
pub struct AgendaMut<'a> {
    agenda: &'a mut Agenda,
}

impl AgendaMut<'_> {
    pub fn add(&mut self, appointment: Appointment) -> Result<(), Conflict> {
        self.agenda.add(appointment)
    }

    pub fn add_fields(
        &mut self,
        date: &str,
        time: &str,
        duration: &str,
        place: &str,
        person: &str,
    ) -> Result<(), AddError> {
        self.agenda.add_fields(date, time, duration, place, person)
    }

    pub fn remove_by_person(&mut self, person: &str) -> bool {
        self.agenda.remove_by_person(person)
    }

    pub fn remove_by_date(&mut self, date: &str) -> bool {
        self.agenda.remove_by_date(date)
    }

    pub fn remove_by_date_time(&mut self, date: &str, time: &str) -> bool {
        self.agenda.remove_by_date_time(date, time)
    }

    pub fn remove_by_date_time_text(&mut self, selector: &str) -> bool {
        self.agenda.remove_by_date_time_text(selector)
    }

    pub fn remove_all(&mut self) -> bool {
        self.agenda.remove_all()
    }

    pub fn amend(&mut self, date: &str, time: &str, field: &str, new_value: &str) -> AmendOutcome {
        self.agenda.amend(date, time, field, new_value)
    }

    pub fn amend_at(&mut self, selector: &str, field: &str, new_value: &str) -> AmendOutcome {
        self.agenda.amend_at(selector, field, new_value)
    }
}

impl Deref for AgendaMut<'_> {
    type Target = Agenda;

    fn deref(&self) -> &Agenda {
        self.agenda
    }
}

#[cfg(test)]
mod tests {
    use super::{AgendaRegistry, ImportReport, RegistryError};
    use crate::config::StoreConfig;
    use crate::model::agenda::Agenda;
    use std::io;
    use std::path::{Path, PathBuf};

    fn registry() -> AgendaRegistry {
        AgendaRegistry::new(StoreConfig::new("unused"))
    }

    #[test]
    fn add_rejects_duplicate_names() {
        let mut registry = registry();
        registry.add("Extra").unwrap();
        let err = registry.add("Extra").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "Extra"));
        assert_eq!(registry.len(), 1);

        registry.insert(Agenda::new("Pippo")).unwrap();
        assert!(registry.insert(Agenda::new("Pippo")).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn names_are_case_and_space_sensitive() {
        let mut registry = registry();
        registry.add("Altro").unwrap();
        assert!(registry.contains("Altro"));
        assert!(!registry.contains("altro"));
        assert!(!registry.contains("   Altro"));
    }

    #[test]
    fn rename_keeps_key_in_sync() {
        let mut registry = registry();
        registry.add("Varie").unwrap();
        registry.add("Personale").unwrap();

        registry.rename("Varie", "Vario").unwrap();
        assert_eq!(registry.select("Vario").unwrap().name(), "Vario");
        assert!(!registry.contains("Varie"));

        assert!(matches!(
            registry.rename("Personale", "Vario"),
            Err(RegistryError::DuplicateName(_))
        ));
        assert!(matches!(
            registry.rename("Non Esisto", "Esisto"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn unreadable_directory_entries_are_reported() {
        let registry = registry();
        let mut report = ImportReport::default();
        let entries = vec![
            Ok(PathBuf::from("missing/Casa.txt")),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        ];

        let files = registry.snapshot_files(Path::new("dir"), entries.into_iter(), &mut report);

        assert!(files.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, PathBuf::from("dir"));
        assert!(!report.is_complete());
    }

    #[test]
    fn list_names_is_sorted_with_dirty_marker() {
        let mut registry = registry();
        registry.add("Zeta").unwrap();
        registry.add("Alfa").unwrap();
        assert_eq!(registry.list_names(), vec!["Alfa*", "Zeta*"]);
    }

    #[test]
    fn clear_reports_whether_anything_was_removed() {
        let mut registry = registry();
        assert!(!registry.clear());
        registry.add("").unwrap();
        assert!(registry.contains("Agenda"));
        assert!(registry.clear());
        assert!(registry.is_empty());
    }
}
