//! Line-based agenda snapshots.
//!
//! # Responsibility
//! - Encode an agenda as one record line per appointment.
//! - Decode snapshot text, skipping malformed lines into a report.
//! - Read and write snapshot files under a [`StoreConfig`].
//!
//! # Invariants
//! - Record grammar: `dd-MM-yyyy|HH-mm|<minutes>min|<place>|<person>`.
//! - Malformed *lines* are tolerated and reported; unreadable *files* are
//!   returned as [`SnapshotError`].
//! - A loaded agenda is persisted only when read from a file with the
//!   canonical extension.

use crate::config::StoreConfig;
use crate::model::agenda::Agenda;
use crate::model::appointment::Appointment;
use crate::model::field::ValidationError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

const RECORD_SEPARATOR: char = '|';
const DURATION_SUFFIX: &str = "min";
const RECORD_FIELDS: usize = 5;

/// I/O failure while reading or writing one snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot i/o failed at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Why a snapshot line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineIssue {
    /// The line did not split into exactly five fields.
    FieldCount(usize),
    /// A field failed its rule.
    Invalid(ValidationError),
    /// The appointment overlaps one read earlier from the same snapshot.
    Overlap,
}

impl Display for LineIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldCount(found) => {
                write!(f, "expected {RECORD_FIELDS} fields, found {found}")
            }
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Overlap => f.write_str("overlaps an earlier appointment"),
        }
    }
}

/// One skipped snapshot line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub content: String,
    pub issue: LineIssue,
}

/// Diagnostic batch for one decoded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    pub agenda_name: String,
    pub lines_read: usize,
    pub malformed: Vec<MalformedLine>,
}

impl SnapshotReport {
    /// Whether every line became an appointment.
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

impl Display for SnapshotReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "agenda `{}`: {} line(s) read, {} skipped",
            self.agenda_name,
            self.lines_read,
            self.malformed.len()
        )?;
        for line in &self.malformed {
            write!(
                f,
                "\n  line {}: `{}` ({})",
                line.line_number, line.content, line.issue
            )?;
        }
        Ok(())
    }
}

/// A decoded agenda together with its diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub agenda: Agenda,
    pub report: SnapshotReport,
}

/// Encodes every appointment as one newline-terminated record line.
pub fn encode(agenda: &Agenda) -> String {
    agenda.iter().map(Appointment::to_record).collect()
}

/// Parses one record line.
pub fn parse_record(line: &str) -> Result<Appointment, LineIssue> {
    let fields: Vec<&str> = line.split(RECORD_SEPARATOR).collect();
    if fields.len() != RECORD_FIELDS {
        return Err(LineIssue::FieldCount(fields.len()));
    }
    let duration = fields[2]
        .strip_suffix(DURATION_SUFFIX)
        .unwrap_or(fields[2]);
    Appointment::new(fields[0], fields[1], duration, fields[3], fields[4])
        .map_err(LineIssue::Invalid)
}

/// Decodes snapshot text into a fresh (dirty) agenda named `name`.
///
/// Lines that fail to parse, fail validation or overlap an earlier line are
/// skipped and recorded in the report; decoding itself never fails.
pub fn decode(name: &str, text: &str) -> LoadedSnapshot {
    let mut agenda = Agenda::new(name);
    let mut malformed = Vec::new();
    let mut lines_read = 0;

    for (index, line) in text.lines().enumerate() {
        lines_read += 1;
        let outcome = parse_record(line)
            .and_then(|appointment| agenda.add(appointment).map_err(|_| LineIssue::Overlap));
        if let Err(issue) = outcome {
            malformed.push(MalformedLine {
                line_number: index + 1,
                content: line.to_string(),
                issue,
            });
        }
    }

    let report = SnapshotReport {
        agenda_name: agenda.name().to_string(),
        lines_read,
        malformed,
    };
    LoadedSnapshot { agenda, report }
}

/// Writes `agenda` to its canonical path and marks it persisted.
///
/// # Errors
/// - [`SnapshotError::Io`] when the directory cannot be created or the file
///   cannot be written; the agenda keeps its previous flag.
pub fn save(agenda: &mut Agenda, config: &StoreConfig) -> Result<PathBuf, SnapshotError> {
    let started_at = Instant::now();
    let path = config.snapshot_path(agenda.name());

    let written = config
        .ensure_dir()
        .map_err(|err| SnapshotError::io(&config.snapshot_dir, err))
        .and_then(|()| {
            std::fs::write(&path, encode(agenda)).map_err(|err| SnapshotError::io(&path, err))
        });

    match written {
        Ok(()) => {
            agenda.set_persisted(true);
            info!(
                "event=snapshot_save module=snapshot status=ok agenda={} appointments={} duration_ms={}",
                agenda.name(),
                agenda.len(),
                started_at.elapsed().as_millis()
            );
            Ok(path)
        }
        Err(err) => {
            error!(
                "event=snapshot_save module=snapshot status=error agenda={} error={}",
                agenda.name(),
                err
            );
            Err(err)
        }
    }
}

/// Reads one snapshot file; the agenda is named after the file stem.
///
/// # Errors
/// - [`SnapshotError::Io`] when the file cannot be read (missing, not UTF-8,
///   permission denied).
pub fn load(path: &Path, config: &StoreConfig) -> Result<LoadedSnapshot, SnapshotError> {
    let started_at = Instant::now();
    let text = std::fs::read_to_string(path).map_err(|err| {
        error!(
            "event=snapshot_load module=snapshot status=error path={} error={}",
            path.display(),
            err
        );
        SnapshotError::io(path, err)
    })?;

    let name = agenda_name_for(path);
    let mut loaded = decode(&name, &text);
    loaded.agenda.set_persisted(config.is_canonical(path));

    if loaded.report.is_clean() {
        info!(
            "event=snapshot_load module=snapshot status=ok agenda={} lines={} duration_ms={}",
            loaded.report.agenda_name,
            loaded.report.lines_read,
            started_at.elapsed().as_millis()
        );
    } else {
        warn!(
            "event=snapshot_load module=snapshot status=partial agenda={} lines={} malformed={} duration_ms={}",
            loaded.report.agenda_name,
            loaded.report.lines_read,
            loaded.report.malformed.len(),
            started_at.elapsed().as_millis()
        );
    }
    Ok(loaded)
}

impl Agenda {
    /// Saves this agenda under `config`; see [`save`].
    pub fn save(&mut self, config: &StoreConfig) -> Result<PathBuf, SnapshotError> {
        save(self, config)
    }

    /// Loads one snapshot file; see [`load`].
    pub fn load(path: &Path, config: &StoreConfig) -> Result<LoadedSnapshot, SnapshotError> {
        load(path, config)
    }
}

fn agenda_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
