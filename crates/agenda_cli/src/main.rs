//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `agenda_core` linkage by importing one snapshot directory.
//! - Keep output deterministic: one line per agenda, then the totals.
//!
//! Usage: `agenda_cli [SNAPSHOT_DIR | CONFIG.json]`
//!
//! Core events are logged under `$AGENDA_LOG_DIR` (default `./logs`).

use agenda_core::{AgendaRegistry, StoreConfig};
use log::warn;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "AGENDA_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";

fn main() -> ExitCode {
    let log_dir = match std::env::current_dir() {
        Ok(cwd) => resolve_log_dir(std::env::var_os(LOG_DIR_ENV), &cwd),
        Err(err) => {
            eprintln!("agenda_cli logging_error={err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = agenda_core::init_logging(agenda_core::default_log_level(), &log_dir) {
        eprintln!("agenda_cli logging_error={err}");
        return ExitCode::FAILURE;
    }

    let config = match resolve_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("agenda_cli config_error={err}");
            return ExitCode::FAILURE;
        }
    };

    println!("agenda_core version={}", agenda_core::core_version());
    println!("snapshot_dir={}", config.snapshot_dir.display());

    let mut registry = AgendaRegistry::new(config);
    let report = match registry.import_all() {
        Ok(report) => report,
        Err(err) => {
            eprintln!("agenda_cli import_error={err}");
            return ExitCode::FAILURE;
        }
    };

    for label in registry.list_names() {
        println!("agenda {label}");
    }
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    for failure in &report.failed {
        warn!(
            "event=cli_import module=cli status=error file={}",
            failure.file.display()
        );
        println!("failed {}: {}", failure.file.display(), failure.error);
    }
    println!(
        "loaded={} duplicates={} failed={} complete={}",
        report.loaded.len(),
        report.duplicates.len(),
        report.failed.len(),
        report.is_complete()
    );

    if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn resolve_config(arg: Option<String>) -> Result<StoreConfig, agenda_core::ConfigError> {
    match arg {
        None => Ok(StoreConfig::default()),
        Some(arg) if Path::new(&arg).extension().is_some_and(|ext| ext == "json") => {
            StoreConfig::from_file(&arg)
        }
        Some(arg) => Ok(StoreConfig::new(arg)),
    }
}

/// Absolute log directory: the override if given (relative to `cwd`), else
/// `cwd/logs`.
fn resolve_log_dir(override_dir: Option<OsString>, cwd: &Path) -> PathBuf {
    match override_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => cwd.join(dir),
        None => cwd.join(DEFAULT_LOG_DIR),
    }
}
