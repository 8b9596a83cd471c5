//! Snapshot store configuration.
//!
//! # Responsibility
//! - Describe where agenda snapshots live and which extension is canonical.
//! - Load that description from JSON and validate it.
//!
//! # Invariants
//! - Configuration is an explicit value handed to the registry and to
//!   snapshot save/load; there is no process-wide mutable path.
//! - `extension` has no leading dot and no path separators.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default snapshot directory, relative to the working directory.
pub const DEFAULT_SNAPSHOT_DIR: &str = "Agende_testuali";
/// Extension of canonical snapshot files.
pub const DEFAULT_SNAPSHOT_EXTENSION: &str = "txt";

/// Configuration loading/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Where snapshots are read from and written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one snapshot file per agenda.
    pub snapshot_dir: PathBuf,
    /// Canonical snapshot extension, without the dot.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            extension: DEFAULT_SNAPSHOT_EXTENSION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Default extension, custom directory.
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Parses and validates a JSON document; missing keys take defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "snapshot_dir cannot be empty".to_string(),
            ));
        }
        let extension = self.extension.as_str();
        if extension.is_empty()
            || extension.starts_with('.')
            || extension.contains(['/', '\\'])
        {
            return Err(ConfigError::Invalid(format!(
                "extension must be a bare suffix like `txt`, got `{extension}`"
            )));
        }
        Ok(())
    }

    /// Creates the snapshot directory (and parents) when missing.
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.snapshot_dir)
    }

    /// Canonical snapshot path for an agenda name.
    pub fn snapshot_path(&self, agenda_name: &str) -> PathBuf {
        self.snapshot_dir
            .join(format!("{agenda_name}.{}", self.extension))
    }

    /// Whether `path` carries the canonical extension (case-sensitive).
    pub fn is_canonical(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_SNAPSHOT_DIR};
    use std::path::{Path, PathBuf};

    #[test]
    fn missing_keys_take_defaults() {
        let config = StoreConfig::from_json_str("{}").expect("empty object should load");
        assert_eq!(config.snapshot_dir, PathBuf::from(DEFAULT_SNAPSHOT_DIR));
        assert_eq!(config.extension, "txt");

        let config = StoreConfig::from_json_str(r#"{"snapshot_dir": "/tmp/agende"}"#)
            .expect("partial object should load");
        assert_eq!(config.snapshot_dir, PathBuf::from("/tmp/agende"));
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = StoreConfig::from_json_str(r#"{"extension": ".txt"}"#)
            .expect_err("dotted extension must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn canonical_extension_is_case_sensitive() {
        let config = StoreConfig::default();
        assert!(config.is_canonical(Path::new("Lavoro.txt")));
        assert!(!config.is_canonical(Path::new("Lavoro.TXT")));
        assert!(!config.is_canonical(Path::new("Lavoro.csv")));
        assert!(!config.is_canonical(Path::new("Lavoro")));
    }

    #[test]
    fn snapshot_path_appends_extension() {
        let config = StoreConfig::new("/data").with_extension("agenda");
        assert_eq!(
            config.snapshot_path("Casa"),
            PathBuf::from("/data/Casa.agenda")
        );
    }
}
