//! Capture configuration errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::ValidationError;

/// Why a capture configuration or session could not be loaded, saved or used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read capture config '{path}': {source}")]
    ReadFile {
        /// Config file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be written.
    #[error("cannot write capture config '{path}': {source}")]
    WriteFile {
        /// Config file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A config or calibration directory could not be created.
    #[error("cannot create directory '{path}': {source}")]
    CreateDir {
        /// Directory.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the config layout.
    #[error("malformed capture config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The config could not be encoded.
    #[error("cannot encode capture config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Parsed, but inconsistent (bad mapping, out-of-range group, ...).
    #[error("inconsistent configuration: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    pub(crate) fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// File or directory involved, for I/O failures.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::ReadFile { path, .. }
            | ConfigError::WriteFile { path, .. }
            | ConfigError::CreateDir { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the config file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::ReadFile { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
