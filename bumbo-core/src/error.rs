//! Error types for bumbo-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from catalog lookups, request parsing, and
/// project layout operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The metadata type is absent from the catalog.
    #[error("{type_name} is not a recognized metadata type")]
    UnknownMetadataType { type_name: String },

    /// A component request did not match `Type:name1,name2,...`.
    #[error("invalid component request '{input}': {reason}")]
    InvalidRequest { input: String, reason: String },

    /// No `sfdx-project.json` was found walking up from `start`.
    #[error("no sfdx-project.json found in {start} or any parent directory")]
    ProjectNotFound { start: PathBuf },

    /// The project has no `.forceignore` file to register staging suffixes in.
    #[error(".forceignore file not found at {path}")]
    ForceIgnoreMissing { path: PathBuf },

    /// I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `config.yaml` exists but could not be parsed.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl CoreError {
    /// Stable error code printed alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::UnknownMetadataType { .. } => "UnknownMetadataType",
            CoreError::InvalidRequest { .. } => "InvalidRequest",
            CoreError::ProjectNotFound { .. } => "ProjectNotFound",
            CoreError::ForceIgnoreMissing { .. } => "ForceIgnoreMissing",
            CoreError::Io { .. } => "IoError",
            CoreError::ConfigParse { .. } => "ConfigParseError",
        }
    }
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
