//! Error types for bumbo-sync.

use std::path::PathBuf;

use thiserror::Error;

use bumbo_core::CoreError;

/// All errors that can abort a retrieve or deploy session.
///
/// Declined merges are not errors; they show up as rejected components in the
/// session report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Catalog, request, or project layout failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The merge tool executable is not configured or not on disk.
    #[error("could not find merge tool executable at {path}; set merge_tool in .bumbo/config.yaml or BUMBO_MERGE_TOOL")]
    MergeToolMissing { path: PathBuf },

    /// Listing remote components failed.
    #[error("remote metadata listing failed: {0}")]
    RemoteQuery(String),

    /// The batched retrieve call failed; no merges ran.
    #[error("retrieve of {batch} failed: {message}")]
    RetrieveFailed { batch: String, message: String },

    /// The timestamp store holds an entry that is not `identity:integer`.
    #[error("file {path} is corrupted (bad entry '{entry}'), delete the file and try again")]
    CorruptStore { path: PathBuf, entry: String },

    /// Reading or writing the timestamp store failed.
    #[error("timestamp store I/O error at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The batched deploy call failed; timestamps were not written.
    #[error("deploy of {batch} failed: {message}")]
    DeployFailed { batch: String, message: String },

    /// Copying, staging, or purging a component file failed.
    #[error("I/O error at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declined merge could not put the local version back.
    #[error("could not restore {live} from {staged}: {source}")]
    Restore {
        live: PathBuf,
        staged: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking task could not be joined.
    #[error("task failure: {0}")]
    Task(String),
}

impl SyncError {
    /// Stable error code printed alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Core(e) => e.code(),
            SyncError::MergeToolMissing { .. } => "MergeToolMissing",
            SyncError::RemoteQuery(_) => "RemoteQueryError",
            SyncError::RetrieveFailed { .. } => "RetrieveFailed",
            SyncError::CorruptStore { .. } => "CorruptStoreError",
            SyncError::StoreIo { .. } => "StoreIOError",
            SyncError::DeployFailed { .. } => "DeployFailed",
            SyncError::Staging { .. } => "StagingError",
            SyncError::Restore { .. } => "RestoreFailed",
            SyncError::Task(_) => "TaskError",
        }
    }
}

/// Convenience constructor for [`SyncError::Staging`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Staging {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::StoreIo`].
pub(crate) fn store_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::StoreIo {
        path: path.into(),
        source,
    }
}
