//! External three-way merge tool invocation.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::SyncError;

/// Runs the merge step for one physical file.
pub trait MergeTool: Send + Sync {
    /// Merge `incoming` into `original`, writing the result over `original`.
    ///
    /// Returns the tool's exit code; `0` accepts the merge.
    fn merge(&self, original: &Path, incoming: &Path) -> std::io::Result<i32>;
}

/// kdiff3-compatible command line tool.
#[derive(Debug, Clone)]
pub struct KDiff3 {
    path: PathBuf,
}

impl KDiff3 {
    /// Fails with [`SyncError::MergeToolMissing`] unless `path` exists.
    pub fn locate(path: Option<&Path>) -> Result<Self, SyncError> {
        match path {
            Some(p) if p.exists() => Ok(Self {
                path: p.to_path_buf(),
            }),
            Some(p) => Err(SyncError::MergeToolMissing {
                path: p.to_path_buf(),
            }),
            None => Err(SyncError::MergeToolMissing {
                path: PathBuf::from("<unset>"),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MergeTool for KDiff3 {
    fn merge(&self, original: &Path, incoming: &Path) -> std::io::Result<i32> {
        let status = Command::new(&self.path)
            .arg(original)
            .arg(incoming)
            .arg("-o")
            .arg(original)
            .args(["--cs", "CreateBakFiles=0", "--cs", "ShowInfoDialogs=0", "--auto"])
            .status()?;
        // Killed by a signal: treat as declined.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Result of the merge step for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Merge applied, or there was no prior local copy to merge with.
    Accepted,
    /// The tool exited non-zero; the local copy was put back.
    Declined { exit_code: i32 },
    /// The tool could not be run; the local copy was put back.
    Failed { message: String },
}

impl FileOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FileOutcome::Accepted)
    }
}

/// Merge the staged (prior local) copy into the freshly retrieved live file.
///
/// Declines and tool failures restore the live file from the staged copy.
/// Only a failed restore is an error.
pub fn merge_file(
    tool: &dyn MergeTool,
    live: &Path,
    staged: &Path,
) -> Result<FileOutcome, SyncError> {
    if !staged.exists() {
        return Ok(FileOutcome::Accepted);
    }
    let outcome = match tool.merge(live, staged) {
        Ok(0) => return Ok(FileOutcome::Accepted),
        Ok(exit_code) => FileOutcome::Declined { exit_code },
        Err(e) => FileOutcome::Failed {
            message: e.to_string(),
        },
    };
    restore(live, staged)?;
    Ok(outcome)
}

fn restore(live: &Path, staged: &Path) -> Result<(), SyncError> {
    std::fs::copy(staged, live)
        .map(|_| ())
        .map_err(|source| SyncError::Restore {
            live: live.to_path_buf(),
            staged: staged.to_path_buf(),
            source,
        })
}
