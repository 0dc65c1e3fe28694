//! Project layout and bootstrap.
//!
//! # Storage layout
//!
//! ```text
//! <project root>/
//!   sfdx-project.json          (marks the root)
//!   .forceignore               (must exist; gets the staging globs)
//!   force-app/main/default/    (package directory, configurable)
//!   .bumbo/
//!     init                     (marker written by `bumbo init`)
//!     config.yaml              (optional)
//!     retrieve_timestamps      (timestamp store)
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};

pub const PROJECT_FILE: &str = "sfdx-project.json";
pub const FORCEIGNORE_FILE: &str = ".forceignore";
pub const CONFIG_DIR_NAME: &str = ".bumbo";
pub const TIMESTAMP_FILE_NAME: &str = "retrieve_timestamps";
pub const INIT_MARKER_NAME: &str = "init";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Staging suffix for the retrieve flow.
pub const RETRIEVE_SUFFIX: &str = ".tmp";
/// Staging suffix for the deploy flow.
pub const DEPLOY_SUFFIX: &str = ".dtmp";

pub const DEFAULT_PACKAGE_DIR: &str = "force-app/main/default";

const DEFAULT_CONFIG: &str = "\
# bumbo project configuration
#
# merge_tool: /usr/bin/kdiff3
# sfdx_bin: sfdx
# api_version: \"47.0\"
# target_org: my-sandbox
# package_dir: force-app/main/default
# metadata_types:
#   ApexTrigger:
#     folder: triggers
#     single:
#       extension: .trigger
";

/// Resolved paths for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub package_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let package_dir = root.join(DEFAULT_PACKAGE_DIR);
        Self { root, package_dir }
    }

    /// Override the package directory (relative paths are taken from the root).
    pub fn with_package_dir(mut self, package_dir: impl AsRef<Path>) -> Self {
        self.package_dir = self.root.join(package_dir);
        self
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR_NAME)
    }

    pub fn store_path(&self) -> PathBuf {
        self.config_dir().join(TIMESTAMP_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn forceignore_path(&self) -> PathBuf {
        self.root.join(FORCEIGNORE_FILE)
    }

    /// Create `.bumbo/` if it does not exist yet.
    pub fn ensure_config_dir(&self) -> Result<PathBuf, CoreError> {
        let dir = self.config_dir();
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        Ok(dir)
    }
}

/// Walk up from `start` to the first directory containing `sfdx-project.json`.
pub fn resolve_root(start: &Path) -> Result<PathBuf, CoreError> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| CoreError::ProjectNotFound {
            start: start.to_path_buf(),
        })
}

/// Outcome of `init_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Lines appended to `.forceignore` (empty when already present).
    pub appended: Vec<String>,
    pub config_dir: PathBuf,
    pub config_written: bool,
}

/// Prepare a project: register both staging globs in `.forceignore`, create
/// `.bumbo/`, and drop the init marker plus a commented `config.yaml`.
///
/// Safe to run repeatedly.
pub fn init_at(layout: &ProjectLayout) -> Result<InitReport, CoreError> {
    let forceignore = layout.forceignore_path();
    let contents = match std::fs::read_to_string(&forceignore) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::ForceIgnoreMissing { path: forceignore });
        }
        Err(e) => return Err(io_err(&forceignore, e)),
    };

    let appended: Vec<String> = [RETRIEVE_SUFFIX, DEPLOY_SUFFIX]
        .iter()
        .map(|suffix| format!("*{suffix}"))
        .filter(|glob| !contents.lines().any(|line| line.trim() == glob))
        .collect();

    if !appended.is_empty() {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&forceignore)
            .map_err(|e| io_err(&forceignore, e))?;
        let mut text = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            text.push('\n');
        }
        for glob in &appended {
            text.push_str(glob);
            text.push('\n');
        }
        file.write_all(text.as_bytes())
            .map_err(|e| io_err(&forceignore, e))?;
    }

    let config_dir = layout.ensure_config_dir()?;
    let marker = config_dir.join(INIT_MARKER_NAME);
    std::fs::write(&marker, "d").map_err(|e| io_err(&marker, e))?;

    let config_path = layout.config_path();
    let config_written = !config_path.exists();
    if config_written {
        std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| io_err(&config_path, e))?;
    }

    Ok(InitReport {
        appended,
        config_dir,
        config_written,
    })
}
