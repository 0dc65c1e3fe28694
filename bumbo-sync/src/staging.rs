//! Staging manager: side-by-side copies of live component files.
//!
//! `classes/Foo.cls` is staged as `classes/Foo.cls<suffix>`. Staged copies
//! never outlive a session: [`PurgeGuard`] sweeps them when it drops.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use bumbo_core::Component;

use crate::error::{io_err, SyncError};

/// A live file and its staged copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub live: PathBuf,
    pub staged: PathBuf,
}

/// `<live><suffix>`.
pub fn staged_path(live: &Path, suffix: &str) -> PathBuf {
    let mut name = live.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy every file of every component to its staged path.
///
/// Files that do not exist locally yet are skipped.
pub fn stage(components: &[Component], suffix: &str) -> Result<Vec<StagedFile>, SyncError> {
    let mut staged = Vec::new();
    for component in components {
        for live in &component.files {
            let target = staged_path(live, suffix);
            match std::fs::copy(live, &target) {
                Ok(_) => {
                    tracing::debug!("staged {}", target.display());
                    staged.push(StagedFile {
                        live: live.clone(),
                        staged: target,
                    });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("{} not present locally, nothing to stage", live.display());
                }
                Err(e) => return Err(io_err(live, e)),
            }
        }
    }
    tracing::info!("staged {} file(s)", staged.len());
    Ok(staged)
}

/// Delete every file under `root` whose name contains `suffix`.
///
/// Only file names are matched, so a root that itself lives under a `.tmp`
/// directory is safe. `.git` and `node_modules` are not descended into.
pub fn purge(root: &Path, suffix: &str) -> Result<usize, SyncError> {
    if !root.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir()
            && matches!(entry.file_name().to_str(), Some(".git" | "node_modules")))
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, e.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(suffix) {
            std::fs::remove_file(entry.path()).map_err(|e| io_err(entry.path(), e))?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::info!("purged {removed} staged file(s) under {}", root.display());
    }
    Ok(removed)
}

/// Purges staged files under `root` when dropped, on every exit path.
#[derive(Debug)]
pub struct PurgeGuard {
    root: PathBuf,
    suffix: String,
}

impl PurgeGuard {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }
}

impl Drop for PurgeGuard {
    fn drop(&mut self) {
        if let Err(e) = purge(&self.root, &self.suffix) {
            tracing::error!("failed to purge staged files: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn component(files: Vec<PathBuf>) -> Component {
        Component {
            type_name: "ApexClass".into(),
            name: "Foo".to_string(),
            identity: "classes/Foo.cls".into(),
            remote_key: "Foo.cls".to_string(),
            files,
        }
    }

    #[test]
    fn staged_path_appends_suffix() {
        assert_eq!(
            staged_path(Path::new("classes/Foo.cls"), ".tmp"),
            PathBuf::from("classes/Foo.cls.tmp")
        );
    }

    #[test]
    fn stage_copies_existing_and_skips_missing() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("Foo.cls");
        let absent = tmp.path().join("Bar.cls");
        fs::write(&present, "local").unwrap();

        let staged = stage(&[component(vec![present.clone(), absent.clone()])], ".tmp").unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(fs::read_to_string(tmp.path().join("Foo.cls.tmp")).unwrap(), "local");
        assert!(!tmp.path().join("Bar.cls.tmp").exists());
    }

    #[test]
    fn purge_removes_only_matching_names() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("classes");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Foo.cls"), "x").unwrap();
        fs::write(nested.join("Foo.cls.tmp"), "x").unwrap();
        fs::write(nested.join("Foo.cls.dtmp"), "x").unwrap();

        assert_eq!(purge(tmp.path(), ".tmp").unwrap(), 1);
        assert!(nested.join("Foo.cls").exists());
        assert!(nested.join("Foo.cls.dtmp").exists());
        assert!(!nested.join("Foo.cls.tmp").exists());
    }

    #[test]
    fn purge_keeps_files_inside_directories_named_like_the_suffix() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build.tmp").join("classes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Foo.cls"), "live").unwrap();
        fs::write(dir.join("Foo.cls.tmp"), "staged").unwrap();

        assert_eq!(purge(tmp.path(), ".tmp").unwrap(), 1);
        assert_eq!(fs::read_to_string(dir.join("Foo.cls")).unwrap(), "live");
        assert!(!dir.join("Foo.cls.tmp").exists());
        assert!(tmp.path().join("build.tmp").is_dir());
    }

    #[test]
    fn purge_of_missing_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(purge(&tmp.path().join("nope"), ".tmp").unwrap(), 0);
    }

    #[test]
    fn guard_purges_on_drop() {
        let tmp = TempDir::new().unwrap();
        let staged = tmp.path().join("Foo.cls.tmp");
        {
            let _guard = PurgeGuard::new(tmp.path(), ".tmp");
            fs::write(&staged, "x").unwrap();
        }
        assert!(!staged.exists());
    }
}
