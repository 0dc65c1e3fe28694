//! Timestamp store: last successful retrieve per component.
//!
//! Persists a plain-text file at `<project>/.bumbo/retrieve_timestamps`:
//!
//! ```text
//! classes/Foo.cls:1571234567890,lwc/card:-1
//! ```
//!
//! Writes go to a `.swap` sidecar that is then renamed over the store.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use bumbo_core::ComponentIdentity;

use crate::error::{store_err, SyncError};

/// Last retrieve instant of one component, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RetrieveStamp {
    /// Written as `-1`.
    Never,
    At(i64),
}

impl RetrieveStamp {
    const NEVER_SENTINEL: i64 = -1;

    pub fn from_millis(millis: i64) -> Self {
        if millis == Self::NEVER_SENTINEL {
            RetrieveStamp::Never
        } else {
            RetrieveStamp::At(millis)
        }
    }

    pub fn as_millis(self) -> i64 {
        match self {
            RetrieveStamp::Never => Self::NEVER_SENTINEL,
            RetrieveStamp::At(ms) => ms,
        }
    }

    /// Whether a remote copy last modified at `remote` must be retrieved.
    ///
    /// Never-retrieved components always are; otherwise only when the remote
    /// is strictly newer. A component missing from the remote listing is not.
    pub fn needs_retrieve(self, remote: Option<i64>) -> bool {
        match self {
            RetrieveStamp::Never => true,
            RetrieveStamp::At(stored) => remote.is_some_and(|r| stored < r),
        }
    }
}

impl fmt::Display for RetrieveStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_millis())
    }
}

/// In-memory timestamp record keyed by component identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimestampRecord {
    entries: BTreeMap<ComponentIdentity, RetrieveStamp>,
}

impl TimestampRecord {
    /// Seed every requested identity as never retrieved.
    pub fn initialize<'a>(identities: impl IntoIterator<Item = &'a ComponentIdentity>) -> Self {
        Self {
            entries: identities
                .into_iter()
                .map(|id| (id.clone(), RetrieveStamp::Never))
                .collect(),
        }
    }

    /// Unknown identities read as never retrieved.
    pub fn get(&self, identity: &ComponentIdentity) -> RetrieveStamp {
        self.entries
            .get(identity)
            .copied()
            .unwrap_or(RetrieveStamp::Never)
    }

    pub fn set(&mut self, identity: ComponentIdentity, stamp: RetrieveStamp) {
        self.entries.insert(identity, stamp);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentIdentity, RetrieveStamp)> {
        self.entries.iter().map(|(id, stamp)| (id, *stamp))
    }

    /// `identity:instant` pairs joined by commas, no trailing comma.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(id, stamp)| format!("{id}:{stamp}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parse store contents. Any bad entry fails the whole parse.
///
/// Blank contents parse as an empty list.
pub fn parse(
    path: &Path,
    contents: &str,
) -> Result<Vec<(ComponentIdentity, RetrieveStamp)>, SyncError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    contents
        .split(',')
        .map(|block| {
            let corrupt = || SyncError::CorruptStore {
                path: path.to_path_buf(),
                entry: block.to_string(),
            };
            let (identity, instant) = block.rsplit_once(':').ok_or_else(corrupt)?;
            let identity = identity.trim();
            if identity.is_empty() {
                return Err(corrupt());
            }
            let millis: i64 = instant.trim().parse().map_err(|_| corrupt())?;
            Ok((
                ComponentIdentity::from(identity),
                RetrieveStamp::from_millis(millis),
            ))
        })
        .collect()
}

/// Overlay the persisted store at `path` onto `record`.
///
/// A missing file leaves `record` untouched. On a corrupt file nothing is
/// applied.
pub fn load_into(path: &Path, record: &mut TimestampRecord) -> Result<(), SyncError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no timestamp store at {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(store_err(path, e)),
    };
    for (identity, stamp) in parse(path, &contents)? {
        record.set(identity, stamp);
    }
    Ok(())
}

/// Overwrite the store at `path` with the complete `record`.
///
/// Writes to `<path>.swap` then renames to `<path>`.
pub fn save(path: &Path, record: &TimestampRecord) -> Result<(), SyncError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| store_err(dir, e))?;
    }
    let swap = path.with_extension("swap");
    std::fs::write(&swap, record.serialize()).map_err(|e| store_err(&swap, e))?;
    if let Err(e) = std::fs::rename(&swap, path) {
        let _ = std::fs::remove_file(&swap);
        return Err(store_err(path, e));
    }
    tracing::info!(
        "wrote {} timestamp(s) to {}",
        record.len(),
        path.display()
    );
    Ok(())
}
