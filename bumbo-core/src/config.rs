//! Project configuration (`.bumbo/config.yaml`).
//!
//! Layers, highest first: `<project>/.bumbo/config.yaml`,
//! `~/.bumbo/config.yaml`, defaults. Each key comes from the highest layer that
//! sets it. `BUMBO_MERGE_TOOL` overrides `merge_tool` from any layer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{MetadataCatalog, TypeDescriptor};
use crate::error::{io_err, CoreError};
use crate::project::{ProjectLayout, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PACKAGE_DIR};
use crate::types::MetadataTypeName;

pub const MERGE_TOOL_ENV: &str = "BUMBO_MERGE_TOOL";
pub const DEFAULT_API_VERSION: &str = "47.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BumboConfig {
    pub merge_tool: Option<PathBuf>,
    pub sfdx_bin: String,
    pub api_version: String,
    pub target_org: Option<String>,
    pub package_dir: PathBuf,
    pub metadata_types: BTreeMap<MetadataTypeName, TypeDescriptor>,
}

impl Default for BumboConfig {
    fn default() -> Self {
        Self {
            merge_tool: None,
            sfdx_bin: "sfdx".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            target_org: None,
            package_dir: PathBuf::from(DEFAULT_PACKAGE_DIR),
            metadata_types: BTreeMap::new(),
        }
    }
}

impl BumboConfig {
    /// Load config for the project rooted at `root`, layered over the
    /// user-level file under `home` (when given).
    ///
    /// Keys the project file leaves unset fall through to the user file, then
    /// to defaults. `metadata_types` entries are merged, project entries
    /// winning.
    pub fn load_at(root: &Path, home: Option<&Path>) -> Result<Self, CoreError> {
        let project_file = ProjectLayout::new(root).config_path();
        let user_file = home.map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));

        let project = ConfigLayer::read(&project_file)?.unwrap_or_default();
        let user = match user_file {
            Some(path) => ConfigLayer::read(&path)?.unwrap_or_default(),
            None => ConfigLayer::default(),
        };
        let mut config = project.over(user).resolve();

        if let Some(tool) = std::env::var_os(MERGE_TOOL_ENV) {
            if !tool.is_empty() {
                config.merge_tool = Some(PathBuf::from(tool));
            }
        }
        Ok(config)
    }

    /// `load_at` convenience wrapper using `dirs::home_dir()`.
    pub fn load(root: &Path) -> Result<Self, CoreError> {
        Self::load_at(root, dirs::home_dir().as_deref())
    }

    /// A single config file over defaults.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(ConfigLayer::parse(path, &contents)?.resolve())
    }

    pub fn layout(&self, root: &Path) -> ProjectLayout {
        ProjectLayout::new(root).with_package_dir(&self.package_dir)
    }

    pub fn catalog(&self) -> MetadataCatalog {
        MetadataCatalog::builtin().with_types(self.metadata_types.clone())
    }
}

/// The keys one config file actually sets.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    merge_tool: Option<PathBuf>,
    sfdx_bin: Option<String>,
    api_version: Option<String>,
    target_org: Option<String>,
    package_dir: Option<PathBuf>,
    metadata_types: BTreeMap<MetadataTypeName, TypeDescriptor>,
}

impl ConfigLayer {
    /// `None` when `path` does not exist.
    fn read(path: &Path) -> Result<Option<Self>, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(path, &contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(path, e)),
        }
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, CoreError> {
        // A file holding only comments parses as null.
        if contents.lines().all(|l| {
            let l = l.trim();
            l.is_empty() || l.starts_with('#')
        }) {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `self` wins wherever it sets a key.
    fn over(self, lower: ConfigLayer) -> ConfigLayer {
        let mut metadata_types = lower.metadata_types;
        metadata_types.extend(self.metadata_types);
        ConfigLayer {
            merge_tool: self.merge_tool.or(lower.merge_tool),
            sfdx_bin: self.sfdx_bin.or(lower.sfdx_bin),
            api_version: self.api_version.or(lower.api_version),
            target_org: self.target_org.or(lower.target_org),
            package_dir: self.package_dir.or(lower.package_dir),
            metadata_types,
        }
    }

    fn resolve(self) -> BumboConfig {
        let defaults = BumboConfig::default();
        BumboConfig {
            merge_tool: self.merge_tool,
            sfdx_bin: self.sfdx_bin.unwrap_or(defaults.sfdx_bin),
            api_version: self.api_version.unwrap_or(defaults.api_version),
            target_org: self.target_org,
            package_dir: self.package_dir.unwrap_or(defaults.package_dir),
            metadata_types: self.metadata_types,
        }
    }
}
