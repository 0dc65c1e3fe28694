//! Metadata catalog: which folder and which files make up a component of a
//! given metadata type.
//!
//! The catalog is built once at startup (built-ins plus any `metadata_types`
//! from config) and only read afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Component, ComponentIdentity, ComponentRequest, MetadataTypeName};

/// How the files of one component are laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileLayout {
    /// One file: `<folder>/<name><extension>`.
    Single { extension: String },
    /// A directory `<folder>/<name>/` holding `<name><suffix>` per suffix.
    Bundle { suffixes: Vec<String> },
}

/// On-disk shape of one metadata type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub folder: String,
    #[serde(flatten)]
    pub layout: FileLayout,
}

impl TypeDescriptor {
    pub fn single(folder: &str, extension: &str) -> Self {
        Self {
            folder: folder.to_string(),
            layout: FileLayout::Single {
                extension: extension.to_string(),
            },
        }
    }

    pub fn bundle(folder: &str, suffixes: &[&str]) -> Self {
        Self {
            folder: folder.to_string(),
            layout: FileLayout::Bundle {
                suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataCatalog {
    types: BTreeMap<MetadataTypeName, TypeDescriptor>,
}

impl MetadataCatalog {
    /// The metadata types supported out of the box.
    pub fn builtin() -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            MetadataTypeName::from("ApexClass"),
            TypeDescriptor::single("classes", ".cls"),
        );
        types.insert(
            MetadataTypeName::from("ApexPage"),
            TypeDescriptor::single("pages", ".page"),
        );
        types.insert(
            MetadataTypeName::from("LightningComponentBundle"),
            TypeDescriptor::bundle("lwc", &[".js", ".css", ".html"]),
        );
        types.insert(
            MetadataTypeName::from("AuraDefinitionBundle"),
            TypeDescriptor::bundle(
                "aura",
                &[".cmp", "Controller.js", "Helper.js", ".design", ".css"],
            ),
        );
        Self { types }
    }

    /// Add or replace type descriptors, typically from `config.yaml`.
    pub fn with_types(
        mut self,
        extra: impl IntoIterator<Item = (MetadataTypeName, TypeDescriptor)>,
    ) -> Self {
        self.types.extend(extra);
        self
    }

    pub fn descriptor(&self, type_name: &MetadataTypeName) -> Result<&TypeDescriptor, CoreError> {
        self.types
            .get(type_name)
            .ok_or_else(|| CoreError::UnknownMetadataType {
                type_name: type_name.0.clone(),
            })
    }

    pub fn resolve_folder(&self, type_name: &MetadataTypeName) -> Result<&str, CoreError> {
        Ok(&self.descriptor(type_name)?.folder)
    }

    /// File extension of the type, or `""` for bundle types.
    pub fn resolve_extension(&self, type_name: &MetadataTypeName) -> Result<&str, CoreError> {
        match &self.descriptor(type_name)?.layout {
            FileLayout::Single { extension } => Ok(extension),
            FileLayout::Bundle { .. } => Ok(""),
        }
    }

    /// `folder/name.ext` (or `folder/name` for bundles).
    pub fn resolve_identity(
        &self,
        type_name: &MetadataTypeName,
        name: &str,
    ) -> Result<ComponentIdentity, CoreError> {
        let folder = self.resolve_folder(type_name)?;
        let ext = self.resolve_extension(type_name)?;
        Ok(ComponentIdentity(format!("{folder}/{name}{ext}")))
    }

    /// Every physical file of a component under `base_dir`, in declared
    /// suffix order.
    pub fn resolve_bundle_files(
        &self,
        base_dir: &Path,
        type_name: &MetadataTypeName,
        name: &str,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let descriptor = self.descriptor(type_name)?;
        let folder = base_dir.join(&descriptor.folder);
        Ok(match &descriptor.layout {
            FileLayout::Single { extension } => vec![folder.join(format!("{name}{extension}"))],
            FileLayout::Bundle { suffixes } => {
                let dir = folder.join(name);
                suffixes
                    .iter()
                    .map(|suffix| dir.join(format!("{name}{suffix}")))
                    .collect()
            }
        })
    }

    pub fn resolve_component(
        &self,
        base_dir: &Path,
        type_name: &MetadataTypeName,
        name: &str,
    ) -> Result<Component, CoreError> {
        let ext = self.resolve_extension(type_name)?;
        Ok(Component {
            type_name: type_name.clone(),
            name: name.to_string(),
            identity: self.resolve_identity(type_name, name)?,
            remote_key: format!("{name}{ext}"),
            files: self.resolve_bundle_files(base_dir, type_name, name)?,
        })
    }

    /// Resolve every name of every request. The first request naming an
    /// identity wins; later repeats are dropped.
    pub fn resolve_requests(
        &self,
        base_dir: &Path,
        requests: &[ComponentRequest],
    ) -> Result<Vec<Component>, CoreError> {
        let mut components: Vec<Component> = Vec::new();
        for request in requests {
            for name in &request.names {
                let component = self.resolve_component(base_dir, &request.type_name, name)?;
                if !components.iter().any(|c| c.identity == component.identity) {
                    components.push(component);
                }
            }
        }
        Ok(components)
    }
}

impl Default for MetadataCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_identity() {
        let catalog = MetadataCatalog::builtin();
        let id = catalog
            .resolve_identity(&"ApexClass".into(), "Foo")
            .unwrap();
        assert_eq!(id, ComponentIdentity::from("classes/Foo.cls"));
    }

    #[test]
    fn bundle_identity_is_the_bundle_root() {
        let catalog = MetadataCatalog::builtin();
        let id = catalog
            .resolve_identity(&"LightningComponentBundle".into(), "card")
            .unwrap();
        assert_eq!(id, ComponentIdentity::from("lwc/card"));
        assert_eq!(
            catalog
                .resolve_extension(&"LightningComponentBundle".into())
                .unwrap(),
            ""
        );
    }

    #[test]
    fn config_types_extend_the_catalog() {
        let catalog = MetadataCatalog::builtin().with_types([(
            MetadataTypeName::from("ApexTrigger"),
            TypeDescriptor::single("triggers", ".trigger"),
        )]);
        let id = catalog
            .resolve_identity(&"ApexTrigger".into(), "OnAccount")
            .unwrap();
        assert_eq!(id.0, "triggers/OnAccount.trigger");
    }

    #[test]
    fn descriptor_deserializes_from_yaml() {
        let single: TypeDescriptor =
            serde_yaml::from_str("folder: triggers\nsingle:\n  extension: .trigger\n").unwrap();
        assert_eq!(single, TypeDescriptor::single("triggers", ".trigger"));

        let bundle: TypeDescriptor =
            serde_yaml::from_str("folder: lwc\nbundle:\n  suffixes: [.js, .html]\n").unwrap();
        assert_eq!(bundle, TypeDescriptor::bundle("lwc", &[".js", ".html"]));
    }
}
