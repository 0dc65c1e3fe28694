//! Domain types shared by the catalog, the engine, and the CLI.
//!
//! Paths on disk use `PathBuf`; identities are the `/`-separated strings the
//! timestamp store is keyed by.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A metadata type name as the remote platform spells it (e.g. `ApexClass`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetadataTypeName(pub String);

impl fmt::Display for MetadataTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MetadataTypeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MetadataTypeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Canonical key for one component: `folder/name.ext`, or `folder/name` for
/// bundle types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentIdentity(pub String);

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ComponentIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ComponentIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Component request grammar
// ---------------------------------------------------------------------------

/// One `Type:name1,name2,...` argument.
///
/// Names keep their command-line order; duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRequest {
    pub type_name: MetadataTypeName,
    pub names: Vec<String>,
}

impl FromStr for ComponentRequest {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidRequest {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (type_name, names) = input
            .split_once(':')
            .ok_or_else(|| invalid("expected Type:name1,name2"))?;
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(invalid("missing metadata type"));
        }

        let mut parsed: Vec<String> = Vec::new();
        for name in names.split(',').map(str::trim) {
            if name.is_empty() {
                return Err(invalid("empty component name"));
            }
            if !parsed.iter().any(|n| n == name) {
                parsed.push(name.to_string());
            }
        }

        Ok(Self {
            type_name: MetadataTypeName::from(type_name),
            names: parsed,
        })
    }
}

impl fmt::Display for ComponentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.names.join(","))
    }
}

// ---------------------------------------------------------------------------
// Resolved component
// ---------------------------------------------------------------------------

/// A requested component after catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub type_name: MetadataTypeName,
    pub name: String,
    pub identity: ComponentIdentity,
    /// Bare file name the remote listing reports (`name.ext`, or `name` for
    /// bundles).
    pub remote_key: String,
    /// Every physical file belonging to the component, absolute.
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Batch argument
// ---------------------------------------------------------------------------

/// A set of `type:name` pairs sent to the remote in a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentBatch {
    entries: Vec<(MetadataTypeName, String)>,
}

impl ComponentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, type_name: MetadataTypeName, name: impl Into<String>) {
        let name = name.into();
        if !self
            .entries
            .iter()
            .any(|(t, n)| t == &type_name && n == &name)
        {
            self.entries.push((type_name, name));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(MetadataTypeName, String)] {
        &self.entries
    }

    /// Comma-joined `type:name` list, grouped by type in first-seen order.
    pub fn to_arg(&self) -> String {
        let mut types: Vec<&MetadataTypeName> = Vec::new();
        for (type_name, _) in &self.entries {
            if !types.contains(&type_name) {
                types.push(type_name);
            }
        }
        let mut parts = Vec::with_capacity(self.entries.len());
        for type_name in types {
            for (t, name) in &self.entries {
                if t == type_name {
                    parts.push(format!("{t}:{name}"));
                }
            }
        }
        parts.join(",")
    }
}

impl<'a> FromIterator<&'a Component> for ComponentBatch {
    fn from_iter<I: IntoIterator<Item = &'a Component>>(iter: I) -> Self {
        let mut batch = ComponentBatch::new();
        for component in iter {
            batch.push(component.type_name.clone(), component.name.clone());
        }
        batch
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_and_names() {
        let req: ComponentRequest = "ApexClass:Foo,Bar".parse().unwrap();
        assert_eq!(req.type_name, MetadataTypeName::from("ApexClass"));
        assert_eq!(req.names, vec!["Foo".to_string(), "Bar".to_string()]);
    }

    #[test]
    fn duplicate_names_collapse() {
        let req: ComponentRequest = "ApexClass:Foo,Foo, Bar".parse().unwrap();
        assert_eq!(req.names, vec!["Foo".to_string(), "Bar".to_string()]);
    }

    #[test]
    fn rejects_missing_separator_and_empty_names() {
        assert!(matches!(
            "ApexClass".parse::<ComponentRequest>(),
            Err(CoreError::InvalidRequest { .. })
        ));
        assert!(matches!(
            "ApexClass:Foo,,Bar".parse::<ComponentRequest>(),
            Err(CoreError::InvalidRequest { .. })
        ));
        assert!(matches!(
            ":Foo".parse::<ComponentRequest>(),
            Err(CoreError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn batch_arg_groups_types() {
        let mut batch = ComponentBatch::new();
        batch.push("ApexClass".into(), "Foo");
        batch.push("ApexPage".into(), "Home");
        batch.push("ApexClass".into(), "Bar");
        batch.push("ApexClass".into(), "Foo");
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.to_arg(),
            "ApexClass:Foo,ApexClass:Bar,ApexPage:Home"
        );
    }

    #[test]
    fn empty_batch_has_empty_arg() {
        assert_eq!(ComponentBatch::new().to_arg(), "");
    }

    #[test]
    fn request_display_round_trips_grammar() {
        let req: ComponentRequest = "LightningComponentBundle:card,list".parse().unwrap();
        assert_eq!(req.to_string(), "LightningComponentBundle:card,list");
    }
}
