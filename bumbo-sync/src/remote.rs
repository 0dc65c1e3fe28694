//! Remote org seam.
//!
//! [`Org`] is the only way the engine talks to the remote platform. [`SfdxCli`]
//! implements it by shelling out to the `sfdx` command line; tests use
//! in-memory fakes.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

use bumbo_core::{ComponentBatch, MetadataTypeName};

/// One entry of a remote metadata listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileProperties {
    /// Remote path such as `classes/Foo.cls` or `lwc/card`.
    pub file_name: String,
    /// ISO-8601 instant.
    pub last_modified_date: String,
}

/// A failed remote call, carrying whatever the transport reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

/// Handle to a remote org. Every call blocks until the remote side finishes.
pub trait Org: Send + Sync {
    /// List every remote component of `types`.
    fn list_metadata(
        &self,
        types: &[MetadataTypeName],
        api_version: &str,
    ) -> Result<Vec<RemoteFileProperties>, RemoteError>;

    /// Pull the remote version of every component in `batch` over the live files.
    fn retrieve(&self, batch: &ComponentBatch) -> Result<(), RemoteError>;

    /// Push the local version of every component in `batch`.
    fn deploy(&self, batch: &ComponentBatch) -> Result<(), RemoteError>;
}

/// [`Org`] backed by the `sfdx` executable, run from the project root.
#[derive(Debug, Clone)]
pub struct SfdxCli {
    pub bin: String,
    pub project_root: PathBuf,
    pub target_org: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListMetadataOutput {
    #[serde(default)]
    result: Option<OneOrMany>,
}

// `listmetadata --json` collapses a single-element result into an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RemoteFileProperties>),
    One(RemoteFileProperties),
}

impl SfdxCli {
    pub fn new(bin: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            project_root: project_root.into(),
            target_org: None,
        }
    }

    pub fn with_target_org(mut self, target_org: Option<String>) -> Self {
        self.target_org = target_org;
        self
    }

    fn run(&self, mut args: Vec<String>) -> Result<String, RemoteError> {
        if let Some(org) = &self.target_org {
            args.push("-u".to_string());
            args.push(org.clone());
        }
        tracing::debug!("running {} {}", self.bin, args.join(" "));
        let output = Command::new(&self.bin)
            .args(&args)
            .current_dir(&self.project_root)
            .output()
            .map_err(|e| RemoteError(format!("failed to run {}: {e}", self.bin)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(RemoteError(format!(
            "{} {} failed (status {}): {} {}",
            self.bin,
            args.first().map(String::as_str).unwrap_or_default(),
            output.status,
            stdout,
            stderr
        )))
    }
}

impl Org for SfdxCli {
    fn list_metadata(
        &self,
        types: &[MetadataTypeName],
        api_version: &str,
    ) -> Result<Vec<RemoteFileProperties>, RemoteError> {
        let mut listed = Vec::new();
        for type_name in types {
            let stdout = self.run(vec![
                "force:mdapi:listmetadata".to_string(),
                "-m".to_string(),
                type_name.0.clone(),
                "-a".to_string(),
                api_version.to_string(),
                "--json".to_string(),
            ])?;
            listed.extend(parse_list_output(&stdout)?);
        }
        Ok(listed)
    }

    fn retrieve(&self, batch: &ComponentBatch) -> Result<(), RemoteError> {
        self.run(vec![
            "force:source:retrieve".to_string(),
            "-m".to_string(),
            batch.to_arg(),
        ])
        .map(|_| ())
    }

    fn deploy(&self, batch: &ComponentBatch) -> Result<(), RemoteError> {
        self.run(vec![
            "force:source:deploy".to_string(),
            "-m".to_string(),
            batch.to_arg(),
        ])
        .map(|_| ())
    }
}

fn parse_list_output(stdout: &str) -> Result<Vec<RemoteFileProperties>, RemoteError> {
    let parsed: ListMetadataOutput = serde_json::from_str(stdout)
        .map_err(|e| RemoteError(format!("unreadable listmetadata output: {e}")))?;
    Ok(match parsed.result {
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(one)) => vec![one],
        None => Vec::new(),
    })
}
