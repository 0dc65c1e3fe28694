//! Session pipeline shared by `bumbo retrieve` and `bumbo deploy`.
//!
//! 1. Resolve requested components through the catalog.
//! 2. Arm the staged-file purge guard.
//! 3. Query remote last-modified instants.
//! 4. Sweep staged leftovers from a crashed run.
//! 5. Seed and load the timestamp record.
//! 6. Stage local copies.
//! 7. Retrieve, merge, and fold outcomes.
//! 8. Deploy flow only: deploy accepted components.
//! 9. Save timestamps.
//!
//! Concurrent sessions against one project are not coordinated; callers must
//! not run two at once.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use bumbo_core::{
    project::{DEPLOY_SUFFIX, RETRIEVE_SUFFIX},
    ComponentBatch, ComponentRequest, MetadataCatalog, ProjectLayout,
};

use crate::deploy;
use crate::inventory::{fetch_last_modified, requested_types};
use crate::merge::MergeTool;
use crate::reconcile::{blocking, ComponentReport, Reconciler};
use crate::remote::Org;
use crate::staging::{self, PurgeGuard};
use crate::timestamp_store::{self, RetrieveStamp, TimestampRecord};
use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Retrieve,
    Deploy,
}

impl Flow {
    pub fn suffix(self) -> &'static str {
        match self {
            Flow::Retrieve => RETRIEVE_SUFFIX,
            Flow::Deploy => DEPLOY_SUFFIX,
        }
    }
}

/// Outcome of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub flow: Flow,
    pub components: Vec<ComponentReport>,
    /// Batch sent to the retrieve call, empty when nothing was newer.
    pub retrieved: ComponentBatch,
    /// Batch sent to the deploy call; `None` when no call was made.
    pub deployed: Option<ComponentBatch>,
}

impl SessionReport {
    pub fn accepted(&self) -> impl Iterator<Item = &ComponentReport> {
        self.components.iter().filter(|r| r.is_accepted())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ComponentReport> {
        self.components.iter().filter(|r| !r.is_accepted())
    }
}

pub struct Session {
    layout: ProjectLayout,
    catalog: MetadataCatalog,
    org: Arc<dyn Org>,
    merge_tool: Arc<dyn MergeTool>,
    api_version: String,
}

impl Session {
    pub fn new(
        layout: ProjectLayout,
        catalog: MetadataCatalog,
        org: Arc<dyn Org>,
        merge_tool: Arc<dyn MergeTool>,
    ) -> Self {
        Self {
            layout,
            catalog,
            org,
            merge_tool,
            api_version: bumbo_core::config::DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Bring requested components up to date with the org.
    ///
    /// The full timestamp record, including entries this session did not
    /// request, is written back.
    pub async fn retrieve(&self, requests: &[ComponentRequest]) -> Result<SessionReport, SyncError> {
        self.run(Flow::Retrieve, requests).await
    }

    /// Reconcile, then deploy every accepted component.
    ///
    /// Only the requested components are written to the store, and only after
    /// the deploy succeeded. A failed deploy leaves the store untouched.
    pub async fn deploy(&self, requests: &[ComponentRequest]) -> Result<SessionReport, SyncError> {
        self.run(Flow::Deploy, requests).await
    }

    async fn run(&self, flow: Flow, requests: &[ComponentRequest]) -> Result<SessionReport, SyncError> {
        let suffix = flow.suffix();
        let components = self
            .catalog
            .resolve_requests(&self.layout.package_dir, requests)?;

        let _purge = PurgeGuard::new(&self.layout.root, suffix);

        let org = self.org.clone();
        let types = requested_types(&components);
        let api_version = self.api_version.clone();
        let remote =
            blocking(move || fetch_last_modified(org.as_ref(), &types, &api_version)).await??;

        staging::purge(&self.layout.root, suffix)?;
        self.layout.ensure_config_dir()?;

        let store_path = self.layout.store_path();
        let mut record = TimestampRecord::initialize(components.iter().map(|c| &c.identity));
        timestamp_store::load_into(&store_path, &mut record)?;

        staging::stage(&components, suffix)?;

        let now = Utc::now().timestamp_millis();
        let reconciler = Reconciler::new(self.org.clone(), self.merge_tool.clone(), suffix);
        let (reports, retrieved) = reconciler
            .reconcile(&components, &mut record, &remote, now)
            .await?;

        let deployed = match flow {
            Flow::Retrieve => {
                timestamp_store::save(&store_path, &record)?;
                None
            }
            Flow::Deploy => {
                let deployed = deploy::deploy(self.org.clone(), &reports).await?;
                let deployed_at = Utc::now().timestamp_millis();
                let mut written = TimestampRecord::default();
                for report in &reports {
                    let identity = report.component.identity.clone();
                    let stamp = if report.is_accepted() {
                        RetrieveStamp::At(deployed_at)
                    } else {
                        record.get(&identity)
                    };
                    written.set(identity, stamp);
                }
                timestamp_store::save(&store_path, &written)?;
                deployed
            }
        };

        Ok(SessionReport {
            flow,
            components: reports,
            retrieved,
            deployed,
        })
    }
}
