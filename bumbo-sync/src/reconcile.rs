//! Reconciliation engine.
//!
//! Per component:
//!
//! ```text
//! Unchanged                                   (remote not newer; accepted)
//! NeedsRetrieve -> Retrieved -> MergedAccepted (every file merged; stamped now)
//!                            -> MergedRejected (a file declined; local restored)
//! ```
//!
//! All components needing retrieval go out in one batched call. Merges then
//! fan out one task per physical file and are all joined before any state is
//! folded back, so one failing file never stops its siblings.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use bumbo_core::{Component, ComponentBatch};

use crate::inventory::RemoteLastModified;
use crate::merge::{merge_file, FileOutcome, MergeTool};
use crate::remote::Org;
use crate::staging::staged_path;
use crate::timestamp_store::{RetrieveStamp, TimestampRecord};
use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Unchanged,
    NeedsRetrieve,
    Retrieved,
    MergedAccepted,
    MergedRejected,
}

impl ComponentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ComponentState::Unchanged
                | ComponentState::MergedAccepted
                | ComponentState::MergedRejected
        )
    }
}

/// Merge outcome of one physical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMerge {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Where one component ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentReport {
    pub component: Component,
    pub state: ComponentState,
    pub files: Vec<FileMerge>,
}

impl ComponentReport {
    /// Accepted components are stamped and deployed; unchanged ones count.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self.state,
            ComponentState::Unchanged | ComponentState::MergedAccepted
        )
    }
}

/// Decide, without side effects, which components need retrieval.
pub fn classify(
    components: &[Component],
    record: &TimestampRecord,
    remote: &RemoteLastModified,
) -> Vec<ComponentReport> {
    components
        .iter()
        .map(|component| {
            let stored = record.get(&component.identity);
            let state = if stored.needs_retrieve(remote.get(&component.remote_key)) {
                ComponentState::NeedsRetrieve
            } else {
                tracing::debug!("{} is up to date", component.identity);
                ComponentState::Unchanged
            };
            ComponentReport {
                component: component.clone(),
                state,
                files: Vec::new(),
            }
        })
        .collect()
}

/// Drives components from classification to a terminal state.
pub struct Reconciler {
    org: Arc<dyn Org>,
    merge_tool: Arc<dyn MergeTool>,
    suffix: String,
}

impl Reconciler {
    pub fn new(org: Arc<dyn Org>, merge_tool: Arc<dyn MergeTool>, suffix: impl Into<String>) -> Self {
        Self {
            org,
            merge_tool,
            suffix: suffix.into(),
        }
    }

    /// Retrieve, merge, and fold outcomes into `record`.
    ///
    /// Accepted merges set the component's stamp to `now`; rejected ones
    /// leave it alone. Returns the batch that was retrieved alongside the
    /// per-component reports.
    pub async fn reconcile(
        &self,
        components: &[Component],
        record: &mut TimestampRecord,
        remote: &RemoteLastModified,
        now: i64,
    ) -> Result<(Vec<ComponentReport>, ComponentBatch), SyncError> {
        let mut reports = classify(components, record, remote);

        let batch: ComponentBatch = reports
            .iter()
            .filter(|r| r.state == ComponentState::NeedsRetrieve)
            .map(|r| &r.component)
            .collect();
        if batch.is_empty() {
            tracing::info!("all {} component(s) up to date", reports.len());
            return Ok((reports, batch));
        }

        tracing::info!("retrieving {}", batch.to_arg());
        let org = self.org.clone();
        let call = batch.clone();
        blocking(move || org.retrieve(&call))
            .await?
            .map_err(|e| SyncError::RetrieveFailed {
                batch: batch.to_arg(),
                message: e.to_string(),
            })?;
        for report in reports
            .iter_mut()
            .filter(|r| r.state == ComponentState::NeedsRetrieve)
        {
            report.state = ComponentState::Retrieved;
        }

        let restore_error = self.merge_retrieved(&mut reports).await?;

        for report in reports
            .iter_mut()
            .filter(|r| r.state == ComponentState::Retrieved)
        {
            if report.files.iter().all(|f| f.outcome.is_accepted()) {
                report.state = ComponentState::MergedAccepted;
                record.set(report.component.identity.clone(), RetrieveStamp::At(now));
            } else {
                report.state = ComponentState::MergedRejected;
                tracing::warn!("merge on {} not accepted", report.component.identity);
            }
        }

        match restore_error {
            Some(err) => Err(err),
            None => Ok((reports, batch)),
        }
    }

    /// Run the merge step for every file of every retrieved component.
    ///
    /// Fills `files` on each report. The first failed restore is returned
    /// after every task has been joined.
    async fn merge_retrieved(
        &self,
        reports: &mut [ComponentReport],
    ) -> Result<Option<SyncError>, SyncError> {
        let mut tasks = JoinSet::new();
        for (component_idx, report) in reports.iter().enumerate() {
            if report.state != ComponentState::Retrieved {
                continue;
            }
            for (file_idx, live) in report.component.files.iter().enumerate() {
                let tool = self.merge_tool.clone();
                let live = live.clone();
                let staged = staged_path(&live, &self.suffix);
                tasks.spawn(async move {
                    let result =
                        tokio::task::spawn_blocking(move || merge_file(tool.as_ref(), &live, &staged))
                            .await
                            .unwrap_or_else(|e| {
                                Ok(FileOutcome::Failed {
                                    message: format!("merge task failed: {e}"),
                                })
                            });
                    (component_idx, file_idx, result)
                });
            }
        }

        let mut outcomes: Vec<Vec<Option<FileOutcome>>> = reports
            .iter()
            .map(|r| vec![None; r.component.files.len()])
            .collect();
        let mut restore_error = None;
        while let Some(joined) = tasks.join_next().await {
            let (component_idx, file_idx, result) =
                joined.map_err(|e| SyncError::Task(e.to_string()))?;
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!("{err}");
                    let message = err.to_string();
                    restore_error.get_or_insert(err);
                    FileOutcome::Failed { message }
                }
            };
            if let FileOutcome::Failed { message } = &outcome {
                tracing::warn!(
                    "merge tool failed on {}: {message}",
                    reports[component_idx].component.files[file_idx].display()
                );
            }
            outcomes[component_idx][file_idx] = Some(outcome);
        }

        for (report, file_outcomes) in reports.iter_mut().zip(outcomes) {
            report.files = report
                .component
                .files
                .iter()
                .zip(file_outcomes)
                .filter_map(|(path, outcome)| {
                    outcome.map(|outcome| FileMerge {
                        path: path.clone(),
                        outcome,
                    })
                })
                .collect();
        }
        Ok(restore_error)
    }
}

/// Run a blocking call on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, SyncError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Task(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::RemoteLastModified;
    use crate::remote::RemoteFileProperties;

    fn component(name: &str) -> Component {
        Component {
            type_name: "ApexClass".into(),
            name: name.to_string(),
            identity: format!("classes/{name}.cls").into(),
            remote_key: format!("{name}.cls"),
            files: vec![PathBuf::from(format!("/p/classes/{name}.cls"))],
        }
    }

    fn remote(entries: &[(&str, &str)]) -> RemoteLastModified {
        let listing: Vec<RemoteFileProperties> = entries
            .iter()
            .map(|(f, d)| RemoteFileProperties {
                file_name: f.to_string(),
                last_modified_date: d.to_string(),
            })
            .collect();
        RemoteLastModified::from_listing(&listing)
    }

    #[test]
    fn never_retrieved_always_needs_retrieve() {
        let components = [component("Foo")];
        let record = TimestampRecord::initialize(components.iter().map(|c| &c.identity));
        let reports = classify(&components, &record, &RemoteLastModified::default());
        assert_eq!(reports[0].state, ComponentState::NeedsRetrieve);
    }

    #[test]
    fn remote_not_newer_is_unchanged_and_accepted() {
        let components = [component("Foo"), component("Bar")];
        let mut record = TimestampRecord::default();
        record.set("classes/Foo.cls".into(), RetrieveStamp::At(1000));
        record.set("classes/Bar.cls".into(), RetrieveStamp::At(1000));
        let remote = remote(&[
            ("classes/Foo.cls", "1970-01-01T00:00:01.000Z"),
            ("classes/Bar.cls", "1970-01-01T00:00:01.001Z"),
        ]);

        let reports = classify(&components, &record, &remote);
        assert_eq!(reports[0].state, ComponentState::Unchanged);
        assert!(reports[0].is_accepted());
        assert!(reports[0].state.is_terminal());
        assert_eq!(reports[1].state, ComponentState::NeedsRetrieve);
        assert!(!reports[1].state.is_terminal());
    }
}
