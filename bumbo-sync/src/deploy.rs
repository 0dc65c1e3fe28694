//! Deploy trigger: one batched deploy of every accepted component.

use std::sync::Arc;

use bumbo_core::ComponentBatch;

use crate::reconcile::{blocking, ComponentReport};
use crate::remote::Org;
use crate::SyncError;

/// `type:name` pairs of every accepted component, in report order.
pub fn accepted_batch(reports: &[ComponentReport]) -> ComponentBatch {
    reports
        .iter()
        .filter(|r| r.is_accepted())
        .map(|r| &r.component)
        .collect()
}

/// Deploy every accepted component in a single call.
///
/// Returns `None` without calling the org when nothing was accepted.
pub async fn deploy(
    org: Arc<dyn Org>,
    reports: &[ComponentReport],
) -> Result<Option<ComponentBatch>, SyncError> {
    let batch = accepted_batch(reports);
    if batch.is_empty() {
        tracing::info!("nothing accepted, skipping deploy");
        return Ok(None);
    }

    tracing::info!("deploying {}", batch.to_arg());
    let call = batch.clone();
    blocking(move || org.deploy(&call))
        .await?
        .map_err(|e| SyncError::DeployFailed {
            batch: batch.to_arg(),
            message: e.to_string(),
        })?;
    Ok(Some(batch))
}
