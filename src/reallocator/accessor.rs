//! Deployment reads

use std::collections::BTreeSet;

use tracing::info;

use super::Reallocator;
use crate::client::DeploymentClient;
use crate::deployment::{ConditionType, DeploymentHandle, DeploymentSnapshot};
use crate::{Error, Result};

/// Read the deployment, translating HTTP 404 into [`Error::DeploymentNotFound`].
///
/// Other API errors are returned as-is; retrying is the caller's business.
pub async fn fetch(
    client: &dyn DeploymentClient,
    handle: &DeploymentHandle,
) -> Result<DeploymentSnapshot> {
    match client.get(handle).await {
        Ok(deployment) => Ok(DeploymentSnapshot::new(deployment)),
        Err(e) if e.is_not_found() => {
            info!(deployment = %handle, "Deployment invalid or not found");
            Err(Error::not_found(&handle.name, &handle.namespace))
        }
        Err(e) => Err(e),
    }
}

/// Condition types present on the snapshot
pub fn status_condition_types(snapshot: &DeploymentSnapshot) -> BTreeSet<ConditionType> {
    snapshot.condition_types()
}

impl Reallocator {
    /// Fresh snapshot of the target deployment
    pub async fn fetch(&self) -> Result<DeploymentSnapshot> {
        fetch(self.client.as_ref(), &self.handle).await
    }
}
