//! Desired replica count updates

use tracing::debug;

use super::Reallocator;
use crate::deployment::DeploymentSnapshot;
use crate::error::Stage;
use crate::retry::retry_fixed;
use crate::{Error, Result};

impl Reallocator {
    /// Patch `spec.replicas` to `target`, then read the deployment back.
    ///
    /// The patch is retried at a fixed interval up to the configured cap;
    /// re-sending the same count is harmless. The read-back is not retried.
    pub async fn set_replicas(&self, target: i32) -> Result<DeploymentSnapshot> {
        let client = self.client.as_ref();
        let handle = &self.handle;

        retry_fixed(&self.config.retry(), "patch_replicas", || {
            client.patch_replicas(handle, target)
        })
        .await
        .map_err(|exhausted| {
            Error::reallocation(
                &handle.name,
                Stage::SetReplicas,
                exhausted.attempts,
                Some(exhausted.last_error),
            )
        })?;

        let snapshot = self.fetch().await?;
        debug!(
            deployment = %handle,
            replicas = snapshot.desired_replicas(),
            generation = snapshot.generation(),
            "Replica count updated"
        );
        Ok(snapshot)
    }
}
