//! Pod-template node affinity updates
//!
//! The affinity is applied with a whole-object replace, so every retry works
//! from a freshly read deployment: resubmitting a stale object would either
//! conflict on `resourceVersion` again or overwrite someone else's change.

use tracing::{debug, error, warn};

use super::Reallocator;
use crate::deployment::{AffinityPreference, DeploymentSnapshot};
use crate::error::Stage;
use crate::retry::retry_fixed;
use crate::{Error, Result};

impl Reallocator {
    /// Replace the pod-template affinity with a single weight-1 preferred term
    /// on the given hostnames, starting from `current`.
    ///
    /// The first attempt submits `current`; each later attempt re-reads the
    /// deployment first. If every attempt fails, the replica count is restored
    /// to [`Reallocator::original_replicas`] before the error is returned.
    pub async fn set_affinity_avoiding(
        &self,
        current: DeploymentSnapshot,
        hostnames: &[String],
    ) -> Result<DeploymentSnapshot> {
        let preference = AffinityPreference::for_nodes(hostnames);
        let mut attempt = 0u32;
        let current = &current;
        let preference = &preference;

        let result = retry_fixed(&self.config.retry(), "replace_affinity", || {
            let first = attempt == 0;
            attempt += 1;
            async move {
                let base = if first {
                    current.clone()
                } else {
                    self.fetch().await?
                };
                let desired = base.with_affinity(preference);
                self.client.replace(&self.handle, &desired).await
            }
        })
        .await;

        match result {
            Ok(()) => {
                let snapshot = self.fetch().await?;
                debug!(
                    deployment = %self.handle,
                    generation = snapshot.generation(),
                    "Affinity updated"
                );
                Ok(snapshot)
            }
            Err(exhausted) => {
                warn!(
                    deployment = %self.handle,
                    replicas = self.original_replicas,
                    "Affinity update exhausted retries, restoring replicas"
                );
                if let Err(rollback) = self.set_replicas(self.original_replicas).await {
                    error!(
                        deployment = %self.handle,
                        error = %rollback,
                        "Replica rollback failed"
                    );
                    return Err(rollback);
                }
                Err(Error::reallocation(
                    &self.handle.name,
                    Stage::SetAffinity,
                    exhausted.attempts,
                    Some(exhausted.last_error),
                ))
            }
        }
    }
}
