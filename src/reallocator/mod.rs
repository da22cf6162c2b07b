//! Deployment reallocation
//!
//! A [`Reallocator`] moves the pods of one deployment off a set of nodes. It
//! is built from four pieces layered on the same [`DeploymentHandle`]:
//!
//! - [`accessor`] reads the deployment and projects its status conditions
//! - [`replicas`] patches the desired replica count with bounded retry
//! - [`affinity`] replaces the pod-template node affinity with bounded retry
//!   and rolls the replica count back when it gives up
//! - [`workflow`] runs the soft attempt, escalates to hard mode when
//!   `ReplicaFailure` persists, and waits for convergence
//!
//! The soft attempt starts from the snapshot read at construction, and each
//! step hands the fresh [`DeploymentSnapshot`] it read back to the next one,
//! so the state flows explicitly through the workflow instead of living in a
//! mutable field. A [`Reallocator`] is consumed by its single run.

pub mod accessor;
pub mod affinity;
pub mod replicas;
pub mod workflow;

use std::sync::Arc;

use tracing::info;

use crate::client::DeploymentClient;
use crate::config::ReallocatorConfig;
use crate::deployment::{DeploymentHandle, DeploymentSnapshot};
use crate::Result;

pub use workflow::{Phase, ReallocationOutcome, SoftAttempt};

/// Orchestrates reallocation of a single deployment
///
/// At most one reallocation should run against a given deployment at a time;
/// concurrent runs are not coordinated and race on the affinity replace.
pub struct Reallocator {
    client: Arc<dyn DeploymentClient>,
    handle: DeploymentHandle,
    config: ReallocatorConfig,
    initial: DeploymentSnapshot,
    original_replicas: i32,
}

impl Reallocator {
    /// Read the target deployment and record its replica count.
    ///
    /// Fails with [`crate::Error::DeploymentNotFound`] if it does not exist
    /// and with [`crate::Error::Kube`] for any other API failure.
    pub async fn new(
        client: Arc<dyn DeploymentClient>,
        handle: DeploymentHandle,
        config: ReallocatorConfig,
    ) -> Result<Self> {
        let initial = accessor::fetch(client.as_ref(), &handle).await?;
        let original_replicas = initial.desired_replicas();

        info!(
            deployment = %handle,
            replicas = original_replicas,
            generation = initial.generation(),
            "Loaded deployment"
        );

        Ok(Self {
            client,
            handle,
            config,
            initial,
            original_replicas,
        })
    }

    /// Target deployment
    pub fn handle(&self) -> &DeploymentHandle {
        &self.handle
    }

    /// Replica count read at construction; the rollback target
    pub fn original_replicas(&self) -> i32 {
        self.original_replicas
    }

    /// Snapshot read at construction
    pub fn initial_snapshot(&self) -> &DeploymentSnapshot {
        &self.initial
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::client::MockDeploymentClient;
    use crate::Error;
    use kube::core::ErrorResponse;

    pub fn api_error(code: u16, reason: &str) -> Error {
        Error::from(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} from test"),
            reason: reason.to_string(),
            code,
        }))
    }

    pub fn handle() -> DeploymentHandle {
        DeploymentHandle::new("api", "default")
    }

    pub fn nodes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Build a reallocator with zero delays; the mock must expect the
    /// construction-time `get`.
    pub async fn reallocator(mock: MockDeploymentClient) -> Reallocator {
        Reallocator::new(
            Arc::new(mock),
            handle(),
            ReallocatorConfig::default().without_delays(),
        )
        .await
        .expect("construction should succeed")
    }
}
