//! Soft/hard escalation and convergence
//!
//! ```text
//! Init -> SoftAttempted -> [HardAttempted] -> Converging -> Done | Failed
//! ```
//!
//! Init happens in [`Reallocator::new`]. The remaining states are driven by
//! [`Reallocator::reallocate`], which consumes the reallocator and never
//! returns an error: any failure past Init becomes `status: false` in the
//! [`ReallocationOutcome`].

use serde::Serialize;
use tracing::{error, info, warn};

use super::accessor::status_condition_types;
use super::Reallocator;
use crate::deployment::{ConditionType, DeploymentSnapshot};
use crate::error::Stage;
use crate::{Error, Result};

/// Workflow state in which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Affinity update, settle, and status check
    SoftAttempted,
    /// Scale to zero and back
    HardAttempted,
    /// Waiting for ReplicaFailure to clear
    Converging,
}

/// Result of one reallocation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReallocationOutcome {
    /// Name of the deployment
    pub deployment_name: String,
    /// True when ReplicaFailure cleared
    pub status: bool,
    /// Where the run failed, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,
}

impl ReallocationOutcome {
    /// Successful run
    pub fn succeeded(deployment_name: impl Into<String>) -> Self {
        Self {
            deployment_name: deployment_name.into(),
            status: true,
            failed_phase: None,
        }
    }

    /// Failed run
    pub fn failed(deployment_name: impl Into<String>, phase: Phase) -> Self {
        Self {
            deployment_name: deployment_name.into(),
            status: false,
            failed_phase: Some(phase),
        }
    }
}

/// What the soft attempt observed after settling
#[derive(Debug, Clone)]
pub struct SoftAttempt {
    /// Snapshot read after the settle delay
    pub snapshot: DeploymentSnapshot,
    /// ReplicaFailure was still present
    pub needs_hard_mode: bool,
}

fn replica_failure_present(snapshot: &DeploymentSnapshot) -> bool {
    status_condition_types(snapshot).contains(&ConditionType::ReplicaFailure)
}

impl Reallocator {
    /// Move the deployment's pods away from `avoid_hostnames`.
    ///
    /// One construction is one run: the snapshot and replica count recorded
    /// by [`Reallocator::new`] are consumed here.
    pub async fn reallocate(self, avoid_hostnames: &[String]) -> ReallocationOutcome {
        let name = self.handle.name.clone();

        match self.run(avoid_hostnames).await {
            Ok(snapshot) => {
                info!(
                    deployment = %self.handle,
                    generation = snapshot.generation(),
                    "Operation for deployment complete"
                );
                ReallocationOutcome::succeeded(name)
            }
            Err((phase, e)) => {
                error!(
                    deployment = %self.handle,
                    phase = ?phase,
                    error = %e,
                    "Reallocation failed"
                );
                ReallocationOutcome::failed(name, phase)
            }
        }
    }

    async fn run(
        &self,
        avoid_hostnames: &[String],
    ) -> std::result::Result<DeploymentSnapshot, (Phase, Error)> {
        let soft = self
            .soft_attempt(self.initial.clone(), avoid_hostnames)
            .await
            .map_err(|e| (Phase::SoftAttempted, e))?;

        let latest = if soft.needs_hard_mode {
            self.hard_attempt()
                .await
                .map_err(|e| (Phase::HardAttempted, e))?
        } else {
            soft.snapshot
        };

        self.converge(latest)
            .await
            .map_err(|e| (Phase::Converging, e))
    }

    /// Apply the affinity preference, wait for it to settle, and report
    /// whether ReplicaFailure is still present.
    pub async fn soft_attempt(
        &self,
        current: DeploymentSnapshot,
        avoid_hostnames: &[String],
    ) -> Result<SoftAttempt> {
        info!(deployment = %self.handle, nodes = ?avoid_hostnames, "Trying soft mode");
        self.set_affinity_avoiding(current, avoid_hostnames).await?;

        tokio::time::sleep(self.config.settle_delay()).await;

        let snapshot = self.fetch().await?;
        let needs_hard_mode = replica_failure_present(&snapshot);
        if needs_hard_mode {
            info!(deployment = %self.handle, "Soft mode didn't work");
        }

        Ok(SoftAttempt {
            snapshot,
            needs_hard_mode,
        })
    }

    /// Scale to zero, pause, and restore the original replica count so every
    /// pod is recreated under the new affinity. Returns the read-back after
    /// the restore.
    pub async fn hard_attempt(&self) -> Result<DeploymentSnapshot> {
        info!(deployment = %self.handle, "Trying hard mode");

        info!(deployment = %self.handle, "Setting replicas to zero");
        self.set_replicas(0).await?;

        tokio::time::sleep(self.config.scale_down_pause()).await;

        info!(
            deployment = %self.handle,
            replicas = self.original_replicas,
            "Setting replicas to original value"
        );
        self.set_replicas(self.original_replicas).await
    }

    /// Poll until ReplicaFailure is absent.
    ///
    /// `current` is the first observation; after that the deployment is
    /// re-read up to `convergence_polls` times at the poll interval. A failed
    /// read counts as an unconverged poll.
    pub async fn converge(&self, current: DeploymentSnapshot) -> Result<DeploymentSnapshot> {
        info!(
            deployment = %self.handle,
            generation = current.generation(),
            "Awaiting deployment recovery"
        );
        let mut latest = Some(current);
        let mut polls = 0u32;

        loop {
            if let Some(snapshot) = latest.take() {
                if !replica_failure_present(&snapshot) {
                    return Ok(snapshot);
                }
            }

            if polls >= self.config.convergence_polls {
                error!(
                    deployment = %self.handle,
                    polls = polls,
                    "Deployment isn't recovering from ReplicaFailure"
                );
                return Err(Error::reallocation(
                    &self.handle.name,
                    Stage::Convergence,
                    polls,
                    None,
                ));
            }

            polls += 1;
            info!(deployment = %self.handle, poll = polls, "Awaiting");
            tokio::time::sleep(self.config.poll_interval()).await;

            latest = match self.fetch().await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(
                        deployment = %self.handle,
                        error = %e,
                        "Status read failed while awaiting recovery"
                    );
                    None
                }
            };
        }
    }
}
