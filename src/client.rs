//! Deployment API client abstraction
//!
//! The reallocator consumes exactly three API calls: read, replica patch and
//! full replace. They sit behind [`DeploymentClient`] so the workflow can run
//! against a mock or an in-memory fake.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::trace;

#[cfg(test)]
use mockall::automock;

use crate::deployment::DeploymentHandle;
use crate::Error;

/// Field manager recorded on patches
pub const FIELD_MANAGER: &str = "reallocator";

/// Trait abstracting the Deployment operations the reallocator needs
///
/// Implementations return the raw API error (including 404) as
/// [`Error::Kube`]; translating not-found is the caller's job.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeploymentClient: Send + Sync {
    /// Read the deployment
    async fn get(&self, handle: &DeploymentHandle) -> Result<Deployment, Error>;

    /// Merge-patch `spec.replicas`
    async fn patch_replicas(&self, handle: &DeploymentHandle, replicas: i32) -> Result<(), Error>;

    /// Replace the whole deployment object
    async fn replace(&self, handle: &DeploymentHandle, deployment: &Deployment)
        -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct KubeDeploymentClient {
    client: Client,
}

impl KubeDeploymentClient {
    /// Create a new KubeDeploymentClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, handle: &DeploymentHandle) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), &handle.namespace)
    }
}

#[async_trait]
impl DeploymentClient for KubeDeploymentClient {
    async fn get(&self, handle: &DeploymentHandle) -> Result<Deployment, Error> {
        trace!(deployment = %handle, "Reading deployment");
        Ok(self.api(handle).get(&handle.name).await?)
    }

    async fn patch_replicas(&self, handle: &DeploymentHandle, replicas: i32) -> Result<(), Error> {
        let patch = serde_json::json!({
            "spec": { "replicas": replicas }
        });

        self.api(handle)
            .patch(
                &handle.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;

        Ok(())
    }

    async fn replace(
        &self,
        handle: &DeploymentHandle,
        deployment: &Deployment,
    ) -> Result<(), Error> {
        self.api(handle)
            .replace(&handle.name, &PostParams::default(), deployment)
            .await?;

        Ok(())
    }
}
