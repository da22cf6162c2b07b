//! Error types for the reallocator
//!
//! Three kinds matter to callers: the target deployment is missing, the API
//! failed transiently, or a bounded retry/poll loop ran out of attempts.

use std::fmt;

use thiserror::Error;

/// Main error type for reallocation operations
#[derive(Debug, Error)]
pub enum Error {
    /// The target deployment does not exist
    #[error("deployment {namespace}/{name} not found")]
    DeploymentNotFound {
        /// Deployment name
        name: String,
        /// Deployment namespace
        namespace: String,
    },

    /// Kubernetes API error (anything other than not-found)
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A bounded retry or poll loop exhausted its budget
    #[error("reallocation of {deployment} failed in {stage} after {attempts} attempts")]
    Reallocation {
        /// Deployment being reallocated
        deployment: String,
        /// Loop that gave up
        stage: Stage,
        /// Number of attempts made
        attempts: u32,
        /// Last underlying error, if the loop saw one
        #[source]
        source: Option<Box<Error>>,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred (e.g., "create_client")
        context: String,
    },
}

/// The bounded loop a [`Error::Reallocation`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Patching the desired replica count
    SetReplicas,
    /// Replacing the pod template affinity
    SetAffinity,
    /// Waiting for ReplicaFailure to clear
    Convergence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::SetReplicas => "set-replicas",
            Stage::SetAffinity => "set-affinity",
            Stage::Convergence => "convergence",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Create a not-found error for the given deployment
    pub fn not_found(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::DeploymentNotFound {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Create a budget-exhaustion error carrying the last cause
    pub fn reallocation(
        deployment: impl Into<String>,
        stage: Stage,
        attempts: u32,
        source: Option<Error>,
    ) -> Self {
        Self::Reallocation {
            deployment: deployment.into(),
            stage,
            attempts,
            source: source.map(Box::new),
        }
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// True if this is an API response with HTTP 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube { source: kube::Error::Api(resp) } if resp.code == 404)
    }

    /// The stage of a budget-exhaustion error, if this is one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Reallocation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
