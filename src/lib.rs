//! Reallocator - move a Deployment's pods away from a set of nodes
//!
//! Reallocation escalates in two steps. Soft mode writes a preferred node
//! affinity onto the pod template and waits briefly. If the deployment still
//! reports `ReplicaFailure`, hard mode scales it to zero and back so every
//! pod is rescheduled. Either way the run ends by polling until
//! `ReplicaFailure` clears or the poll budget runs out.
//!
//! The affinity is only a scheduler preference; nothing here guarantees
//! where pods land.
//!
//! # Modules
//!
//! - [`reallocator`] - The reallocation workflow and its building blocks
//! - [`deployment`] - Handle, snapshot, condition and affinity types
//! - [`client`] - Deployment API abstraction and its kube-rs implementation
//! - [`retry`] - Fixed-interval bounded retry
//! - [`config`] - Timings and attempt caps
//! - [`kube_utils`] - Kubernetes client construction
//! - [`telemetry`] - Logging setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod deployment;
pub mod error;
pub mod kube_utils;
pub mod reallocator;
pub mod retry;
pub mod telemetry;

pub use error::Error;
pub use reallocator::{ReallocationOutcome, Reallocator};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
