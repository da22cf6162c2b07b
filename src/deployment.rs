//! Deployment handle, snapshot and affinity types
//!
//! A [`DeploymentSnapshot`] wraps the full `apps/v1` Deployment as last read
//! from the API server. The full object is kept (not just the projected
//! fields) because the affinity update resubmits it with a whole-object
//! replace, which needs the server's `resourceVersion`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelectorRequirement, NodeSelectorTerm, PreferredSchedulingTerm,
};

/// Node label the affinity term matches against
pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

/// Weight of the single preferred scheduling term
pub const PREFERENCE_WEIGHT: i32 = 1;

/// Replica count the apiserver assumes when `spec.replicas` is unset
const DEFAULT_REPLICAS: i32 = 1;

/// Identifies the deployment being reallocated
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeploymentHandle {
    /// Deployment name
    pub name: String,
    /// Deployment namespace
    pub namespace: String,
}

impl DeploymentHandle {
    /// Create a handle for `namespace/name`
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for DeploymentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Deployment status condition type
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionType {
    /// Minimum availability reached
    Available,
    /// Rollout is progressing
    Progressing,
    /// The controller cannot create or delete replicas
    ReplicaFailure,
    /// Any other cluster-defined type, kept verbatim
    Other(String),
}

impl ConditionType {
    /// Wire name of the condition type
    pub fn as_str(&self) -> &str {
        match self {
            ConditionType::Available => "Available",
            ConditionType::Progressing => "Progressing",
            ConditionType::ReplicaFailure => "ReplicaFailure",
            ConditionType::Other(s) => s,
        }
    }
}

impl From<&str> for ConditionType {
    fn from(s: &str) -> Self {
        match s {
            "Available" => ConditionType::Available,
            "Progressing" => ConditionType::Progressing,
            "ReplicaFailure" => ConditionType::ReplicaFailure,
            other => ConditionType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node-selector operator of a hostname term
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOperator {
    /// Prefer nodes whose hostname is in the list
    In,
    /// Prefer nodes whose hostname is not in the list
    NotIn,
}

impl MatchOperator {
    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::In => "In",
            MatchOperator::NotIn => "NotIn",
        }
    }
}

impl FromStr for MatchOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(MatchOperator::In),
            "NotIn" => Ok(MatchOperator::NotIn),
            other => Err(format!("unsupported match operator: {other}")),
        }
    }
}

/// One preferred scheduling term against the hostname label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostnameTerm {
    /// Hostname values to match
    pub hostnames: Vec<String>,
    /// Match operator
    pub operator: MatchOperator,
    /// Scheduler weight
    pub weight: i32,
}

/// Ordered list of preferred hostname terms
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffinityPreference {
    /// Terms in submission order
    pub terms: Vec<HostnameTerm>,
}

impl AffinityPreference {
    /// The single weight-1 `In` term built for a reallocation
    pub fn for_nodes(hostnames: &[String]) -> Self {
        Self {
            terms: vec![HostnameTerm {
                hostnames: hostnames.to_vec(),
                operator: MatchOperator::In,
                weight: PREFERENCE_WEIGHT,
            }],
        }
    }

    /// Render as a pod-template `Affinity` with only node affinity set
    pub fn to_affinity(&self) -> Affinity {
        let preferred = self
            .terms
            .iter()
            .map(|term| PreferredSchedulingTerm {
                preference: NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: HOSTNAME_LABEL.to_string(),
                        operator: term.operator.as_str().to_string(),
                        values: Some(term.hostnames.clone()),
                    }]),
                    match_fields: None,
                },
                weight: term.weight,
            })
            .collect();

        Affinity {
            node_affinity: Some(NodeAffinity {
                preferred_during_scheduling_ignored_during_execution: Some(preferred),
                required_during_scheduling_ignored_during_execution: None,
            }),
            ..Default::default()
        }
    }

    /// Read hostname terms back out of an `Affinity`.
    ///
    /// Terms on other labels or with other operators are skipped. Returns
    /// `None` when nothing matched.
    pub fn from_affinity(affinity: &Affinity) -> Option<Self> {
        let preferred = affinity
            .node_affinity
            .as_ref()?
            .preferred_during_scheduling_ignored_during_execution
            .as_ref()?;

        let terms: Vec<HostnameTerm> = preferred
            .iter()
            .flat_map(|term| {
                term.preference
                    .match_expressions
                    .iter()
                    .flatten()
                    .filter(|req| req.key == HOSTNAME_LABEL)
                    .filter_map(move |req| {
                        Some(HostnameTerm {
                            hostnames: req.values.clone().unwrap_or_default(),
                            operator: req.operator.parse().ok()?,
                            weight: term.weight,
                        })
                    })
            })
            .collect();

        (!terms.is_empty()).then_some(Self { terms })
    }
}

/// Point-in-time read of a deployment
#[derive(Clone, Debug)]
pub struct DeploymentSnapshot {
    deployment: Deployment,
}

impl DeploymentSnapshot {
    /// Wrap a deployment read from the API server
    pub fn new(deployment: Deployment) -> Self {
        Self { deployment }
    }

    /// The underlying object
    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// `spec.replicas`
    pub fn desired_replicas(&self) -> i32 {
        self.deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(DEFAULT_REPLICAS)
    }

    /// `metadata.generation`, zero if the server has not set one
    pub fn generation(&self) -> i64 {
        self.deployment.metadata.generation.unwrap_or(0)
    }

    /// Types present in `status.conditions`
    pub fn condition_types(&self) -> BTreeSet<ConditionType> {
        self.deployment
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| ConditionType::from(c.type_.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Hostname preference currently on the pod template
    pub fn pod_template_affinity(&self) -> Option<AffinityPreference> {
        self.deployment
            .spec
            .as_ref()?
            .template
            .spec
            .as_ref()?
            .affinity
            .as_ref()
            .and_then(AffinityPreference::from_affinity)
    }

    /// Copy of the deployment with its pod-template affinity replaced
    pub fn with_affinity(&self, preference: &AffinityPreference) -> Deployment {
        let mut deployment = self.deployment.clone();
        let spec = deployment.spec.get_or_insert_with(Default::default);
        let pod_spec = spec.template.spec.get_or_insert_with(Default::default);
        pod_spec.affinity = Some(preference.to_affinity());
        deployment
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentCondition, DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    /// A deployment with the given replicas, generation and condition types
    pub fn deployment(
        name: &str,
        replicas: i32,
        generation: i64,
        conditions: &[&str],
    ) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                generation: Some(generation),
                resource_version: Some(generation.to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec::default()),
                },
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                conditions: Some(
                    conditions
                        .iter()
                        .map(|t| DeploymentCondition {
                            type_: t.to_string(),
                            status: "True".to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
        }
    }
}
