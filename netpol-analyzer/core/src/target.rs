use crate::{edge::EdgeMatcher, labels::Labels, peer::PodMatcher};
use std::fmt;

/// Identifies the policy document a target's rules came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyRef {
    pub namespace: String,
    pub name: String,
}

/// One direction of policy for one subject: the pods a namespace's policies
/// select, the documents that contributed rules, and the combined edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub namespace: String,
    pub pods: PodMatcher,
    pub source_rules: Vec<PolicyRef>,
    pub edge: EdgeMatcher,
}

// === impl PolicyRef ===

impl fmt::Display for PolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl Target ===

impl Target {
    pub fn new(
        namespace: impl Into<String>,
        pods: PodMatcher,
        source: PolicyRef,
        edge: EdgeMatcher,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pods,
            source_rules: vec![source],
            edge,
        }
    }

    /// The subject-identity key: two targets with equal keys describe the
    /// same pods and may be merged.
    pub fn primary_key(&self) -> String {
        format!("{}/{}", self.namespace, self.pods.canonical())
    }

    /// Indicates whether this target's subject covers the given pod.
    pub fn selects(&self, namespace: &str, pod_labels: &Labels) -> bool {
        self.namespace == namespace && self.pods.allows(pod_labels)
    }

    /// Folds another target for the same subject into this one: provenance
    /// appends, edges union.
    ///
    /// # Panics
    ///
    /// Merging targets with different subjects is a programmer error.
    pub fn merge(&mut self, other: Target) {
        let (key, other_key) = (self.primary_key(), other.primary_key());
        if key != other_key {
            panic!("cannot merge target {other_key} into {key}");
        }
        self.source_rules.extend(other.source_rules);
        let edge = std::mem::replace(&mut self.edge, EdgeMatcher::None);
        self.edge = edge.combine(other.edge);
    }
}
