use crate::{
    labels::{LabelSelector, Labels},
    network::IpBlock,
    port::PortMatcher,
    traffic::{InternalPeer, PortQuery},
};
use std::net::IpAddr;

/// Selects pods by label, independent of namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodMatcher {
    All,
    Selector(LabelSelector),
}

/// Selects namespaces by name or by label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceMatcher {
    All,
    Exact(String),
    Selector(LabelSelector),
}

/// In-cluster endpoints on some ports: pods in the selected namespaces,
/// selected by label, reachable on the matched ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodPeer {
    pub namespaces: NamespaceMatcher,
    pub pods: PodMatcher,
    pub ports: PortMatcher,
}

/// An external-address peer: an address block with its port matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpPeer {
    pub block: IpBlock,
    pub ports: PortMatcher,
}

// === impl PodMatcher ===

impl PodMatcher {
    pub fn allows(&self, labels: &Labels) -> bool {
        match self {
            Self::All => true,
            Self::Selector(selector) => selector.matches(labels),
        }
    }

    /// The stable string form used for subject identity. All-pods renders
    /// as the empty selector does.
    pub fn canonical(&self) -> String {
        match self {
            Self::All => LabelSelector::default().canonical(),
            Self::Selector(selector) => selector.canonical(),
        }
    }
}

// === impl NamespaceMatcher ===

impl NamespaceMatcher {
    pub fn allows(&self, namespace: &str, labels: &Labels) -> bool {
        match self {
            Self::All => true,
            Self::Exact(name) => name == namespace,
            Self::Selector(selector) => selector.matches(labels),
        }
    }
}

// === impl PodPeer ===

impl PodPeer {
    pub(crate) fn allows(&self, peer: &InternalPeer, q: &PortQuery<'_>) -> bool {
        self.namespaces.allows(&peer.namespace, &peer.namespace_labels)
            && self.pods.allows(&peer.pod_labels)
            && self.ports.admits(q)
    }

    /// Indicates whether two peers select the same namespaces and pods, so
    /// their port matchers may be merged without widening either selection.
    pub(crate) fn same_scope(&self, other: &Self) -> bool {
        self.namespaces == other.namespaces && self.pods == other.pods
    }
}

// === impl IpPeer ===

impl IpPeer {
    pub(crate) fn allows(&self, ip: &IpAddr, q: &PortQuery<'_>) -> bool {
        self.block.allows(ip) && self.ports.admits(q)
    }
}
