use crate::{
    peer::{IpPeer, PodPeer},
    traffic::{InternalPeer, PortQuery, TrafficPeer},
};

/// The in-cluster side of an edge.
///
/// `None` admits no in-cluster peer; it exists so that an edge whose peers
/// are exclusively IP blocks still has an internal side, and it is the
/// identity of the internal union. A `Specific` list is never empty: the
/// constructors reduce an empty list to `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InternalMatcher {
    None,
    All,
    Specific(Vec<PodPeer>),
}

/// The full peer side of one direction of policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeMatcher {
    /// Nothing is allowed.
    None,
    /// Everything is allowed.
    All,
    /// A union of IP-block peers and an in-cluster matcher.
    Specific {
        ips: Vec<IpPeer>,
        internal: InternalMatcher,
    },
}

// === impl InternalMatcher ===

impl InternalMatcher {
    pub fn specific(peers: Vec<PodPeer>) -> Self {
        if peers.is_empty() {
            Self::None
        } else {
            Self::Specific(peers)
        }
    }

    /// Union of two internal matchers. Peers selecting the same namespaces
    /// and pods merge their port matchers; the union never widens a
    /// namespace or pod selection.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::None, m) | (m, Self::None) => m,
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Specific(mut peers), Self::Specific(incoming)) => {
                for peer in incoming {
                    match peers.iter().position(|p| p.same_scope(&peer)) {
                        Some(i) => {
                            let ports = peers[i].ports.clone();
                            peers[i].ports = ports.combine(peer.ports);
                        }
                        None => peers.push(peer),
                    }
                }
                Self::Specific(peers)
            }
        }
    }

    pub(crate) fn allows(&self, peer: &InternalPeer, q: &PortQuery<'_>) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Specific(peers) => peers.iter().any(|p| p.allows(peer, q)),
        }
    }
}

// === impl EdgeMatcher ===

impl EdgeMatcher {
    /// Builds a specific edge, reducing the empty edge to `None`.
    pub fn specific(ips: Vec<IpPeer>, internal: InternalMatcher) -> Self {
        if ips.is_empty() && internal == InternalMatcher::None {
            Self::None
        } else {
            Self::Specific { ips, internal }
        }
    }

    /// Rule union: `None` is the identity, `All` absorbs, and specific
    /// edges merge lazily. IP peers concatenate (identical peers are
    /// deduplicated, overlap is tolerated since the outer predicate is a
    /// disjunction); internal matchers combine.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::None, edge) | (edge, Self::None) => edge,
            (Self::All, _) | (_, Self::All) => Self::All,
            (
                Self::Specific {
                    ips: mut a_ips,
                    internal: a_internal,
                },
                Self::Specific {
                    ips: b_ips,
                    internal: b_internal,
                },
            ) => {
                for peer in b_ips {
                    if !a_ips.contains(&peer) {
                        a_ips.push(peer);
                    }
                }
                Self::Specific {
                    ips: a_ips,
                    internal: a_internal.combine(b_internal),
                }
            }
        }
    }

    pub(crate) fn allows(&self, peer: &TrafficPeer, q: &PortQuery<'_>) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Specific { ips, internal } => {
                if ips.iter().any(|ip| ip.allows(&peer.ip, q)) {
                    return true;
                }
                match peer.internal.as_ref() {
                    Some(internal_peer) => internal.allows(internal_peer, q),
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        labels::LabelSelector,
        peer::{NamespaceMatcher, PodMatcher},
        port::{PortId, PortMatcher, PortProtocol, Protocol},
    };
    use std::iter::FromIterator;

    fn tcp(n: u16) -> PortMatcher {
        PortMatcher::Specific(vec![PortProtocol {
            port: Some(PortId::Number(n.try_into().unwrap())),
            protocol: Protocol::Tcp,
        }])
    }

    fn pod_peer(ns: NamespaceMatcher, ports: PortMatcher) -> PodPeer {
        PodPeer {
            namespaces: ns,
            pods: PodMatcher::All,
            ports,
        }
    }

    fn specific(peers: Vec<PodPeer>) -> EdgeMatcher {
        EdgeMatcher::specific(vec![], InternalMatcher::specific(peers))
    }

    #[test]
    fn none_is_the_union_identity() {
        for edge in &[
            EdgeMatcher::None,
            EdgeMatcher::All,
            specific(vec![pod_peer(NamespaceMatcher::All, tcp(80))]),
        ] {
            assert_eq!(EdgeMatcher::None.combine(edge.clone()), *edge);
            assert_eq!(edge.clone().combine(EdgeMatcher::None), *edge);
        }
    }

    #[test]
    fn all_absorbs() {
        for edge in &[
            EdgeMatcher::None,
            EdgeMatcher::All,
            specific(vec![pod_peer(NamespaceMatcher::All, tcp(80))]),
        ] {
            assert_eq!(EdgeMatcher::All.combine(edge.clone()), EdgeMatcher::All);
            assert_eq!(edge.clone().combine(EdgeMatcher::All), EdgeMatcher::All);
        }
    }

    #[test]
    fn same_scope_peers_merge_ports() {
        let a = specific(vec![pod_peer(NamespaceMatcher::Exact("y".into()), tcp(80))]);
        let b = specific(vec![pod_peer(NamespaceMatcher::Exact("y".into()), tcp(81))]);
        assert_eq!(
            a.combine(b),
            specific(vec![pod_peer(
                NamespaceMatcher::Exact("y".into()),
                tcp(80).combine(tcp(81)),
            )])
        );
    }

    #[test]
    fn different_scopes_stay_disjoint() {
        let y = pod_peer(NamespaceMatcher::Exact("y".into()), tcp(80));
        let by_label = pod_peer(
            NamespaceMatcher::Selector(LabelSelector::from_iter(Some(("ns", "y")))),
            tcp(80),
        );
        assert_eq!(
            specific(vec![y.clone()]).combine(specific(vec![by_label.clone()])),
            specific(vec![y, by_label]),
        );
    }

    #[test]
    fn empty_edge_reduces_to_none() {
        assert_eq!(
            EdgeMatcher::specific(vec![], InternalMatcher::specific(vec![])),
            EdgeMatcher::None
        );
    }

    #[test]
    fn all_internal_absorbs_pod_peers() {
        let a = EdgeMatcher::specific(vec![], InternalMatcher::All);
        let b = specific(vec![pod_peer(NamespaceMatcher::Exact("y".into()), tcp(80))]);
        assert_eq!(
            a.combine(b),
            EdgeMatcher::Specific {
                ips: vec![],
                internal: InternalMatcher::All,
            }
        );
    }
}
