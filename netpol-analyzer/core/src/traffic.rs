use crate::{labels::Labels, port::Protocol};
use std::{net::IpAddr, num::NonZeroU16};

/// A connection attempt to evaluate against a compiled policy.
#[derive(Clone, Debug)]
pub struct Traffic {
    pub src: TrafficPeer,
    pub dst: TrafficPeer,
    pub port: NonZeroU16,
    pub protocol: Protocol,
}

/// One side of a connection. A peer without an internal half is external to
/// the cluster.
#[derive(Clone, Debug)]
pub struct TrafficPeer {
    pub internal: Option<InternalPeer>,
    pub ip: IpAddr,
}

/// Cluster-state identity of an in-cluster peer, as reported by the cluster
/// state query.
#[derive(Clone, Debug)]
pub struct InternalPeer {
    pub namespace: String,
    pub pod: String,
    pub pod_labels: Labels,
    pub namespace_labels: Labels,
}

/// Resolves a pod-declared port name to a numeric port.
///
/// Consulted on every query; the core never caches resolutions, since pod
/// label or port-name changes invalidate them.
pub trait ResolvePort {
    fn resolve_port(&self, peer: &InternalPeer, name: &str, protocol: Protocol)
        -> Option<NonZeroU16>;
}

/// Declines to resolve any named port.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPortResolution;

impl ResolvePort for NoPortResolution {
    fn resolve_port(&self, _: &InternalPeer, _: &str, _: Protocol) -> Option<NonZeroU16> {
        None
    }
}

/// The port half of an allow query. Named ports always resolve against the
/// connection's destination pod, whichever side a matcher is evaluating.
pub(crate) struct PortQuery<'a> {
    pub port: NonZeroU16,
    pub protocol: Protocol,
    pub dst: Option<&'a InternalPeer>,
    pub resolver: &'a dyn ResolvePort,
}

// === impl PortQuery ===

impl PortQuery<'_> {
    pub(crate) fn resolve(&self, name: &str) -> Option<NonZeroU16> {
        let dst = self.dst?;
        self.resolver.resolve_port(dst, name, self.protocol)
    }
}
