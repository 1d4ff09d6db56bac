#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod edge;
mod explain;
mod labels;
mod network;
mod peer;
mod policy;
mod port;
mod target;
mod traffic;

pub use self::{
    edge::{EdgeMatcher, InternalMatcher},
    labels::{LabelSelector, Labels, Requirement},
    network::{InvalidIpBlock, IpBlock},
    peer::{IpPeer, NamespaceMatcher, PodMatcher, PodPeer},
    policy::{Direction, Policy},
    port::{PortId, PortMatcher, PortProtocol, Protocol, UnknownProtocol},
    target::{PolicyRef, Target},
    traffic::{InternalPeer, NoPortResolution, ResolvePort, Traffic, TrafficPeer},
};
pub use ipnet::{IpNet, Ipv4Net, Ipv6Net};
