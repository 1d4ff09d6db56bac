#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod netpol;

pub use self::{
    labels::Selector,
    netpol::{
        EgressRule, IngressRule, IpBlock, NetworkPolicy, NetworkPolicySpec, ObjectMeta, Peer,
        PolicyType, Port, PortRef,
    },
};
