use crate::selector::label_selector;
use anyhow::{anyhow, bail, Context, Result};
use netpol_analyzer_core::{
    Direction, EdgeMatcher, InternalMatcher, IpBlock, IpNet, IpPeer, NamespaceMatcher, PodMatcher,
    PodPeer, Policy, PolicyRef, PortId, PortMatcher, PortProtocol, Protocol, Target,
};
use netpol_analyzer_k8s_api as api;
use std::num::NonZeroU16;
use tracing::debug;

/// Folds policy documents into a compiled [`Policy`].
///
/// Documents are processed in iteration order: target order is first-seen
/// and source-rule order within a target follows the input, so callers that
/// need reproducible output supply a stable ordering. Compilation aborts on
/// the first malformed document, naming it.
pub fn compile(docs: impl IntoIterator<Item = api::NetworkPolicy>) -> Result<Policy> {
    let mut policy = Policy::default();
    for doc in docs {
        let source = document_ref(&doc.metadata)?;
        compile_document(&mut policy, &source, doc.spec)
            .with_context(|| format!("network policy {source}"))?;
    }
    Ok(policy)
}

fn document_ref(metadata: &api::ObjectMeta) -> Result<PolicyRef> {
    let namespace = metadata
        .namespace
        .clone()
        .ok_or_else(|| anyhow!("network policy is missing metadata.namespace"))?;
    let name = metadata
        .name
        .clone()
        .ok_or_else(|| anyhow!("network policy is missing metadata.name"))?;
    Ok(PolicyRef { namespace, name })
}

fn compile_document(
    policy: &mut Policy,
    source: &PolicyRef,
    spec: api::NetworkPolicySpec,
) -> Result<()> {
    let subject = if spec.pod_selector.selects_all() {
        PodMatcher::All
    } else {
        PodMatcher::Selector(label_selector(spec.pod_selector.clone())?)
    };

    for direction in policy_types(&spec) {
        let edge = match direction {
            Direction::Ingress => {
                let rules = spec.ingress.as_deref().unwrap_or(&[]);
                edge(
                    source,
                    rules
                        .iter()
                        .map(|r| (r.from.as_deref(), r.ports.as_deref()))
                        .collect(),
                )?
            }
            Direction::Egress => {
                let rules = spec.egress.as_deref().unwrap_or(&[]);
                edge(
                    source,
                    rules
                        .iter()
                        .map(|r| (r.to.as_deref(), r.ports.as_deref()))
                        .collect(),
                )?
            }
        };

        let target = Target::new(source.namespace.clone(), subject.clone(), source.clone(), edge);
        debug!(%direction, target = %target.primary_key(), "compiled");
        policy.add_target(direction, target);
    }

    Ok(())
}

/// The directions a document restricts. Absent `policyTypes` takes the
/// upstream defaulting: ingress always, egress only when egress rules are
/// declared.
fn policy_types(spec: &api::NetworkPolicySpec) -> Vec<Direction> {
    match &spec.policy_types {
        Some(types) => types
            .iter()
            .map(|t| match t {
                api::PolicyType::Ingress => Direction::Ingress,
                api::PolicyType::Egress => Direction::Egress,
            })
            .collect(),
        None => {
            let mut directions = vec![Direction::Ingress];
            if spec.egress.as_ref().is_some_and(|rules| !rules.is_empty()) {
                directions.push(Direction::Egress);
            }
            directions
        }
    }
}

/// Interprets one direction's rules as an edge. An empty rule list denies
/// the direction outright; a rule with neither peers nor ports allows it
/// outright; otherwise each rule's peers contribute IP or pod peers
/// restricted to the rule's ports.
fn edge(
    source: &PolicyRef,
    rules: Vec<(Option<&[api::Peer]>, Option<&[api::Port]>)>,
) -> Result<EdgeMatcher> {
    if rules.is_empty() {
        return Ok(EdgeMatcher::None);
    }

    let mut ips = Vec::new();
    let mut pods = Vec::new();
    let mut allow_all = false;
    let mut all_internal = false;

    for (peers, ports) in rules {
        let peers = peers.unwrap_or(&[]);
        let ports = port_matcher(ports.unwrap_or(&[]))?;

        if peers.is_empty() {
            if ports == PortMatcher::All {
                allow_all = true;
            } else {
                // Ports without peers: any source, on those ports.
                pods.push(PodPeer {
                    namespaces: NamespaceMatcher::All,
                    pods: PodMatcher::All,
                    ports,
                });
            }
            continue;
        }

        for peer in peers {
            match interpret_peer(source, peer, &ports)? {
                InterpretedPeer::Ip(peer) => ips.push(peer),
                InterpretedPeer::Pod(peer) => {
                    if peer.namespaces == NamespaceMatcher::All
                        && peer.pods == PodMatcher::All
                        && peer.ports == PortMatcher::All
                    {
                        all_internal = true;
                    } else {
                        pods.push(peer);
                    }
                }
            }
        }
    }

    if allow_all {
        return Ok(EdgeMatcher::All);
    }

    let internal = if all_internal {
        InternalMatcher::All
    } else {
        InternalMatcher::specific(pods)
    };
    Ok(EdgeMatcher::specific(ips, internal))
}

enum InterpretedPeer {
    Ip(IpPeer),
    Pod(PodPeer),
}

fn interpret_peer(
    source: &PolicyRef,
    peer: &api::Peer,
    ports: &PortMatcher,
) -> Result<InterpretedPeer> {
    if let Some(block) = &peer.ip_block {
        if peer.pod_selector.is_some() || peer.namespace_selector.is_some() {
            bail!("peer must not combine an ipBlock with selectors");
        }
        let net = block
            .cidr
            .parse::<IpNet>()
            .with_context(|| format!("parsing CIDR {}", block.cidr))?;
        let except = block
            .except
            .iter()
            .flatten()
            .map(|cidr| {
                cidr.parse::<IpNet>()
                    .with_context(|| format!("parsing except CIDR {cidr}"))
            })
            .collect::<Result<Vec<IpNet>>>()?;
        let block = IpBlock::new(net, except)?;
        return Ok(InterpretedPeer::Ip(IpPeer {
            block,
            ports: ports.clone(),
        }));
    }

    if peer.pod_selector.is_none() && peer.namespace_selector.is_none() {
        bail!("peer must carry an ipBlock, podSelector, or namespaceSelector");
    }

    let namespaces = match &peer.namespace_selector {
        // A peer that names no namespaces means the policy's own namespace.
        None => NamespaceMatcher::Exact(source.namespace.clone()),
        Some(selector) if selector.selects_all() => NamespaceMatcher::All,
        Some(selector) => NamespaceMatcher::Selector(label_selector(selector.clone())?),
    };
    let pods = match &peer.pod_selector {
        None => PodMatcher::All,
        Some(selector) if selector.selects_all() => PodMatcher::All,
        Some(selector) => PodMatcher::Selector(label_selector(selector.clone())?),
    };

    Ok(InterpretedPeer::Pod(PodPeer {
        namespaces,
        pods,
        ports: ports.clone(),
    }))
}

fn port_matcher(ports: &[api::Port]) -> Result<PortMatcher> {
    if ports.is_empty() {
        return Ok(PortMatcher::All);
    }

    let mut entries = Vec::with_capacity(ports.len());
    for port in ports {
        let protocol = match port.protocol.as_deref() {
            None => Protocol::Tcp,
            Some(protocol) => protocol.parse()?,
        };
        let port = match &port.port {
            None => None,
            Some(api::PortRef::Number(n)) => {
                let n = NonZeroU16::new(*n)
                    .ok_or_else(|| anyhow!("port must be in the range 1-65535"))?;
                Some(PortId::Number(n))
            }
            Some(api::PortRef::Name(name)) => {
                if name.is_empty() {
                    bail!("named port must not be empty");
                }
                Some(PortId::Name(name.clone()))
            }
        };
        entries.push(PortProtocol { port, protocol });
    }
    Ok(PortMatcher::Specific(entries))
}
