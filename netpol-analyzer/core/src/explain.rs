use crate::{
    edge::{EdgeMatcher, InternalMatcher},
    peer::{NamespaceMatcher, PodMatcher},
    policy::{Direction, Policy},
    port::PortMatcher,
    target::Target,
};
use ipnet::IpNet;
use std::fmt::Write;

// === impl Policy ===

impl Policy {
    /// Linearizes the policy into stable human-readable lines, ingress
    /// targets first. The output reflects the IR verbatim, so two inputs
    /// compiling to the same IR explain identically. Each target ends with
    /// a blank separator line.
    pub fn explain(&self) -> String {
        let mut lines = Vec::new();
        for target in &self.ingress {
            explain_target(&mut lines, target, Direction::Ingress);
        }
        for target in &self.egress {
            explain_target(&mut lines, target, Direction::Egress);
        }
        lines.join("\n")
    }
}

fn explain_target(lines: &mut Vec<String>, target: &Target, direction: Direction) {
    lines.push(format!("{direction}: {}", target.primary_key()));
    if !target.source_rules.is_empty() {
        lines.push("  source rules:".to_string());
        for source in &target.source_rules {
            lines.push(format!("    {source}"));
        }
    }

    match &target.edge {
        EdgeMatcher::None => lines.push(format!("  all {direction} blocked")),
        EdgeMatcher::All => lines.push(format!("  all {direction} allowed")),
        EdgeMatcher::Specific { ips, internal } => {
            lines.push(format!("  {direction}:"));
            for peer in ips {
                lines.push(format!(
                    "  - IPBlock: cidr {}, except {}",
                    peer.block.net(),
                    excepts(peer.block.except()),
                ));
                for port in port_lines(&peer.ports) {
                    lines.push(format!("    {port}"));
                }
            }
            match internal {
                InternalMatcher::None => {}
                InternalMatcher::All => lines.push("    all pods in all namespaces".to_string()),
                InternalMatcher::Specific(peers) => {
                    for peer in peers {
                        lines.push(format!(
                            "    {}; {}",
                            namespace_phrase(&peer.namespaces),
                            pod_phrase(&peer.pods),
                        ));
                        for port in port_lines(&peer.ports) {
                            lines.push(format!("      {port}"));
                        }
                    }
                }
            }
        }
    }

    lines.push(String::new());
}

fn excepts(nets: &[IpNet]) -> String {
    let mut out = String::from("[");
    for (i, net) in nets.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{net}");
    }
    out.push(']');
    out
}

fn port_lines(ports: &PortMatcher) -> Vec<String> {
    match ports {
        PortMatcher::All => vec!["all ports all protocols".to_string()],
        PortMatcher::Specific(entries) => entries
            .iter()
            .map(|pp| match &pp.port {
                Some(port) => format!("port {port} on protocol {}", pp.protocol),
                None => format!("all ports on protocol {}", pp.protocol),
            })
            .collect(),
    }
}

fn namespace_phrase(namespaces: &NamespaceMatcher) -> String {
    match namespaces {
        NamespaceMatcher::All => "all namespaces".to_string(),
        NamespaceMatcher::Exact(name) => format!("namespace {name}"),
        NamespaceMatcher::Selector(selector) => {
            format!("namespaces matching {}", selector.canonical())
        }
    }
}

fn pod_phrase(pods: &PodMatcher) -> String {
    match pods {
        PodMatcher::All => "all pods".to_string(),
        PodMatcher::Selector(selector) => format!("pods matching {}", selector.canonical()),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        EdgeMatcher, InternalMatcher, IpBlock, IpPeer, LabelSelector, NamespaceMatcher,
        PodMatcher, PodPeer, Policy, PolicyRef, PortId, PortMatcher, PortProtocol, Protocol,
        Target,
    };
    use crate::policy::Direction;
    use std::iter::FromIterator;

    fn source(ns: &str, name: &str) -> PolicyRef {
        PolicyRef {
            namespace: ns.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn deny_all_target() {
        let mut policy = Policy::default();
        policy.add_target(
            Direction::Ingress,
            Target::new("x", PodMatcher::All, source("x", "deny-ingress"), EdgeMatcher::None),
        );
        assert_eq!(
            policy.explain(),
            "ingress: x/<none>\n\
             \x20 source rules:\n\
             \x20   x/deny-ingress\n\
             \x20 all ingress blocked\n",
        );
    }

    #[test]
    fn specific_target() {
        let block = IpBlock::new(
            "10.0.0.0/16".parse().unwrap(),
            vec!["10.0.1.0/24".parse().unwrap()],
        )
        .unwrap();
        let edge = EdgeMatcher::specific(
            vec![IpPeer {
                block,
                ports: PortMatcher::All,
            }],
            InternalMatcher::specific(vec![PodPeer {
                namespaces: NamespaceMatcher::Exact("y".to_string()),
                pods: PodMatcher::Selector(LabelSelector::from_iter(Some(("pod", "b")))),
                ports: PortMatcher::Specific(vec![PortProtocol {
                    port: Some(PortId::Number(80.try_into().unwrap())),
                    protocol: Protocol::Tcp,
                }]),
            }]),
        );

        let mut policy = Policy::default();
        policy.add_target(
            Direction::Egress,
            Target::new("x", PodMatcher::All, source("x", "allow-some"), edge),
        );
        assert_eq!(
            policy.explain(),
            "egress: x/<none>\n\
             \x20 source rules:\n\
             \x20   x/allow-some\n\
             \x20 egress:\n\
             \x20 - IPBlock: cidr 10.0.0.0/16, except [10.0.1.0/24]\n\
             \x20   all ports all protocols\n\
             \x20   namespace y; pods matching pod=b\n\
             \x20     port 80 on protocol TCP\n",
        );
    }

    #[test]
    fn explanation_is_deterministic() {
        let mk = || {
            let mut policy = Policy::default();
            policy.add_target(
                Direction::Ingress,
                Target::new("x", PodMatcher::All, source("x", "a"), EdgeMatcher::All),
            );
            policy.add_target(
                Direction::Egress,
                Target::new("x", PodMatcher::All, source("x", "b"), EdgeMatcher::None),
            );
            policy.explain()
        };
        assert_eq!(mk(), mk());
        assert_eq!(
            mk(),
            "ingress: x/<none>\n\
             \x20 source rules:\n\
             \x20   x/a\n\
             \x20 all ingress allowed\n\
             \n\
             egress: x/<none>\n\
             \x20 source rules:\n\
             \x20   x/b\n\
             \x20 all egress blocked\n",
        );
    }
}
