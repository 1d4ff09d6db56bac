use crate::{
    target::Target,
    traffic::{PortQuery, ResolvePort, Traffic},
};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ingress,
    Egress,
}

/// The compiled artifact: one target per `(direction, subject)` encountered
/// in the input documents, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    pub ingress: Vec<Target>,
    pub egress: Vec<Target>,
}

// === impl Direction ===

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => "ingress".fmt(f),
            Self::Egress => "egress".fmt(f),
        }
    }
}

// === impl Policy ===

impl Policy {
    /// Folds a target into the policy: an existing target with the same
    /// subject is merged (edges union, provenance appends); otherwise the
    /// target is appended, preserving first-seen order.
    pub fn add_target(&mut self, direction: Direction, target: Target) {
        let targets = match direction {
            Direction::Ingress => &mut self.ingress,
            Direction::Egress => &mut self.egress,
        };
        let key = target.primary_key();
        match targets.iter_mut().find(|t| t.primary_key() == key) {
            Some(existing) => existing.merge(target),
            None => targets.push(target),
        }
    }

    /// Decides whether the traffic is admitted.
    ///
    /// Ingress consults the targets selecting the destination pod; egress
    /// the targets selecting the source. A side with no selecting target is
    /// unrestricted; otherwise every selecting target must admit the
    /// traffic. An external side is never restricted. The verdict is the
    /// conjunction of both directions. The query is total and read-only.
    pub fn allows(&self, traffic: &Traffic, resolver: &dyn ResolvePort) -> bool {
        let q = PortQuery {
            port: traffic.port,
            protocol: traffic.protocol,
            dst: traffic.dst.internal.as_ref(),
            resolver,
        };
        self.direction_allows(Direction::Ingress, traffic, &q)
            && self.direction_allows(Direction::Egress, traffic, &q)
    }

    fn direction_allows(&self, direction: Direction, traffic: &Traffic, q: &PortQuery<'_>) -> bool {
        let (subject, remote, targets) = match direction {
            Direction::Ingress => (&traffic.dst, &traffic.src, &self.ingress),
            Direction::Egress => (&traffic.src, &traffic.dst, &self.egress),
        };
        let subject = match subject.internal.as_ref() {
            Some(internal) => internal,
            None => return true,
        };
        targets
            .iter()
            .filter(|t| t.selects(&subject.namespace, &subject.pod_labels))
            .all(|t| t.edge.allows(remote, q))
    }
}
