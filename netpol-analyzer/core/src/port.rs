use crate::traffic::PortQuery;
use std::{fmt, num::NonZeroU16, str::FromStr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown protocol: {0}")]
pub struct UnknownProtocol(String);

/// A numeric port or a pod-declared port name.
///
/// Named ports are resolved per destination pod at query time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortId {
    Number(NonZeroU16),
    Name(String),
}

/// One entry of a specific port matcher. A `None` port means all ports on
/// the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortProtocol {
    pub port: Option<PortId>,
    pub protocol: Protocol,
}

/// Decides whether a `(port, protocol)` pair is admitted.
#[derive(Clone, Debug)]
pub enum PortMatcher {
    All,
    Specific(Vec<PortProtocol>),
}

// === impl Protocol ===

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => "TCP".fmt(f),
            Self::Udp => "UDP".fmt(f),
            Self::Sctp => "SCTP".fmt(f),
        }
    }
}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            "SCTP" => Ok(Self::Sctp),
            s => Err(UnknownProtocol(s.to_string())),
        }
    }
}

// === impl PortId ===

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(port) => port.fmt(f),
            Self::Name(name) => name.fmt(f),
        }
    }
}

impl From<NonZeroU16> for PortId {
    fn from(port: NonZeroU16) -> Self {
        Self::Number(port)
    }
}

// === impl PortProtocol ===

impl PortProtocol {
    fn allows(&self, port: &PortId, protocol: Protocol) -> bool {
        self.protocol == protocol && self.port.as_ref().map_or(true, |p| p == port)
    }

    /// Resolves named entries against the query's destination pod. A name
    /// with no resolution admits nothing.
    fn admits(&self, q: &PortQuery<'_>) -> bool {
        if self.protocol != q.protocol {
            return false;
        }
        match &self.port {
            None => true,
            Some(PortId::Number(port)) => *port == q.port,
            Some(PortId::Name(name)) => match q.resolve(name) {
                Some(port) => port == q.port,
                None => {
                    tracing::warn!(port = %name, protocol = %q.protocol, "unresolved named port");
                    false
                }
            },
        }
    }
}

// === impl PortMatcher ===

impl PortMatcher {
    /// Structural match: named entries compare by name, without resolution.
    pub fn allows(&self, port: &PortId, protocol: Protocol) -> bool {
        match self {
            Self::All => true,
            Self::Specific(entries) => entries.iter().any(|pp| pp.allows(port, protocol)),
        }
    }

    pub(crate) fn admits(&self, q: &PortQuery<'_>) -> bool {
        match self {
            Self::All => true,
            Self::Specific(entries) => entries.iter().any(|pp| pp.admits(q)),
        }
    }

    /// Rule union. `All` absorbs; entry lists concatenate, dropping exact
    /// duplicates.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Specific(mut a), Self::Specific(b)) => {
                for entry in b {
                    if !a.contains(&entry) {
                        a.push(entry);
                    }
                }
                Self::Specific(a)
            }
        }
    }
}

/// Entry lists compare as multisets: combination may concatenate rule ports
/// in either order without changing identity.
impl PartialEq for PortMatcher {
    fn eq(&self, other: &Self) -> bool {
        fn count(entries: &[PortProtocol], entry: &PortProtocol) -> usize {
            entries.iter().filter(|e| *e == entry).count()
        }

        match (self, other) {
            (Self::All, Self::All) => true,
            (Self::Specific(a), Self::Specific(b)) => {
                a.len() == b.len() && a.iter().all(|entry| count(a, entry) == count(b, entry))
            }
            _ => false,
        }
    }
}

impl Eq for PortMatcher {}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(n: u16) -> PortId {
        PortId::Number(n.try_into().unwrap())
    }

    fn tcp(n: u16) -> PortProtocol {
        PortProtocol {
            port: Some(port(n)),
            protocol: Protocol::Tcp,
        }
    }

    #[test]
    fn all_allows_everything() {
        assert!(PortMatcher::All.allows(&port(80), Protocol::Tcp));
        assert!(PortMatcher::All.allows(&PortId::Name("dns".to_string()), Protocol::Udp));
    }

    #[test]
    fn specific_matches_port_and_protocol() {
        let m = PortMatcher::Specific(vec![
            tcp(80),
            PortProtocol {
                port: None,
                protocol: Protocol::Udp,
            },
        ]);
        assert!(m.allows(&port(80), Protocol::Tcp));
        assert!(!m.allows(&port(81), Protocol::Tcp));
        assert!(!m.allows(&port(80), Protocol::Sctp));
        assert!(m.allows(&port(53), Protocol::Udp), "nil port, same protocol");
        assert!(
            !m.allows(&PortId::Name("http".to_string()), Protocol::Tcp),
            "names compare structurally"
        );
    }

    #[test]
    fn combine_absorbs_all() {
        let specific = PortMatcher::Specific(vec![tcp(80)]);
        assert_eq!(specific.clone().combine(PortMatcher::All), PortMatcher::All);
        assert_eq!(PortMatcher::All.combine(specific), PortMatcher::All);
    }

    #[test]
    fn combine_concatenates_and_dedupes() {
        let a = PortMatcher::Specific(vec![tcp(80), tcp(81)]);
        let b = PortMatcher::Specific(vec![tcp(81), tcp(82)]);
        assert_eq!(
            a.combine(b),
            PortMatcher::Specific(vec![tcp(80), tcp(81), tcp(82)])
        );
    }

    #[test]
    fn equality_is_order_independent() {
        let a = PortMatcher::Specific(vec![tcp(80), tcp(81)]);
        let b = PortMatcher::Specific(vec![tcp(81), tcp(80)]);
        assert_eq!(a, b);
        assert_ne!(a, PortMatcher::Specific(vec![tcp(80)]));
        assert_ne!(a, PortMatcher::All);
    }
}
