use ipnet::IpNet;
use std::net::IpAddr;

/// An address block with carve-outs.
///
/// An address is in the block iff it lies within `net` and within none of
/// the `except` networks. Every except must be a strict subnet of `net`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpBlock {
    net: IpNet,
    except: Vec<IpNet>,
}

#[derive(Debug, thiserror::Error)]
#[error("except {except} is not a strict subnet of {net}")]
pub struct InvalidIpBlock {
    net: IpNet,
    except: IpNet,
}

// === impl IpBlock ===

impl IpBlock {
    pub fn new(net: IpNet, except: Vec<IpNet>) -> Result<Self, InvalidIpBlock> {
        for ex in &except {
            if !net.contains(ex) || *ex == net {
                return Err(InvalidIpBlock { net, except: *ex });
            }
        }
        Ok(Self { net, except })
    }

    pub fn net(&self) -> &IpNet {
        &self.net
    }

    pub fn except(&self) -> &[IpNet] {
        &self.except
    }

    pub fn allows(&self, ip: &IpAddr) -> bool {
        self.net.contains(ip) && !self.except.iter().any(|ex| ex.contains(ip))
    }
}

impl From<IpNet> for IpBlock {
    fn from(net: IpNet) -> Self {
        Self {
            net,
            except: vec![],
        }
    }
}

impl From<IpAddr> for IpBlock {
    fn from(addr: IpAddr) -> Self {
        IpNet::from(addr).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn contains_minus_excepts() {
        let block = IpBlock::new(net("10.0.0.0/16"), vec![net("10.0.1.0/24")]).unwrap();
        assert!(block.allows(&ip("10.0.0.1")));
        assert!(block.allows(&ip("10.0.2.1")));
        assert!(!block.allows(&ip("10.0.1.1")), "excepted subnet");
        assert!(!block.allows(&ip("10.1.0.1")), "outside the block");
        assert!(!block.allows(&ip("2001:db8::1")), "wrong family");
    }

    #[test]
    fn except_must_be_strict_subnet() {
        assert!(IpBlock::new(net("10.0.0.0/16"), vec![net("10.0.1.0/24")]).is_ok());
        assert!(
            IpBlock::new(net("10.0.0.0/16"), vec![net("10.0.0.0/16")]).is_err(),
            "except equal to the block"
        );
        assert!(
            IpBlock::new(net("10.0.0.0/16"), vec![net("10.0.0.0/8")]).is_err(),
            "except wider than the block"
        );
        assert!(
            IpBlock::new(net("10.0.0.0/16"), vec![net("192.168.0.0/24")]).is_err(),
            "except disjoint from the block"
        );
    }
}
