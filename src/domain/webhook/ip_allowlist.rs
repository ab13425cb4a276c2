//! Source-address allow-list for webhook callers.
//!
//! Entries are either a single address or a CIDR block; IPv4 and IPv6 are
//! both supported. An empty list admits every caller.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpAllowListError {
    #[error("invalid IP address '{0}'")]
    InvalidAddress(String),

    #[error("invalid CIDR prefix length in '{0}'")]
    InvalidPrefix(String),
}

/// One allow-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRule {
    Exact(IpAddr),
    Cidr { network: IpAddr, prefix: u8 },
}

impl IpRule {
    pub fn matches(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        match *self {
            IpRule::Exact(allowed) => canonical(allowed) == ip,
            IpRule::Cidr { network, prefix } => match (canonical_cidr(network, prefix), ip) {
                ((IpAddr::V4(net), prefix), IpAddr::V4(addr)) => {
                    let mask = mask_u32(prefix);
                    u32::from(net) & mask == u32::from(addr) & mask
                }
                ((IpAddr::V6(net), prefix), IpAddr::V6(addr)) => {
                    let mask = mask_u128(prefix);
                    u128::from(net) & mask == u128::from(addr) & mask
                }
                _ => false,
            },
        }
    }
}

impl FromStr for IpRule {
    type Err = IpAllowListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            None => s
                .parse()
                .map(IpRule::Exact)
                .map_err(|_| IpAllowListError::InvalidAddress(s.to_string())),
            Some((addr, bits)) => {
                let network: IpAddr = addr
                    .parse()
                    .map_err(|_| IpAllowListError::InvalidAddress(s.to_string()))?;
                let prefix: u8 = bits
                    .parse()
                    .map_err(|_| IpAllowListError::InvalidPrefix(s.to_string()))?;
                let max = if network.is_ipv4() { 32 } else { 128 };
                if prefix > max {
                    return Err(IpAllowListError::InvalidPrefix(s.to_string()));
                }
                // a mapped block must stay inside ::ffff:0:0/96
                if is_ipv4_mapped(network) && prefix < MAPPED_PREFIX_BITS {
                    return Err(IpAllowListError::InvalidPrefix(s.to_string()));
                }
                let (network, prefix) = canonical_cidr(network, prefix);
                Ok(IpRule::Cidr { network, prefix })
            }
        }
    }
}

impl fmt::Display for IpRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpRule::Exact(ip) => write!(f, "{}", ip),
            IpRule::Cidr { network, prefix } => write!(f, "{}/{}", network, prefix),
        }
    }
}

/// Parsed allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAllowList {
    rules: Vec<IpRule>,
}

impl IpAllowList {
    /// Parses every entry, skipping blanks.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed entry rather than silently dropping it.
    pub fn parse<I, S>(entries: I) -> Result<Self, IpAllowListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .filter(|e| !e.as_ref().trim().is_empty())
            .map(|e| e.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// An allow-list that admits everyone.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[IpRule] {
        &self.rules
    }

    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|rule| rule.matches(ip))
    }
}

/// Treats IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) as IPv4.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Prefix bits taken by the `::ffff:0:0/96` mapping block.
const MAPPED_PREFIX_BITS: u8 = 96;

fn is_ipv4_mapped(ip: IpAddr) -> bool {
    matches!(ip, IpAddr::V6(v6) if v6.to_ipv4_mapped().is_some())
}

/// Rewrites an IPv4-mapped IPv6 block as the equivalent IPv4 block.
fn canonical_cidr(network: IpAddr, prefix: u8) -> (IpAddr, u8) {
    match network {
        IpAddr::V6(v6) if prefix >= MAPPED_PREFIX_BITS => match v6.to_ipv4_mapped() {
            Some(v4) => (IpAddr::V4(v4), prefix - MAPPED_PREFIX_BITS),
            None => (network, prefix),
        },
        _ => (network, prefix),
    }
}

fn mask_u32(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

fn mask_u128(prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p => u128::MAX << (128 - u32::from(p.min(128))),
    }
}
