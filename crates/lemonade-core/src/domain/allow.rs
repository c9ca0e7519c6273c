//! Allow-list of peer address ranges accepted by the endpoint.
//!
//! The `--allow` option takes a comma-separated list of CIDR ranges, e.g.
//! `"192.168.0.0/16,::1/128"`.  A bare address without a prefix length is a
//! single-host range.  IPv4-mapped IPv6 peers (`::ffff:10.0.0.1`) are matched
//! against the IPv4 ranges.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Default `--allow` value: every IPv4 and IPv6 address.
pub const DEFAULT_ALLOW: &str = "0.0.0.0/0,::/0";

/// Errors produced while parsing an allow-list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllowParseError {
    #[error("invalid IP address in allow range '{0}'")]
    InvalidAddress(String),

    #[error("invalid prefix length in allow range '{0}'")]
    InvalidPrefix(String),

    #[error("allow list is empty")]
    Empty,
}

/// One CIDR range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix_len: u8,
}

impl IpRange {
    /// Builds a range, rejecting prefix lengths longer than the address.
    pub fn new(network: IpAddr, prefix_len: u8) -> Option<Self> {
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        (prefix_len <= max).then_some(Self {
            network,
            prefix_len,
        })
    }

    /// Returns `true` when `ip` lies inside this range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, normalize(ip)) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = prefix_mask_u32(self.prefix_len);
                u32::from(net) & mask == u32::from(addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = prefix_mask_u128(self.prefix_len);
                u128::from(net) & mask == u128::from(addr) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpRange {
    type Err = AllowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let network: IpAddr = addr_part
            .parse()
            .map_err(|_| AllowParseError::InvalidAddress(s.to_string()))?;

        let prefix_len = match prefix_part {
            Some(p) => p
                .parse::<u8>()
                .map_err(|_| AllowParseError::InvalidPrefix(s.to_string()))?,
            None if network.is_ipv4() => 32,
            None => 128,
        };

        IpRange::new(network, prefix_len).ok_or_else(|| AllowParseError::InvalidPrefix(s.to_string()))
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// A set of [`IpRange`]s; a peer is allowed when any range contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    ranges: Vec<IpRange>,
}

impl AllowList {
    /// Parses a comma-separated list of ranges.  Empty items are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AllowParseError`] for a malformed item or when no range is
    /// left after skipping empty items.
    pub fn parse(list: &str) -> Result<Self, AllowParseError> {
        let ranges = list
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(str::parse::<IpRange>)
            .collect::<Result<Vec<IpRange>, _>>()?;

        if ranges.is_empty() {
            return Err(AllowParseError::Empty);
        }
        Ok(Self { ranges })
    }

    /// Only the IPv4 and IPv6 loopback addresses.
    pub fn loopback() -> Self {
        Self {
            ranges: vec![
                IpRange {
                    network: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)),
                    prefix_len: 8,
                },
                IpRange {
                    network: IpAddr::V6(Ipv6Addr::LOCALHOST),
                    prefix_len: 128,
                },
            ],
        }
    }

    /// Returns `true` when `ip` is inside at least one range.
    pub fn allows(&self, ip: IpAddr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }

    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }
}

impl Default for AllowList {
    fn default() -> Self {
        // DEFAULT_ALLOW is a compile-time constant known to parse.
        Self::parse(DEFAULT_ALLOW).unwrap_or_else(|_| Self::loopback())
    }
}

/// Maps `::ffff:a.b.c.d` to `a.b.c.d` so IPv4 ranges apply to dual-stack peers.
fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn prefix_mask_u32(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

fn prefix_mask_u128(prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix_len))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_allows_everything() {
        let allow = AllowList::default();
        assert!(allow.allows(ip("10.1.2.3")));
        assert!(allow.allows(ip("2001:db8::1")));
        assert_eq!(allow.ranges().len(), 2);
    }

    #[test]
    fn test_prefix_length_is_honoured() {
        // Arrange
        let allow = AllowList::parse("192.168.1.0/24").unwrap();

        // Assert
        assert!(allow.allows(ip("192.168.1.200")));
        assert!(!allow.allows(ip("192.168.2.1")));
    }

    #[test]
    fn test_bare_address_is_single_host() {
        let allow = AllowList::parse("10.0.0.7").unwrap();
        assert!(allow.allows(ip("10.0.0.7")));
        assert!(!allow.allows(ip("10.0.0.8")));
    }

    #[test]
    fn test_ipv4_mapped_peer_matches_ipv4_range() {
        let allow = AllowList::parse("127.0.0.0/8").unwrap();
        assert!(allow.allows(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn test_ipv4_range_does_not_match_plain_ipv6() {
        let allow = AllowList::parse("0.0.0.0/0").unwrap();
        assert!(!allow.allows(ip("::1")));
    }

    #[test]
    fn test_ipv6_prefix() {
        let allow = AllowList::parse("fd00::/8").unwrap();
        assert!(allow.allows(ip("fd12:3456::1")));
        assert!(!allow.allows(ip("fe80::1")));
    }

    #[test]
    fn test_loopback_list() {
        let allow = AllowList::loopback();
        assert!(allow.allows(ip("127.0.0.1")));
        assert!(allow.allows(ip("::1")));
        assert!(!allow.allows(ip("192.168.0.1")));
    }

    #[test]
    fn test_whitespace_and_empty_items_are_tolerated() {
        let allow = AllowList::parse(" 10.0.0.0/8 , ,::1 ").unwrap();
        assert_eq!(allow.ranges().len(), 2);
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        assert_eq!(
            AllowList::parse("300.0.0.1/8"),
            Err(AllowParseError::InvalidAddress("300.0.0.1/8".to_string()))
        );
    }

    #[test]
    fn test_prefix_longer_than_address_is_rejected() {
        assert!(matches!(
            AllowList::parse("10.0.0.0/33"),
            Err(AllowParseError::InvalidPrefix(_))
        ));
        assert!(matches!(
            AllowList::parse("::/129"),
            Err(AllowParseError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert_eq!(AllowList::parse(" , "), Err(AllowParseError::Empty));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let range: IpRange = "172.16.0.0/12".parse().unwrap();
        assert_eq!(range.to_string(), "172.16.0.0/12");
    }
}
