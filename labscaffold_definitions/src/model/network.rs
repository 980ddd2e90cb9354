use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A validated IPv4 CIDR block, canonicalised to its network address
/// (host bits zeroed) on construction.
///
/// Built on `ipnet::Ipv4Net`, grounded in `Qovery-engine`'s dependency on
/// `ipnet` for the same family of address-block arithmetic; the teacher has
/// no CIDR type of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkCidr(Ipv4Net);

impl NetworkCidr {
    pub fn parse(s: &str) -> Result<Self, String> {
        let net: Ipv4Net = s
            .parse()
            .map_err(|e| format!("'{s}' is not a valid CIDR: {e}"))?;
        Ok(NetworkCidr(net.trunc()))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.0.contains(&addr)
    }

    /// Non-null intersection of the two address ranges.
    pub fn overlaps(&self, other: &NetworkCidr) -> bool {
        self.0.contains(&other.0.network())
            || other.0.contains(&self.0.network())
            || self.0.contains(&other.0.broadcast())
            || other.0.contains(&self.0.broadcast())
    }

    pub fn address_count(&self) -> u64 {
        1u64 << (32 - self.0.prefix_len() as u32)
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    pub fn network(&self) -> Ipv4Addr {
        self.0.network()
    }
}

impl std::fmt::Display for NetworkCidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetworkCidr {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkCidr::parse(s)
    }
}

impl TryFrom<String> for NetworkCidr {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        NetworkCidr::parse(&value)
    }
}

impl From<NetworkCidr> for String {
    fn from(value: NetworkCidr) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalises_host_bits() {
        let c = NetworkCidr::parse("10.244.1.5/16").unwrap();
        assert_eq!(c.to_string(), "10.244.0.0/16");
    }

    #[test]
    fn overlap_is_symmetric_and_reflexive() {
        let a = NetworkCidr::parse("10.244.0.0/16").unwrap();
        let b = NetworkCidr::parse("10.244.128.0/17").unwrap();
        let c = NetworkCidr::parse("10.96.0.0/12").unwrap();
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&a));
        assert!(a.overlaps(&b)); // b is a subset of a
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn address_count_matches_prefix() {
        assert_eq!(NetworkCidr::parse("10.244.0.0/16").unwrap().address_count(), 65536);
        assert_eq!(NetworkCidr::parse("10.96.0.0/12").unwrap().address_count(), 1 << 20);
    }

    #[test]
    fn rejects_garbage() {
        assert!(NetworkCidr::parse("not-a-cidr").is_err());
    }
}
