//! Subnet specifier parsing and network normalization.
//!
//! A specifier is either an all-digit prefix length ("24") or a dotted-decimal
//! mask ("255.255.255.0").

use crate::error::{Error, Result};
use crate::models::{Network, MAX_LENGTH};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// How dotted-decimal masks are turned into a prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPolicy {
    /// Count the set bits; non-contiguous masks are accepted as-is.
    #[default]
    Loose,
    /// Reject masks that are not ones followed by zeros.
    Strict,
}

/// A parsed subnet specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetSpec {
    Prefix(u8),
    Mask(Ipv4Addr),
}

impl FromStr for SubnetSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<SubnetSpec> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            // digits that overflow u8 are out of range too
            match s.parse::<u8>() {
                Ok(len) if len <= MAX_LENGTH => Ok(SubnetSpec::Prefix(len)),
                _ => Err(Error::InvalidPrefix(s.to_string())),
            }
        } else {
            s.parse::<Ipv4Addr>()
                .map(SubnetSpec::Mask)
                .map_err(|_| Error::InvalidMask(s.to_string()))
        }
    }
}

impl SubnetSpec {
    pub fn prefix_len(&self, policy: MaskPolicy) -> Result<u8> {
        match *self {
            SubnetSpec::Prefix(len) => Ok(len),
            SubnetSpec::Mask(mask) => {
                if policy == MaskPolicy::Strict && !is_contiguous_mask(mask) {
                    return Err(Error::InvalidMask(mask.to_string()));
                }
                Ok(mask_prefix_len(mask))
            }
        }
    }
}

/// Prefix length of a dotted-decimal mask, computed as the number of set bits.
///
/// The mask is not checked for contiguity: 255.0.255.0 yields 16. Use
/// [`is_contiguous_mask`] or [`MaskPolicy::Strict`] to reject such masks.
pub fn mask_prefix_len(mask: Ipv4Addr) -> u8 {
    u32::from(mask).count_ones() as u8
}

/// True when the mask is a run of ones followed only by zeros.
pub fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

/// Parse an address and a subnet specifier into the containing network.
///
/// The address is floored to its network boundary, so "192.168.1.77" with "24"
/// gives 192.168.1.0/24.
pub fn normalize(ip: &str, subnet_spec: &str, policy: MaskPolicy) -> Result<Network> {
    let addr: Ipv4Addr = ip
        .parse()
        .map_err(|_| Error::InvalidAddress(ip.to_string()))?;
    let prefix = subnet_spec.parse::<SubnetSpec>()?.prefix_len(policy)?;
    let network = Network::containing(addr, prefix)?;
    log::debug!("normalize({ip}, {subnet_spec}) -> {network}");
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefix_spec() {
        assert_eq!("24".parse::<SubnetSpec>().unwrap(), SubnetSpec::Prefix(24));
        assert_eq!("0".parse::<SubnetSpec>().unwrap(), SubnetSpec::Prefix(0));
        assert_eq!("032".parse::<SubnetSpec>().unwrap(), SubnetSpec::Prefix(32));
        assert_eq!(
            "33".parse::<SubnetSpec>().unwrap_err(),
            Error::InvalidPrefix("33".to_string())
        );
        assert!(matches!(
            "99999999999".parse::<SubnetSpec>(),
            Err(Error::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_parse_mask_spec() {
        assert_eq!(
            "255.255.255.0".parse::<SubnetSpec>().unwrap(),
            SubnetSpec::Mask(Ipv4Addr::new(255, 255, 255, 0))
        );
        assert!(matches!(
            "255.255.255".parse::<SubnetSpec>(),
            Err(Error::InvalidMask(_))
        ));
        assert!(matches!("".parse::<SubnetSpec>(), Err(Error::InvalidMask(_))));
        assert!(matches!("-1".parse::<SubnetSpec>(), Err(Error::InvalidMask(_))));
    }

    #[test]
    fn test_mask_prefix_len() {
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 255, 255, 0)), 24);
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 255, 255, 252)), 30);
        assert_eq!(mask_prefix_len(Ipv4Addr::new(0, 0, 0, 0)), 0);
        // non-contiguous: loose popcount
        assert_eq!(mask_prefix_len(Ipv4Addr::new(255, 0, 255, 0)), 16);
    }

    #[test]
    fn test_contiguous_mask() {
        assert!(is_contiguous_mask(Ipv4Addr::new(255, 255, 255, 0)));
        assert!(is_contiguous_mask(Ipv4Addr::new(0, 0, 0, 0)));
        assert!(is_contiguous_mask(Ipv4Addr::new(255, 255, 255, 255)));
        assert!(!is_contiguous_mask(Ipv4Addr::new(255, 0, 255, 0)));
        assert!(!is_contiguous_mask(Ipv4Addr::new(0, 255, 255, 255)));
    }

    #[test]
    fn test_mask_policy() {
        let spec: SubnetSpec = "255.0.255.0".parse().unwrap();
        assert_eq!(spec.prefix_len(MaskPolicy::Loose).unwrap(), 16);
        assert_eq!(
            spec.prefix_len(MaskPolicy::Strict).unwrap_err(),
            Error::InvalidMask("255.0.255.0".to_string())
        );
    }

    #[test]
    fn test_normalize() {
        let net = normalize("192.168.1.77", "24", MaskPolicy::Loose).unwrap();
        assert_eq!(net, Network::new("192.168.1.0/24").unwrap());

        let net = normalize("10.20.30.40", "255.255.0.0", MaskPolicy::Loose).unwrap();
        assert_eq!(net, Network::new("10.20.0.0/16").unwrap());

        assert_eq!(
            normalize("10.0.0", "24", MaskPolicy::Loose).unwrap_err(),
            Error::InvalidAddress("10.0.0".to_string())
        );
        assert!(matches!(
            normalize("10.0.0.1", "40", MaskPolicy::Loose),
            Err(Error::InvalidPrefix(_))
        ));
    }
}
