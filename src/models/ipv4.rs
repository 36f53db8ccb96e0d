//! IPv4 network arithmetic.
//!
//! Provides the [`Network`] value type (a normalized address/prefix pair) and the
//! free functions it is built on.

use crate::error::{Error, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 prefix (32 bits).
pub const MAX_LENGTH: u8 = 32;

fn check_len(len: u8) -> Result<()> {
    if len > MAX_LENGTH {
        Err(Error::InvalidPrefix(len.to_string()))
    } else {
        Ok(())
    }
}

// Caller guarantees len <= 32.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len;
    let all_bits = u32::MAX as u64;
    ((all_bits >> right_len) << right_len) as u32
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use subnet_ledger::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32> {
    check_len(len)?;
    Ok(mask_bits(len))
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    check_len(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask_bits(len)))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    check_len(len)?;
    let mask = mask_bits(len);
    Ok(Ipv4Addr::from((u32::from(addr) & mask) | !mask))
}

/// Number of addresses in a network of the given prefix length, `2^(32-len)`.
pub fn num_addresses(len: u8) -> Result<u64> {
    check_len(len)?;
    Ok(1u64 << (MAX_LENGTH - len))
}

/// Number of usable host addresses, excluding the network and broadcast address.
///
/// /31 and /32 have none.
pub fn num_usable_hosts(len: u8) -> Result<u64> {
    Ok(num_addresses(len)?.saturating_sub(2))
}

/// Returns the first address after the network containing `addr`.
///
/// Fails with [`Error::AddressSpaceExhausted`] when the network already ends at
/// 255.255.255.255.
pub fn ip_after_subnet(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let network_bits = u32::from(cut_addr(addr, len)?) as u64;
    let next_bits = network_bits + num_addresses(len)?;
    u32::try_from(next_bits)
        .map(Ipv4Addr::from)
        .map_err(|_| {
            Error::AddressSpaceExhausted(Network {
                addr: Ipv4Addr::from(network_bits as u32),
                prefix: len,
            })
        })
}

/// IPv4 network: a network address and a prefix length.
///
/// The address is always floored to the network boundary on construction, so a
/// host address with trailing bits set silently becomes its containing network.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Network {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Network {
    /// Create a [`Network`] from a CIDR string (e.g. "10.0.0.0/24").
    ///
    /// Host bits are dropped: "10.0.0.7/24" yields 10.0.0.0/24.
    pub fn new(addr_cidr: &str) -> Result<Network> {
        let addr_cidr = addr_cidr.trim();
        let (addr, prefix) = addr_cidr
            .split_once('/')
            .ok_or_else(|| Error::InvalidAddress(addr_cidr.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| Error::InvalidAddress(addr.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| Error::InvalidPrefix(prefix.to_string()))?;
        Network::containing(addr, prefix)
    }

    /// The network of length `prefix` that contains `addr` (non-strict).
    pub fn containing(addr: Ipv4Addr, prefix: u8) -> Result<Network> {
        Ok(Network {
            addr: cut_addr(addr, prefix)?,
            prefix,
        })
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn broadcast_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) | !mask_bits(self.prefix))
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Subnet mask in dotted-decimal form.
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(mask_bits(self.prefix))
    }

    /// Total number of addresses, `2^(32-prefix)`.
    pub fn capacity(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.prefix)
    }

    /// Number of usable host addresses, `max(capacity - 2, 0)`.
    pub fn usable_capacity(&self) -> u64 {
        self.capacity().saturating_sub(2)
    }

    /// Usable host addresses in ascending order.
    ///
    /// The iterator is lazy and calling `hosts()` again restarts it. Empty for
    /// /31 and /32.
    pub fn hosts(&self) -> Hosts {
        if self.capacity() > 2 {
            Hosts {
                next: u32::from(self.addr) as u64 + 1,
                end: u32::from(self.broadcast_address()) as u64,
            }
        } else {
            Hosts { next: 0, end: 0 }
        }
    }

    pub fn first_usable(&self) -> Option<Ipv4Addr> {
        self.hosts().next()
    }

    pub fn last_usable(&self) -> Option<Ipv4Addr> {
        if self.capacity() > 2 {
            Some(Ipv4Addr::from(u32::from(self.broadcast_address()) - 1))
        } else {
            None
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask_bits(self.prefix) == u32::from(self.addr)
    }

    /// The adjacent network of the same size, starting right after this one's
    /// broadcast address.
    pub fn successor(&self) -> Result<Network> {
        let addr = ip_after_subnet(self.addr, self.prefix)?;
        Ok(Network {
            addr,
            prefix: self.prefix,
        })
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Network> {
        Network::new(s)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Network, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Network::new(&s).map_err(de::Error::custom)
    }
}

/// Iterator over the usable hosts of a [`Network`].
#[derive(Debug, Clone)]
pub struct Hosts {
    next: u64,
    // exclusive
    end: u64,
}

impl Iterator for Hosts {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.next >= self.end {
            return None;
        }
        let addr = Ipv4Addr::from(self.next as u32);
        self.next += 1;
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.end.saturating_sub(self.next)) {
            Ok(len) => (len, Some(len)),
            Err(_) => (usize::MAX, None),
        }
    }
}
