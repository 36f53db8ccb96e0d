//! Host assignment record.

use super::Network;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One address handed to one organization.
///
/// `ip_address` is unique across all organizations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAssignment {
    pub ip_address: Ipv4Addr,
    /// Prefix length of the network the address was allocated from.
    pub prefix_len: u8,
    pub org_id: i64,
}

impl HostAssignment {
    /// Recompute the containing network from the stored address and prefix.
    pub fn network(&self) -> Result<Network> {
        Network::containing(self.ip_address, self.prefix_len)
    }
}
