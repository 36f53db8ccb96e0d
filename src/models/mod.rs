//! Domain models for the subnet ledger.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Network`] - normalized IPv4 network with address arithmetic
//! - [`Organization`] - a registered owner of addresses
//! - [`HostAssignment`] - one address recorded against one organization

mod assignment;
mod ipv4;
mod organization;

// Re-export public types
pub use assignment::HostAssignment;
pub use ipv4::{
    broadcast_addr, cut_addr, get_cidr_mask, ip_after_subnet, num_addresses, num_usable_hosts,
    Hosts, Network, MAX_LENGTH,
};
pub use organization::Organization;
