//! Error type shared by every layer of the ledger.

use crate::models::Network;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("invalid CIDR prefix: {0} (must be between 0 and 32)")]
    InvalidPrefix(String),

    #[error("invalid subnet mask: {0}")]
    InvalidMask(String),

    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("organization already exists: {0}")]
    OrganizationAlreadyExists(String),

    #[error("a /{0} subnet has no usable host addresses")]
    SubnetTooSmall(u8),

    #[error("cannot create required number of subnets: need {required}, only {available} available")]
    InsufficientAddressSpace { required: u64, available: u64 },

    #[error("no usable hosts available in subnet {0}")]
    NoUsableHosts(Network),

    #[error("IP address {0} is already in use")]
    AddressInUse(Ipv4Addr),

    #[error("address {0} is already recorded in the ledger")]
    DuplicateAddress(Ipv4Addr),

    #[error("no subnet follows {0}: address space exhausted")]
    AddressSpaceExhausted(Network),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}
