//! Typed request and result shapes.
//!
//! Requests are parsed from JSON with `serde_path_to_error`, so a malformed
//! field is reported with its path.

use crate::error::{Error, Result};
use crate::models::Network;
use crate::processing::Allocation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::InvalidRequest(format!("path={} error={}", e.path(), e.inner())))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::InvalidRequest(format!("missing required field `{field}`")))
    } else {
        Ok(())
    }
}

/// Register an organization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    #[serde(alias = "organization_name")]
    pub org_name: String,
    pub pc_count: u64,
}

impl RegisterRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let req: RegisterRequest = parse_json(json)?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> Result<()> {
        require("org_name", &self.org_name)
    }
}

/// Allocate `requested_count` addresses for an organization, starting from the
/// network containing `ip_address`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    #[serde(alias = "org_name")]
    pub organization_name: String,
    pub ip_address: String,
    /// Prefix length ("24") or dotted mask ("255.255.255.0").
    #[serde(alias = "subnet_mask")]
    pub subnet_spec: String,
    pub requested_count: u64,
}

impl AllocationRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let req: AllocationRequest = parse_json(json)?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> Result<()> {
        require("organization_name", &self.organization_name)?;
        require("ip_address", &self.ip_address)?;
        require("subnet_spec", &self.subnet_spec)
    }
}

/// One network's share of an allocation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignedSubnet {
    pub subnet: Network,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    pub first_usable: Option<Ipv4Addr>,
    pub last_usable: Option<Ipv4Addr>,
    pub pcs_allocated: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationResult {
    pub organization: String,
    /// The normalized start network.
    pub assigned_subnet: Network,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    /// Usable hosts of the start network.
    pub total_usable_hosts: u64,
    pub assigned_subnets: Vec<AssignedSubnet>,
}

impl AllocationResult {
    pub fn new(organization: &str, allocation: &Allocation) -> Self {
        AllocationResult {
            organization: organization.to_string(),
            assigned_subnet: allocation.start,
            network_address: allocation.network_address(),
            broadcast_address: allocation.broadcast_address(),
            total_usable_hosts: allocation.total_usable_hosts(),
            assigned_subnets: allocation
                .subnets
                .iter()
                .map(|s| AssignedSubnet {
                    subnet: s.network,
                    network_address: s.network.network_address(),
                    broadcast_address: s.network.broadcast_address(),
                    first_usable: s.network.first_usable(),
                    last_usable: s.network.last_usable(),
                    pcs_allocated: s.count(),
                })
                .collect(),
        }
    }
}

/// Standalone description of a network, without allocating anything.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetSummary {
    pub subnet: Network,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub total_hosts: u64,
    pub usable_hosts: u64,
    pub first_usable: Option<Ipv4Addr>,
    pub last_usable: Option<Ipv4Addr>,
}

impl From<Network> for SubnetSummary {
    fn from(net: Network) -> Self {
        SubnetSummary {
            subnet: net,
            network_address: net.network_address(),
            broadcast_address: net.broadcast_address(),
            netmask: net.netmask(),
            total_hosts: net.capacity(),
            usable_hosts: net.usable_capacity(),
            first_usable: net.first_usable(),
            last_usable: net.last_usable(),
        }
    }
}
