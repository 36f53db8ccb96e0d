//! Subnet allocation.
//!
//! Walks same-size networks upward from a start network, reserving usable
//! host addresses in the ledger until the requested count is met.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::Network;
use crate::store::Store;
use std::net::Ipv4Addr;

/// Addresses taken from one network during an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetAllocation {
    pub network: Network,
    /// Ascending.
    pub addresses: Vec<Ipv4Addr>,
}

impl SubnetAllocation {
    pub fn count(&self) -> usize {
        self.addresses.len()
    }
}

/// Result of one [`Allocator::allocate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The normalized network the walk started from.
    pub start: Network,
    /// One entry per network used, in ascending order.
    pub subnets: Vec<SubnetAllocation>,
}

impl Allocation {
    pub fn network_address(&self) -> Ipv4Addr {
        self.start.network_address()
    }

    pub fn broadcast_address(&self) -> Ipv4Addr {
        self.start.broadcast_address()
    }

    /// Usable hosts of the start network alone.
    pub fn total_usable_hosts(&self) -> u64 {
        self.start.usable_capacity()
    }

    pub fn assigned_count(&self) -> usize {
        self.subnets.iter().map(SubnetAllocation::count).sum()
    }

    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.subnets.iter().flat_map(|s| s.addresses.iter().copied())
    }
}

/// Assigns host addresses to organizations through a [`Ledger`].
pub struct Allocator<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: Store> Allocator<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Allocator { ledger }
    }

    /// Reserve `requested` addresses for `org_id`, starting at `start` and
    /// moving to successor networks of the same prefix as each fills up.
    ///
    /// All-or-nothing: if any address is already owned the call fails with
    /// [`Error::AddressInUse`] and nothing is recorded.
    pub fn allocate(&self, start: Network, org_id: i64, requested: u64) -> Result<Allocation> {
        let prefix = start.prefix_len();
        let hosts_per_subnet = start.usable_capacity();
        if hosts_per_subnet == 0 {
            log::warn!("allocate({start}) rejected: /{prefix} has no usable hosts");
            return Err(Error::SubnetTooSmall(prefix));
        }

        let required = requested.div_ceil(hosts_per_subnet);
        // Coarse bound only; the real ceiling is successor() running out.
        let available = start.capacity();
        if required > available {
            log::warn!("allocate({start}) rejected: {required} subnets needed, bound is {available}");
            return Err(Error::InsufficientAddressSpace {
                required,
                available,
            });
        }

        log::info!(
            "allocate({start}) org={org_id} requested={requested} hosts_per_subnet={hosts_per_subnet} subnets={required}"
        );

        let mut batch = self.ledger.begin()?;
        let mut subnets = Vec::new();
        let mut remaining = requested;
        let mut current = start;

        while remaining > 0 {
            let usable = current.usable_capacity();
            if usable == 0 {
                return Err(Error::NoUsableHosts(current));
            }
            let take = remaining.min(usable);

            let mut addresses = Vec::new();
            // take <= 2^32 - 2, fits usize on 32-bit targets too
            for addr in current.hosts().take(take as usize) {
                batch.stage(addr, org_id, prefix).map_err(|e| match e {
                    Error::DuplicateAddress(a) => Error::AddressInUse(a),
                    other => other,
                })?;
                addresses.push(addr);
            }
            log::debug!("allocate() {current} assigned {take}");
            subnets.push(SubnetAllocation {
                network: current,
                addresses,
            });

            remaining -= take;
            if remaining > 0 {
                current = current.successor()?;
            }
        }

        batch.commit()?;

        Ok(Allocation { start, subnets })
    }
}
