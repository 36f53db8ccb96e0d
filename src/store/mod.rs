//! Storage collaborators for organizations and host assignments.
//!
//! - [`memory`] - in-process store
//! - [`json_file`] - store persisted as a single JSON document

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{Error, Result};
use crate::models::{HostAssignment, Organization};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Record store consumed by the ledger and the reporting layer.
///
/// Implementations must keep `ip_address` unique across all organizations and
/// make [`Store::insert_assignments`] all-or-nothing.
pub trait Store: Send + Sync {
    /// Register a new organization. Fails with `OrganizationAlreadyExists` if the
    /// name is taken.
    fn create_organization(&self, name: &str, pc_count: u64) -> Result<Organization>;

    fn find_organization(&self, name: &str) -> Result<Option<Organization>>;

    /// All organizations in registration order.
    fn organizations(&self) -> Result<Vec<Organization>>;

    /// Id of the organization owning `addr`, if any.
    fn owner_of(&self, addr: Ipv4Addr) -> Result<Option<i64>>;

    /// Insert every row or none. Fails with `DuplicateAddress` on the first
    /// address already stored or repeated within `rows`.
    fn insert_assignments(&self, rows: &[HostAssignment]) -> Result<()>;

    /// Assignments of one organization in insertion order.
    fn assignments_for(&self, org_id: i64) -> Result<Vec<HostAssignment>>;
}

/// Table contents shared by the store implementations.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub(crate) struct State {
    organizations: Vec<Organization>,
    assignments: Vec<HostAssignment>,
    #[serde(skip)]
    owners: HashMap<Ipv4Addr, i64>,
}

impl State {
    /// Rebuild the address index after deserializing.
    pub(crate) fn reindex(mut self) -> Result<State> {
        self.owners.clear();
        for row in &self.assignments {
            if self.owners.insert(row.ip_address, row.org_id).is_some() {
                return Err(Error::Storage(format!(
                    "address {} stored more than once",
                    row.ip_address
                )));
            }
        }
        Ok(self)
    }

    pub(crate) fn create_organization(&mut self, name: &str, pc_count: u64) -> Result<Organization> {
        if self.organizations.iter().any(|o| o.name == name) {
            return Err(Error::OrganizationAlreadyExists(name.to_string()));
        }
        let id = self.organizations.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let org = Organization {
            id,
            name: name.to_string(),
            pc_count,
            created_at: Utc::now(),
        };
        self.organizations.push(org.clone());
        Ok(org)
    }

    pub(crate) fn find_organization(&self, name: &str) -> Option<Organization> {
        self.organizations.iter().find(|o| o.name == name).cloned()
    }

    pub(crate) fn organizations(&self) -> Vec<Organization> {
        self.organizations.clone()
    }

    pub(crate) fn owner_of(&self, addr: Ipv4Addr) -> Option<i64> {
        self.owners.get(&addr).copied()
    }

    pub(crate) fn insert_assignments(&mut self, rows: &[HostAssignment]) -> Result<()> {
        let mut batch = HashSet::with_capacity(rows.len());
        for row in rows {
            if !self.organizations.iter().any(|o| o.id == row.org_id) {
                return Err(Error::OrganizationNotFound(format!("id {}", row.org_id)));
            }
            if self.owners.contains_key(&row.ip_address) || !batch.insert(row.ip_address) {
                return Err(Error::DuplicateAddress(row.ip_address));
            }
        }
        for row in rows {
            self.owners.insert(row.ip_address, row.org_id);
            self.assignments.push(*row);
        }
        Ok(())
    }

    pub(crate) fn assignments_for(&self, org_id: i64) -> Vec<HostAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.org_id == org_id)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ip: [u8; 4], org_id: i64) -> HostAssignment {
        HostAssignment {
            ip_address: Ipv4Addr::from(ip),
            prefix_len: 24,
            org_id,
        }
    }

    #[test]
    fn test_state_org_ids_ascend() {
        let mut state = State::default();
        let a = state.create_organization("acme", 10).unwrap();
        let b = state.create_organization("globex", 3).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(
            state.create_organization("acme", 1).unwrap_err(),
            Error::OrganizationAlreadyExists("acme".to_string())
        );
        assert_eq!(state.organizations().len(), 2);
    }

    #[test]
    fn test_state_insert_is_all_or_nothing() {
        let mut state = State::default();
        state.create_organization("acme", 10).unwrap();
        state.insert_assignments(&[row([10, 0, 0, 5], 1)]).unwrap();

        let err = state
            .insert_assignments(&[row([10, 0, 0, 4], 1), row([10, 0, 0, 5], 1)])
            .unwrap_err();
        assert_eq!(err, Error::DuplicateAddress(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(state.assignments_for(1).len(), 1);
        assert_eq!(state.owner_of(Ipv4Addr::new(10, 0, 0, 4)), None);

        let err = state
            .insert_assignments(&[row([10, 0, 0, 7], 1), row([10, 0, 0, 7], 1)])
            .unwrap_err();
        assert_eq!(err, Error::DuplicateAddress(Ipv4Addr::new(10, 0, 0, 7)));
        assert_eq!(state.assignments_for(1).len(), 1);
    }

    #[test]
    fn test_state_rejects_unknown_org() {
        let mut state = State::default();
        assert!(matches!(
            state.insert_assignments(&[row([10, 0, 0, 1], 9)]),
            Err(Error::OrganizationNotFound(_))
        ));
    }

    #[test]
    fn test_state_reindex() {
        let mut state = State::default();
        state.create_organization("acme", 1).unwrap();
        state.insert_assignments(&[row([10, 0, 0, 1], 1)]).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let loaded: State = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.owner_of(Ipv4Addr::new(10, 0, 0, 1)), None);
        let loaded = loaded.reindex().unwrap();
        assert_eq!(loaded.owner_of(Ipv4Addr::new(10, 0, 0, 1)), Some(1));

        let mut dup = state.clone();
        dup.assignments.push(row([10, 0, 0, 1], 1));
        assert!(matches!(dup.reindex(), Err(Error::Storage(_))));
    }
}
