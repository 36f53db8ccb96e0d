//! In-process store.

use super::{State, Store};
use crate::error::{Error, Result};
use crate::models::{HostAssignment, Organization};
use std::net::Ipv4Addr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Store holding all records in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {e}")))
    }
}

impl Store for MemoryStore {
    fn create_organization(&self, name: &str, pc_count: u64) -> Result<Organization> {
        self.write()?.create_organization(name, pc_count)
    }

    fn find_organization(&self, name: &str) -> Result<Option<Organization>> {
        Ok(self.read()?.find_organization(name))
    }

    fn organizations(&self) -> Result<Vec<Organization>> {
        Ok(self.read()?.organizations())
    }

    fn owner_of(&self, addr: Ipv4Addr) -> Result<Option<i64>> {
        Ok(self.read()?.owner_of(addr))
    }

    fn insert_assignments(&self, rows: &[HostAssignment]) -> Result<()> {
        self.write()?.insert_assignments(rows)
    }

    fn assignments_for(&self, org_id: i64) -> Result<Vec<HostAssignment>> {
        Ok(self.read()?.assignments_for(org_id))
    }
}
