//! Assignment ledger: global address uniqueness on top of a [`Store`].

use crate::error::{Error, Result};
use crate::models::HostAssignment;
use crate::store::Store;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard};

/// Records which organization owns which address.
///
/// Reservations go through a [`Batch`], which holds the ledger's commit lock
/// from the first check until commit or drop. Two batches therefore never
/// both see the same address as free.
pub struct Ledger<S> {
    store: S,
    commit_lock: Mutex<()>,
}

impl<S: Store> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger {
            store,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start an all-or-nothing batch of reservations.
    ///
    /// Blocks while another batch is open.
    pub fn begin(&self) -> Result<Batch<'_, S>> {
        let guard = self
            .commit_lock
            .lock()
            .map_err(|e| Error::Storage(format!("ledger lock poisoned: {e}")))?;
        Ok(Batch {
            ledger: self,
            _guard: guard,
            staged: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Reserve a single address. Fails with `DuplicateAddress` if any
    /// organization already owns it.
    pub fn reserve(&self, addr: Ipv4Addr, org_id: i64, prefix_len: u8) -> Result<()> {
        let mut batch = self.begin()?;
        batch.stage(addr, org_id, prefix_len)?;
        batch.commit()?;
        Ok(())
    }

    /// `(address, prefix_len)` pairs owned by `org_id`, in insertion order.
    pub fn list_by_organization(&self, org_id: i64) -> Result<Vec<(Ipv4Addr, u8)>> {
        Ok(self
            .store
            .assignments_for(org_id)?
            .into_iter()
            .map(|a| (a.ip_address, a.prefix_len))
            .collect())
    }
}

/// Reservations staged against a [`Ledger`]. Nothing is recorded until
/// [`Batch::commit`]; dropping the batch discards everything staged.
pub struct Batch<'a, S: Store> {
    ledger: &'a Ledger<S>,
    _guard: MutexGuard<'a, ()>,
    staged: Vec<HostAssignment>,
    seen: HashSet<Ipv4Addr>,
}

impl<'a, S: Store> Batch<'a, S> {
    /// Check `addr` against the ledger and this batch, then stage it.
    pub fn stage(&mut self, addr: Ipv4Addr, org_id: i64, prefix_len: u8) -> Result<()> {
        if self.seen.contains(&addr) {
            return Err(Error::DuplicateAddress(addr));
        }
        if let Some(owner) = self.ledger.store.owner_of(addr)? {
            log::debug!("stage({addr}) rejected, owned by org {owner}");
            return Err(Error::DuplicateAddress(addr));
        }
        log::trace!("stage({addr}/{prefix_len}) for org {org_id}");
        self.seen.insert(addr);
        self.staged.push(HostAssignment {
            ip_address: addr,
            prefix_len,
            org_id,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write every staged reservation in one atomic insert. Returns the number
    /// of addresses recorded.
    pub fn commit(mut self) -> Result<usize> {
        let rows = std::mem::take(&mut self.staged);
        if rows.is_empty() {
            return Ok(0);
        }
        self.ledger.store.insert_assignments(&rows)?;
        log::debug!("commit() recorded {} addresses", rows.len());
        Ok(rows.len())
    }
}

impl<'a, S: Store> Drop for Batch<'a, S> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            log::debug!("discarding {} staged reservations", self.staged.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ledger_with_orgs() -> Ledger<MemoryStore> {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.store().create_organization("a", 1).unwrap();
        ledger.store().create_organization("b", 1).unwrap();
        ledger
    }

    #[test]
    fn test_reserve_rejects_duplicate_across_orgs() {
        let ledger = ledger_with_orgs();
        let addr = Ipv4Addr::new(10, 0, 0, 5);
        ledger.reserve(addr, 1, 24).unwrap();
        assert_eq!(
            ledger.reserve(addr, 2, 24).unwrap_err(),
            Error::DuplicateAddress(addr)
        );
        assert_eq!(ledger.list_by_organization(1).unwrap(), vec![(addr, 24)]);
        assert!(ledger.list_by_organization(2).unwrap().is_empty());
    }

    #[test]
    fn test_batch_discarded_on_drop() {
        let ledger = ledger_with_orgs();
        {
            let mut batch = ledger.begin().unwrap();
            batch.stage(Ipv4Addr::new(10, 0, 0, 1), 1, 24).unwrap();
            batch.stage(Ipv4Addr::new(10, 0, 0, 2), 1, 24).unwrap();
            assert_eq!(batch.len(), 2);
        }
        assert!(ledger.list_by_organization(1).unwrap().is_empty());
    }

    #[test]
    fn test_batch_rejects_repeat_within_batch() {
        let ledger = ledger_with_orgs();
        let mut batch = ledger.begin().unwrap();
        let addr = Ipv4Addr::new(10, 0, 0, 1);
        batch.stage(addr, 1, 24).unwrap();
        assert_eq!(
            batch.stage(addr, 1, 24).unwrap_err(),
            Error::DuplicateAddress(addr)
        );
        assert_eq!(batch.commit().unwrap(), 1);
    }

    #[test]
    fn test_batch_commit_preserves_order() {
        let ledger = ledger_with_orgs();
        let mut batch = ledger.begin().unwrap();
        for last in [9, 3, 7] {
            batch.stage(Ipv4Addr::new(10, 0, 0, last), 2, 28).unwrap();
        }
        assert_eq!(batch.commit().unwrap(), 3);
        assert_eq!(
            ledger.list_by_organization(2).unwrap(),
            vec![
                (Ipv4Addr::new(10, 0, 0, 9), 28),
                (Ipv4Addr::new(10, 0, 0, 3), 28),
                (Ipv4Addr::new(10, 0, 0, 7), 28),
            ]
        );
    }

    #[test]
    fn test_concurrent_batches_never_share_an_address() {
        let ledger = ledger_with_orgs();
        let results: Vec<Result<usize>> = std::thread::scope(|s| {
            let handles: Vec<_> = [1i64, 2]
                .into_iter()
                .map(|org_id| {
                    let ledger = &ledger;
                    s.spawn(move || {
                        let mut batch = ledger.begin()?;
                        for last in 1..=50 {
                            batch.stage(Ipv4Addr::new(10, 0, 0, last), org_id, 24)?;
                        }
                        batch.commit()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let total =
            ledger.list_by_organization(1).unwrap().len() + ledger.list_by_organization(2).unwrap().len();
        assert_eq!(total, 50);
    }
}
