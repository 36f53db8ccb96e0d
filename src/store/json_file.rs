//! Store persisted as one JSON document on disk.

use super::{State, Store};
use crate::error::{Error, Result};
use crate::models::{HostAssignment, Organization};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

/// Store that rewrites its JSON file after every successful mutation.
///
/// Mutations are applied to a copy of the state, written to disk, then
/// swapped in. The file is replaced by renaming a fully written sibling temp
/// file over it, so a failed validation or write leaves both the file and the
/// in-memory state untouched.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(json) => {
                log::info!("Reading ledger file: {}", path.display());
                let mut deserializer = serde_json::Deserializer::from_str(&json);
                let state: State = serde_path_to_error::deserialize(&mut deserializer)
                    .map_err(|e| {
                        Error::Serialization(format!(
                            "Error parsing ledger file {}: path={} error={}",
                            path.display(),
                            e.path(),
                            e
                        ))
                    })?;
                state.reindex()?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Ledger file not found, starting empty: {}", path.display());
                State::default()
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Error reading ledger file {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {e}")))
    }

    fn persist(&self, state: &State) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| Error::Serialization(format!("Error serializing ledger: {e}")))?;
        log::debug!("Writing ledger file: {}", self.path.display());
        write_atomic(&self.path, json.as_bytes()).map_err(|e| {
            Error::Storage(format!(
                "Error writing ledger file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Apply `op` to a copy of the state, persist it, then publish it.
    fn mutate<T>(&self, op: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {e}")))?;
        let mut next = guard.clone();
        let out = op(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

/// Replace `path` with `bytes`. The target is only touched by the final rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    // on failure the temp file is removed when the error drops
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Store for JsonFileStore {
    fn create_organization(&self, name: &str, pc_count: u64) -> Result<Organization> {
        self.mutate(|state| state.create_organization(name, pc_count))
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
        self.mutate(|state| state.insert_assignments(rows))
    }

    fn assignments_for(&self, org_id: i64) -> Result<Vec<HostAssignment>> {
        Ok(self.read()?.assignments_for(org_id))
    }
}
