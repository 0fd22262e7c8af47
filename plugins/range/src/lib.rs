#![warn(
    missing_debug_implementations,
    // missing_docs, // we shall remove thee, someday!
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]
//! Lease persistence for the range plugin.
//!
//! The plugin binds a single lease file at setup with
//! [`PluginState::register_backing_db`], seeds its allocator from
//! [`PluginState::load_records`], and calls
//! [`PluginState::save_ip_address`] every time a lease is created, renewed or
//! updated.

pub mod metrics;

use std::{path::Path, sync::OnceLock};

use parking_lot::Mutex;
use tracing::{debug, error, info};

pub use lease_db::{LeaseDb, LeaseDbError, LeaseTable, MacAddr, Record, parse_mac};

/// Storage state owned by a range plugin instance
#[derive(Debug, Default)]
pub struct PluginState {
    leasedb: OnceLock<LeaseDb>,
    // held across check-and-open so a losing caller does no I/O
    bind_lock: Mutex<()>,
}

impl PluginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a lease file as the backing store for leases. A plugin only
    /// ever has one: any later call fails with `AlreadyBound` and leaves the
    /// existing binding in place. The file is held open for the life of the
    /// plugin; there is no way to close it.
    pub fn register_backing_db(&self, path: impl AsRef<Path>) -> Result<(), LeaseDbError> {
        let path = path.as_ref();
        let _guard = self.bind_lock.lock();
        if let Some(db) = self.leasedb.get() {
            error!(
                requested = %path.display(),
                bound = %db.path().display(),
                "cannot swap out a lease database while running"
            );
            return Err(LeaseDbError::AlreadyBound);
        }
        let db = LeaseDb::open(path).inspect_err(|err| {
            error!(?err, path = %path.display(), "failed to open lease database");
        })?;
        self.leasedb
            .set(db)
            .map_err(|_| LeaseDbError::AlreadyBound)?;
        metrics::LEASE_DB_BOUND.set(1);
        info!(path = %path.display(), "lease database registered");
        Ok(())
    }

    /// the bound lease file, if any
    pub fn leasedb(&self) -> Option<&LeaseDb> {
        self.leasedb.get()
    }

    fn bound(&self) -> Result<&LeaseDb, LeaseDbError> {
        self.leasedb.get().ok_or(LeaseDbError::Unbound)
    }

    /// Replay the bound lease file into a table of the latest record for
    /// each hardware address
    pub fn load_records(&self) -> Result<LeaseTable, LeaseDbError> {
        let records = self.bound()?.load()?;
        metrics::LEASES_LOADED.inc_by(records.len() as u64);
        info!(leases = records.len(), "loaded leases from storage");
        Ok(records)
    }

    /// writes out a lease to storage
    pub fn save_ip_address(&self, hw: MacAddr, record: &Record) -> Result<(), LeaseDbError> {
        match self.bound()?.append(hw, record) {
            Ok(()) => {
                metrics::LEASES_PERSISTED.inc();
                debug!(%hw, ip = %record.address, expires = record.expires, "lease saved");
                Ok(())
            }
            Err(err) => {
                metrics::LEASE_PERSIST_FAILURES.inc();
                error!(?err, %hw, "record insert/update failed");
                Err(err)
            }
        }
    }
}
