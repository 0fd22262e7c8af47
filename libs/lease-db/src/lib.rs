//! # lease-db
//!
//! `lease-db` is a flat file, append-only store of leases. Every lease
//! create/renew/update is appended as one line via [`LeaseDb::append`], and
//! on startup [`LeaseDb::load`] replays the whole file to rebuild the current
//! lease table, with the last line for a hardware address winning.
//!
//! The file is never truncated or rewritten, and there is no delete record.
//!
//! [`LeaseDb::append`]: crate::LeaseDb::append
//! [`LeaseDb::load`]: crate::LeaseDb::load
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

pub mod codec;
pub mod error;

pub use codec::{Record, decode, encode, parse_mac};
pub use error::{Field, LeaseDbError};
pub use pnet::datalink::MacAddr;

/// current lease for each hardware address, keyed by the canonical
/// (lowercase, colon separated) address text
pub type LeaseTable = HashMap<String, Record>;

/// Handle to an open lease file.
///
/// The file is opened once and held for as long as the handle lives. Reads
/// and appends are serialized through an internal lock so concurrent
/// appends never interleave within a line.
#[derive(Debug)]
pub struct LeaseDb {
    path: PathBuf,
    file: Mutex<File>,
}

impl LeaseDb {
    /// Open `path` for append and read, creating it if missing. New files are
    /// only accessible by the owner. Nothing is written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LeaseDbError> {
        let path = path.as_ref();
        let mut opts = OpenOptions::new();
        opts.read(true).append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let file = opts
            .open(path)
            .map_err(|source| LeaseDbError::StorageUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "opened lease database");

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: io::Error) -> LeaseDbError {
        LeaseDbError::StorageUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    /// Replay the entire file from the start into a lease table.
    ///
    /// Any malformed line fails the whole load; a partial table is never
    /// returned. An empty file gives an empty table.
    pub fn load(&self) -> Result<LeaseTable, LeaseDbError> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))
            .map_err(|err| self.unavailable(err))?;

        let mut records = LeaseTable::new();
        for (n, line) in BufReader::new(&mut *file).split(b'\n').enumerate() {
            let mut line = line.map_err(|err| self.unavailable(err))?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8(line).map_err(|err| {
                LeaseDbError::malformed(Field::Line, String::from_utf8_lossy(err.as_bytes()))
            });
            let (hw, record) = line.and_then(|line| decode(&line)).inspect_err(|err| {
                error!(path = %self.path.display(), line = n + 1, ?err, "failed to replay lease database");
            })?;
            trace!(%hw, ?record, "replayed lease");
            records.insert(hw.to_string(), record);
        }
        debug!(leases = records.len(), "lease database replayed");

        Ok(records)
    }

    /// Append one lease as a single line. Fails with `PersistFailed` if the
    /// write does not complete; nothing is retried and there is no fsync.
    ///
    /// A hostname containing a line break is rejected with `MalformedRecord`
    /// and nothing is written.
    ///
    /// `write_all` may take more than one `write` call after a short write.
    /// Lines stay whole because the file lock is held for the full line, so
    /// this only holds for writers going through this handle.
    pub fn append(&self, hw: MacAddr, record: &Record) -> Result<(), LeaseDbError> {
        codec::check_hostname(&record.hostname)?;
        if record.hostname.contains(codec::DELIMITER) {
            warn!(%hw, hostname = %record.hostname, "hostname contains a delimiter and will not read back intact");
        }
        let line = encode(hw, record);
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())
            .map_err(LeaseDbError::PersistFailed)?;
        trace!(%hw, ?record, "appended lease");
        Ok(())
    }
}
