use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Errors returned by the lease database
#[derive(Error, Debug)]
pub enum LeaseDbError {
    #[error("cannot swap out a lease database while running")]
    AlreadyBound,
    #[error("no lease database has been registered")]
    Unbound,
    #[error("lease database {path:?} is unavailable")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed {field}: {raw:?}")]
    MalformedRecord { field: Field, raw: String },
    #[error("record insert/update failed")]
    PersistFailed(#[source] io::Error),
}

impl LeaseDbError {
    pub(crate) fn malformed(field: Field, raw: impl Into<String>) -> Self {
        LeaseDbError::MalformedRecord {
            field,
            raw: raw.into(),
        }
    }
}

/// The part of a lease line that failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// the line could not be read as text at all
    Line,
    HardwareAddress,
    Address,
    Expiry,
    Hostname,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Line => "lease line",
            Field::HardwareAddress => "hardware address",
            Field::Address => "ip address",
            Field::Expiry => "expiry",
            Field::Hostname => "hostname",
        })
    }
}
