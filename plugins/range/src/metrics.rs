//! Plugin-local metrics for the lease file.
//!
//! Metrics are lazily initialized on first access via `lazy_static!`.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntGauge, register_int_counter, register_int_gauge};

lazy_static! {
    /// Count of distinct leases (one per hardware address) loaded from the lease file
    pub static ref LEASES_LOADED: IntCounter = register_int_counter!(
        "range_leases_loaded",
        "count of distinct leases loaded from the lease file"
    ).unwrap();

    /// Count of leases appended to the lease file
    pub static ref LEASES_PERSISTED: IntCounter = register_int_counter!(
        "range_leases_persisted",
        "count of leases appended to the lease file"
    ).unwrap();

    /// Count of failed appends to the lease file
    pub static ref LEASE_PERSIST_FAILURES: IntCounter = register_int_counter!(
        "range_lease_persist_failures",
        "count of lease appends that failed"
    ).unwrap();

    /// Gauge: whether a lease file is bound (1=bound, 0=unbound)
    pub static ref LEASE_DB_BOUND: IntGauge = register_int_gauge!(
        "range_lease_db_bound",
        "whether a lease file has been bound (1=bound, 0=unbound)"
    ).unwrap();
}
