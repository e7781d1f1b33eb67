//! tallymap: an integer-keyed open-addressing table that keeps one
//! monotonically increasing counter per observed key.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: count a high-rate stream of opaque integer handles (method ids,
//!   addresses) exactly, then enumerate the counts once for a report.
//! - Layers:
//!   - ProbeTable<K, V>: structural store. `key mod capacity` home slot,
//!     linear probing bounded to a few slots, doubling growth at half load.
//!   - CounterAggregator<K>: owns the counter records and maps keys to
//!     them through the table; a one-entry cache of the last key turns runs
//!     of identical keys into a single branch and an increment.
//!   - BoundedAggregator<K>: opt-in fixed-size alternative that wraps and
//!     overwrites old records instead of growing.
//!   - Shared<T, R> / Recorder<K>: the one coarse lock callers hold around
//!     every access, and a config-driven front end over all of the above.
//!
//! Constraints
//! - No internal locking. Tables and tallies are `Send` but not `Sync`;
//!   sharing requires `Shared`, so the single-lock discipline is visible in
//!   the types.
//! - Load factor stays at or below 0.5; growth is the only latency spike on
//!   the record path and is amortized constant.
//! - Keys are fixed-width unsigned integers. The table never hashes beyond
//!   the modulo and never looks behind the handle.
//!
//! Reentrancy policy
//! - Enumeration callbacks must not call back into the table. A debug-only
//!   guard on each public table method panics if they do; release builds
//!   compile it away.
//!
//! Removal
//! - `ProbeTable::remove` vacates a slot without tombstones or back-shifting.
//!   Lookups stop at the first vacant slot, so a key that probed past the
//!   removed slot is stranded. The counting path never removes.
//!
//! Failure semantics
//! - Allocation failure is reported as `TableError::OutOfMemory` rather than
//!   aborting. If growth fails part-way through migrating entries the table
//!   is poisoned and rejects further inserts.

mod bounded;
pub mod config;
mod counter_aggregator;
mod error;
mod int_key;
pub mod probe_table;
mod probe_table_proptest;
mod recorder;
mod reentrancy;
pub mod report;
mod shared;
mod tally;

// The README example is compiled and run as a doctest.
#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctest;

// Public surface
pub use bounded::BoundedAggregator;
pub use config::{TableConfig, TallyConfig, TallyMode};
pub use counter_aggregator::CounterAggregator;
pub use error::{ReportError, TableError};
pub use int_key::IntKey;
pub use probe_table::ProbeTable;
pub use recorder::Recorder;
pub use report::{write_report, KeyResolver};
pub use shared::{EventTotal, Shared};
pub use tally::{CounterRecord, Tally};
