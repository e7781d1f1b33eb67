//! Error types for the table, the aggregators, and the report writer.

use thiserror::Error;

/// Failure of a table or aggregator operation.
///
/// A negative lookup is not an error; it is reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// The slot array (or the bounded record buffer) could not be allocated.
    #[error("out of memory allocating storage for {capacity} slots")]
    OutOfMemory { capacity: usize },

    /// Growth would take the table past its configured maximum capacity.
    #[error("table growth would exceed the configured limit of {limit} slots")]
    CapacityLimit { limit: usize },

    /// A growth failed part-way through migrating entries; the table has
    /// lost entries and refuses further inserts.
    #[error("table is poisoned by a failed growth")]
    Poisoned,

    /// A configuration asked for zero slots or zero records.
    #[error("capacity must be nonzero")]
    ZeroCapacity,
}

/// Failure while writing the final report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for table and aggregator operations.
pub type Result<T> = std::result::Result<T, TableError>;
