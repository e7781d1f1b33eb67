//! Configuration for tables and recorders.

/// Default number of slots allocated by a new table.
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Default maximum probe length.
pub const DEFAULT_MAX_PROBE: usize = 8;

/// Sizing and probing parameters for a [`ProbeTable`](crate::ProbeTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableConfig {
    /// Number of slots allocated at creation. Must be nonzero.
    pub initial_capacity: usize,
    /// Number of slots examined from a key's home slot before the table
    /// is considered full for that key.
    pub max_probe: usize,
    /// Capacity past which the table refuses to grow.
    pub max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_probe: DEFAULT_MAX_PROBE,
            max_capacity: usize::MAX,
        }
    }
}

impl TableConfig {
    /// Create a configuration with the given initial capacity.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Default::default()
        }
    }

    /// Set the maximum probe length (at least 1).
    pub fn with_max_probe(mut self, max_probe: usize) -> Self {
        self.max_probe = max_probe.max(1);
        self
    }

    /// Set the capacity limit for growth.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// What a [`Recorder`](crate::Recorder) keeps per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TallyMode {
    /// One exact counter per distinct key, in a growable table.
    #[default]
    Detailed,
    /// At most `limit` counters; past that, new keys wrap around and
    /// overwrite the oldest records.
    Bounded { limit: usize },
    /// No per-key tracking; a single lock-free event total.
    TotalOnly,
}

/// Configuration for a [`Recorder`](crate::Recorder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TallyConfig {
    pub mode: TallyMode,
    pub table: TableConfig,
}

impl TallyConfig {
    pub fn new(mode: TallyMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.table = table;
        self
    }
}
