//! Trait seams between the triage runner and its storage backends.
//!
//! - `EventLog`    — the authoritative, hash-chained record of every event
//! - `MirrorTable` — the human-readable projection of allocated ids
//!
//! The runner always writes the log before the table, so a crash can leave
//! an id in the log without a table row, never the reverse.

use std::collections::HashSet;

use frontdesk_contracts::{FrontDeskResult, Record, Status};

/// What a scan of the log's current contents yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    /// Non-blank lines in the log.
    pub entries: usize,
    /// Largest numeric `T-####` suffix seen, if any.
    pub max_id: Option<u32>,
    /// Every id present in the log.
    pub ids: HashSet<String>,
    /// Ids of `triage` records: the only valid status-change subjects.
    pub triage_ids: HashSet<String>,
    /// Notes of all `triage` records, used to skip re-submitted intake lines.
    pub notes: HashSet<String>,
    /// `YYYY-MM-DD` of every `missed` record.
    pub missed_days: HashSet<String>,
}

/// The append-only event log.
///
/// Implementations must treat `append` as append-only: the bytes of earlier
/// records are never rewritten.  A failed append is fatal to the caller.
pub trait EventLog: Send + Sync {
    /// Chain `records` onto the current tail and persist them durably.
    ///
    /// Returns the records with `prev_hash` and `hash` filled in, in the
    /// order they were written.
    fn append(&self, records: Vec<Record>) -> FrontDeskResult<Vec<Record>>;

    /// Summarise the records already in the log.
    fn summary(&self) -> FrontDeskResult<LogSummary>;
}

/// The mirror table.  Carries no integrity guarantee of its own.
pub trait MirrorTable: Send + Sync {
    /// Reserve `count` consecutive ids following the larger of `log_max` and
    /// the largest id already present in the table.
    fn allocate(&self, log_max: Option<u32>, count: usize) -> FrontDeskResult<Vec<String>>;

    /// Add one row per `triage` record.  Other record kinds are ignored.
    fn write_rows(&self, records: &[Record]) -> FrontDeskResult<()>;

    /// Update the status column of the row for `id`.
    ///
    /// Returns `false` when the table has no row for `id`.
    fn set_status(&self, id: &str, status: Status) -> FrontDeskResult<bool>;
}
