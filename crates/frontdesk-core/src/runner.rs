//! The triage runner: turns a batch of producer items into log records.
//!
//! Per batch:
//!
//!   Filter → Cap → Allocate → [EventLog::append] → MirrorTable::write_rows
//!
//! The log append is the commit point.  The table write happens strictly
//! after the log's durability barrier; if it fails the records are still
//! logged and the table can be rebuilt from the log.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use frontdesk_contracts::{
    parse_id, FrontDeskError, FrontDeskResult, Item, Record, Source, Status,
};

use crate::config::{FrontDeskConfig, DEFAULT_MAX_BATCH};
use crate::traits::{EventLog, MirrorTable};

/// What one call to `TriageRunner::run` did.
#[derive(Debug, Clone, Default)]
pub struct TriageOutcome {
    /// The chained records, in log order.
    pub appended: Vec<Record>,
    /// Number of leading input items this run consumed (logged or skipped).
    pub consumed: usize,
    /// Items left for a later run because the batch cap was reached.
    pub deferred: usize,
    /// Items skipped because their text was already logged.
    pub skipped: usize,
    /// False when the mirror table write failed after the log append.
    pub mirror_synced: bool,
}

impl TriageOutcome {
    pub fn ids(&self) -> Vec<&str> {
        self.appended.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Drives one batch from producer items to durable, chained records.
pub struct TriageRunner {
    log: Box<dyn EventLog>,
    table: Box<dyn MirrorTable>,
    max_batch: usize,
    default_tag: String,
    skip_logged: bool,
}

impl TriageRunner {
    pub fn new(log: Box<dyn EventLog>, table: Box<dyn MirrorTable>) -> Self {
        Self {
            log,
            table,
            max_batch: DEFAULT_MAX_BATCH,
            default_tag: frontdesk_contracts::record::DEFAULT_TAG.to_string(),
            skip_logged: true,
        }
    }

    /// Apply the batch cap, default tag and duplicate policy from `config`.
    pub fn with_config(mut self, config: &FrontDeskConfig) -> Self {
        self.max_batch = config.max_batch.max(1);
        self.default_tag = config.default_tag.clone();
        self.skip_logged = config.skip_logged;
        self
    }

    /// Log up to `max_batch` of `items` as `triage` records.
    ///
    /// Items beyond the cap are not an error; they are reported as
    /// `deferred` and left for the caller to resubmit.
    pub fn run(
        &self,
        items: Vec<Item>,
        src: Source,
        at: DateTime<Utc>,
    ) -> FrontDeskResult<TriageOutcome> {
        let summary = self.log.summary()?;
        let mut seen: HashSet<String> = if self.skip_logged {
            summary.notes.clone()
        } else {
            HashSet::new()
        };

        let total = items.len();
        let mut batch: Vec<Item> = Vec::new();
        // Input positions of batched and skipped items.
        let mut batch_pos: Vec<usize> = Vec::new();
        let mut skipped_pos: Vec<usize> = Vec::new();
        let mut consumed = 0;

        for (pos, mut item) in items.into_iter().enumerate() {
            if batch.len() == self.max_batch {
                break;
            }
            consumed = pos + 1;

            item.title = item.title.trim().to_string();
            if item.title.is_empty() {
                skipped_pos.push(pos);
                continue;
            }
            if self.skip_logged && !seen.insert(item.title.clone()) {
                debug!(title = %item.title, "item already logged; skipping");
                skipped_pos.push(pos);
                continue;
            }
            if item.tag.is_none() {
                item.tag = Some(self.default_tag.clone());
            }
            batch.push(item);
            batch_pos.push(pos);
        }

        if batch.is_empty() {
            let skipped = skipped_pos.len();
            let deferred = total - consumed;
            info!(skipped, deferred, "nothing to triage");
            return Ok(TriageOutcome {
                consumed,
                deferred,
                skipped,
                mirror_synced: true,
                ..TriageOutcome::default()
            });
        }

        // ── Allocate ─────────────────────────────────────────────────────────
        let ids = self.table.allocate(summary.max_id, batch.len())?;
        let records: Vec<Record> = ids
            .into_iter()
            .zip(batch.iter())
            .map(|(id, item)| Record::triage(id, item, src, at))
            .collect();

        // ── Commit to the log ────────────────────────────────────────────────
        let appended = self.log.append(records)?;

        // A log with a tighter cap writes a prefix; the rest stays queued.
        if let Some(&first_unwritten) = batch_pos.get(appended.len()) {
            warn!(
                requested = batch.len(),
                written = appended.len(),
                "log accepted fewer records than requested; remainder deferred"
            );
            consumed = first_unwritten;
        }
        let skipped = skipped_pos.iter().filter(|&&pos| pos < consumed).count();
        let deferred = total - consumed;
        if deferred > 0 {
            warn!(
                deferred,
                max_batch = self.max_batch,
                "batch cap reached; remaining items deferred to a later run"
            );
        }

        // ── Project into the table ───────────────────────────────────────────
        let mirror_synced = match self.table.write_rows(&appended) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "mirror table update failed; rebuild it from the log");
                false
            }
        };

        info!(
            appended = appended.len(),
            skipped,
            deferred,
            first_id = %appended.first().map(|r| r.id.as_str()).unwrap_or(""),
            "triage batch logged"
        );

        Ok(TriageOutcome {
            appended,
            consumed,
            deferred,
            skipped,
            mirror_synced,
        })
    }

    /// Record a status change for an existing `triage` record.
    ///
    /// History is never edited: the change is a new `status` record with its
    /// own id whose `subject` names the target.  Only `triage` ids are valid
    /// subjects; `status` and `missed` records have no row to update.
    pub fn set_status(
        &self,
        subject: &str,
        status: Status,
        src: Source,
        at: DateTime<Utc>,
    ) -> FrontDeskResult<Record> {
        if parse_id(subject).is_none() {
            return Err(FrontDeskError::InvalidId {
                id: subject.to_string(),
            });
        }
        let summary = self.log.summary()?;
        if !summary.triage_ids.contains(subject) {
            return Err(FrontDeskError::InvalidId {
                id: subject.to_string(),
            });
        }

        let record = self.append_one(summary.max_id, |id| {
            Record::status_change(id, subject, status, src, at)
        })?;

        match self.table.set_status(subject, status) {
            Ok(true) => {}
            Ok(false) => warn!(subject = %subject, "no mirror row for subject"),
            Err(e) => error!(error = %e, "mirror table status update failed"),
        }

        info!(id = %record.id, subject = %subject, status = %status, "status change logged");
        Ok(record)
    }

    /// Log a `missed` record for `day`, a day on which no triage run happened.
    ///
    /// Each day is marked at most once.  The mirror table is not touched.
    pub fn mark_missed(&self, day: NaiveDate, src: Source) -> FrontDeskResult<Record> {
        let summary = self.log.summary()?;
        let key = day.format("%Y-%m-%d").to_string();
        if summary.missed_days.contains(&key) {
            return Err(FrontDeskError::AlreadyMissed { day: key });
        }

        let record = self.append_one(summary.max_id, |id| Record::missed(id, day, src))?;
        info!(id = %record.id, day = %key, "missed day logged");
        Ok(record)
    }

    /// Allocate one id, build a record with it and append it to the log.
    fn append_one(
        &self,
        log_max: Option<u32>,
        build: impl FnOnce(String) -> Record,
    ) -> FrontDeskResult<Record> {
        let id = self
            .table
            .allocate(log_max, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| FrontDeskError::Encoding {
                reason: "id allocation returned no id".to_string(),
            })?;

        self.log
            .append(vec![build(id)])?
            .pop()
            .ok_or_else(|| FrontDeskError::Encoding {
                reason: "log append returned no record".to_string(),
            })
    }
}
