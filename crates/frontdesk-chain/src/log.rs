//! File-backed implementation of `EventLog`.
//!
//! One canonical JSON record per line, appended with `O_APPEND` and synced
//! to disk after every line.  The chain pointer for a new batch is read from
//! the last record on disk and carried forward in memory across the batch.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use frontdesk_contracts::{
    parse_id, ChainViolation, FrontDeskError, FrontDeskResult, Record,
};
use frontdesk_core::{config::DEFAULT_MAX_BATCH, fsutil::ensure_parent, EventLog, LogSummary};

use crate::canonical::{encode_line, HASH_FIELD};
use crate::chain::{compute_hash, record_fields, GENESIS_PREV_HASH};
use crate::verify::{verify_file, VerifyReport};

/// Where the next append continues from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tail {
    exists: bool,
    prev_hash: String,
    /// The file is non-empty and its last byte is not `\n`.
    needs_newline: bool,
}

/// An append-only JSONL log with SHA-256 chaining.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
    max_batch: usize,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_batch: DEFAULT_MAX_BATCH,
        }
    }

    /// Cap on records written per `append` call.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay the whole file and check every link.
    pub fn verify(&self) -> FrontDeskResult<VerifyReport> {
        verify_file(&self.path)
    }

    /// Locate the chain pointer at the end of the file.
    ///
    /// The last non-blank line must be a complete record with a `hash`;
    /// anything else means the tail is torn or foreign and appending onto it
    /// would hide the damage, so it is reported instead.
    fn read_tail(&self) -> FrontDeskResult<Tail> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Tail {
                    exists: false,
                    prev_hash: GENESIS_PREV_HASH.to_string(),
                    needs_newline: false,
                })
            }
            Err(e) => return Err(FrontDeskError::io(&self.path, e)),
        };

        let needs_newline = bytes.last().is_some_and(|b| *b != b'\n');

        let last = bytes
            .split(|b| *b == b'\n')
            .enumerate()
            .filter(|(_, line)| !line.trim_ascii().is_empty())
            .last();

        let Some((idx, line)) = last else {
            return Ok(Tail {
                exists: true,
                prev_hash: GENESIS_PREV_HASH.to_string(),
                needs_newline,
            });
        };
        let line_no = idx + 1;

        let value: Value = serde_json::from_slice(line).map_err(|e| ChainViolation::Parse {
            line: line_no,
            reason: e.to_string(),
        })?;
        let prev_hash = value
            .get(HASH_FIELD)
            .and_then(Value::as_str)
            .ok_or(ChainViolation::MissingField {
                line: line_no,
                field: HASH_FIELD,
            })?
            .to_string();

        Ok(Tail {
            exists: true,
            prev_hash,
            needs_newline,
        })
    }
}

impl EventLog for FileEventLog {
    /// Chain and append `records`, syncing after each line.
    ///
    /// Records past the batch cap are dropped with a warning, not an error.
    /// On success every returned record is on stable storage.
    fn append(&self, mut records: Vec<Record>) -> FrontDeskResult<Vec<Record>> {
        if records.len() > self.max_batch {
            warn!(
                requested = records.len(),
                max_batch = self.max_batch,
                "append batch truncated to cap"
            );
            records.truncate(self.max_batch);
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        ensure_parent(&self.path)?;
        let tail = self.read_tail()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FrontDeskError::io(&self.path, e))?;

        if !tail.exists {
            sync_parent_dir(&self.path)?;
        }
        if tail.needs_newline {
            // The last record is complete but its newline never made it out.
            file.write_all(b"\n")
                .map_err(|e| FrontDeskError::io(&self.path, e))?;
        }

        let mut prev_hash = tail.prev_hash;
        let mut written = Vec::with_capacity(records.len());

        for record in records {
            let chained = compute_hash(record, &prev_hash)?;
            let mut line = encode_line(&record_fields(&chained)?)?;
            line.push(b'\n');

            file.write_all(&line)
                .map_err(|e| FrontDeskError::io(&self.path, e))?;
            file.sync_all()
                .map_err(|e| FrontDeskError::io(&self.path, e))?;

            debug!(id = %chained.id, hash = %chained.hash, "record appended");
            prev_hash = chained.hash.clone();
            written.push(chained);
        }

        info!(
            path = %self.path.display(),
            count = written.len(),
            head = %prev_hash,
            "log append synced"
        );
        Ok(written)
    }

    /// Count entries and collect ids and notes without verifying the chain.
    ///
    /// Unparseable lines are skipped here; `verify` is what reports them.
    fn summary(&self) -> FrontDeskResult<LogSummary> {
        let text = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LogSummary::default())
            }
            Err(e) => return Err(FrontDeskError::io(&self.path, e)),
        };

        let mut summary = LogSummary::default();
        for (idx, line) in text.split(|b| *b == b'\n').enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }
            summary.entries += 1;
            let value: Value = match serde_json::from_slice(line) {
                Ok(v) => v,
                Err(e) => {
                    debug!(line = idx + 1, error = %e, "skipping unparseable log line");
                    continue;
                }
            };
            let id = value.get("id").and_then(Value::as_str);
            if let Some(id) = id {
                summary.max_id = summary.max_id.max(parse_id(id));
                summary.ids.insert(id.to_string());
            }
            match value.get("type").and_then(Value::as_str) {
                Some("triage") => {
                    if let Some(id) = id {
                        summary.triage_ids.insert(id.to_string());
                    }
                    if let Some(note) = value.get("note").and_then(Value::as_str) {
                        summary.notes.insert(note.to_string());
                    }
                }
                Some("missed") => {
                    let ts = value.get("ts").and_then(Value::as_str);
                    if let Some(day) = ts.and_then(|ts| ts.get(..10)) {
                        summary.missed_days.insert(day.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(summary)
    }
}

/// Make a newly created log file's directory entry durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> FrontDeskResult<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| FrontDeskError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> FrontDeskResult<()> {
    Ok(())
}
