//! Replay verification of a log file.
//!
//! The verifier reads the file top to bottom and trusts nothing but the
//! file's own chain.  Per non-blank line, in order:
//!
//! 1. the line parses as a JSON object
//! 2. `hash` and `prev_hash` are present as strings
//! 3. `hash` equals the digest recomputed over the other fields
//! 4. `prev_hash` equals the previous record's `hash` (empty for the first)
//! 5. a `T-####` id is greater than the previous record's `T-####` id
//!
//! The first failure aborts the scan.  Nothing after a broken link is
//! reported as verified.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use frontdesk_contracts::{parse_id, ChainViolation, FrontDeskError, FrontDeskResult};

use crate::canonical::HASH_FIELD;
use crate::chain::{hash_fields, GENESIS_PREV_HASH};

/// Result of a successful verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Records verified.
    pub entries: usize,
    /// `hash` of the last record, or empty for an empty log.
    pub head: String,
    /// False when the log file does not exist.
    pub present: bool,
}

/// Incremental chain checker, fed one line at a time.
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    expected_prev: String,
    previous_id: Option<(u32, String)>,
    verified: usize,
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self {
            expected_prev: GENESIS_PREV_HASH.to_string(),
            previous_id: None,
            verified: 0,
        }
    }

    pub fn verified(&self) -> usize {
        self.verified
    }

    /// `hash` of the last accepted record.
    pub fn head(&self) -> &str {
        &self.expected_prev
    }

    /// Check one raw line.  Blank lines are accepted and return `None`.
    pub fn check_line(
        &mut self,
        line_no: usize,
        raw: &[u8],
    ) -> Result<Option<Map<String, Value>>, ChainViolation> {
        let text = match std::str::from_utf8(raw) {
            Ok(t) => t.trim(),
            Err(e) => {
                return Err(ChainViolation::Parse {
                    line: line_no,
                    reason: format!("invalid UTF-8: {e}"),
                })
            }
        };
        if text.is_empty() {
            return Ok(None);
        }

        let fields = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ChainViolation::Parse {
                    line: line_no,
                    reason: "not a JSON object".to_string(),
                })
            }
            Err(e) => {
                return Err(ChainViolation::Parse {
                    line: line_no,
                    reason: e.to_string(),
                })
            }
        };

        let stored = string_field(&fields, HASH_FIELD, line_no)?.to_string();
        let stored_prev = string_field(&fields, "prev_hash", line_no)?.to_string();

        let expected = hash_fields(&fields).map_err(|e| ChainViolation::Parse {
            line: line_no,
            reason: e.to_string(),
        })?;
        if stored != expected {
            return Err(ChainViolation::HashMismatch {
                line: line_no,
                stored,
                expected,
            });
        }

        if stored_prev != self.expected_prev {
            return Err(ChainViolation::PrevHashMismatch {
                line: line_no,
                stored: stored_prev,
                expected: self.expected_prev.clone(),
            });
        }

        if let Some(id) = fields.get("id").and_then(Value::as_str) {
            if let Some(n) = parse_id(id) {
                if let Some((prev_n, prev_id)) = &self.previous_id {
                    if n <= *prev_n {
                        return Err(ChainViolation::IdOrder {
                            line: line_no,
                            id: id.to_string(),
                            previous: prev_id.clone(),
                        });
                    }
                }
                self.previous_id = Some((n, id.to_string()));
            }
        }

        self.expected_prev = stored;
        self.verified += 1;
        Ok(Some(fields))
    }
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
    line: usize,
) -> Result<&'a str, ChainViolation> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ChainViolation::MissingField { line, field })
}

/// Verify every line readable from `reader`.
pub fn verify_reader<R: BufRead>(mut reader: R) -> FrontDeskResult<VerifyReport> {
    let mut verifier = ChainVerifier::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).map_err(|e| FrontDeskError::Io {
            path: "<reader>".to_string(),
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        line_no += 1;
        verifier.check_line(line_no, &buf)?;
    }

    Ok(VerifyReport {
        entries: verifier.verified(),
        head: verifier.head().to_string(),
        present: true,
    })
}

/// Verify the log at `path`.  A missing file verifies as empty.
pub fn verify_file(path: &Path) -> FrontDeskResult<VerifyReport> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "log file absent; nothing to verify");
            return Ok(VerifyReport {
                entries: 0,
                head: GENESIS_PREV_HASH.to_string(),
                present: false,
            });
        }
        Err(e) => return Err(FrontDeskError::io(path, e)),
    };

    match verify_reader(BufReader::new(file)) {
        Ok(report) => {
            debug!(path = %path.display(), entries = report.entries, "chain verified");
            Ok(report)
        }
        Err(FrontDeskError::Io { reason, .. }) => Err(FrontDeskError::Io {
            path: path.display().to_string(),
            reason,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "chain verification failed");
            Err(e)
        }
    }
}
