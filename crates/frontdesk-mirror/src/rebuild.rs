//! Regenerating the mirror table from the log.
//!
//! The log is authoritative.  Rows are rebuilt from a verified replay, so a
//! table that drifted (crash between the two writes, hand edits) converges
//! back to exactly one row per logged `triage` record.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use frontdesk_chain::ChainVerifier;
use frontdesk_contracts::{record::DEFAULT_TAG, FrontDeskError, FrontDeskResult};

use crate::table::{MarkdownTable, Row};

/// Replay the log at `log_path` and derive the table rows.
///
/// Fails on the first chain violation; a table is never built from a log
/// that does not verify.  A missing log yields no rows.
pub fn project_rows(log_path: &Path) -> FrontDeskResult<Vec<Row>> {
    let file = match File::open(log_path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(FrontDeskError::io(log_path, e)),
    };

    let mut reader = BufReader::new(file);
    let mut verifier = ChainVerifier::new();
    let mut rows: Vec<Row> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| FrontDeskError::io(log_path, e))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let Some(fields) = verifier.check_line(line_no, &buf)? else {
            continue;
        };
        match str_field(&fields, "type") {
            Some("triage") => {
                let Some(id) = str_field(&fields, "id") else {
                    continue;
                };
                index.insert(id.to_string(), rows.len());
                rows.push(Row {
                    id: id.to_string(),
                    title: str_field(&fields, "note").unwrap_or_default().to_string(),
                    status: str_field(&fields, "status").unwrap_or("open").to_string(),
                    due: str_field(&fields, "due").unwrap_or_default().to_string(),
                    tag: str_field(&fields, "tag").unwrap_or(DEFAULT_TAG).to_string(),
                });
            }
            Some("status") => {
                let subject = str_field(&fields, "subject");
                let status = str_field(&fields, "status");
                if let (Some(subject), Some(status)) = (subject, status) {
                    if let Some(&i) = index.get(subject) {
                        rows[i].status = status.to_string();
                    }
                }
            }
            _ => {}
        }
    }

    Ok(rows)
}

/// Rewrite `table_path` from the verified log.  Returns the row count.
pub fn rebuild_table(log_path: &Path, table_path: &Path) -> FrontDeskResult<usize> {
    let rows = project_rows(log_path)?;
    MarkdownTable::new(table_path).replace(&rows)?;
    info!(
        log = %log_path.display(),
        table = %table_path.display(),
        rows = rows.len(),
        "mirror table rebuilt from log"
    );
    Ok(rows.len())
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}
