//! The Markdown mirror table.
//!
//! ```text
//! | id | title | status | due | tag |
//! |----|-------|--------|-----|-----|
//! | T-0001 | fix login bug | open |  | general |
//! ```
//!
//! A convenience view for humans.  It has no integrity guarantee and may lag
//! the log after a crash; `rebuild_table` regenerates it from the log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use frontdesk_contracts::{
    parse_id, FrontDeskError, FrontDeskResult, Item, Record, RecordKind, Status,
};
use frontdesk_core::{fsutil, MirrorTable};

use crate::allocator::{allocate_ids, combined_max, max_table_id};

pub const HEADER: &str = "| id | title | status | due | tag |";
pub const SEPARATOR: &str = "|----|-------|--------|-----|-----|";

const COLUMNS: [&str; 5] = ["id", "title", "status", "due", "tag"];

// ── Rows ──────────────────────────────────────────────────────────────────────

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due: String,
    pub tag: String,
}

impl Row {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.note.clone(),
            status: record.status.to_string(),
            due: String::new(),
            tag: record.tag.clone(),
        }
    }

    /// Parse a table line; `None` for headers, separators and junk.
    pub fn parse(line: &str) -> Option<Self> {
        let cells = split_cells(line)?;
        if cells.len() != COLUMNS.len() || parse_id(&cells[0]).is_none() {
            return None;
        }
        let mut cells = cells.into_iter();
        Some(Self {
            id: cells.next()?,
            title: cells.next()?,
            status: cells.next()?,
            due: cells.next()?,
            tag: cells.next()?,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "| {} | {} | {} | {} | {} |",
            escape_cell(&self.id),
            escape_cell(&self.title),
            escape_cell(&self.status),
            escape_cell(&self.due),
            escape_cell(&self.tag),
        )
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('\n', " ").replace('|', "\\|")
}

/// Split `| a | b |` into trimmed cells, honouring `\|` escapes.
///
/// Returns `None` unless the line is framed by pipes.
pub fn split_cells(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            other => current.push(other),
        }
    }
    cells.push(current.trim().to_string());
    Some(cells)
}

fn is_header(line: &str) -> bool {
    split_cells(line).is_some_and(|cells| cells == COLUMNS)
}

fn is_separator(line: &str) -> bool {
    split_cells(line).is_some_and(|cells| {
        cells.len() == COLUMNS.len()
            && cells
                .iter()
                .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
    })
}

/// Header, separator and rows as file text.
pub fn render_table(rows: &[Row]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(SEPARATOR);
    out.push('\n');
    for row in rows {
        out.push_str(&row.render());
        out.push('\n');
    }
    out
}

// ── File-backed table ─────────────────────────────────────────────────────────

/// A Markdown table file with one row per `triage` record.
#[derive(Debug, Clone)]
pub struct MarkdownTable {
    path: PathBuf,
    default_tag: String,
}

impl MarkdownTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_tag: frontdesk_contracts::record::DEFAULT_TAG.to_string(),
        }
    }

    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> FrontDeskResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FrontDeskError::io(&self.path, e)),
        }
    }

    /// Every well-formed row, in file order.
    pub fn rows(&self) -> FrontDeskResult<Vec<Row>> {
        Ok(self
            .read()?
            .map(|text| text.lines().filter_map(Row::parse).collect())
            .unwrap_or_default())
    }

    /// Largest id present in the table; `None` if empty or missing.
    pub fn max_id(&self) -> FrontDeskResult<Option<u32>> {
        Ok(self.read()?.as_deref().and_then(max_table_id))
    }

    /// Make sure the file starts with the header and separator.
    ///
    /// A missing file is created.  A file whose first two lines are not the
    /// header is rewritten with the header followed by its well-formed rows;
    /// anything else in it is dropped.
    pub fn ensure_header(&self) -> FrontDeskResult<()> {
        let Some(text) = self.read()? else {
            debug!(path = %self.path.display(), "creating mirror table");
            return fsutil::write_atomic(&self.path, &render_table(&[]));
        };

        let mut lines = text.lines();
        let header_ok = lines.next().is_some_and(is_header) && lines.next().is_some_and(is_separator);
        if header_ok {
            return Ok(());
        }

        let rows: Vec<Row> = text.lines().filter_map(Row::parse).collect();
        warn!(
            path = %self.path.display(),
            kept_rows = rows.len(),
            "mirror table header malformed; rewriting"
        );
        fsutil::write_atomic(&self.path, &render_table(&rows))
    }

    /// Replace the whole table with `rows`.
    pub fn replace(&self, rows: &[Row]) -> FrontDeskResult<()> {
        fsutil::write_atomic(&self.path, &render_table(rows))
    }

    /// Allocate ids for `items` from the table alone and append their rows.
    ///
    /// Rows are `open`, with a blank due date and the item's tag or the
    /// default.  Returns the allocated ids in item order so the same content
    /// can be handed to the log.
    pub fn append_rows(&self, items: &[Item]) -> FrontDeskResult<Vec<String>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_header()?;
        let ids = allocate_ids(self.max_id()?, items.len())?;
        let rows: Vec<Row> = ids
            .iter()
            .zip(items)
            .map(|(id, item)| Row {
                id: id.clone(),
                title: item.title.clone(),
                status: Status::Open.to_string(),
                due: String::new(),
                tag: item.tag.clone().unwrap_or_else(|| self.default_tag.clone()),
            })
            .collect();
        self.append_raw(&rows)?;
        Ok(ids)
    }

    fn append_raw(&self, rows: &[Row]) -> FrontDeskResult<()> {
        let needs_newline = self
            .read()?
            .is_some_and(|t| !t.is_empty() && !t.ends_with('\n'));

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| FrontDeskError::io(&self.path, e))?;

        let mut buf = String::new();
        if needs_newline {
            buf.push('\n');
        }
        for row in rows {
            buf.push_str(&row.render());
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
            .map_err(|e| FrontDeskError::io(&self.path, e))?;
        file.sync_all().map_err(|e| FrontDeskError::io(&self.path, e))?;

        info!(path = %self.path.display(), rows = rows.len(), "mirror rows appended");
        Ok(())
    }
}

impl MirrorTable for MarkdownTable {
    fn allocate(&self, log_max: Option<u32>, count: usize) -> FrontDeskResult<Vec<String>> {
        let max = combined_max(log_max, self.max_id()?);
        allocate_ids(max, count)
    }

    fn write_rows(&self, records: &[Record]) -> FrontDeskResult<()> {
        let rows: Vec<Row> = records
            .iter()
            .filter(|r| r.kind == RecordKind::Triage)
            .map(Row::from_record)
            .collect();
        if rows.is_empty() {
            return Ok(());
        }
        self.ensure_header()?;
        self.append_raw(&rows)
    }

    fn set_status(&self, id: &str, status: Status) -> FrontDeskResult<bool> {
        let mut rows = self.rows()?;
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        row.status = status.to_string();
        self.replace(&rows)?;
        Ok(true)
    }
}
