//! The intake file: free-text items waiting to be triaged.
//!
//! One item per line.  Headings (`#`) and blank lines are ignored, as are
//! checklist entries that are already ticked.  `- [ ] text`, `- text` and
//! `* text` yield `text`; any other line is taken as-is.

use std::path::{Path, PathBuf};

use tracing::debug;

use frontdesk_contracts::{FrontDeskError, FrontDeskResult};

use crate::fsutil::write_atomic;

/// Extract the item text from one intake line, if it is an item.
pub fn parse_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let body = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim_start);

    let text = match body {
        Some(rest) => {
            if let Some(unchecked) = rest.strip_prefix("[ ]") {
                unchecked
            } else if rest.starts_with("[x]") || rest.starts_with("[X]") {
                return None;
            } else {
                rest
            }
        }
        None => line,
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// All items in `text`, in file order.
pub fn parse_intake(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_line).collect()
}

/// A file-backed intake queue.
#[derive(Debug, Clone)]
pub struct IntakeFile {
    path: PathBuf,
}

impl IntakeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the pending items.  A missing file is an empty queue.
    pub fn load(&self) -> FrontDeskResult<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_intake(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no intake file");
                Ok(Vec::new())
            }
            Err(e) => Err(FrontDeskError::io(&self.path, e)),
        }
    }

    /// Remove the first `count` item lines, keeping every other line.
    ///
    /// Headings, blank lines, ticked entries and items past `count` survive,
    /// so items deferred by the batch cap are picked up by the next run.
    pub fn remove_consumed(&self, count: usize) -> FrontDeskResult<()> {
        if count == 0 {
            return Ok(());
        }
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FrontDeskError::io(&self.path, e)),
        };

        let mut remaining = count;
        let mut kept = String::with_capacity(text.len());
        for line in text.lines() {
            if remaining > 0 && parse_line(line).is_some() {
                remaining -= 1;
                continue;
            }
            kept.push_str(line);
            kept.push('\n');
        }

        debug!(path = %self.path.display(), removed = count - remaining, "intake rewritten");
        write_atomic(&self.path, &kept)
    }
}
