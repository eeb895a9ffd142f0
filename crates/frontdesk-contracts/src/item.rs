//! Producer-side input items.

use serde::{Deserialize, Serialize};

/// One logical item handed to the triage pipeline by a producer.
///
/// `title` becomes the record's `note` and the table's `title` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    /// Falls back to `general` when absent.
    #[serde(default)]
    pub tag: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}
