//! Log records and the small enumerations they carry.
//!
//! A `Record` is one line of the triage log.  It is built once, chained by
//! the appender (which fills `prev_hash` and `hash`), and never modified
//! afterwards.  Corrections are new records of kind `status`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FrontDeskError;
use crate::item::Item;

/// Prefix shared by every allocated record id.
pub const ID_PREFIX: &str = "T-";

/// Tag used when the producer does not supply one.
pub const DEFAULT_TAG: &str = "general";

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Lifecycle state of a triaged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Triaged,
    Blocked,
    Done,
    Dropped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Triaged => "triaged",
            Status::Blocked => "blocked",
            Status::Done => "done",
            Status::Dropped => "dropped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Status::Open),
            "triaged" => Ok(Status::Triaged),
            "blocked" => Ok(Status::Blocked),
            "done" => Ok(Status::Done),
            "dropped" => Ok(Status::Dropped),
            _ => Err(FrontDeskError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Which collaborator produced a record.
///
/// `Interactive` and `Import` are written by front ends that drive the CLI
/// (`frontdesk add --src interactive`) rather than by this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The intake file, processed by `frontdesk triage`.
    Intake,
    /// Items passed directly on the command line.
    Cli,
    /// A human answering prompts.
    Interactive,
    /// Bulk import from another tool.
    Import,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Intake => "intake",
            Source::Cli => "cli",
            Source::Interactive => "interactive",
            Source::Import => "import",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intake" => Ok(Source::Intake),
            "cli" => Ok(Source::Cli),
            "interactive" => Ok(Source::Interactive),
            "import" => Ok(Source::Import),
            _ => Err(FrontDeskError::InvalidSource {
                value: s.to_string(),
            }),
        }
    }
}

/// The `type` discriminator that lets several record kinds share one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A new item entering the queue.
    Triage,
    /// A status change for an earlier record, named by `subject`.
    Status,
    /// A day on which no triage run happened.
    Missed,
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One entry in the hash-chained triage log.
///
/// `prev_hash` and `hash` are empty until the appender chains the record.
/// Field order here is irrelevant to hashing; the canonical encoder sorts
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `T-####`, strictly increasing across the log.
    pub id: String,

    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Free-form text describing the triaged item.
    pub note: String,

    pub status: Status,

    pub src: Source,

    #[serde(default = "default_tag")]
    pub tag: String,

    /// For `status` records: the id whose status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// UTC, second precision, trailing `Z`.
    pub ts: String,

    #[serde(default)]
    pub prev_hash: String,

    #[serde(default)]
    pub hash: String,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

impl Record {
    /// A fresh `triage` record for `item`, status `open`.
    pub fn triage(id: impl Into<String>, item: &Item, src: Source, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Triage,
            note: item.title.clone(),
            status: Status::Open,
            src,
            tag: item.tag.clone().unwrap_or_else(default_tag),
            subject: None,
            ts: format_ts(at),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    /// A `status` record moving `subject` to `status`.
    pub fn status_change(
        id: impl Into<String>,
        subject: impl Into<String>,
        status: Status,
        src: Source,
        at: DateTime<Utc>,
    ) -> Self {
        let subject = subject.into();
        Self {
            id: id.into(),
            kind: RecordKind::Status,
            note: format!("{subject} -> {status}"),
            status,
            src,
            tag: default_tag(),
            subject: Some(subject),
            ts: format_ts(at),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    /// A `missed` record marking `day` as a day without a triage run.
    ///
    /// `ts` is midnight UTC of `day`, so the date part of `ts` names the
    /// missed day.  Status is `dropped`: nothing was triaged.
    pub fn missed(id: impl Into<String>, day: NaiveDate, src: Source) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Missed,
            note: format!("no triage run on {day}"),
            status: Status::Dropped,
            src,
            tag: default_tag(),
            subject: None,
            ts: format_ts(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    /// True once the appender has filled in the integrity fields.
    pub fn is_chained(&self) -> bool {
        !self.hash.is_empty()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render sequence number `n` as a `T-####` id.
pub fn format_id(n: u32) -> String {
    format!("{ID_PREFIX}{n:04}")
}

/// Extract the numeric part of a `T-####` id.
///
/// At least four digits are required; wider ids (`T-10000`) are accepted.
/// Anything else yields `None`.
pub fn parse_id(id: &str) -> Option<u32> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
