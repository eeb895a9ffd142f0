//! # frontdesk-chain
//!
//! Append-only, SHA-256 hash-chained triage log.
//!
//! ## Overview
//!
//! Every record is canonically encoded (sorted keys, compact separators,
//! ASCII-only) and hashed together with the previous record's hash.  The
//! appender syncs each line to disk before moving on.  `verify_file`
//! replays a log from its first line and stops at the first record whose
//! hash or link does not check out.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frontdesk_chain::{FileEventLog, LogLock};
//! use frontdesk_core::EventLog;
//!
//! let _lock = LogLock::acquire(path)?;
//! let log = FileEventLog::new(path);
//! log.append(records)?;
//! assert_eq!(log.verify()?.entries, 2);
//! ```

pub mod canonical;
pub mod chain;
pub mod lock;
pub mod log;
pub mod verify;

pub use canonical::{canonical_bytes, encode_line};
pub use chain::{compute_hash, digest, hash_fields, GENESIS_PREV_HASH};
pub use lock::LogLock;
pub use log::FileEventLog;
pub use verify::{verify_file, verify_reader, ChainVerifier, VerifyReport};

// ── Tests ─────────────────────────────────────────────────────────────────────
