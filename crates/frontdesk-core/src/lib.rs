//! # frontdesk-core
//!
//! The triage pipeline for the front-desk log.
//!
//! This crate provides:
//! - The two storage seams (`EventLog`, `MirrorTable`)
//! - `TriageRunner`, which sequences allocation, the log append and the
//!   mirror update in crash-safe order
//! - TOML configuration and the intake-file reader
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frontdesk_core::{FrontDeskConfig, TriageRunner};
//!
//! let runner = TriageRunner::new(Box::new(log), Box::new(table)).with_config(&config);
//! let outcome = runner.run(items, Source::Intake, Utc::now())?;
//! ```

pub mod config;
pub mod fsutil;
pub mod intake;
pub mod runner;
pub mod traits;

pub use config::FrontDeskConfig;
pub use intake::{parse_intake, IntakeFile};
pub use runner::{TriageOutcome, TriageRunner};
pub use traits::{EventLog, LogSummary, MirrorTable};

// ── Tests ─────────────────────────────────────────────────────────────────────
