//! TOML configuration for the front-desk tools.
//!
//! Every field has a default, so an empty document (or a missing file when
//! loaded through `load_or_default`) yields a working configuration.
//!
//! Example:
//! ```toml
//! log_path = "front-desk/log.jsonl"
//! table_path = "front-desk/tasks.md"
//! max_batch = 10
//! default_tag = "general"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use frontdesk_contracts::{record::DEFAULT_TAG, FrontDeskError, FrontDeskResult};

/// Maximum records appended per invocation unless configured otherwise.
pub const DEFAULT_MAX_BATCH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontDeskConfig {
    /// The hash-chained JSONL log.
    pub log_path: PathBuf,

    /// The Markdown mirror table.
    pub table_path: PathBuf,

    /// Intake file read by `frontdesk triage`.
    pub intake_path: PathBuf,

    /// Records appended per run; excess items wait for a later run.
    pub max_batch: usize,

    /// Tag given to items that do not carry one.
    pub default_tag: String,

    /// Hold `<log_path>.lock` for the duration of every write command.
    pub lock: bool,

    /// Skip intake lines whose text is already the note of a logged record.
    pub skip_logged: bool,
}

impl Default for FrontDeskConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("front-desk/log.jsonl"),
            table_path: PathBuf::from("front-desk/tasks.md"),
            intake_path: PathBuf::from("front-desk/intake.md"),
            max_batch: DEFAULT_MAX_BATCH,
            default_tag: DEFAULT_TAG.to_string(),
            lock: true,
            skip_logged: true,
        }
    }
}

impl FrontDeskConfig {
    /// Parse `s` as TOML and validate the result.
    pub fn from_toml_str(s: &str) -> FrontDeskResult<Self> {
        let config: FrontDeskConfig = toml::from_str(s).map_err(|e| FrontDeskError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: &Path) -> FrontDeskResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FrontDeskError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> FrontDeskResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    fn validate(&self) -> FrontDeskResult<()> {
        if self.max_batch == 0 {
            return Err(FrontDeskError::ConfigError {
                reason: "max_batch must be at least 1".to_string(),
            });
        }
        if self.default_tag.trim().is_empty() {
            return Err(FrontDeskError::ConfigError {
                reason: "default_tag must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
