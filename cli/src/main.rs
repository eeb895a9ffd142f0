//! frontdesk — command-line front end for the hash-chained triage log.
//!
//! Usage:
//!   frontdesk verify [LOG]
//!   frontdesk triage
//!   frontdesk add "fix login bug" "call customer about refund" --tag support
//!   frontdesk status T-0001 done
//!   frontdesk missed --date 2025-05-31
//!   frontdesk next-id
//!   frontdesk rebuild-table

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use frontdesk_chain::{verify_file, FileEventLog, LogLock};
use frontdesk_contracts::{FrontDeskError, FrontDeskResult, Item, Source, Status};
use frontdesk_core::{EventLog, FrontDeskConfig, IntakeFile, TriageOutcome, TriageRunner};
use frontdesk_mirror::{allocator::combined_max, next_id, rebuild_table, MarkdownTable};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Front desk — tamper-evident triage log.
#[derive(Parser)]
#[command(
    name = "frontdesk",
    about = "Tamper-evident, append-only triage log",
    long_about = "Appends triage items to a SHA-256 hash-chained JSONL log, keeps a\n\
                  Markdown mirror table of allocated ids, and verifies the chain."
)]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "frontdesk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay the log and check every hash link.
    Verify {
        /// Log file to verify (defaults to the configured log).
        log: Option<PathBuf>,
    },
    /// Move pending intake items into the log and the mirror table.
    Triage,
    /// Log items given on the command line.
    Add {
        /// One item per argument.
        #[arg(required = true)]
        text: Vec<String>,
        /// Tag for every item in this call.
        #[arg(long)]
        tag: Option<String>,
        /// Producer recorded in `src`: cli, interactive, import or intake.
        #[arg(long, default_value = "cli")]
        src: String,
    },
    /// Record a status change for an existing id.
    Status {
        /// Id to update, e.g. T-0001.
        id: String,
        /// open, triaged, blocked, done or dropped.
        status: String,
    },
    /// Mark a day on which no triage run happened.
    Missed {
        /// Day to mark, YYYY-MM-DD (defaults to today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the id the next record would get.
    NextId,
    /// Regenerate the mirror table from the verified log.
    RebuildTable,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = FrontDeskConfig::load_or_default(&cli.config)
        .and_then(|config| dispatch(cli.command, &config));

    match result {
        Ok(output) => {
            println!("{}", output);
        }
        Err(FrontDeskError::Chain(violation)) => {
            eprintln!("ERROR {}", violation);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR {}", e);
            std::process::exit(1);
        }
    }
}

fn dispatch(command: Command, config: &FrontDeskConfig) -> FrontDeskResult<String> {
    match command {
        Command::Verify { log } => cmd_verify(log.as_deref().unwrap_or(&config.log_path)),
        Command::Triage => cmd_triage(config),
        Command::Add { text, tag, src } => cmd_add(config, text, tag, src.parse()?),
        Command::Status { id, status } => cmd_status(config, &id, status.parse()?),
        Command::Missed { date } => {
            cmd_missed(config, date.unwrap_or_else(|| Utc::now().date_naive()))
        }
        Command::NextId => cmd_next_id(config),
        Command::RebuildTable => cmd_rebuild(config),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_verify(path: &Path) -> FrontDeskResult<String> {
    let report = verify_file(path)?;
    if report.present {
        Ok(format!("OK {} entries: chain verified", report.entries))
    } else {
        Ok(format!("OK 0 entries (no file): {}", path.display()))
    }
}

fn cmd_triage(config: &FrontDeskConfig) -> FrontDeskResult<String> {
    let _lock = lock(config)?;
    let intake = IntakeFile::new(&config.intake_path);
    let items: Vec<Item> = intake.load()?.into_iter().map(Item::new).collect();
    if items.is_empty() {
        return Ok(format!("No items to triage in {}", intake.path().display()));
    }

    let outcome = runner(config).run(items, Source::Intake, Utc::now())?;
    intake.remove_consumed(outcome.consumed)?;
    Ok(render_outcome(&outcome))
}

fn cmd_add(
    config: &FrontDeskConfig,
    text: Vec<String>,
    tag: Option<String>,
    src: Source,
) -> FrontDeskResult<String> {
    let _lock = lock(config)?;
    let items: Vec<Item> = text
        .into_iter()
        .map(|t| Item {
            title: t,
            tag: tag.clone(),
        })
        .collect();
    let outcome = runner(config).run(items, src, Utc::now())?;
    Ok(render_outcome(&outcome))
}

fn cmd_status(config: &FrontDeskConfig, id: &str, status: Status) -> FrontDeskResult<String> {
    let _lock = lock(config)?;
    let record = runner(config).set_status(id, status, Source::Cli, Utc::now())?;
    Ok(format!("{} {} -> {}", record.id, id, status))
}

fn cmd_missed(config: &FrontDeskConfig, day: NaiveDate) -> FrontDeskResult<String> {
    let _lock = lock(config)?;
    let record = runner(config).mark_missed(day, Source::Cli)?;
    Ok(format!("{} {} marked as missed", record.id, day))
}

fn cmd_next_id(config: &FrontDeskConfig) -> FrontDeskResult<String> {
    let log_max = FileEventLog::new(&config.log_path).summary()?.max_id;
    let table_max = MarkdownTable::new(&config.table_path).max_id()?;
    next_id(combined_max(log_max, table_max))
}

fn cmd_rebuild(config: &FrontDeskConfig) -> FrontDeskResult<String> {
    let _lock = lock(config)?;
    let rows = rebuild_table(&config.log_path, &config.table_path)?;
    Ok(format!(
        "Rebuilt {} with {} row(s)",
        config.table_path.display(),
        rows
    ))
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn runner(config: &FrontDeskConfig) -> TriageRunner {
    let log = FileEventLog::new(&config.log_path).with_max_batch(config.max_batch);
    let table = MarkdownTable::new(&config.table_path).with_default_tag(&config.default_tag);
    TriageRunner::new(Box::new(log), Box::new(table)).with_config(config)
}

fn lock(config: &FrontDeskConfig) -> FrontDeskResult<Option<LogLock>> {
    if !config.lock {
        debug!("log locking disabled by configuration");
        return Ok(None);
    }
    LogLock::acquire(&config.log_path).map(Some)
}

fn render_outcome(outcome: &TriageOutcome) -> String {
    let mut out = String::new();
    for record in &outcome.appended {
        out.push_str(&format!("{}  {}\n", record.id, record.note));
    }
    out.push_str(&format!(
        "Logged {} item(s); skipped {}; deferred {}",
        outcome.appended.len(),
        outcome.skipped,
        outcome.deferred
    ));
    if !outcome.mirror_synced {
        out.push_str("\nwarning: mirror table is out of date; run `frontdesk rebuild-table`");
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
