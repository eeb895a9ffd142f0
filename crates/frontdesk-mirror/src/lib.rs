//! # frontdesk-mirror
//!
//! Id allocation and the human-readable mirror of the triage log.
//!
//! [`MarkdownTable`] implements [`MirrorTable`](frontdesk_core::MirrorTable):
//! it hands out `T-####` ids and keeps one pipe-table row per triaged item.
//! The table is a projection only; [`rebuild_table`] regenerates it from the
//! verified log whenever the two disagree.

pub mod allocator;
pub mod rebuild;
pub mod table;

pub use allocator::{allocate_ids, max_table_id, next_id};
pub use rebuild::{project_rows, rebuild_table};
pub use table::{MarkdownTable, Row, HEADER, SEPARATOR};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};

    use frontdesk_chain::FileEventLog;
    use frontdesk_contracts::{FrontDeskError, Item, Record, Source, Status};
    use frontdesk_core::{EventLog, FrontDeskConfig, IntakeFile, MirrorTable, TriageRunner};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()
    }

    // ── Allocator ────────────────────────────────────────────────────────────

    #[test]
    fn allocation_starts_at_one() {
        assert_eq!(next_id(None).unwrap(), "T-0001");
        assert_eq!(next_id(Some(41)).unwrap(), "T-0042");
        assert_eq!(allocate_ids(Some(9998), 3).unwrap(), vec!["T-9999", "T-10000", "T-10001"]);
    }

    #[test]
    fn allocation_refuses_to_wrap() {
        assert!(matches!(next_id(Some(u32::MAX)), Err(FrontDeskError::InvalidId { .. })));
    }

    #[test]
    fn max_table_id_ignores_header_and_malformed_rows() {
        let text = format!(
            "{HEADER}\n{SEPARATOR}\n| T-0003 | a | open |  | general |\n| T-00x9 | bad |\n| nonsense |\nplain text\n| T-0012 | b | done |  | ops |\n"
        );
        assert_eq!(max_table_id(&text), Some(12));
        assert_eq!(max_table_id(""), None);
        assert_eq!(max_table_id(&format!("{HEADER}\n{SEPARATOR}\n")), None);
    }

    // ── Table ────────────────────────────────────────────────────────────────

    #[test]
    fn append_rows_creates_table_and_returns_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.md");
        let table = MarkdownTable::new(&path);

        let ids = table
            .append_rows(&[Item::new("fix login bug"), Item::new("pay | invoice").with_tag("billing")])
            .unwrap();
        assert_eq!(ids, vec!["T-0001", "T-0002"]);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            format!(
                "{HEADER}\n{SEPARATOR}\n| T-0001 | fix login bug | open |  | general |\n| T-0002 | pay \\| invoice | open |  | billing |\n"
            )
        );

        let rows = table.rows().unwrap();
        assert_eq!(rows[1].title, "pay | invoice");
        assert_eq!(table.append_rows(&[Item::new("third")]).unwrap(), vec!["T-0003"]);
    }

    #[test]
    fn malformed_header_is_rewritten_keeping_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.md");
        fs::write(&path, "Tasks\n| T-0005 | kept | open |  | general |\ngarbage").unwrap();

        let table = MarkdownTable::new(&path);
        table.ensure_header().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("{HEADER}\n{SEPARATOR}\n| T-0005 | kept | open |  | general |\n")
        );
        assert_eq!(table.max_id().unwrap(), Some(5));
    }

    #[test]
    fn mirror_allocation_takes_the_larger_of_log_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = MarkdownTable::new(dir.path().join("tasks.md"));
        table.append_rows(&[Item::new("a"), Item::new("b")]).unwrap();

        assert_eq!(table.allocate(None, 1).unwrap(), vec!["T-0003"]);
        assert_eq!(table.allocate(Some(7), 2).unwrap(), vec!["T-0008", "T-0009"]);
    }

    #[test]
    fn write_rows_only_projects_triage_records() {
        let dir = tempfile::tempdir().unwrap();
        let table = MarkdownTable::new(dir.path().join("tasks.md"));

        let triage = Record::triage("T-0001", &Item::new("a"), Source::Cli, at());
        let status = Record::status_change("T-0002", "T-0001", Status::Done, Source::Cli, at());
        table.write_rows(&[triage, status]).unwrap();

        let rows = table.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "T-0001");
    }

    #[test]
    fn set_status_updates_only_the_named_row() {
        let dir = tempfile::tempdir().unwrap();
        let table = MarkdownTable::new(dir.path().join("tasks.md"));
        table.append_rows(&[Item::new("a"), Item::new("b")]).unwrap();

        assert!(table.set_status("T-0002", Status::Blocked).unwrap());
        assert!(!table.set_status("T-0099", Status::Done).unwrap());

        let rows = table.rows().unwrap();
        assert_eq!(rows[0].status, "open");
        assert_eq!(rows[1].status, "blocked");
    }

    // ── Rebuild ──────────────────────────────────────────────────────────────

    #[test]
    fn rebuild_projects_triage_rows_and_applies_status_changes() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.jsonl");
        let table_path = dir.path().join("tasks.md");
        let log = FileEventLog::new(&log_path);

        log.append(vec![
            Record::triage("T-0001", &Item::new("fix login bug"), Source::Intake, at()),
            Record::triage("T-0002", &Item::new("refund").with_tag("billing"), Source::Intake, at()),
            Record::status_change("T-0003", "T-0001", Status::Done, Source::Cli, at()),
        ])
        .unwrap();

        // A stale, hand-edited table is replaced wholesale.
        fs::write(&table_path, "| T-0042 | bogus | open |  | general |\n").unwrap();

        assert_eq!(rebuild_table(&log_path, &table_path).unwrap(), 2);
        let rows = MarkdownTable::new(&table_path).rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].id.as_str(), rows[0].status.as_str()), ("T-0001", "done"));
        assert_eq!((rows[1].id.as_str(), rows[1].tag.as_str()), ("T-0002", "billing"));
    }

    #[test]
    fn rebuild_refuses_a_broken_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.jsonl");
        let table_path = dir.path().join("tasks.md");
        FileEventLog::new(&log_path)
            .append(vec![Record::triage("T-0001", &Item::new("a"), Source::Cli, at())])
            .unwrap();

        let text = fs::read_to_string(&log_path).unwrap().replace("\"a\"", "\"z\"");
        fs::write(&log_path, text).unwrap();

        let err = rebuild_table(&log_path, &table_path).unwrap_err();
        assert!(matches!(err, FrontDeskError::Chain(_)));
        assert!(!table_path.exists());
    }

    #[test]
    fn rebuild_of_missing_log_writes_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("tasks.md");
        assert_eq!(rebuild_table(&dir.path().join("none.jsonl"), &table_path).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(&table_path).unwrap(),
            format!("{HEADER}\n{SEPARATOR}\n")
        );
    }

    // ── End to end ───────────────────────────────────────────────────────────

    #[test]
    fn runner_writes_log_then_table_with_matching_ids() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("front-desk/log.jsonl");
        let table_path = dir.path().join("front-desk/tasks.md");

        let runner = TriageRunner::new(
            Box::new(FileEventLog::new(&log_path)),
            Box::new(MarkdownTable::new(&table_path)),
        );
        let outcome = runner
            .run(
                vec![Item::new("fix login bug"), Item::new("call customer about refund")],
                Source::Intake,
                at(),
            )
            .unwrap();

        assert_eq!(outcome.ids(), vec!["T-0001", "T-0002"]);
        assert!(outcome.mirror_synced);

        let report = FileEventLog::new(&log_path).verify().unwrap();
        assert_eq!(report.entries, 2);

        let table_ids: Vec<String> = MarkdownTable::new(&table_path)
            .rows()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(table_ids, vec!["T-0001", "T-0002"]);

        // The rebuilt projection is identical to the live one.
        let live = fs::read_to_string(&table_path).unwrap();
        rebuild_table(&log_path, &table_path).unwrap();
        assert_eq!(fs::read_to_string(&table_path).unwrap(), live);
    }

    #[test]
    fn ids_never_repeat_when_the_table_lags_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.jsonl");
        let table_path = dir.path().join("tasks.md");
        let log = FileEventLog::new(&log_path);

        // Simulate a crash after the log write but before the table write.
        log.append(vec![Record::triage("T-0001", &Item::new("a"), Source::Intake, at())])
            .unwrap();

        let runner = TriageRunner::new(Box::new(log.clone()), Box::new(MarkdownTable::new(&table_path)));
        let outcome = runner.run(vec![Item::new("b")], Source::Intake, at()).unwrap();

        assert_eq!(outcome.ids(), vec!["T-0002"]);
        assert_eq!(log.summary().unwrap().entries, 2);
        assert_eq!(log.verify().unwrap().entries, 2);
    }

    #[test]
    fn a_tighter_log_cap_leaves_unwritten_items_in_the_intake() {
        let dir = tempfile::tempdir().unwrap();
        let intake_path = dir.path().join("intake.md");
        let text: String = (1..=12).map(|i| format!("- [ ] item {i}\n")).collect();
        fs::write(&intake_path, text).unwrap();

        // The runner allows 12 per batch; the log keeps its default of 10.
        let config = FrontDeskConfig {
            max_batch: 12,
            ..FrontDeskConfig::default()
        };
        let runner = TriageRunner::new(
            Box::new(FileEventLog::new(dir.path().join("log.jsonl"))),
            Box::new(MarkdownTable::new(dir.path().join("tasks.md"))),
        )
        .with_config(&config);

        let intake = IntakeFile::new(&intake_path);
        let items = intake.load().unwrap().into_iter().map(Item::new).collect();
        let outcome = runner.run(items, Source::Intake, at()).unwrap();

        assert_eq!(outcome.appended.len(), 10);
        assert_eq!(outcome.consumed, 10);
        assert_eq!(outcome.deferred, 2);

        intake.remove_consumed(outcome.consumed).unwrap();
        assert_eq!(intake.load().unwrap(), vec!["item 11", "item 12"]);
    }
}
