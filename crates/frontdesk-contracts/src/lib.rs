//! # frontdesk-contracts
//!
//! Shared types and error contracts for the front-desk triage log.
//!
//! Every crate in the workspace imports from here. No I/O or hashing lives
//! in this crate, only data definitions and error types.

pub mod error;
pub mod item;
pub mod record;

pub use error::{ChainViolation, FrontDeskError, FrontDeskResult};
pub use item::Item;
pub use record::{format_id, format_ts, parse_id, Record, RecordKind, Source, Status};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    // ── Ids ──────────────────────────────────────────────────────────────────

    #[test]
    fn format_id_zero_pads_to_four_digits() {
        assert_eq!(format_id(1), "T-0001");
        assert_eq!(format_id(42), "T-0042");
        assert_eq!(format_id(9999), "T-9999");
        assert_eq!(format_id(10000), "T-10000");
    }

    #[test]
    fn parse_id_accepts_padded_and_wide_ids() {
        assert_eq!(parse_id("T-0001"), Some(1));
        assert_eq!(parse_id("T-0420"), Some(420));
        assert_eq!(parse_id("T-12345"), Some(12345));
    }

    #[test]
    fn parse_id_rejects_malformed_ids() {
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("T-1"), None);
        assert_eq!(parse_id("T-00a1"), None);
        assert_eq!(parse_id("X-0001"), None);
        assert_eq!(parse_id("t-0001"), None);
        assert_eq!(parse_id("T--001"), None);
    }

    // ── Status ───────────────────────────────────────────────────────────────

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("open".parse::<Status>().unwrap(), Status::Open);
        assert_eq!("DONE".parse::<Status>().unwrap(), Status::Done);
        assert_eq!(" blocked ".parse::<Status>().unwrap(), Status::Blocked);
    }

    #[test]
    fn unknown_status_is_an_error() {
        let err = "finished".parse::<Status>().unwrap_err();
        assert!(err.to_string().contains("finished"));
    }

    // ── Record ───────────────────────────────────────────────────────────────

    #[test]
    fn triage_record_serializes_type_discriminator_and_defaults() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let record = Record::triage("T-0007", &Item::new("fix login bug"), Source::Intake, at);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "triage");
        assert_eq!(value["status"], "open");
        assert_eq!(value["src"], "intake");
        assert_eq!(value["tag"], "general");
        assert_eq!(value["ts"], "2025-03-04T05:06:07Z");
        assert_eq!(value["prev_hash"], "");
        assert!(value.get("subject").is_none(), "subject is omitted for triage records");
        assert!(!record.is_chained());
    }

    #[test]
    fn status_change_record_names_its_subject() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let record = Record::status_change("T-0008", "T-0007", Status::Done, Source::Cli, at);

        assert_eq!(record.kind, RecordKind::Status);
        assert_eq!(record.subject.as_deref(), Some("T-0007"));
        assert_eq!(record.note, "T-0007 -> done");
    }

    #[test]
    fn missed_record_is_dated_at_midnight_of_the_day() {
        let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let record = Record::missed("T-0012", day, Source::Cli);

        assert_eq!(record.kind, RecordKind::Missed);
        assert_eq!(record.ts, "2025-03-09T00:00:00Z");
        assert_eq!(record.note, "no triage run on 2025-03-09");
        assert_eq!(record.status, Status::Dropped);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "missed");
        assert!(value.get("subject").is_none());
    }

    #[test]
    fn source_parses_every_producer_tag() {
        for src in [Source::Intake, Source::Cli, Source::Interactive, Source::Import] {
            assert_eq!(src.as_str().parse::<Source>().unwrap(), src);
            assert_eq!(serde_json::to_value(src).unwrap(), src.as_str());
        }
        assert_eq!(" Import ".parse::<Source>().unwrap(), Source::Import);
        assert!(matches!(
            "cron".parse::<Source>(),
            Err(FrontDeskError::InvalidSource { .. })
        ));
    }

    #[test]
    fn record_without_tag_reads_back_as_general() {
        let line = r#"{"id":"T-0001","type":"triage","note":"x","status":"open","src":"intake","ts":"2025-01-01T00:00:00Z","prev_hash":"","hash":"ab"}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        assert_eq!(record.tag, "general");
        assert!(record.is_chained());
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn violation_display_names_line_and_values() {
        let v = ChainViolation::HashMismatch {
            line: 3,
            stored: "aaaa".to_string(),
            expected: "bbbb".to_string(),
        };
        let msg = v.to_string();
        assert_eq!(msg, "line 3: hash mismatch (have aaaa, expected bbbb)");
        assert_eq!(v.line(), 3);
    }

    #[test]
    fn violation_converts_into_frontdesk_error() {
        let err: FrontDeskError = ChainViolation::MissingField {
            line: 2,
            field: "prev_hash",
        }
        .into();
        assert!(matches!(err, FrontDeskError::Chain(ref v) if v.line() == 2));
        assert!(err.to_string().contains("missing prev_hash"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = FrontDeskError::io(
            std::path::Path::new("front-desk/log.jsonl"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("front-desk/log.jsonl"));
        assert!(msg.contains("denied"));
    }
}
