//! Hash-chain primitives: digests and record chaining.
//!
//! `hash = hex(SHA-256(canonical_bytes(record without hash)))`, where the
//! encoded fields include `prev_hash`.  That one field is what links a record
//! to its predecessor; changing any earlier record changes its hash and
//! therefore breaks the next record's `prev_hash`.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use frontdesk_contracts::{FrontDeskError, FrontDeskResult, Record};

use crate::canonical::canonical_bytes;

/// `prev_hash` of the first record in every log.
pub const GENESIS_PREV_HASH: &str = "";

/// SHA-256 of `bytes` as 64 lowercase hex characters.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Expected `hash` for an arbitrary JSON object read from the log.
pub fn hash_fields(fields: &Map<String, Value>) -> FrontDeskResult<String> {
    Ok(digest(&canonical_bytes(fields)?))
}

/// The record as a JSON object, the form the encoder and verifier work on.
pub fn record_fields(record: &Record) -> FrontDeskResult<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FrontDeskError::Encoding {
            reason: format!("record serialized to non-object JSON: {other}"),
        }),
        Err(e) => Err(FrontDeskError::Encoding {
            reason: e.to_string(),
        }),
    }
}

/// Link `record` after `prev_hash` and fill in its own `hash`.
///
/// Pure: no I/O, and the same input always yields the same output.
pub fn compute_hash(mut record: Record, prev_hash: &str) -> FrontDeskResult<Record> {
    record.prev_hash = prev_hash.to_string();
    record.hash.clear();
    record.hash = hash_fields(&record_fields(&record)?)?;
    Ok(record)
}
