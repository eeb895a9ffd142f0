//! Canonical encoding of log records.
//!
//! A record is encoded as compact JSON with:
//!   1. object keys sorted by code point, at every nesting level
//!   2. `,` and `:` separators with no whitespace
//!   3. every character outside printable ASCII escaped as `\uXXXX`
//!      (surrogate pairs above the BMP, lowercase hex)
//!
//! Field insertion order therefore never changes the bytes.  The output is
//! byte-identical to Python's `json.dumps(sort_keys=True, ensure_ascii=True,
//! separators=(",", ":"))`, so logs written by the older scripts verify
//! unchanged.
//!
//! Numbers are re-emitted exactly as they appeared in the source text
//! (serde_json's `arbitrary_precision`), so a Python-written `1e+16` is
//! hashed as `1e+16`, not `1e16`.

use std::io;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{ser::Formatter, Map, Value};

use frontdesk_contracts::{FrontDeskError, FrontDeskResult};

/// The integrity field that the digest covers everything but.
pub const HASH_FIELD: &str = "hash";

/// Encode `fields` without the `hash` entry: the digest input.
pub fn canonical_bytes(fields: &Map<String, Value>) -> FrontDeskResult<Vec<u8>> {
    let without_hash: Map<String, Value> = fields
        .iter()
        .filter(|(k, _)| k.as_str() != HASH_FIELD)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    encode(&Value::Object(without_hash))
}

/// Encode `fields` in full, `hash` included: the on-disk line body.
pub fn encode_line(fields: &Map<String, Value>) -> FrontDeskResult<Vec<u8>> {
    encode(&Value::Object(fields.clone()))
}

fn encode(value: &Value) -> FrontDeskResult<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    Sorted(value)
        .serialize(&mut ser)
        .map_err(|e| FrontDeskError::Encoding {
            reason: e.to_string(),
        })?;
    Ok(out)
}

// ── Key ordering ──────────────────────────────────────────────────────────────

/// Serializes a JSON value with object keys in sorted order regardless of
/// how the underlying map orders them.
struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    out.serialize_entry(k, &Sorted(v))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Sorted(item))?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}

// ── ASCII-only output ─────────────────────────────────────────────────────────

/// Compact formatter that escapes everything outside `' '..='~'`.
///
/// serde_json already escapes quotes, backslashes and control characters;
/// this only handles the unescaped fragments in between.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
