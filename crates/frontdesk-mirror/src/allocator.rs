//! Sequence allocation for `T-####` ids.
//!
//! Ids are derived from what is already persisted: the largest numeric
//! suffix found, plus one.  Nothing is reserved ahead of time, so the caller
//! must write the allocated ids before allocating again.

use frontdesk_contracts::{format_id, parse_id, FrontDeskError, FrontDeskResult};

use crate::table::split_cells;

/// The id following `existing_max`; `T-0001` when nothing exists yet.
pub fn next_id(existing_max: Option<u32>) -> FrontDeskResult<String> {
    Ok(allocate_ids(existing_max, 1)?.remove(0))
}

/// `count` consecutive ids following `existing_max`.
pub fn allocate_ids(existing_max: Option<u32>, count: usize) -> FrontDeskResult<Vec<String>> {
    let start = existing_max.unwrap_or(0);
    (1..=count)
        .map(|offset| {
            u32::try_from(offset)
                .ok()
                .and_then(|o| start.checked_add(o))
                .map(format_id)
                .ok_or_else(|| FrontDeskError::InvalidId {
                    id: format!("{}{}+{}", frontdesk_contracts::record::ID_PREFIX, start, offset),
                })
        })
        .collect()
}

/// Largest id in the first column of a Markdown table.
///
/// Header, separator and malformed rows are ignored.
pub fn max_table_id(text: &str) -> Option<u32> {
    text.lines()
        .filter_map(split_cells)
        .filter_map(|cells| cells.first().and_then(|c| parse_id(c)))
        .max()
}

/// The larger of two optional maxima.
pub fn combined_max(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    a.max(b)
}
