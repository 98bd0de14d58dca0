//! Value-style tally updates.

use serde_json::Value;
use std::collections::BTreeMap;

/// Candidate id to accumulated count.
pub type Tally = BTreeMap<String, u64>;

/// Return a new tally with `candidate_id` incremented by one.
///
/// `current` is left untouched. An empty `candidate_id`, or a count that is
/// already at `u64::MAX`, yields an empty tally.
pub fn tally_pure(current: &Tally, candidate_id: &str) -> Tally {
    if candidate_id.is_empty() {
        return Tally::new();
    }

    let count = current.get(candidate_id).copied().unwrap_or(0);
    let Some(count) = count.checked_add(1) else {
        return Tally::new();
    };

    let mut next = current.clone();
    next.insert(candidate_id.to_string(), count);
    next
}

/// `tally_pure` over untyped input.
///
/// Anything that is not an object of non-negative integer counts, or an id
/// that is not a non-empty string, yields an empty tally.
pub fn tally_pure_value(current: &Value, candidate_id: &Value) -> Tally {
    let Some(candidate_id) = candidate_id.as_str() else {
        return Tally::new();
    };

    match tally_from_value(current) {
        Some(tally) => tally_pure(&tally, candidate_id),
        None => Tally::new(),
    }
}

fn tally_from_value(value: &Value) -> Option<Tally> {
    value
        .as_object()?
        .iter()
        .map(|(id, count)| count.as_u64().map(|c| (id.clone(), c)))
        .collect()
}
