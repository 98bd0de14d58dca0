//! Region tree aggregation.
//!
//! A region carries its own vote count plus any number of sub-regions:
//! ```text
//! { name: "district", votes: 5, subRegions: [ { name: "ward", ... }, ... ] }
//! ```
//! Totals are computed with an explicit worklist, so tree depth is bounded by
//! heap rather than stack.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node in the region tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNode {
    pub name: String,
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub sub_regions: Vec<RegionNode>,
}

impl RegionNode {
    /// A region with no sub-regions.
    pub fn leaf(name: impl Into<String>, votes: i64) -> Self {
        Self {
            name: name.into(),
            votes,
            sub_regions: Vec::new(),
        }
    }

    pub fn with_sub_regions(
        name: impl Into<String>,
        votes: i64,
        sub_regions: Vec<RegionNode>,
    ) -> Self {
        Self {
            name: name.into(),
            votes,
            sub_regions,
        }
    }

    /// Total votes of this region and every descendant.
    pub fn total_votes(&self) -> i64 {
        let mut total: i64 = 0;
        let mut pending: Vec<&RegionNode> = vec![self];

        while let Some(node) = pending.pop() {
            total = total.saturating_add(node.votes);
            pending.extend(node.sub_regions.iter());
        }

        total
    }
}

// The derived drop recurses once per level; flatten it so deep chains can be
// released as safely as they are counted.
impl Drop for RegionNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.sub_regions);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.sub_regions);
        }
    }
}

/// Sum the votes of a region tree. An absent tree counts as zero.
pub fn count_votes_in_regions(tree: Option<&RegionNode>) -> i64 {
    tree.map_or(0, RegionNode::total_votes)
}

/// Sum the votes of an untyped region tree.
///
/// Non-object nodes count as zero, a missing or non-integer `votes` counts as
/// zero, and a missing or non-array `subRegions` contributes nothing. Counts
/// beyond `i64::MAX` are clamped to it.
pub fn count_votes_in_value(tree: &Value) -> i64 {
    let mut total: i64 = 0;
    let mut pending: Vec<&Value> = vec![tree];

    while let Some(node) = pending.pop() {
        let Some(fields) = node.as_object() else {
            continue;
        };

        let votes = fields.get("votes").map_or(0, votes_of);
        total = total.saturating_add(votes);

        if let Some(Value::Array(children)) = fields.get("subRegions") {
            pending.extend(children.iter());
        }
    }

    total
}

fn votes_of(value: &Value) -> i64 {
    match (value.as_i64(), value.as_u64()) {
        (Some(n), _) => n,
        (None, Some(n)) => i64::try_from(n).unwrap_or(i64::MAX),
        (None, None) => 0,
    }
}
