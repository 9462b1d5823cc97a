//! Per-deal engagement aggregates.

use crate::domain::DealId;
use serde::{Deserialize, Serialize};

/// Derived engagement counts for a deal.
///
/// Maintained transactionally alongside the vote ledger; never authoritative
/// on its own and never hand-edited. All counts are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSnapshot {
    pub deal_id: DealId,
    pub upvotes: i64,
    pub downvotes: i64,
    pub views: i64,
    pub comments: i64,
}

impl EngagementSnapshot {
    /// A zeroed snapshot for a freshly created deal.
    pub fn empty(deal_id: DealId) -> Self {
        EngagementSnapshot {
            deal_id,
            upvotes: 0,
            downvotes: 0,
            views: 0,
            comments: 0,
        }
    }

    /// Upvotes minus downvotes.
    pub fn net_score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}
