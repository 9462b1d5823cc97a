//! Deal type and its moderation status.

use crate::domain::{DealId, Decimal, TimeMs, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moderation status of a deal.
///
/// Transitions between statuses are owned by the moderation workflow; nothing
/// else writes this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Draft,
    PendingReview,
    Published,
    Rejected,
    Expired,
    Removed,
}

impl DealStatus {
    /// Canonical storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Draft => "draft",
            DealStatus::PendingReview => "pending_review",
            DealStatus::Published => "published",
            DealStatus::Rejected => "rejected",
            DealStatus::Expired => "expired",
            DealStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DealStatus::Draft),
            "pending_review" => Ok(DealStatus::PendingReview),
            "published" => Ok(DealStatus::Published),
            "rejected" => Ok(DealStatus::Rejected),
            "expired" => Ok(DealStatus::Expired),
            "removed" => Ok(DealStatus::Removed),
            other => Err(format!("unknown deal status: {}", other)),
        }
    }
}

/// A deal as stored. Counters and heat score are derived elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub category: String,
    pub shop: String,
    pub submitter: UserId,
    pub status: DealStatus,
    pub created_at: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<TimeMs>,
}

impl Deal {
    /// True if the deal is published and its expiry (if any) has not passed.
    pub fn is_publicly_visible(&self, now: TimeMs) -> bool {
        self.status == DealStatus::Published
            && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

/// Fields a submitter provides when creating a draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub category: String,
    pub shop: String,
    #[serde(default)]
    pub expires_at: Option<TimeMs>,
}
