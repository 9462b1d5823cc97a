//! Ranking: ordered, paginated views over publicly visible deals.
//!
//! Each request reads deals and counters in a single repository query, scores
//! them against one clock reading, and slices the fully ordered list. Within
//! a request no deal can be skipped or duplicated across the slice; ranks may
//! still drift between separate page requests as votes land, which is
//! accepted (ordering across requests is eventual, not strict).

use crate::db::repo::DealWithCounts;
use crate::db::Repository;
use crate::domain::{Deal, DealId, Decimal, EngagementSnapshot, Role, TimeMs};
use crate::engine::{heat_score, HeatParams};
use crate::error::EngineError;
use crate::identity::IdentityGate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Sort order for deal listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Hot,
    Newest,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(SortOrder::Hot),
            "newest" => Ok(SortOrder::Newest),
            _ => Err(()),
        }
    }
}

/// One row of a listing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSummary {
    pub id: DealId,
    pub title: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub category: String,
    pub shop: String,
    pub created_at: TimeMs,
    pub upvotes: i64,
    pub downvotes: i64,
    pub views: i64,
    pub comments: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_score: Option<f64>,
}

/// A deal detail read: the deal plus its committed counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDetail {
    #[serde(flatten)]
    pub deal: Deal,
    pub counts: EngagementSnapshot,
}

pub struct RankingService {
    repo: Arc<Repository>,
    gate: IdentityGate,
    params: HeatParams,
    max_page_size: usize,
}

impl RankingService {
    pub fn new(
        repo: Arc<Repository>,
        gate: IdentityGate,
        params: HeatParams,
        max_page_size: usize,
    ) -> Self {
        Self {
            repo,
            gate,
            params,
            max_page_size,
        }
    }

    /// List publicly visible deals, ordered and paginated.
    ///
    /// `page` is 1-based; `page_size` is clamped to the configured maximum.
    pub async fn list_deals(
        &self,
        sort: SortOrder,
        category: Option<&str>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<DealSummary>, EngineError> {
        if page == 0 {
            return Err(EngineError::BadRequest("page is 1-based".to_string()));
        }
        if page_size == 0 {
            return Err(EngineError::BadRequest("pageSize must be positive".to_string()));
        }
        let page_size = page_size.min(self.max_page_size);

        let now = TimeMs::now();
        let rows = self.repo.query_published(category, now).await?;
        let mut ranked = rank(rows, sort, now, &self.params);

        let offset = (page - 1).saturating_mul(page_size);
        if offset >= ranked.len() {
            return Ok(Vec::new());
        }
        ranked.drain(..offset);
        ranked.truncate(page_size);

        Ok(ranked
            .into_iter()
            .map(|(row, heat)| summarize(row, sort, heat))
            .collect())
    }

    /// Fetch a single deal with its counters, honoring visibility.
    ///
    /// Published, unexpired deals are visible to everyone. Everything else is
    /// visible only to its submitter or to moderators and above, and reads as
    /// `NotFound` to anyone else rather than confirming the deal exists.
    pub async fn get_deal(
        &self,
        token: Option<&str>,
        deal_id: &DealId,
    ) -> Result<DealDetail, EngineError> {
        let (deal, counts) = futures::future::try_join(
            self.repo.get_deal(deal_id),
            self.repo.get_snapshot(deal_id),
        )
        .await?;

        let deal = deal.ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)))?;
        let counts =
            counts.ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)))?;

        if !deal.is_publicly_visible(TimeMs::now()) {
            let allowed = match self.gate.resolve(token).await {
                Ok(identity) => {
                    identity.role.allows(Role::Moderator) || identity.user_id == deal.submitter
                }
                Err(_) => false,
            };
            if !allowed {
                return Err(EngineError::NotFound(format!("deal {}", deal_id)));
            }
        }

        Ok(DealDetail { deal, counts })
    }
}

/// Order rows for the requested sort, scoring heat against a single clock
/// reading. Ties break by creation time (newest first), then id, so the
/// ordering is total and pagination is stable within a request.
fn rank(
    rows: Vec<DealWithCounts>,
    sort: SortOrder,
    now: TimeMs,
    params: &HeatParams,
) -> Vec<(DealWithCounts, f64)> {
    let mut scored: Vec<(DealWithCounts, f64)> = rows
        .into_iter()
        .map(|row| {
            let age_hours = row.deal.created_at.hours_until(now);
            let heat = heat_score(&row.counts, age_hours, params);
            (row, heat)
        })
        .collect();

    scored.sort_by(|(a, heat_a), (b, heat_b)| match sort {
        SortOrder::Hot => heat_b
            .total_cmp(heat_a)
            .then_with(|| b.deal.created_at.cmp(&a.deal.created_at))
            .then_with(|| a.deal.id.cmp(&b.deal.id)),
        SortOrder::Newest => b
            .deal
            .created_at
            .cmp(&a.deal.created_at)
            .then_with(|| a.deal.id.cmp(&b.deal.id)),
    });

    scored
}

fn summarize(row: DealWithCounts, sort: SortOrder, heat: f64) -> DealSummary {
    DealSummary {
        id: row.deal.id,
        title: row.deal.title,
        price: row.deal.price,
        original_price: row.deal.original_price,
        category: row.deal.category,
        shop: row.deal.shop,
        created_at: row.deal.created_at,
        upvotes: row.counts.upvotes,
        downvotes: row.counts.downvotes,
        views: row.counts.views,
        comments: row.counts.comments,
        heat_score: (sort == SortOrder::Hot).then_some(heat),
    }
}
