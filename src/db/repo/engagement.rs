//! Snapshot reads, deduplicated view recording, and comment counts.

use super::Repository;
use crate::domain::{DealId, EngagementSnapshot, TimeMs};
use sqlx::Row;

impl Repository {
    /// Read the committed counter row for a deal.
    pub async fn get_snapshot(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<EngagementSnapshot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT upvotes, downvotes, views, comments
            FROM engagement_counters
            WHERE deal_id = ?
            "#,
        )
        .bind(deal_id.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| EngagementSnapshot {
            deal_id: deal_id.clone(),
            upvotes: r.get("upvotes"),
            downvotes: r.get("downvotes"),
            views: r.get("views"),
            comments: r.get("comments"),
        }))
    }

    /// Count a view unless the same viewer was already counted for this deal
    /// within the dedup window.
    ///
    /// Returns true when the view was counted. The window is measured from
    /// the last counted view; suppressed views do not extend it.
    pub async fn record_view_deduped(
        &self,
        deal_id: &DealId,
        viewer_key: &str,
        now: TimeMs,
        window_ms: i64,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        let last_seen: Option<i64> = sqlx::query(
            "SELECT last_seen_ms FROM view_events WHERE deal_id = ? AND viewer_key = ?",
        )
        .bind(deal_id.as_str())
        .bind(viewer_key)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.get("last_seen_ms"));

        if let Some(last) = last_seen {
            if now.as_ms() - last < window_ms {
                tx.commit().await?;
                return Ok(false);
            }
        }

        let result = sqlx::query(
            "UPDATE engagement_counters SET views = views + 1 WHERE deal_id = ?",
        )
        .bind(deal_id.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO view_events (deal_id, viewer_key, last_seen_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(deal_id, viewer_key) DO UPDATE SET
                last_seen_ms = excluded.last_seen_ms
            "#,
        )
        .bind(deal_id.as_str())
        .bind(viewer_key)
        .bind(now.as_ms())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Adjust the comment count by `delta`, floored at zero.
    ///
    /// Returns false when the deal has no counter row.
    pub async fn adjust_comment_count(
        &self,
        deal_id: &DealId,
        delta: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE engagement_counters SET comments = MAX(0, comments + ?) WHERE deal_id = ?",
        )
        .bind(delta)
        .bind(deal_id.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
