//! Deal row operations: insert, lookup, status CAS, and published queries.

use super::{DealWithCounts, Repository};
use crate::domain::{Deal, DealId, DealStatus, Decimal, EngagementSnapshot, TimeMs, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

impl Repository {
    /// Insert a new deal together with its zeroed counter row.
    ///
    /// Both rows land in one transaction so a deal can never exist without
    /// counters.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including duplicate id).
    pub async fn insert_deal(&self, deal: &Deal) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO deals
            (id, title, description, price, original_price, category, shop, submitter,
             status, created_at, published_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(deal.id.as_str())
        .bind(&deal.title)
        .bind(&deal.description)
        .bind(deal.price.to_canonical_string())
        .bind(deal.original_price.map(|p| p.to_canonical_string()))
        .bind(&deal.category)
        .bind(&deal.shop)
        .bind(deal.submitter.as_str())
        .bind(deal.status.as_str())
        .bind(deal.created_at.as_ms())
        .bind(deal.published_at.map(|t| t.as_ms()))
        .bind(deal.expires_at.map(|t| t.as_ms()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO engagement_counters (deal_id) VALUES (?)")
            .bind(deal.id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a deal by id.
    pub async fn get_deal(&self, id: &DealId) -> Result<Option<Deal>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, price, original_price, category, shop, submitter,
                   status, created_at, published_at, expires_at
            FROM deals
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| deal_from_row(&r)).transpose()
    }

    /// Compare-and-swap status transition.
    ///
    /// Moves the deal from `from` to `to` only if its stored status still is
    /// `from`; returns false when another transition won the race.
    /// `published_at` is stamped in the same statement the first time the
    /// deal enters `published` and never overwritten afterwards.
    pub async fn transition_status(
        &self,
        id: &DealId,
        from: DealStatus,
        to: DealStatus,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE deals
            SET status = ?,
                published_at = CASE
                    WHEN ? = 'published' AND published_at IS NULL THEN ?
                    ELSE published_at
                END
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(to.as_str())
        .bind(now.as_ms())
        .bind(id.as_str())
        .bind(from.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Expire every published deal whose expiry has passed.
    ///
    /// Returns the number of deals moved to `expired`.
    pub async fn expire_due(&self, now: TimeMs) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE deals
            SET status = 'expired'
            WHERE status = 'published' AND expires_at IS NOT NULL AND expires_at <= ?
            "#,
        )
        .bind(now.as_ms())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Query all publicly visible deals with their counters.
    ///
    /// The join reads deal and counters in one statement, so each returned
    /// pair reflects a single committed state.
    pub async fn query_published(
        &self,
        category: Option<&str>,
        now: TimeMs,
    ) -> Result<Vec<DealWithCounts>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.title, d.description, d.price, d.original_price, d.category,
                   d.shop, d.submitter, d.status, d.created_at, d.published_at, d.expires_at,
                   c.upvotes, c.downvotes, c.views, c.comments
            FROM deals d
            JOIN engagement_counters c ON c.deal_id = d.id
            WHERE d.status = 'published'
              AND (d.expires_at IS NULL OR d.expires_at > ?)
              AND (? IS NULL OR d.category = ?)
            ORDER BY d.created_at DESC, d.id ASC
            "#,
        )
        .bind(now.as_ms())
        .bind(category)
        .bind(category)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let deal = deal_from_row(row)?;
                let counts = EngagementSnapshot {
                    deal_id: deal.id.clone(),
                    upvotes: row.get("upvotes"),
                    downvotes: row.get("downvotes"),
                    views: row.get("views"),
                    comments: row.get("comments"),
                };
                Ok(DealWithCounts { deal, counts })
            })
            .collect()
    }
}

fn deal_from_row(row: &SqliteRow) -> Result<Deal, sqlx::Error> {
    let id: String = row.get("id");
    let status_str: String = row.get("status");
    let status = DealStatus::from_str(&status_str).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: e.into(),
    })?;

    let price_str: String = row.get("price");
    let price = Decimal::from_str(&price_str).unwrap_or_else(|e| {
        warn!(deal_id = %id, price = %price_str, error = %e, "Failed to parse deal price decimal, using default");
        Decimal::default()
    });

    let original_price = row
        .get::<Option<String>, _>("original_price")
        .and_then(|s| match Decimal::from_str(&s) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(deal_id = %id, original_price = %s, error = %e, "Failed to parse original price decimal, dropping");
                None
            }
        });

    Ok(Deal {
        id: DealId::new(id),
        title: row.get("title"),
        description: row.get("description"),
        price,
        original_price,
        category: row.get("category"),
        shop: row.get("shop"),
        submitter: UserId::new(row.get("submitter")),
        status,
        created_at: TimeMs::new(row.get("created_at")),
        published_at: row.get::<Option<i64>, _>("published_at").map(TimeMs::new),
        expires_at: row.get::<Option<i64>, _>("expires_at").map(TimeMs::new),
    })
}
