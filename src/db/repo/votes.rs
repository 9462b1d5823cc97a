//! Vote ledger rows and the transactional counter update.

use super::Repository;
use crate::domain::{DealId, TimeMs, UserId, Vote, VoteDirection};
use sqlx::Row;
use std::str::FromStr;

impl Repository {
    /// Fetch the current vote row for (deal, user), if any.
    pub async fn get_vote(
        &self,
        deal_id: &DealId,
        user_id: &UserId,
    ) -> Result<Option<Vote>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT deal_id, user_id, direction, updated_at
            FROM votes
            WHERE deal_id = ? AND user_id = ?
            "#,
        )
        .bind(deal_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| {
            let direction_str: String = r.get("direction");
            let direction =
                VoteDirection::from_str(&direction_str).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "direction".to_string(),
                    source: e.into(),
                })?;
            Ok(Vote {
                deal_id: DealId::new(r.get("deal_id")),
                user_id: UserId::new(r.get("user_id")),
                direction,
                updated_at: TimeMs::new(r.get("updated_at")),
            })
        })
        .transpose()
    }

    /// Apply a vote change and its counter delta in one transaction.
    ///
    /// `previous` is the direction of the existing row (if any) and `next`
    /// the direction after the operation; `next = None` deletes the row.
    /// Either both the vote row and the counters commit, or neither does.
    ///
    /// # Errors
    /// Returns an error if any statement fails; the transaction is rolled
    /// back and the ledger stays consistent with the counters.
    pub async fn apply_vote(
        &self,
        deal_id: &DealId,
        user_id: &UserId,
        previous: Option<VoteDirection>,
        next: Option<VoteDirection>,
        now: TimeMs,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        match next {
            Some(direction) => {
                sqlx::query(
                    r#"
                    INSERT INTO votes (deal_id, user_id, direction, updated_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(deal_id, user_id) DO UPDATE SET
                        direction = excluded.direction,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(deal_id.as_str())
                .bind(user_id.as_str())
                .bind(direction.as_str())
                .bind(now.as_ms())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM votes WHERE deal_id = ? AND user_id = ?")
                    .bind(deal_id.as_str())
                    .bind(user_id.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let (up_delta, down_delta) = vote_count_delta(previous, next);
        if up_delta != 0 || down_delta != 0 {
            let result = sqlx::query(
                r#"
                UPDATE engagement_counters
                SET upvotes = upvotes + ?, downvotes = downvotes + ?
                WHERE deal_id = ?
                "#,
            )
            .bind(up_delta)
            .bind(down_delta)
            .bind(deal_id.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(sqlx::Error::RowNotFound);
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Counter delta for a vote change: decrement what the old row counted,
/// increment what the new row counts.
fn vote_count_delta(
    previous: Option<VoteDirection>,
    next: Option<VoteDirection>,
) -> (i64, i64) {
    let mut up = 0i64;
    let mut down = 0i64;
    match previous {
        Some(VoteDirection::Up) => up -= 1,
        Some(VoteDirection::Down) => down -= 1,
        None => {}
    }
    match next {
        Some(VoteDirection::Up) => up += 1,
        Some(VoteDirection::Down) => down += 1,
        None => {}
    }
    (up, down)
}
