//! Engagement counters: views with a dedup window, comment counts, and
//! snapshot reads.
//!
//! View recording is advisory input to ranking, not a correctness-critical
//! ledger; callers treat failures as best-effort.

use crate::db::Repository;
use crate::domain::{DealId, EngagementSnapshot, TimeMs, UserId};
use crate::error::EngineError;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Key identifying a viewer for dedup purposes.
///
/// Members dedup on their user id; anonymous viewers on a hash of whatever
/// fingerprint material the caller supplies (IP + user agent, typically).
/// The raw fingerprint is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerKey {
    Member(UserId),
    Anonymous(String),
}

impl ViewerKey {
    /// Build an anonymous key by hashing the raw fingerprint material.
    pub fn from_fingerprint(raw: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        ViewerKey::Anonymous(hex::encode(hasher.finalize()))
    }

    /// Storage form, prefixed so member ids and fingerprint hashes can never
    /// collide.
    pub fn storage_key(&self) -> String {
        match self {
            ViewerKey::Member(user_id) => format!("u:{}", user_id),
            ViewerKey::Anonymous(hash) => format!("a:{}", hash),
        }
    }
}

pub struct EngagementService {
    repo: Arc<Repository>,
    dedup_window_ms: i64,
}

impl EngagementService {
    pub fn new(repo: Arc<Repository>, dedup_window_ms: i64) -> Self {
        Self {
            repo,
            dedup_window_ms,
        }
    }

    /// Record a view, deduplicated per (viewer, deal) within the window.
    ///
    /// Returns true when the view was counted.
    pub async fn record_view(
        &self,
        deal_id: &DealId,
        viewer: &ViewerKey,
    ) -> Result<bool, EngineError> {
        let counted = self
            .repo
            .record_view_deduped(
                deal_id,
                &viewer.storage_key(),
                TimeMs::now(),
                self.dedup_window_ms,
            )
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => EngineError::NotFound(format!("deal {}", deal_id)),
                other => EngineError::Db(other),
            })?;

        debug!(deal_id = %deal_id, counted, "View recorded");
        Ok(counted)
    }

    /// Count a successfully created comment.
    pub async fn record_comment(&self, deal_id: &DealId) -> Result<(), EngineError> {
        if !self.repo.adjust_comment_count(deal_id, 1).await? {
            return Err(EngineError::NotFound(format!("deal {}", deal_id)));
        }
        Ok(())
    }

    /// Un-count a deleted comment.
    pub async fn remove_comment(&self, deal_id: &DealId) -> Result<(), EngineError> {
        if !self.repo.adjust_comment_count(deal_id, -1).await? {
            return Err(EngineError::NotFound(format!("deal {}", deal_id)));
        }
        Ok(())
    }

    /// Read the committed counters for a deal.
    pub async fn snapshot(&self, deal_id: &DealId) -> Result<EngagementSnapshot, EngineError> {
        self.repo
            .get_snapshot(deal_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)))
    }
}
