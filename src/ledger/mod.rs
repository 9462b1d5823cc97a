//! Vote ledger: the single writer of vote rows and vote counters.
//!
//! Casting is a read-modify-write on the caller's current vote row. The
//! cycle runs under the deal's lock and commits the row change and the
//! counter delta in one transaction, so concurrent casts on the same deal
//! can neither lose counter updates nor double-count a racing user.

pub mod locks;

pub use locks::DealLocks;

use crate::db::Repository;
use crate::domain::{DealId, Role, TimeMs, VoteDirection, VoteState};
use crate::error::EngineError;
use crate::identity::IdentityGate;
use std::sync::Arc;
use tracing::debug;

pub struct VoteLedger {
    repo: Arc<Repository>,
    gate: IdentityGate,
    locks: DealLocks,
}

impl VoteLedger {
    pub fn new(repo: Arc<Repository>, gate: IdentityGate) -> Self {
        Self {
            repo,
            gate,
            locks: DealLocks::new(),
        }
    }

    /// Cast a vote and return the caller's effective vote afterwards.
    ///
    /// Re-casting the current direction withdraws the vote (toggle-off);
    /// casting the opposite direction replaces it.
    ///
    /// # Errors
    /// `Unauthenticated`/`Forbidden` from the role gate, `NotFound` for an
    /// unknown deal, `InvalidState` when the deal is not publicly votable.
    pub async fn cast_vote(
        &self,
        token: Option<&str>,
        deal_id: &DealId,
        direction: VoteDirection,
    ) -> Result<VoteState, EngineError> {
        let identity = self.gate.require(token, Role::Member).await?;

        let lock = self.locks.lock_for(deal_id);
        let _guard = lock.lock().await;

        let now = TimeMs::now();
        self.ensure_votable(deal_id, now).await?;

        let previous = self
            .repo
            .get_vote(deal_id, &identity.user_id)
            .await?
            .map(|v| v.direction);
        let next = match previous {
            Some(current) if current == direction => None,
            _ => Some(direction),
        };

        self.repo
            .apply_vote(deal_id, &identity.user_id, previous, next, now)
            .await?;

        debug!(
            deal_id = %deal_id,
            user_id = %identity.user_id,
            previous = ?previous,
            next = ?next,
            "Vote applied"
        );
        Ok(VoteState::from(next))
    }

    /// Withdraw the caller's vote. Idempotent: no-op when no vote exists.
    pub async fn remove_vote(
        &self,
        token: Option<&str>,
        deal_id: &DealId,
    ) -> Result<VoteState, EngineError> {
        let identity = self.gate.require(token, Role::Member).await?;

        let lock = self.locks.lock_for(deal_id);
        let _guard = lock.lock().await;

        if self.repo.get_deal(deal_id).await?.is_none() {
            return Err(EngineError::NotFound(format!("deal {}", deal_id)));
        }

        let previous = self
            .repo
            .get_vote(deal_id, &identity.user_id)
            .await?
            .map(|v| v.direction);
        if previous.is_none() {
            return Ok(VoteState::NoVote);
        }

        self.repo
            .apply_vote(deal_id, &identity.user_id, previous, None, TimeMs::now())
            .await?;
        Ok(VoteState::NoVote)
    }

    async fn ensure_votable(&self, deal_id: &DealId, now: TimeMs) -> Result<(), EngineError> {
        let deal = self
            .repo
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)))?;

        if !deal.is_publicly_visible(now) {
            return Err(EngineError::InvalidState(format!(
                "deal {} is not open for voting (status {})",
                deal_id, deal.status
            )));
        }
        Ok(())
    }
}
