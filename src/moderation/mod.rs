//! Moderation workflow: the state machine that owns deal status.
//!
//! Every transition is checked against the adjacency table and the role
//! hierarchy here, never trusted from the caller, and applied through a
//! compare-and-swap on the stored status so racing moderators resolve to
//! exactly one winner.

use crate::db::Repository;
use crate::domain::{Deal, DealId, DealStatus, NewDeal, Role, TimeMs};
use crate::error::EngineError;
use crate::identity::{Identity, IdentityGate};
use std::sync::Arc;
use tracing::{info, warn};

/// A caller-triggered transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Submit,
    Approve,
    Reject,
    Expire,
    Remove,
    Reopen,
}

impl ModerationAction {
    /// Verb used in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Submit => "submit",
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Expire => "expire",
            ModerationAction::Remove => "remove",
            ModerationAction::Reopen => "reopen",
        }
    }
}

/// The transition table: target state and minimum role for an action taken
/// from `from`. Returns None when the action is not adjacent to `from`.
fn transition_for(action: ModerationAction, from: DealStatus) -> Option<(DealStatus, Role)> {
    use DealStatus::*;
    match (action, from) {
        (ModerationAction::Submit, Draft) => Some((PendingReview, Role::Member)),
        (ModerationAction::Approve, PendingReview) => Some((Published, Role::Moderator)),
        (ModerationAction::Reject, PendingReview) => Some((Rejected, Role::Moderator)),
        (ModerationAction::Expire, Published) => Some((Expired, Role::Moderator)),
        (ModerationAction::Remove, Published) => Some((Removed, Role::Admin)),
        (ModerationAction::Reopen, Rejected | Expired | Removed) => {
            Some((PendingReview, Role::Admin))
        }
        _ => None,
    }
}

pub struct ModerationService {
    repo: Arc<Repository>,
    gate: IdentityGate,
}

impl ModerationService {
    pub fn new(repo: Arc<Repository>, gate: IdentityGate) -> Self {
        Self { repo, gate }
    }

    /// Create a draft deal owned by the caller.
    pub async fn create_deal(
        &self,
        token: Option<&str>,
        new_deal: NewDeal,
    ) -> Result<Deal, EngineError> {
        let identity = self.gate.require(token, Role::Member).await?;

        if new_deal.title.trim().is_empty() {
            return Err(EngineError::BadRequest("title must not be empty".to_string()));
        }
        if new_deal.price.is_negative() {
            return Err(EngineError::BadRequest("price must not be negative".to_string()));
        }

        let deal = Deal {
            id: DealId::generate(),
            title: new_deal.title,
            description: new_deal.description,
            price: new_deal.price,
            original_price: new_deal.original_price,
            category: new_deal.category,
            shop: new_deal.shop,
            submitter: identity.user_id,
            status: DealStatus::Draft,
            created_at: TimeMs::now(),
            published_at: None,
            expires_at: new_deal.expires_at,
        };
        self.repo.insert_deal(&deal).await?;

        info!(deal_id = %deal.id, submitter = %deal.submitter, "Draft deal created");
        Ok(deal)
    }

    /// Apply a moderation action for the caller.
    ///
    /// On a lost CAS the latest state is re-read and the transition retried
    /// once; a transition that is no longer admitted after the re-read fails
    /// `InvalidTransition`, a second lost race surfaces `Conflict`.
    pub async fn apply(
        &self,
        token: Option<&str>,
        deal_id: &DealId,
        action: ModerationAction,
    ) -> Result<Deal, EngineError> {
        let identity = self.gate.resolve(token).await?;

        for attempt in 0..2 {
            let deal = self
                .repo
                .get_deal(deal_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)))?;

            let (to, min_role) = transition_for(action, deal.status).ok_or(
                EngineError::InvalidTransition {
                    from: deal.status,
                    action: action.as_str(),
                },
            )?;

            self.authorize(&identity, &deal, action, min_role)?;

            let won = self
                .repo
                .transition_status(deal_id, deal.status, to, TimeMs::now())
                .await?;
            if won {
                info!(
                    deal_id = %deal_id,
                    from = %deal.status,
                    to = %to,
                    action = action.as_str(),
                    actor = %identity.user_id,
                    "Moderation transition applied"
                );
                return self
                    .repo
                    .get_deal(deal_id)
                    .await?
                    .ok_or_else(|| EngineError::NotFound(format!("deal {}", deal_id)));
            }

            warn!(
                deal_id = %deal_id,
                action = action.as_str(),
                attempt,
                "Moderation transition lost a race, re-reading"
            );
        }

        Err(EngineError::Conflict(format!(
            "deal {} was concurrently modified",
            deal_id
        )))
    }

    /// Move every published deal whose expiry has passed to `expired`.
    ///
    /// System trigger; no role gate. Returns the number of deals swept.
    pub async fn sweep_expired(&self, now: TimeMs) -> Result<u64, EngineError> {
        let swept = self.repo.expire_due(now).await?;
        if swept > 0 {
            info!(swept, "Expired published deals past their expiry");
        }
        Ok(swept)
    }

    fn authorize(
        &self,
        identity: &Identity,
        deal: &Deal,
        action: ModerationAction,
        min_role: Role,
    ) -> Result<(), EngineError> {
        if !identity.role.allows(min_role) {
            return Err(EngineError::Forbidden(format!(
                "{} requires role {} or higher",
                action.as_str(),
                min_role
            )));
        }
        // Submission is personal: only the owner sends their draft to review.
        if action == ModerationAction::Submit && identity.user_id != deal.submitter {
            return Err(EngineError::Forbidden(
                "only the submitter may submit their draft".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::Decimal;
    use crate::identity::MockIdentityProvider;
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn setup() -> (ModerationService, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));

        let provider = MockIdentityProvider::new()
            .with_identity("tok-alice", "alice", Role::Member)
            .with_identity("tok-bob", "bob", Role::Member)
            .with_identity("tok-mod", "mel", Role::Moderator)
            .with_identity("tok-admin", "ada", Role::Admin)
            .with_identity("tok-root", "root", Role::RootAdmin);
        let gate = IdentityGate::new(Arc::new(provider));

        (ModerationService::new(repo.clone(), gate), repo, temp_dir)
    }

    fn new_deal() -> NewDeal {
        NewDeal {
            title: "50% off widgets".to_string(),
            description: "solid deal".to_string(),
            price: Decimal::from_str("9.99").unwrap(),
            original_price: Some(Decimal::from_str("19.99").unwrap()),
            category: "gadgets".to_string(),
            shop: "acme".to_string(),
            expires_at: None,
        }
    }

    #[test]
    fn test_transition_table_adjacency() {
        use DealStatus::*;
        use ModerationAction::*;

        assert_eq!(transition_for(Submit, Draft), Some((PendingReview, Role::Member)));
        assert_eq!(
            transition_for(Approve, PendingReview),
            Some((Published, Role::Moderator))
        );
        assert_eq!(
            transition_for(Reject, PendingReview),
            Some((Rejected, Role::Moderator))
        );
        assert_eq!(transition_for(Expire, Published), Some((Expired, Role::Moderator)));
        assert_eq!(transition_for(Remove, Published), Some((Removed, Role::Admin)));
        for closed in [Rejected, Expired, Removed] {
            assert_eq!(
                transition_for(Reopen, closed),
                Some((PendingReview, Role::Admin))
            );
        }

        // Non-adjacent pairs are rejected outright.
        assert_eq!(transition_for(Approve, Draft), None);
        assert_eq!(transition_for(Reject, Published), None);
        assert_eq!(transition_for(Submit, Published), None);
        assert_eq!(transition_for(Remove, PendingReview), None);
        assert_eq!(transition_for(Reopen, Published), None);
    }

    #[tokio::test]
    async fn test_full_lifecycle_happy_path() {
        let (service, _repo, _temp) = setup().await;

        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();
        assert_eq!(deal.status, DealStatus::Draft);
        assert!(deal.published_at.is_none());

        let deal = service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap();
        assert_eq!(deal.status, DealStatus::PendingReview);

        let deal = service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Approve)
            .await
            .unwrap();
        assert_eq!(deal.status, DealStatus::Published);
        assert!(deal.published_at.is_some());

        let deal = service
            .apply(Some("tok-admin"), &deal.id, ModerationAction::Remove)
            .await
            .unwrap();
        assert_eq!(deal.status, DealStatus::Removed);
        assert!(deal.published_at.is_some(), "audit trail survives removal");
    }

    #[tokio::test]
    async fn test_draft_cannot_jump_to_published() {
        let (service, _repo, _temp) = setup().await;
        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();

        let err = service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: DealStatus::Draft,
                ..
            }
        ));

        // No partial effects.
        let unchanged = service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap();
        assert_eq!(unchanged.status, DealStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_reject_on_published_is_invalid_transition() {
        let (service, _repo, _temp) = setup().await;
        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();
        service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap();
        service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Approve)
            .await
            .unwrap();

        let err = service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Reject)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: DealStatus::Published,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_role_gates_enforced_inside_the_workflow() {
        let (service, _repo, _temp) = setup().await;
        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();
        service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap();

        // A member cannot approve their own (or anyone's) deal.
        let err = service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Approve)
            .await
            .unwrap();

        // A moderator cannot take a published deal down; an admin can.
        let err = service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Remove)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
        service
            .apply(Some("tok-admin"), &deal.id, ModerationAction::Remove)
            .await
            .unwrap();

        // Reopen is admin-only; root_admin inherits it.
        let err = service
            .apply(Some("tok-mod"), &deal.id, ModerationAction::Reopen)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
        let deal = service
            .apply(Some("tok-root"), &deal.id, ModerationAction::Reopen)
            .await
            .unwrap();
        assert_eq!(deal.status, DealStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_only_the_submitter_submits() {
        let (service, _repo, _temp) = setup().await;
        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();

        let err = service
            .apply(Some("tok-bob"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_unauthenticated() {
        let (service, _repo, _temp) = setup().await;
        let err = service.create_deal(None, new_deal()).await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_have_one_winner() {
        let (service, _repo, _temp) = setup().await;
        let service = Arc::new(service);
        let deal = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();
        service
            .apply(Some("tok-alice"), &deal.id, ModerationAction::Submit)
            .await
            .unwrap();

        let a = {
            let service = service.clone();
            let id = deal.id.clone();
            tokio::spawn(
                async move { service.apply(Some("tok-mod"), &id, ModerationAction::Approve).await },
            )
        };
        let b = {
            let service = service.clone();
            let id = deal.id.clone();
            tokio::spawn(
                async move { service.apply(Some("tok-mod"), &id, ModerationAction::Approve).await },
            )
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one approval must win");
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            EngineError::InvalidTransition { .. } | EngineError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn test_sweep_expires_due_deals() {
        let (service, repo, _temp) = setup().await;
        let mut created = service.create_deal(Some("tok-alice"), new_deal()).await.unwrap();
        service
            .apply(Some("tok-alice"), &created.id, ModerationAction::Submit)
            .await
            .unwrap();
        created = service
            .apply(Some("tok-mod"), &created.id, ModerationAction::Approve)
            .await
            .unwrap();

        // Backdate the expiry below now, then sweep.
        sqlx::query("UPDATE deals SET expires_at = ? WHERE id = ?")
            .bind(1i64)
            .bind(created.id.as_str())
            .execute(repo.pool())
            .await
            .unwrap();

        let swept = service.sweep_expired(TimeMs::now()).await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(
            repo.get_deal(&created.id).await.unwrap().unwrap().status,
            DealStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_create_deal_validates_input() {
        let (service, _repo, _temp) = setup().await;

        let mut bad_title = new_deal();
        bad_title.title = "   ".to_string();
        let err = service.create_deal(Some("tok-alice"), bad_title).await.unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));

        let mut bad_price = new_deal();
        bad_price.price = Decimal::from_str("-1").unwrap();
        let err = service.create_deal(Some("tok-alice"), bad_price).await.unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
    }
}
