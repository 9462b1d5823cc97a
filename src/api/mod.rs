pub mod deals;
pub mod engagement;
pub mod health;
pub mod moderation;
pub mod votes;

use crate::engagement::EngagementService;
use crate::identity::IdentityGate;
use crate::ledger::VoteLedger;
use crate::moderation::ModerationService;
use crate::ranking::RankingService;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<VoteLedger>,
    pub moderation: Arc<ModerationService>,
    pub engagement: Arc<EngagementService>,
    pub ranking: Arc<RankingService>,
    pub gate: IdentityGate,
}

impl AppState {
    pub fn new(
        ledger: Arc<VoteLedger>,
        moderation: Arc<ModerationService>,
        engagement: Arc<EngagementService>,
        ranking: Arc<RankingService>,
        gate: IdentityGate,
    ) -> Self {
        Self {
            ledger,
            moderation,
            engagement,
            ranking,
            gate,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/deals",
            get(deals::list_deals).post(deals::create_deal),
        )
        .route("/v1/deals/:id", get(deals::get_deal))
        .route("/v1/deals/:id/submit", post(moderation::submit))
        .route("/v1/deals/:id/approve", post(moderation::approve))
        .route("/v1/deals/:id/reject", post(moderation::reject))
        .route("/v1/deals/:id/expire", post(moderation::expire))
        .route("/v1/deals/:id/remove", post(moderation::remove))
        .route("/v1/deals/:id/reopen", post(moderation::reopen))
        .route(
            "/v1/deals/:id/vote",
            post(votes::cast_vote).delete(votes::remove_vote),
        )
        .route("/v1/deals/:id/views", post(engagement::record_view))
        .route(
            "/v1/deals/:id/comments",
            post(engagement::record_comment).delete(engagement::remove_comment),
        )
        .layer(cors)
        .with_state(state)
}

/// Extract the bearer token from the Authorization header, if present.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
