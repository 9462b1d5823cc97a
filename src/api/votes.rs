use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{bearer_token, AppState};
use crate::domain::{DealId, VoteDirection, VoteState};
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

/// The caller's effective vote plus the counters after the operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub vote_state: VoteState,
    pub upvotes: i64,
    pub downvotes: i64,
}

pub async fn cast_vote(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, EngineError> {
    let deal_id = DealId::new(id);
    let token = bearer_token(&headers);

    let vote_state = state
        .ledger
        .cast_vote(token, &deal_id, request.direction)
        .await?;
    let snapshot = state.engagement.snapshot(&deal_id).await?;

    Ok(Json(VoteResponse {
        vote_state,
        upvotes: snapshot.upvotes,
        downvotes: snapshot.downvotes,
    }))
}

pub async fn remove_vote(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<VoteResponse>, EngineError> {
    let deal_id = DealId::new(id);
    let token = bearer_token(&headers);

    let vote_state = state.ledger.remove_vote(token, &deal_id).await?;
    let snapshot = state.engagement.snapshot(&deal_id).await?;

    Ok(Json(VoteResponse {
        vote_state,
        upvotes: snapshot.upvotes,
        downvotes: snapshot.downvotes,
    }))
}
