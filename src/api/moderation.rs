use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::api::{bearer_token, AppState};
use crate::domain::{Deal, DealId};
use crate::error::EngineError;
use crate::moderation::ModerationAction;

async fn apply(
    state: AppState,
    headers: HeaderMap,
    id: String,
    action: ModerationAction,
) -> Result<Json<Deal>, EngineError> {
    let deal = state
        .moderation
        .apply(bearer_token(&headers), &DealId::new(id), action)
        .await?;
    Ok(Json(deal))
}

pub async fn submit(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Submit).await
}

pub async fn approve(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Approve).await
}

pub async fn reject(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Reject).await
}

pub async fn expire(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Expire).await
}

pub async fn remove(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Remove).await
}

pub async fn reopen(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Deal>, EngineError> {
    apply(state, headers, id, ModerationAction::Reopen).await
}
