use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use tracing::warn;

use crate::api::{bearer_token, AppState};
use crate::domain::DealId;
use crate::engagement::ViewerKey;
use crate::error::EngineError;

/// Fingerprint material for anonymous viewers, supplied by the web layer.
const FINGERPRINT_HEADER: &str = "x-fingerprint";

/// Record a view. Always accepted: view recording is advisory, so failures
/// are logged and swallowed rather than surfaced to the client.
pub async fn record_view(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> StatusCode {
    let deal_id = DealId::new(id);

    let viewer = match viewer_key(&headers, &state).await {
        Some(viewer) => viewer,
        None => {
            warn!(deal_id = %deal_id, "View without token or fingerprint dropped");
            return StatusCode::ACCEPTED;
        }
    };

    if let Err(e) = state.engagement.record_view(&deal_id, &viewer).await {
        warn!(deal_id = %deal_id, error = %e, "View recording failed");
    }
    StatusCode::ACCEPTED
}

pub async fn record_comment(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, EngineError> {
    state.engagement.record_comment(&DealId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_comment(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, EngineError> {
    state.engagement.remove_comment(&DealId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Members dedup on their identity; anonymous viewers on their fingerprint
/// hash. A failed token resolution falls back to the fingerprint rather than
/// rejecting the view.
async fn viewer_key(headers: &HeaderMap, state: &AppState) -> Option<ViewerKey> {
    if let Some(token) = bearer_token(headers) {
        if let Ok(identity) = state.gate.resolve(Some(token)).await {
            return Some(ViewerKey::Member(identity.user_id));
        }
    }

    headers
        .get(FINGERPRINT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|fp| !fp.is_empty())
        .map(ViewerKey::from_fingerprint)
}
