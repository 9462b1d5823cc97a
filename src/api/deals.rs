use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::{bearer_token, AppState};
use crate::domain::{Deal, DealId, NewDeal};
use crate::error::EngineError;
use crate::ranking::{DealDetail, DealSummary, SortOrder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub sort: Option<String>,
    pub category: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub async fn list_deals(
    Query(params): Query<ListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DealSummary>>, EngineError> {
    let sort = match params.sort.as_deref() {
        None => SortOrder::Hot,
        Some(s) => SortOrder::from_str(s)
            .map_err(|_| EngineError::BadRequest("sort must be hot or newest".to_string()))?,
    };

    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(25);

    let deals = state
        .ranking
        .list_deals(sort, category, page, page_size)
        .await?;
    Ok(Json(deals))
}

pub async fn get_deal(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<DealDetail>, EngineError> {
    let detail = state
        .ranking
        .get_deal(bearer_token(&headers), &DealId::new(id))
        .await?;
    Ok(Json(detail))
}

pub async fn create_deal(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(new_deal): Json<NewDeal>,
) -> Result<(StatusCode, Json<Deal>), EngineError> {
    let deal = state
        .moderation
        .create_deal(bearer_token(&headers), new_deal)
        .await?;
    Ok((StatusCode::CREATED, Json(deal)))
}
