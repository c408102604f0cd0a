use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{TitlePage, TitleSummary},
    routes::AppState,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

/// Resolves a free-form title to the corpus entry it matches
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> AppResult<Json<TitleSummary>> {
    state
        .recommender
        .resolve_title(&params.q)
        .map(|record| Json(TitleSummary::from(record)))
        .ok_or_else(|| AppError::NotFound(format!("No title matches '{}'", params.q)))
}

/// Lists corpus titles in artifact order
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Json<TitlePage> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let titles = state
        .recommender
        .titles(params.offset, limit)
        .iter()
        .map(TitleSummary::from)
        .collect();

    Json(TitlePage {
        total: state.recommender.total_titles(),
        offset: params.offset,
        titles,
    })
}
