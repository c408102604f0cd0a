use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RecommendationResponse, RecommendedTitle, TitleSummary},
    routes::AppState,
    services::{enrich_results, Recommendation},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub top_n: Option<i64>,
    /// Attach provider metadata when a provider is configured
    #[serde(default = "default_enrich")]
    pub enrich: bool,
}

fn default_enrich() -> bool {
    true
}

/// Handler for the recommendations endpoint
///
/// 200 with ranked titles, or 404 with `status: not_found` when the title does
/// not resolve.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<(StatusCode, Json<RecommendationResponse>)> {
    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        top_n = ?params.top_n,
        "Processing recommendation request"
    );

    // Similarity ranking is CPU-bound; keep it off the async workers.
    let recommender = state.recommender.clone();
    let title = params.title.clone();
    let top_n = params.top_n;
    let recommendation = tokio::task::spawn_blocking(move || recommender.recommend(&title, top_n))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let (query, results) = match recommendation {
        Recommendation::Ranked { query, results } => (query, results),
        Recommendation::NotFound => {
            return Ok((
                StatusCode::NOT_FOUND,
                Json(RecommendationResponse::NotFound {
                    query: params.title,
                }),
            ));
        }
    };

    let results: Vec<RecommendedTitle> = match (&state.metadata, params.enrich) {
        (Some(provider), true) => enrich_results(provider.clone(), results).await,
        _ => results.into_iter().map(RecommendedTitle::from).collect(),
    };

    tracing::info!(
        request_id = %request_id,
        matched = %query.title,
        results = results.len(),
        "Recommendation request completed"
    );

    Ok((
        StatusCode::OK,
        Json(RecommendationResponse::Ok {
            query: TitleSummary::from(&query),
            results,
        }),
    ))
}
