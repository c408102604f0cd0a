use std::sync::Arc;

use axum::{extract::State, middleware, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::HealthResponse,
    services::{MetadataProvider, RecommendationService},
};

pub mod recommendations;
pub mod titles;

/// Shared state handed to every handler
///
/// Everything here is read-only after startup.
pub struct AppState {
    pub recommender: Arc<RecommendationService>,
    pub metadata: Option<Arc<dyn MetadataProvider>>,
}

impl AppState {
    pub fn new(recommender: RecommendationService) -> Self {
        Self {
            recommender: Arc::new(recommender),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/titles", get(titles::list))
        .route("/titles/resolve", get(titles::resolve))
}

/// Health check endpoint, reporting the loaded artifact bundle
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        artifacts: state.recommender.bundle_info(),
    })
}
