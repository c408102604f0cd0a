use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use marquee::{
    config::Config,
    db::{create_redis_client, Cache},
    engine::ArtifactBundle,
    routes::{create_router, AppState},
    services::{RecommendationService, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // A bundle that fails validation must never serve traffic.
    let bundle = ArtifactBundle::load(&config.artifact_dir)
        .with_context(|| format!("Failed to load artifact bundle from {}", config.artifact_dir))?;
    let recommender =
        RecommendationService::with_default_top_n(Arc::new(bundle), config.default_top_n);

    let mut state = AppState::new(recommender);
    let mut cache_handle = None;

    if let Some(api_key) = config.tmdb_api_key.clone() {
        let cache = match &config.redis_url {
            Some(url) => {
                let (cache, handle) = Cache::new(create_redis_client(url)?);
                cache_handle = Some(handle);
                Some(cache)
            }
            None => None,
        };
        tracing::info!(cached = cache.is_some(), "TMDB metadata enrichment enabled");
        state = state.with_metadata(Arc::new(TmdbProvider::new(
            api_key,
            config.tmdb_api_url.clone(),
            config.tmdb_image_base_url.clone(),
            cache,
        )));
    } else {
        tracing::info!("TMDB_API_KEY not set, metadata enrichment disabled");
    }

    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
