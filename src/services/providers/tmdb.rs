/// TMDB (The Movie Database) metadata provider
///
/// Lookup order:
/// 1. External id present: `/movie/{id}` returns the exact movie.
/// 2. Otherwise: `/search/movie?query={title}` and the first hit wins.
///
/// Both paths go through the optional Redis cache.
use crate::{
    cached,
    db::{Cache, CacheKey},
    engine::normalize_title,
    error::{AppError, AppResult},
    models::{TitleLookup, TitleMetadata, TmdbMovie, TmdbSearchResponse},
    services::providers::MetadataProvider,
};
use reqwest::{Client as HttpClient, StatusCode};

const METADATA_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url,
            cache,
        }
    }

    /// Cache to use for a title search. Titles that normalize to nothing
    /// would all share one key, so they bypass the cache.
    fn title_cache(&self, title: &str) -> Option<&Cache> {
        self.cache
            .as_ref()
            .filter(|_| !normalize_title(title).is_empty())
    }

    /// GET `/movie/{id}`; a 404 means TMDB does not know the id
    async fn movie_by_id(&self, id: &str) -> AppResult<Option<TitleMetadata>> {
        let url = format!("{}/movie/{}", self.api_url, id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let movie: TmdbMovie = response.json().await?;
        Ok(Some(movie.into_metadata(&self.image_base_url)))
    }

    /// GET `/search/movie`, keeping the top hit
    async fn search_by_title(&self, title: &str) -> AppResult<Option<TitleMetadata>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", title),
                ("include_adult", "false"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        tracing::debug!(
            title = %title,
            hits = search.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(search
            .results
            .into_iter()
            .next()
            .map(|movie| movie.into_metadata(&self.image_base_url)))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_metadata(&self, lookup: &TitleLookup) -> AppResult<Option<TitleMetadata>> {
        match lookup.external_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => {
                cached!(
                    self.cache.as_ref(),
                    CacheKey::MetadataById(id.to_string()),
                    METADATA_CACHE_TTL,
                    self.movie_by_id(id)
                )
            }
            None => {
                if lookup.title.trim().is_empty() {
                    return Err(AppError::InvalidInput(
                        "Metadata lookup needs a title".to_string(),
                    ));
                }
                cached!(
                    self.title_cache(&lookup.title),
                    CacheKey::MetadataByTitle(lookup.title.clone()),
                    METADATA_CACHE_TTL,
                    self.search_by_title(&lookup.title)
                )
            }
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
