/// Metadata enrichment providers
///
/// The recommendation engine only knows titles and feature vectors. Posters,
/// overviews and ratings come from an external catalogue, looked up by display
/// title or by the stable external id carried in the artifact bundle.
use crate::{
    error::AppResult,
    models::{TitleLookup, TitleMetadata},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Source of descriptive metadata for recommended titles
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetches metadata for one title
    ///
    /// Returns `Ok(None)` when the catalogue has no match; errors are reserved
    /// for transport or upstream failures.
    async fn fetch_metadata(&self, lookup: &TitleLookup) -> AppResult<Option<TitleMetadata>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
