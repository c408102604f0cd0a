use std::sync::Arc;
use std::time::Instant;

use crate::engine::{
    ArtifactBundle, BundleInfo, RankedResult, Resolution, SimilarityRanker, TitleRecord,
    TitleResolver,
};

/// Default number of recommendations when the caller does not ask for a count
pub const DEFAULT_TOP_N: i64 = 10;

/// Result of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Query resolved; neighbours ordered best first
    Ranked {
        query: TitleRecord,
        results: Vec<RankedResult>,
    },
    /// Query did not match any title
    NotFound,
}

/// Content-based recommendations over a loaded artifact bundle
///
/// Resolves the query title, then ranks every other title by cosine similarity
/// of their feature vectors. Holds no mutable state, so a single instance is
/// shared across all request handlers.
#[derive(Clone)]
pub struct RecommendationService {
    bundle: Arc<ArtifactBundle>,
    resolver: TitleResolver,
    ranker: SimilarityRanker,
    default_top_n: i64,
}

impl RecommendationService {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self::with_default_top_n(bundle, DEFAULT_TOP_N)
    }

    pub fn with_default_top_n(bundle: Arc<ArtifactBundle>, default_top_n: i64) -> Self {
        Self {
            resolver: TitleResolver::new(bundle.clone()),
            ranker: SimilarityRanker::new(bundle.clone()),
            bundle,
            default_top_n,
        }
    }

    /// Recommends titles similar to `query_title`
    ///
    /// `top_n` falls back to the service default and is clamped into the valid
    /// range rather than rejected.
    pub fn recommend(&self, query_title: &str, top_n: Option<i64>) -> Recommendation {
        let start = Instant::now();
        let top_n = top_n.unwrap_or(self.default_top_n);

        let row = match self.resolver.resolve(query_title) {
            Resolution::Found(row) => row,
            Resolution::NotFound => {
                tracing::info!(query = %query_title, "Title not found");
                return Recommendation::NotFound;
            }
        };

        let Some(query) = self.bundle.title(row).cloned() else {
            return Recommendation::NotFound;
        };
        let results = self.ranker.rank(row, top_n);

        tracing::info!(
            query = %query_title,
            matched = %query.title,
            top_n,
            results = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations computed"
        );

        Recommendation::Ranked { query, results }
    }

    /// Looks up the corpus entry a free-form title resolves to
    pub fn resolve_title(&self, query: &str) -> Option<&TitleRecord> {
        self.resolver
            .resolve(query)
            .row()
            .and_then(|row| self.bundle.title(row))
    }

    /// A page of the corpus in row order
    pub fn titles(&self, offset: usize, limit: usize) -> &[TitleRecord] {
        let corpus = self.bundle.corpus();
        let start = offset.min(corpus.len());
        let end = start.saturating_add(limit).min(corpus.len());
        &corpus[start..end]
    }

    pub fn total_titles(&self) -> usize {
        self.bundle.len()
    }

    pub fn bundle_info(&self) -> BundleInfo {
        self.bundle.info()
    }
}
