use std::sync::Arc;

use crate::{
    engine::RankedResult,
    error::AppError,
    models::{RecommendedTitle, TitleLookup},
    services::providers::MetadataProvider,
};

/// Attaches provider metadata to ranked results
///
/// Lookups run concurrently, one task per title, and are keyed by title and
/// external id only. A failed or empty lookup leaves that result without
/// metadata; ordering and scores are never changed.
pub async fn enrich_results(
    provider: Arc<dyn MetadataProvider>,
    results: Vec<RankedResult>,
) -> Vec<RecommendedTitle> {
    let mut tasks = Vec::with_capacity(results.len());

    for result in &results {
        let provider = provider.clone();
        let lookup = TitleLookup::from(result);
        tasks.push(tokio::spawn(async move {
            provider.fetch_metadata(&lookup).await
        }));
    }

    let mut enriched = Vec::with_capacity(results.len());
    let mut failures = 0;

    for (result, task) in results.into_iter().zip(tasks) {
        let title = result.title.clone();
        let mut recommended = RecommendedTitle::from(result);

        match task.await.map_err(|e| AppError::Internal(e.to_string())) {
            Ok(Ok(metadata)) => recommended.metadata = metadata,
            Ok(Err(e)) | Err(e) => {
                failures += 1;
                tracing::warn!(
                    error = %e,
                    title = %title,
                    provider = provider.name(),
                    "Metadata lookup failed"
                );
            }
        }

        enriched.push(recommended);
    }

    if failures > 0 {
        tracing::warn!(
            success_count = enriched.len() - failures,
            error_count = failures,
            "Partial metadata enrichment failure"
        );
    }

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TitleMetadata;
    use crate::services::providers::MockMetadataProvider;
    use chrono::Utc;

    fn ranked(row: usize, title: &str, score: f32, rank: usize) -> RankedResult {
        RankedResult {
            row_index: row,
            title: title.to_string(),
            external_id: None,
            score,
            rank,
        }
    }

    fn metadata(overview: &str) -> TitleMetadata {
        TitleMetadata {
            poster_url: None,
            overview: Some(overview.to_string()),
            release_date: None,
            vote_average: None,
            vote_count: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_enrich_attaches_metadata_in_order() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_fetch_metadata()
            .returning(|lookup| Ok(Some(metadata(&format!("About {}", lookup.title)))));
        provider.expect_name().return_const("mock");

        let results = vec![ranked(4, "Ronin", 0.9, 1), ranked(2, "Thief", 0.4, 2)];
        let enriched = enrich_results(Arc::new(provider), results).await;

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].title, "Ronin");
        assert_eq!(enriched[0].rank, 1);
        assert_eq!(
            enriched[0].metadata.as_ref().unwrap().overview.as_deref(),
            Some("About Ronin")
        );
        assert_eq!(enriched[1].title, "Thief");
    }

    #[tokio::test]
    async fn test_enrich_failure_keeps_result() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch_metadata().returning(|lookup| {
            if lookup.title == "Thief" {
                Err(AppError::ExternalApi("boom".to_string()))
            } else {
                Ok(None)
            }
        });
        provider.expect_name().return_const("mock");

        let results = vec![ranked(4, "Ronin", 0.9, 1), ranked(2, "Thief", 0.4, 2)];
        let enriched = enrich_results(Arc::new(provider), results).await;

        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|r| r.metadata.is_none()));
        assert_eq!(enriched[1].score, 0.4);
    }

    #[tokio::test]
    async fn test_enrich_empty() {
        let provider = MockMetadataProvider::new();
        assert!(enrich_results(Arc::new(provider), Vec::new()).await.is_empty());
    }
}
