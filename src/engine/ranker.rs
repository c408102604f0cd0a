use std::cmp::Ordering;
use std::sync::Arc;

use super::ArtifactBundle;

/// One neighbour of the query title
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    /// Corpus row. Only meaningful for the bundle that produced it.
    pub row_index: usize,
    pub title: String,
    pub external_id: Option<String>,
    /// Cosine similarity in `[0, 1]`
    pub score: f32,
    /// 1-based position in the result list
    pub rank: usize,
}

/// Nearest-neighbour ranking by cosine similarity over the feature matrix
#[derive(Clone)]
pub struct SimilarityRanker {
    bundle: Arc<ArtifactBundle>,
}

impl SimilarityRanker {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    /// Clamps a requested result count into `[1, M - 1]`.
    ///
    /// Returns 0 when the corpus has no rows besides the query.
    pub fn clamp_top_n(&self, top_n: i64) -> usize {
        let max = self.bundle.len().saturating_sub(1);
        if max == 0 {
            return 0;
        }
        let clamped = top_n.clamp(1, max as i64) as usize;
        if clamped as i64 != top_n {
            tracing::debug!(requested = top_n, clamped, "top_n clamped to valid range");
        }
        clamped
    }

    /// Ranks every other row against `row_index`.
    ///
    /// Scores descend; equal scores keep ascending row order. The query row is
    /// never part of the result.
    pub fn rank(&self, row_index: usize, top_n: i64) -> Vec<RankedResult> {
        if row_index >= self.bundle.len() {
            return Vec::new();
        }
        let top_n = self.clamp_top_n(top_n);
        if top_n == 0 {
            return Vec::new();
        }

        let scores = self.bundle.matrix().cosine_similarities(row_index);
        let mut candidates: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(row, _)| *row != row_index)
            .collect();

        if candidates.len() > top_n {
            candidates.select_nth_unstable_by(top_n - 1, by_score_then_row);
            candidates.truncate(top_n);
        }
        candidates.sort_unstable_by(by_score_then_row);

        candidates
            .into_iter()
            .enumerate()
            .filter_map(|(position, (row, score))| {
                self.bundle.title(row).map(|record| RankedResult {
                    row_index: row,
                    title: record.title.clone(),
                    external_id: record.external_id.clone(),
                    score,
                    rank: position + 1,
                })
            })
            .collect()
    }
}

fn by_score_then_row(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TitleRecord, VocabularyMeta};
    use proptest::prelude::*;

    fn ranker(rows: &[Vec<(usize, f32)>], cols: usize) -> SimilarityRanker {
        let corpus = (0..rows.len())
            .map(|row| TitleRecord::new(row, format!("Title {}", row)))
            .collect();
        let bundle = ArtifactBundle::build(corpus, rows, VocabularyMeta::new("test", cols)).unwrap();
        SimilarityRanker::new(Arc::new(bundle))
    }

    #[test]
    fn test_excludes_query_row() {
        let ranker = ranker(&[vec![(0, 1.0)], vec![(0, 1.0)], vec![(1, 1.0)]], 2);
        let results = ranker.rank(0, 10);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.row_index != 0));
        assert_eq!(results[0].row_index, 1);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
    }

    #[test]
    fn test_ties_break_by_ascending_row() {
        let ranker = ranker(
            &[
                vec![(0, 1.0)],
                vec![(1, 1.0)],
                vec![(0, 1.0)],
                vec![(1, 1.0)],
                vec![(0, 1.0)],
            ],
            2,
        );
        let rows: Vec<usize> = ranker.rank(0, 4).iter().map(|r| r.row_index).collect();
        assert_eq!(rows, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_top_n_clamping() {
        let ranker = ranker(&[vec![(0, 1.0)], vec![(0, 0.5)], vec![(1, 1.0)]], 2);
        assert_eq!(ranker.rank(0, 0).len(), 1);
        assert_eq!(ranker.rank(0, -5).len(), 1);
        assert_eq!(ranker.rank(0, 100).len(), 2);
        assert_eq!(ranker.clamp_top_n(i64::MAX), 2);
    }

    #[test]
    fn test_single_title_corpus_has_no_neighbours() {
        let ranker = ranker(&[vec![(0, 1.0)]], 1);
        assert!(ranker.rank(0, 5).is_empty());
    }

    #[test]
    fn test_out_of_range_row_is_empty() {
        let ranker = ranker(&[vec![(0, 1.0)], vec![(0, 1.0)]], 1);
        assert!(ranker.rank(9, 5).is_empty());
    }

    #[test]
    fn test_zero_vector_rows_score_zero() {
        let ranker = ranker(&[vec![], vec![], vec![(0, 1.0)], vec![(0, 1.0)]], 1);

        let from_zero = ranker.rank(0, 3);
        assert!(from_zero.iter().all(|r| r.score == 0.0));
        let rows: Vec<usize> = from_zero.iter().map(|r| r.row_index).collect();
        assert_eq!(rows, vec![1, 2, 3]);

        let from_nonzero = ranker.rank(2, 3);
        assert_eq!(from_nonzero[0].row_index, 3);
        assert!(from_nonzero
            .iter()
            .filter(|r| r.row_index < 2)
            .all(|r| r.score == 0.0));
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Vec<(usize, f32)>>> {
        prop::collection::vec(
            prop::collection::btree_map(0_usize..8, 0.0_f32..10.0, 0..5)
                .prop_map(|m| m.into_iter().collect::<Vec<_>>()),
            1..12,
        )
    }

    proptest! {
        #[test]
        fn prop_rank_invariants(rows in arb_rows(), query in 0_usize..12, top_n in -3_i64..20) {
            let query = query % rows.len();
            let ranker = ranker(&rows, 8);
            let results = ranker.rank(query, top_n);

            let expected = (top_n.max(1) as usize).min(rows.len() - 1);
            prop_assert_eq!(results.len(), expected);

            for r in &results {
                prop_assert!(r.row_index != query);
                prop_assert!((0.0..=1.0).contains(&r.score));
            }
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].row_index < pair[1].row_index);
                }
            }

            prop_assert_eq!(ranker.rank(query, top_n), results);
        }
    }
}
