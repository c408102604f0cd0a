use std::sync::Arc;

use super::{normalize_title, ArtifactBundle};

/// Outcome of resolving a user-supplied title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(usize),
    NotFound,
}

impl Resolution {
    pub fn row(self) -> Option<usize> {
        match self {
            Resolution::Found(row) => Some(row),
            Resolution::NotFound => None,
        }
    }
}

/// Maps free-form titles onto corpus rows by exact normalized match
#[derive(Clone)]
pub struct TitleResolver {
    bundle: Arc<ArtifactBundle>,
}

impl TitleResolver {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        let key = normalize_title(query);
        if key.is_empty() {
            return Resolution::NotFound;
        }

        match self.bundle.index().get(&key) {
            Some(row) => Resolution::Found(row),
            None => Resolution::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TitleRecord, VocabularyMeta};

    fn resolver() -> TitleResolver {
        let corpus = vec![
            TitleRecord::new(0, "The Matrix"),
            TitleRecord::new(1, "Spider-Man: Into the Spider-Verse"),
            TitleRecord::new(2, "Alien"),
            TitleRecord::new(3, "ALIEN"),
        ];
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(2, 1.0)], vec![(2, 1.0)]];
        let bundle = ArtifactBundle::build(corpus, &rows, VocabularyMeta::new("test", 3)).unwrap();
        TitleResolver::new(Arc::new(bundle))
    }

    #[test]
    fn test_resolve_exact() {
        assert_eq!(resolver().resolve("The Matrix"), Resolution::Found(0));
    }

    #[test]
    fn test_resolve_ignores_case_spacing_and_punctuation() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("  the   MATRIX "), Resolution::Found(0));
        assert_eq!(
            resolver.resolve("spiderman into the spiderverse"),
            Resolution::Found(1)
        );
    }

    #[test]
    fn test_resolve_has_no_partial_matching() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("Matrix"), Resolution::NotFound);
        assert_eq!(resolver.resolve("The Matrix Reloaded"), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_empty_query() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(""), Resolution::NotFound);
        assert_eq!(resolver.resolve("!!!"), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_collision_picks_later_row() {
        assert_eq!(resolver().resolve("alien"), Resolution::Found(3));
    }
}
