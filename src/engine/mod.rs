//! Content-similarity engine
//!
//! Everything in this module is synchronous and allocation-local. The loaded
//! [`ArtifactBundle`] is immutable, so the resolver, ranker and service can be
//! shared across threads behind an `Arc` without locking.

pub mod artifacts;
pub mod matrix;
pub mod normalize;
pub mod ranker;
pub mod resolver;

use std::path::PathBuf;

pub use artifacts::{ArtifactBundle, BundleInfo, TitleIndex, TitleRecord, VocabularyMeta};
pub use matrix::SparseMatrix;
pub use normalize::{normalize_title, NORMALIZATION_VERSION};
pub use ranker::{RankedResult, SimilarityRanker};
pub use resolver::{Resolution, TitleResolver};

/// Artifact bundle failed to load or validate. Fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum CorruptArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize artifact {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corpus has {corpus} titles but feature matrix has {matrix} rows")]
    RowCountMismatch { corpus: usize, matrix: usize },

    #[error("Title index entry '{key}' points at row {row}, corpus has {rows} rows")]
    IndexOutOfRange { key: String, row: usize, rows: usize },

    #[error("Feature matrix has {matrix} columns but vocabulary declares {vocabulary}")]
    VocabularyMismatch { matrix: usize, vocabulary: usize },

    #[error("Malformed feature matrix: {0}")]
    MalformedMatrix(String),

    #[error("Title index built with normalization v{found}, runtime uses v{expected}")]
    NormalizationVersion { found: u32, expected: u32 },
}
