use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{normalize_title, CorruptArtifactError, SparseMatrix, NORMALIZATION_VERSION};

pub const TITLES_FILE: &str = "titles.json";
pub const TITLE_INDEX_FILE: &str = "title_index.json";
pub const MATRIX_FILE: &str = "matrix.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";

/// One movie in the corpus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleRecord {
    /// Position in the corpus; the join key with the feature matrix
    #[serde(skip)]
    pub row_index: usize,
    /// Display title
    pub title: String,
    /// Stable identifier for enrichment lookups (e.g. a TMDB id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Opaque metadata carried through from the artifact build
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub attributes: serde_json::Value,
}

impl TitleRecord {
    pub fn new(row_index: usize, title: impl Into<String>) -> Self {
        Self {
            row_index,
            title: title.into(),
            external_id: None,
            attributes: serde_json::Value::Null,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Vectorizer metadata shipped alongside the feature matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyMeta {
    /// Artifact build version, reported by the health endpoint
    pub version: String,
    /// Normalization rule the title index was built with
    pub normalization_version: u32,
    pub vocabulary_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<String>>,
}

impl VocabularyMeta {
    pub fn new(version: impl Into<String>, vocabulary_size: usize) -> Self {
        Self {
            version: version.into(),
            normalization_version: NORMALIZATION_VERSION,
            vocabulary_size,
            terms: None,
        }
    }
}

/// Normalized title → corpus row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TitleIndex(HashMap<String, usize>);

impl TitleIndex {
    /// Builds the index from a corpus.
    ///
    /// When two titles normalize to the same key the later row wins; the
    /// earlier row is still reachable by row index.
    pub fn build(corpus: &[TitleRecord]) -> Self {
        let mut map = HashMap::with_capacity(corpus.len());
        for (row, record) in corpus.iter().enumerate() {
            let key = normalize_title(&record.title);
            if !key.is_empty() {
                map.insert(key, row);
            }
        }
        Self(map)
    }

    pub fn get(&self, normalized: &str) -> Option<usize> {
        self.0.get(normalized).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, usize)> for TitleIndex {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Summary of the loaded bundle
#[derive(Debug, Clone, Serialize)]
pub struct BundleInfo {
    pub version: String,
    pub titles: usize,
    pub features: usize,
    pub nnz: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Immutable snapshot of corpus, feature matrix and title index.
///
/// Only constructible through validation, so holding one means the three
/// structures agree on row count and column count.
#[derive(Debug)]
pub struct ArtifactBundle {
    corpus: Vec<TitleRecord>,
    index: TitleIndex,
    matrix: SparseMatrix,
    vocabulary: VocabularyMeta,
    loaded_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Loads and validates the four artifact files in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, CorruptArtifactError> {
        let dir = dir.as_ref();
        tracing::info!(dir = %dir.display(), "Loading artifact bundle");

        let corpus: Vec<TitleRecord> = read_json(&dir.join(TITLES_FILE))?;
        let index: TitleIndex = read_json(&dir.join(TITLE_INDEX_FILE))?;
        let matrix: SparseMatrix = read_json(&dir.join(MATRIX_FILE))?;
        let vocabulary: VocabularyMeta = read_json(&dir.join(VOCABULARY_FILE))?;

        Self::from_parts(corpus, index, matrix, vocabulary)
    }

    /// Validates in-memory parts and assembles a bundle.
    ///
    /// Row indices on `corpus` are reassigned from position. The matrix is
    /// always re-validated, so one deserialized directly is safe to pass in.
    pub fn from_parts(
        mut corpus: Vec<TitleRecord>,
        index: TitleIndex,
        mut matrix: SparseMatrix,
        vocabulary: VocabularyMeta,
    ) -> Result<Self, CorruptArtifactError> {
        matrix.validate()?;

        if corpus.len() != matrix.rows() {
            return Err(CorruptArtifactError::RowCountMismatch {
                corpus: corpus.len(),
                matrix: matrix.rows(),
            });
        }

        if let Some((key, row)) = index.iter().find(|(_, row)| *row >= corpus.len()) {
            return Err(CorruptArtifactError::IndexOutOfRange {
                key: key.to_string(),
                row,
                rows: corpus.len(),
            });
        }

        if matrix.cols() != vocabulary.vocabulary_size {
            return Err(CorruptArtifactError::VocabularyMismatch {
                matrix: matrix.cols(),
                vocabulary: vocabulary.vocabulary_size,
            });
        }
        if let Some(terms) = &vocabulary.terms {
            if terms.len() != vocabulary.vocabulary_size {
                return Err(CorruptArtifactError::VocabularyMismatch {
                    matrix: matrix.cols(),
                    vocabulary: terms.len(),
                });
            }
        }

        if vocabulary.normalization_version != NORMALIZATION_VERSION {
            return Err(CorruptArtifactError::NormalizationVersion {
                found: vocabulary.normalization_version,
                expected: NORMALIZATION_VERSION,
            });
        }

        for (row, record) in corpus.iter_mut().enumerate() {
            record.row_index = row;
        }

        let non_normalized = index
            .iter()
            .filter(|(key, _)| normalize_title(key) != *key)
            .count();
        if non_normalized > 0 {
            tracing::warn!(
                count = non_normalized,
                "Title index contains keys that are not in normalized form and cannot match a query"
            );
        }

        let bundle = Self {
            corpus,
            index,
            matrix,
            vocabulary,
            loaded_at: Utc::now(),
        };

        tracing::info!(
            version = %bundle.vocabulary.version,
            titles = bundle.corpus.len(),
            features = bundle.matrix.cols(),
            nnz = bundle.matrix.nnz(),
            unreachable_by_title = bundle.unreachable_rows(),
            "Artifact bundle loaded"
        );

        Ok(bundle)
    }

    /// Builds a bundle from a corpus and its feature rows, deriving the
    /// title index with [`TitleIndex::build`].
    pub fn build(
        corpus: Vec<TitleRecord>,
        rows: &[Vec<(usize, f32)>],
        vocabulary: VocabularyMeta,
    ) -> Result<Self, CorruptArtifactError> {
        let matrix = SparseMatrix::from_rows(vocabulary.vocabulary_size, rows)?;
        let index = TitleIndex::build(&corpus);
        Self::from_parts(corpus, index, matrix, vocabulary)
    }

    /// Writes the bundle in the same four-file layout `load` reads
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<(), CorruptArtifactError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| CorruptArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        write_json(&dir.join(TITLES_FILE), &self.corpus)?;
        write_json(&dir.join(TITLE_INDEX_FILE), &self.index)?;
        write_json(&dir.join(MATRIX_FILE), &self.matrix)?;
        write_json(&dir.join(VOCABULARY_FILE), &self.vocabulary)?;
        Ok(())
    }

    pub fn corpus(&self) -> &[TitleRecord] {
        &self.corpus
    }

    pub fn title(&self, row: usize) -> Option<&TitleRecord> {
        self.corpus.get(row)
    }

    pub fn index(&self) -> &TitleIndex {
        &self.index
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    pub fn vocabulary(&self) -> &VocabularyMeta {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            version: self.vocabulary.version.clone(),
            titles: self.corpus.len(),
            features: self.matrix.cols(),
            nnz: self.matrix.nnz(),
            loaded_at: self.loaded_at,
        }
    }

    /// Rows that no title index entry points at
    pub fn unreachable_rows(&self) -> usize {
        let mut reachable = vec![false; self.corpus.len()];
        for (_, row) in self.index.iter() {
            reachable[row] = true;
        }
        reachable.iter().filter(|r| !**r).count()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CorruptArtifactError> {
    let bytes = fs::read(path).map_err(|source| CorruptArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CorruptArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CorruptArtifactError> {
    let json = serde_json::to_vec(value).map_err(|source| CorruptArtifactError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| CorruptArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}
