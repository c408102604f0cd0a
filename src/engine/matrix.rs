use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::CorruptArtifactError;

/// Row-major compressed sparse matrix of non-negative feature weights.
///
/// Row `i` occupies `indices[indptr[i]..indptr[i + 1]]` (column ids, strictly
/// increasing) and the matching slice of `data`. Row norms are computed once
/// when the matrix is validated and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
    #[serde(skip)]
    norms: Vec<f64>,
}

impl SparseMatrix {
    /// Builds a matrix from raw CSR parts, validating structure and values.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self, CorruptArtifactError> {
        let mut matrix = Self {
            rows,
            cols,
            indptr,
            indices,
            data,
            norms: Vec::new(),
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Builds a matrix from per-row `(column, weight)` entries.
    ///
    /// Entries are sorted by column; zero weights are dropped.
    pub fn from_rows(cols: usize, rows: &[Vec<(usize, f32)>]) -> Result<Self, CorruptArtifactError> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for row in rows {
            let mut entries: Vec<(usize, f32)> = row.iter().copied().filter(|(_, w)| *w != 0.0).collect();
            entries.sort_by_key(|(col, _)| *col);
            for (col, weight) in entries {
                indices.push(col);
                data.push(weight);
            }
            indptr.push(indices.len());
        }

        Self::from_csr(rows.len(), cols, indptr, indices, data)
    }

    /// Checks CSR invariants and (re)computes row norms.
    ///
    /// Called after deserialization since norms are not part of the file format.
    pub(crate) fn validate(&mut self) -> Result<(), CorruptArtifactError> {
        let malformed = |reason: String| CorruptArtifactError::MalformedMatrix(reason);

        if self.indptr.len().checked_sub(1) != Some(self.rows) {
            return Err(malformed(format!(
                "indptr has {} entries for {} rows",
                self.indptr.len(),
                self.rows
            )));
        }
        if self.indptr[0] != 0 {
            return Err(malformed("indptr must start at 0".to_string()));
        }
        if self.indices.len() != self.data.len() {
            return Err(malformed(format!(
                "{} column indices but {} values",
                self.indices.len(),
                self.data.len()
            )));
        }
        if self.indptr[self.rows] != self.data.len() {
            return Err(malformed(format!(
                "indptr ends at {}, but matrix stores {} values",
                self.indptr[self.rows],
                self.data.len()
            )));
        }

        for row in 0..self.rows {
            let (start, end) = (self.indptr[row], self.indptr[row + 1]);
            if start > end || end > self.data.len() {
                return Err(malformed(format!("indptr is not monotonic at row {}", row)));
            }
            let cols = &self.indices[start..end];
            if let Some(&col) = cols.iter().find(|&&c| c >= self.cols) {
                return Err(malformed(format!(
                    "row {} references column {} of {}",
                    row, col, self.cols
                )));
            }
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(malformed(format!(
                    "row {} column indices are not strictly increasing",
                    row
                )));
            }
        }

        if let Some(pos) = self.data.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(malformed(format!(
                "value {} at position {} is negative or not finite",
                self.data[pos], pos
            )));
        }

        self.norms = (0..self.rows).map(|row| l2_norm(self.row_values(row))).collect();
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Euclidean norm of a row, precomputed at load.
    pub fn row_norm(&self, row: usize) -> f64 {
        self.norms[row]
    }

    fn row_indices(&self, row: usize) -> &[usize] {
        &self.indices[self.indptr[row]..self.indptr[row + 1]]
    }

    fn row_values(&self, row: usize) -> &[f32] {
        &self.data[self.indptr[row]..self.indptr[row + 1]]
    }

    /// Scatters one row into a dense vector of length `cols`.
    pub fn dense_row(&self, row: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.cols];
        for (&col, &value) in self.row_indices(row).iter().zip(self.row_values(row)) {
            dense[col] = value as f64;
        }
        dense
    }

    /// Sparse matrix times dense vector: one dot product per row.
    ///
    /// Rows are processed in parallel; each row's sum is accumulated in column
    /// order, so the result does not depend on thread scheduling.
    pub fn mul_dense(&self, vector: &[f64]) -> Vec<f64> {
        debug_assert_eq!(vector.len(), self.cols);
        (0..self.rows)
            .into_par_iter()
            .map(|row| {
                self.row_indices(row)
                    .iter()
                    .zip(self.row_values(row))
                    .map(|(&col, &value)| value as f64 * vector[col])
                    .sum::<f64>()
            })
            .collect()
    }

    /// Cosine similarity of `row` against every row of the matrix.
    ///
    /// Zero-norm rows score 0 against everything, themselves included. Scores
    /// are clamped to `[0, 1]`.
    pub fn cosine_similarities(&self, row: usize) -> Vec<f32> {
        let query_norm = self.norms[row];
        if query_norm == 0.0 {
            return vec![0.0; self.rows];
        }

        let dots = self.mul_dense(&self.dense_row(row));
        dots.into_iter()
            .zip(&self.norms)
            .map(|(dot, &norm)| {
                if norm == 0.0 {
                    0.0
                } else {
                    (dot / (query_norm * norm)).clamp(0.0, 1.0) as f32
                }
            })
            .collect()
    }
}

/// Overflow- and underflow-safe Euclidean norm (scaled sum of squares).
fn l2_norm(values: &[f32]) -> f64 {
    let mut scale = 0.0_f64;
    let mut ssq = 1.0_f64;

    for &v in values {
        let a = (v as f64).abs();
        if a == 0.0 {
            continue;
        }
        if scale < a {
            ssq = 1.0 + ssq * (scale / a) * (scale / a);
            scale = a;
        } else {
            ssq += (a / scale) * (a / scale);
        }
    }

    scale * ssq.sqrt()
}
