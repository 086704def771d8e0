//! Cosine similarity top-k ranking over the stored embedding matrix.

use std::cmp::Ordering;

use ndarray::{Array1, ArrayView2, Axis};
use thiserror::Error;

/// Added to every norm so all-zero vectors divide cleanly instead of
/// producing NaN scores.
const NORM_EPSILON: f32 = 1e-12;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("embedding dimension mismatch: query has {query_dim} columns, matrix has {matrix_dim}")]
    ShapeMismatch {
        query_dim: usize,
        matrix_dim: usize,
    },
}

/// Return the indices and cosine scores of the `k` rows of `matrix` most
/// similar to `query`, best first.
///
/// An empty matrix yields empty outputs for any `k`; otherwise `k` is
/// clamped to `[1, rows]`. A column-count mismatch is a contract
/// violation and fails with [`RankError::ShapeMismatch`] rather than
/// truncating or padding. Ties between exactly equal scores keep the
/// lower row index first (stable sort).
pub fn cosine_top_k(
    query: &[f32],
    matrix: ArrayView2<'_, f32>,
    k: usize,
) -> Result<(Vec<usize>, Vec<f32>), RankError> {
    if matrix.nrows() == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    if matrix.ncols() != query.len() {
        return Err(RankError::ShapeMismatch {
            query_dim: query.len(),
            matrix_dim: matrix.ncols(),
        });
    }

    let q = Array1::from_vec(query.to_vec());
    let q_norm = q.dot(&q).sqrt() + NORM_EPSILON;
    let q = q / q_norm;

    let mut scored: Vec<(usize, f32)> = matrix
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(idx, row)| {
            let row_norm = row.dot(&row).sqrt() + NORM_EPSILON;
            (idx, row.dot(&q) / row_norm)
        })
        .collect();

    scored.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));

    let k = k.clamp(1, scored.len());
    scored.truncate(k);

    Ok(scored.into_iter().unzip())
}
