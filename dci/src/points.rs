//! Owned, row-major storage for the point matrix a [`crate::index::Index`]
//! is built over (spec §3's ownership decision: copied in, not borrowed).

use crate::error::{DciError, Result};

/// A borrow-only view of a caller-supplied row-major `rows x cols` f64
/// matrix, used to validate shape at the API boundary (spec §6's matrix
/// contract) before the data is copied into a [`Points`].
#[derive(Clone, Copy, Debug)]
pub struct Matrix<'a> {
    data: &'a [f64],
    cols: usize,
}

impl<'a> Matrix<'a> {
    pub fn new(data: &'a [f64], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(DciError::InvalidConfig(
                "matrix data length does not match rows * cols",
            ));
        }
        Ok(Self { data, cols })
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }
}

/// Owned row-major storage for `N` points in `R^dim`.
#[derive(Clone, Debug, Default)]
pub struct Points {
    data: Vec<f64>,
    dim: usize,
}

impl Points {
    /// Copies `matrix` into owned storage, rejecting any non-finite
    /// value (spec §7's data-pathology error kind).
    pub fn from_matrix(matrix: Matrix<'_>) -> Result<Self> {
        if matrix.data.iter().any(|v| !v.is_finite()) {
            return Err(DciError::InvalidState(
                "point matrix contains a non-finite value",
            ));
        }
        Ok(Self {
            data: matrix.data.to_vec(),
            dim: matrix.cols,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.dim;
        &self.data[start..start + self.dim]
    }

    /// True Euclidean (not squared) distance between point `i` and an
    /// arbitrary query vector. Squares are accumulated left-to-right, no
    /// Kahan summation, per spec §5's numerical contract.
    pub fn distance_to(&self, i: usize, query: &[f64]) -> f64 {
        squared_l2(self.row(i), query).sqrt()
    }
}

#[inline]
pub(crate) fn squared_l2(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
