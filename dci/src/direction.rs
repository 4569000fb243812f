//! Random projection directions (spec §4.1).
//!
//! Each direction is a row of `dim` i.i.d. standard-normal samples,
//! normalized to unit L2 norm. The basis for one [`crate::index::Index`]
//! level is `l * m` such rows, flattened into one contiguous buffer for
//! cache-friendly sequential projection.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{DciError, Result};

/// A flat `count x dim` matrix of unit-norm projection directions.
#[derive(Clone, Debug)]
pub struct Directions {
    data: Vec<f64>,
    dim: usize,
    count: usize,
}

impl Directions {
    /// Draws `count` independent unit vectors in R^dim using `rng`.
    ///
    /// Each row is D i.i.d. `N(0, 1)` samples divided by its L2 norm. A
    /// zero-norm row has probability zero under continuous sampling; if it
    /// is nonetheless observed (a pathological or broken RNG), this raises
    /// [`DciError::InvalidState`] rather than producing a NaN-poisoned
    /// direction.
    pub fn generate<R: Rng + ?Sized>(dim: usize, count: usize, rng: &mut R) -> Result<Self> {
        let mut data = vec![0.0_f64; count * dim];
        for row in data.chunks_exact_mut(dim) {
            for value in row.iter_mut() {
                *value = rng.sample(StandardNormal);
            }

            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm == 0.0 {
                return Err(DciError::InvalidState(
                    "sampled a zero-norm projection direction",
                ));
            }

            for value in row.iter_mut() {
                *value /= norm;
            }
        }

        Ok(Self { data, dim, count })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Projects `point` (a length-`dim` slice) onto direction `i`.
    #[inline]
    pub fn project(&self, i: usize, point: &[f64]) -> f64 {
        dot(self.row(i), point)
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
