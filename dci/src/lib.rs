//! Prioritized Dynamic Continuous Indexing (DCI): an in-memory k-nearest-
//! neighbour index for high-dimensional Euclidean space.
//!
//! The index projects points onto a handful of random 1-D directions and
//! keeps each projection sorted. A query walks those sorted projections
//! in order of increasing gap to the query's own projection, via a single
//! global priority queue, and promotes a point to a candidate once it has
//! been seen across every simple index of some composite group. This
//! makes query time scale linearly in the ambient dimension and, in
//! practice, sublinearly in the data's intrinsic dimension. An optional
//! hierarchical cascade narrows the candidate set through coarser levels
//! before the finest level computes exact distances.
//!
//! ```
//! use dci::{Dci, Matrix};
//!
//! let data = [
//!     1.0, 0.0, 0.0, 0.0,
//!     0.0, 1.0, 0.0, 0.0,
//!     0.0, 0.0, 1.0, 0.0,
//!     0.0, 0.0, 0.0, 1.0,
//! ];
//! let mut index = Dci::builder().seed(7).build(4, 3, 10).unwrap();
//! index.add(Matrix::new(&data, 4, 4).unwrap(), 1, 4, 1.0, 1.0, false).unwrap();
//!
//! let query = [1.0, 0.0, 0.0, 0.0];
//! let result = index
//!     .query(Matrix::new(&query, 1, 4).unwrap(), 1, 4, 1.0, 1.0, false)
//!     .unwrap();
//! assert_eq!(result.row_ids(0)[0], 0);
//! ```

mod direction;
mod engine;
mod error;
mod index;
mod levels;
mod points;
mod projected;
mod types;

pub use error::{DciError, Result};
pub use points::Matrix;
pub use types::PointId;

use levels::{ConstructionParams, HierarchicalIndex, QueryParams};
use points::Points;
use rayon::prelude::*;

/// Row-major `Q x k` query results: `ids` use the `-1` sentinel and
/// `dists` the `+inf` sentinel to pad rows that fall short of `k`
/// retrieved points, per the matrix contract.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryResult {
    k: usize,
    ids: Vec<i32>,
    dists: Vec<f64>,
}

impl QueryResult {
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    #[inline]
    pub fn dists(&self) -> &[f64] {
        &self.dists
    }

    pub fn row_ids(&self, q: usize) -> &[i32] {
        &self.ids[q * self.k..(q + 1) * self.k]
    }

    pub fn row_dists(&self, q: usize) -> &[f64] {
        &self.dists[q * self.k..(q + 1) * self.k]
    }
}

/// Builder for [`Dci`].
///
/// Every other construction/query knob (`L`, `m`, `num_levels`,
/// `field_of_view`, the visit/retrieve budgets, `blind`) is supplied
/// per-call to `add`/`query`, so the only thing worth pinning down ahead
/// of time is the RNG seed behind the projection basis.
#[derive(Clone, Default)]
pub struct Builder {
    seed: Option<u64>,
}

impl Builder {
    /// Sets the seed used to draw the direction basis on the next `add`.
    ///
    /// If left unset, a seed is generated from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds an empty [`Dci`] for `dim`-dimensional points with `l`
    /// composite indices of `m` simple indices each.
    pub fn build(self, dim: usize, l: usize, m: usize) -> Result<Dci> {
        Dci::with_seed(dim, l, m, self.seed)
    }
}

/// The index itself: a value type that owns its projection basis, sorted
/// projected-value stores, and point matrix once populated.
///
/// `add`/`clear` take `&mut self`; `query` takes `&self`. Any number of
/// queries may therefore run concurrently against a populated index
/// without a lock, while the borrow checker statically rules out a
/// `query` running concurrently with an `add`/`clear` — the contract
/// spec.md leaves as a caller obligation is enforced here at compile time.
pub struct Dci {
    dim: usize,
    l: usize,
    m: usize,
    seed: u64,
    cascade: Option<HierarchicalIndex>,
}

impl Dci {
    /// Creates an empty index for `dim`-dimensional points with `l`
    /// composite indices of `m` simple indices each, seeded from entropy.
    ///
    /// Fails with [`DciError::InvalidConfig`] if `dim` is zero or `l`/`m`
    /// fall outside their recommended ranges (`1..=64`, `1..=128`).
    pub fn new(dim: usize, l: usize, m: usize) -> Result<Self> {
        Self::with_seed(dim, l, m, None)
    }

    /// Starts a [`Builder`] for pinning the RNG seed before building.
    pub fn builder() -> Builder {
        Builder::default()
    }

    fn with_seed(dim: usize, l: usize, m: usize, seed: Option<u64>) -> Result<Self> {
        if dim == 0 {
            return Err(DciError::InvalidConfig("dim must be >= 1"));
        }
        if !(1..=64).contains(&l) {
            return Err(DciError::InvalidConfig("L must be in 1..=64"));
        }
        if !(1..=128).contains(&m) {
            return Err(DciError::InvalidConfig("m must be in 1..=128"));
        }
        Ok(Self {
            dim,
            l,
            m,
            seed: seed.unwrap_or_else(|| rand::random()),
            cascade: None,
        })
    }

    /// The dimensionality this index was created with.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dim
    }

    /// The number of points currently indexed (`0` before the first
    /// successful `add`, or after `clear`).
    pub fn size(&self) -> usize {
        self.cascade.as_ref().map_or(0, HierarchicalIndex::n)
    }

    /// Populates the index from a point matrix. Only one `add` is allowed
    /// per populated lifetime; call [`Dci::clear`] first to add again.
    ///
    /// `num_levels` selects the hierarchical cascade depth (spec §4.4);
    /// `field_of_view`/`prop_to_visit`/`prop_to_retrieve` govern the
    /// association step's search budget at every level above the finest;
    /// `blind` skips true-distance re-ranking during association.
    ///
    /// Fails with [`DciError::InvalidConfig`] if already populated or on a
    /// column-count mismatch against `dim`, with
    /// [`DciError::InvalidState`] on non-finite input, or with
    /// [`DciError::InvalidBudget`] on an out-of-range construction
    /// parameter. On any failure the index is left exactly as it was
    /// before the call.
    pub fn add(
        &mut self,
        points: Matrix<'_>,
        num_levels: usize,
        field_of_view: usize,
        prop_to_visit: f64,
        prop_to_retrieve: f64,
        blind: bool,
    ) -> Result<()> {
        if self.cascade.is_some() {
            tracing::warn!("add called on an already-populated index");
            return Err(DciError::InvalidConfig(
                "index already populated; call clear() first",
            ));
        }
        if points.cols() != self.dim {
            tracing::warn!(expected = self.dim, actual = points.cols(), "add dimension mismatch");
            return Err(DciError::DimensionMismatch {
                expected: self.dim,
                actual: points.cols(),
            });
        }

        let params = ConstructionParams {
            num_levels,
            field_of_view,
            prop_to_visit,
            prop_to_retrieve,
            blind,
            seed: self.seed,
        };
        levels::validate_construction(self.l, self.m, &params)
            .map_err(|e| { tracing::warn!(%e, "add rejected invalid parameters"); e })?;

        let owned = Points::from_matrix(points)
            .map_err(|e| { tracing::warn!(%e, "add rejected invalid point data"); e })?;
        let cascade = HierarchicalIndex::build(owned, self.l, self.m, params)?;
        self.cascade = Some(cascade);
        Ok(())
    }

    /// Runs a batch of queries, one `rayon` worker per query row.
    ///
    /// Fails with [`DciError::NotPopulated`] before the first `add`,
    /// [`DciError::DimensionMismatch`] on a column-count mismatch, or
    /// [`DciError::InvalidBudget`] on an out-of-range query parameter.
    pub fn query(
        &self,
        queries: Matrix<'_>,
        k: usize,
        field_of_view: usize,
        prop_to_visit: f64,
        prop_to_retrieve: f64,
        blind: bool,
    ) -> Result<QueryResult> {
        let cascade = self.cascade.as_ref().ok_or_else(|| {
            tracing::warn!("query called before add");
            DciError::NotPopulated
        })?;
        if queries.cols() != self.dim {
            tracing::warn!(expected = self.dim, actual = queries.cols(), "query dimension mismatch");
            return Err(DciError::DimensionMismatch {
                expected: self.dim,
                actual: queries.cols(),
            });
        }
        levels::validate_props(prop_to_visit, prop_to_retrieve)
            .map_err(|e| { tracing::warn!(%e, "query rejected invalid budget"); e })?;
        if field_of_view == 0 {
            tracing::warn!("query rejected field_of_view == 0");
            return Err(DciError::InvalidBudget("field_of_view must be >= 1"));
        }
        if k == 0 {
            tracing::warn!("query rejected k == 0");
            return Err(DciError::InvalidBudget("k must be >= 1"));
        }

        let params = QueryParams {
            k,
            field_of_view,
            prop_to_visit,
            prop_to_retrieve,
            blind,
        };

        let rows: Vec<&[f64]> = queries.iter_rows().collect();
        let q = rows.len();
        tracing::debug!(q, k, "running batch query");
        let per_row: Vec<_> = rows
            .into_par_iter()
            .map(|row| cascade.query(row, params))
            .collect();

        let mut ids = vec![PointId::INVALID.0; q * k];
        let mut dists = vec![f64::INFINITY; q * k];
        for (row_idx, candidates) in per_row.into_iter().enumerate() {
            for (col, candidate) in candidates.into_iter().take(k).enumerate() {
                ids[row_idx * k + col] = candidate.pid.0;
                dists[row_idx * k + col] = candidate.distance.0;
            }
        }

        tracing::debug!(q, "batch query complete");
        Ok(QueryResult { k, ids, dists })
    }

    /// Drops the direction basis and all per-level state, returning the
    /// index to its freshly-`new`ed, unpopulated state.
    pub fn clear(&mut self) {
        self.cascade = None;
    }
}
