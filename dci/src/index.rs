//! A single DCI instance (spec §3's "DCI instance (one level)"): the
//! random basis, the `L` composite indices of `m` simple indices each,
//! and the point matrix they were built over.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::direction::Directions;
use crate::engine::{self, EnginePool, SearchBudget};
use crate::error::Result;
use crate::points::Points;
use crate::projected::{Entry, SimpleIndex};
use crate::types::{Candidate, PointId};

/// One level of the DCI structure: `L` composite indices, each made of
/// `m` simple indices, built over a (possibly sampled) subset of points.
pub struct Index {
    dim: usize,
    m: usize,
    points: Points,
    directions: Directions,
    composites: Vec<Vec<SimpleIndex>>,
    pool: EnginePool,
}

impl Index {
    /// Builds a fresh DCI instance: draws the `l * m` projection
    /// directions, projects every point onto each, and sorts each
    /// simple index. This is the "regenerated on every fresh `add`"
    /// step from spec §3's lifecycle rules.
    pub fn build(points: Points, l: usize, m: usize, seed: u64) -> Result<Self> {
        let dim = points.dim();
        let n = points.len();
        let mut rng = SmallRng::seed_from_u64(seed);
        let directions = Directions::generate(dim, l * m, &mut rng)?;

        let mut composites = Vec::with_capacity(l);
        for c in 0..l {
            let mut simples = Vec::with_capacity(m);
            for s in 0..m {
                let dir = c * m + s;
                let entries: Vec<Entry> = (0..n)
                    .map(|i| Entry {
                        value: directions.project(dir, points.row(i)),
                        id: PointId::from(i),
                    })
                    .collect();
                simples.push(SimpleIndex::build(entries));
            }
            composites.push(simples);
        }

        tracing::debug!(n, dim, l, m, "built DCI level");

        Ok(Self {
            dim,
            m,
            points,
            directions,
            composites,
            pool: EnginePool::new(),
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn point(&self, id: PointId) -> &[f64] {
        self.points.row(id.index())
    }

    pub fn true_distance(&self, id: PointId, query: &[f64]) -> f64 {
        self.points.distance_to(id.index(), query)
    }

    /// Runs the prioritized search engine (spec §4.3) for one query
    /// against this level, optionally restricted to a candidate subset
    /// (spec §4.4's cascade). Draws its scratch state from the level's own
    /// pool, mirroring the teacher's `SearchPool`-backed `Hnsw::search`.
    pub fn search(
        &self,
        query: &[f64],
        budget: SearchBudget,
        restrict: Option<&HashSet<PointId>>,
    ) -> Vec<Candidate> {
        let mut state = self.pool.acquire();
        let out = engine::search(
            &mut state,
            &self.composites,
            |c, s| self.directions.project(c * self.m + s, query),
            |pid| self.true_distance(pid, query),
            budget,
            restrict,
        );
        self.pool.release(state);
        out
    }

    /// Exposes the built composites for invariant checks (spec §8,
    /// properties 1 and 2) that need to look inside a real `Index::build`
    /// pipeline rather than hand-assembling a `SimpleIndex`.
    #[cfg(test)]
    pub(crate) fn composites(&self) -> &[Vec<SimpleIndex>] {
        &self.composites
    }
}
