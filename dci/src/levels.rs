//! The hierarchical, multi-level cascade (spec §4.4).
//!
//! Levels are a plain indexed `Vec<Index>`, level `0` the finest (all `N`
//! points) and the last entry the coarsest — there is no parent/child
//! graph to maintain, per the "cyclic structure between levels: there
//! isn't one" design note.

use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use crate::engine::SearchBudget;
use crate::error::{DciError, Result};
use crate::index::Index;
use crate::points::{Matrix, Points};
use crate::types::{Candidate, PointId};

/// Shrink factor between consecutive levels' sample sizes
/// (`N_i = ceil(N_{i-1} / LEVEL_SHRINK)`). Spec §4.4 leaves the constant
/// `c >= 2` as an implementation policy; `4` keeps a handful of levels
/// useful across the `N` ranges this index targets without needing a
/// separate tuning knob on `add`.
const LEVEL_SHRINK: usize = 4;

/// Construction-time knobs threaded through from `add` (spec §4.4/§4.5).
#[derive(Clone, Copy, Debug)]
pub struct ConstructionParams {
    pub num_levels: usize,
    pub field_of_view: usize,
    pub prop_to_visit: f64,
    pub prop_to_retrieve: f64,
    pub blind: bool,
    pub seed: u64,
}

/// Query-time knobs threaded through from `query` (spec §4.5).
#[derive(Clone, Copy, Debug)]
pub struct QueryParams {
    pub k: usize,
    pub field_of_view: usize,
    pub prop_to_visit: f64,
    pub prop_to_retrieve: f64,
    pub blind: bool,
}

/// `associated[i][s]` maps a point id stored at level `i + 1` (in that
/// level's own local id space) to the set of level-`i` ids it represents
/// (spec §3's "link-sets"), for `i` in `0..levels.len() - 1`.
pub struct HierarchicalIndex {
    levels: Vec<Index>,
    associations: Vec<HashMap<PointId, Vec<PointId>>>,
}

impl HierarchicalIndex {
    /// Builds the full bottom-up cascade described in spec §4.4.
    pub fn build(points: Points, l: usize, m: usize, params: ConstructionParams) -> Result<Self> {
        let n0 = points.len();
        let sizes = level_sizes(n0, params.num_levels);
        let actual_levels = sizes.len();

        let mut rng = SmallRng::seed_from_u64(params.seed);
        let mut levels = Vec::with_capacity(actual_levels);
        let mut associations = Vec::with_capacity(actual_levels.saturating_sub(1));

        levels.push(Index::build(points, l, m, params.seed)?);

        for level_idx in 1..actual_levels {
            let prev = &levels[level_idx - 1];
            let n_i = sizes[level_idx];
            let sampled_ids: Vec<usize> = sample(&mut rng, prev.n(), n_i).into_vec();

            let mut data = Vec::with_capacity(n_i * prev.dim());
            for &id in &sampled_ids {
                data.extend_from_slice(prev.point(PointId::from(id)));
            }
            let matrix = Matrix::new(&data, n_i, prev.dim())?;
            let level_points = Points::from_matrix(matrix)?;
            // Distinct seed per level so levels don't share a projection basis.
            let level_seed = params.seed ^ ((level_idx as u64) << 32);
            let level = Index::build(level_points, l, m, level_seed)?;

            let assoc = build_associations(prev, &level, params)?;

            levels.push(level);
            associations.push(assoc);
        }

        tracing::debug!(
            requested_levels = params.num_levels,
            actual_levels,
            n0,
            "built hierarchical DCI cascade"
        );

        Ok(Self {
            levels,
            associations,
        })
    }

    pub fn n(&self) -> usize {
        self.levels[0].n()
    }

    /// Runs the top-down query cascade from spec §4.4.
    pub fn query(&self, query: &[f64], params: QueryParams) -> Vec<Candidate> {
        let top = self.levels.len() - 1;
        let mut restrict: Option<HashSet<PointId>> = None;

        for level_idx in (0..=top).rev() {
            let level = &self.levels[level_idx];
            let n_i = level.n();
            let budget = SearchBudget {
                top_n: if level_idx == 0 { params.k } else { params.field_of_view },
                max_visited: prop_budget(params.prop_to_visit, n_i),
                max_retrieved: prop_budget(params.prop_to_retrieve, n_i),
                blind: params.blind,
            };

            let results = level.search(query, budget, restrict.as_ref());

            if level_idx == 0 {
                return results;
            }

            let assoc = &self.associations[level_idx - 1];
            let mut next = HashSet::new();
            for candidate in &results {
                if let Some(lower_ids) = assoc.get(&candidate.pid) {
                    next.extend(lower_ids.iter().copied());
                }
            }
            restrict = Some(next);
        }

        unreachable!("loop always returns at level_idx == 0")
    }
}

fn build_associations(
    lower: &Index,
    upper: &Index,
    params: ConstructionParams,
) -> Result<HashMap<PointId, Vec<PointId>>> {
    let n_lower = lower.n();
    let budget = SearchBudget {
        top_n: params.field_of_view,
        max_visited: prop_budget(params.prop_to_visit, n_lower),
        max_retrieved: prop_budget(params.prop_to_retrieve, n_lower),
        blind: params.blind,
    };

    let mut assoc = HashMap::with_capacity(upper.n());
    for s in 0..upper.n() {
        let stored_id = PointId::from(s);
        let query = upper.point(stored_id);
        let retrieved = lower.search(query, budget, None);
        assoc.insert(
            stored_id,
            retrieved.into_iter().map(|c| c.pid).collect::<Vec<_>>(),
        );
    }
    Ok(assoc)
}

fn level_sizes(n0: usize, num_levels: usize) -> Vec<usize> {
    let mut sizes = vec![n0];
    for _ in 1..num_levels {
        let prev = *sizes.last().unwrap();
        let next = ((prev + LEVEL_SHRINK - 1) / LEVEL_SHRINK).max(1);
        if next >= prev {
            break;
        }
        sizes.push(next);
    }
    sizes
}

fn prop_budget(prop: f64, n: usize) -> usize {
    ((prop * n as f64).ceil() as usize).max(1).min(n.max(1))
}

/// Validates the parameter co-constraints from spec §4.4.
pub fn validate_construction(l: usize, m: usize, params: &ConstructionParams) -> Result<()> {
    if !(1..=64).contains(&l) {
        return Err(DciError::InvalidConfig("L must be in 1..=64"));
    }
    if !(1..=128).contains(&m) {
        return Err(DciError::InvalidConfig("m must be in 1..=128"));
    }
    if !(1..=8).contains(&params.num_levels) {
        return Err(DciError::InvalidBudget("num_levels must be in 1..=8"));
    }
    validate_props(params.prop_to_visit, params.prop_to_retrieve)?;
    if params.field_of_view == 0 {
        return Err(DciError::InvalidBudget("field_of_view must be >= 1"));
    }
    Ok(())
}

pub fn validate_props(prop_to_visit: f64, prop_to_retrieve: f64) -> Result<()> {
    if !(prop_to_visit > 0.0 && prop_to_visit <= 1.0) {
        return Err(DciError::InvalidBudget("prop_to_visit must be in (0, 1]"));
    }
    if !(prop_to_retrieve > 0.0 && prop_to_retrieve <= 1.0) {
        return Err(DciError::InvalidBudget("prop_to_retrieve must be in (0, 1]"));
    }
    if prop_to_retrieve > prop_to_visit {
        return Err(DciError::InvalidBudget(
            "prop_to_retrieve must be <= prop_to_visit",
        ));
    }
    Ok(())
}
