//! The Prioritized DCI search engine (spec §4.3): a global min-heap over
//! projected-distance gaps driving composite-of-simples candidate voting.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ordered_float::OrderedFloat;
use parking_lot::Mutex;

use crate::projected::{Cursor, SimpleIndex};
use crate::types::{Candidate, PointId};

/// One entry in the global min-heap, keyed by `|gap|` with an insertion
/// sequence number as a tiebreaker so equal gaps pop in FIFO order
/// (spec §4.3's tie-breaking rule; `BinaryHeap` alone is not stable).
///
/// `cursor` is the state of the two-cursor walk *after* having produced
/// `(gap, pid)`; advancing it again yields this entry's successor.
#[derive(Clone, Copy, Debug)]
struct HeapItem {
    gap: OrderedFloat<f64>,
    seq: u64,
    composite: u16,
    simple: u16,
    pid: PointId,
    cursor: Cursor,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.gap == other.gap && self.seq == other.seq
    }
}
impl Eq for HeapItem {}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.gap
            .cmp(&other.gap)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Per-query mutable state: the frontier heap, per-composite hit counts,
/// the retrieved set, and the bounded top-k finalist heap. Reused across
/// queries via [`EnginePool`] to avoid reallocating on every call.
#[derive(Default)]
pub struct SearchState {
    heap: BinaryHeap<Reverse<HeapItem>>,
    hits: Vec<HashMap<PointId, u32>>,
    visits: Vec<u32>,
    retrieved: HashSet<PointId>,
    topk: BinaryHeap<Candidate>,
    seq: u64,
}

impl SearchState {
    fn reset(&mut self, l: usize, m: usize) {
        self.heap.clear();
        self.hits.clear();
        self.hits.resize_with(l, HashMap::new);
        self.visits.clear();
        self.visits.resize(l * m, 0);
        self.retrieved.clear();
        self.topk.clear();
        self.seq = 0;
    }

    fn next_seq(&mut self) -> u64 {
        let s = self.seq;
        self.seq += 1;
        s
    }
}

/// A reusable pool of [`SearchState`] buffers, mirroring the teacher
/// crate's `SearchPool`: batch queries draw a buffer, use it, and return
/// it instead of allocating heap/hash-map storage per query.
#[derive(Default)]
pub struct EnginePool {
    pool: Mutex<Vec<SearchState>>,
}

impl EnginePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> SearchState {
        self.pool.lock().pop().unwrap_or_default()
    }

    pub fn release(&self, state: SearchState) {
        self.pool.lock().push(state);
    }
}

/// Parameters governing a single prioritized search.
#[derive(Clone, Copy, Debug)]
pub struct SearchBudget {
    /// Number of finalists to retain (`k` at the base level, or
    /// `field_of_view` when used to propagate candidates down a level).
    pub top_n: usize,
    /// Per-simple-index visit budget (`max_visited` in spec §4.3).
    pub max_visited: usize,
    /// Cap on the number of distinct retrieved candidates (`max_retrieved`).
    pub max_retrieved: usize,
    /// When true, rank and report by the projected-gap bound instead of
    /// computing true Euclidean distances (spec §4.4's blind mode).
    pub blind: bool,
}

/// Runs the prioritized search described in spec §4.3 over one DCI
/// level's `l x m` simple indices.
///
/// `composites[c][s]` is the simple index for composite `c`, simple slot
/// `s`. `project` computes the query's projection onto direction
/// `(c, s)`; `distance` computes the true Euclidean distance from the
/// query to a point id. `restrict`, if given, limits promotion to ids in
/// the set (used by the hierarchical cascade in spec §4.4); ids outside
/// the set are still walked past (so the priority order and per-index
/// visit budgets are unaffected) but never promoted.
#[allow(clippy::too_many_arguments)]
pub fn search(
    state: &mut SearchState,
    composites: &[Vec<SimpleIndex>],
    project: impl Fn(usize, usize) -> f64,
    mut distance: impl FnMut(PointId) -> f64,
    budget: SearchBudget,
    restrict: Option<&HashSet<PointId>>,
) -> Vec<Candidate> {
    let l = composites.len();
    let m = if l == 0 { 0 } else { composites[0].len() };
    state.reset(l, m);

    if l == 0 || m == 0 {
        return Vec::new();
    }

    for (c, row) in composites.iter().enumerate() {
        for (s, simple_index) in row.iter().enumerate() {
            if simple_index.is_empty() {
                continue;
            }
            let query_value = project(c, s);
            let mut cursor = Cursor::new(simple_index, query_value);
            if let Some((gap, pid)) = cursor.advance(simple_index) {
                let seq = state.next_seq();
                state.heap.push(Reverse(HeapItem {
                    gap: OrderedFloat(gap),
                    seq,
                    composite: c as u16,
                    simple: s as u16,
                    pid,
                    cursor,
                }));
            }
        }
    }

    let total_visit_cap = budget.max_visited.saturating_mul(l * m);
    let mut total_visits: usize = 0;

    while let Some(Reverse(item)) = state.heap.pop() {
        if state.retrieved.len() >= budget.max_retrieved || total_visits >= total_visit_cap {
            break;
        }

        let HeapItem {
            gap,
            composite,
            simple,
            pid,
            mut cursor,
            ..
        } = item;
        let c = composite as usize;
        let s = simple as usize;
        let slot = c * m + s;

        total_visits += 1;
        state.visits[slot] += 1;

        if state.visits[slot] as usize > budget.max_visited {
            // Over budget for this simple index: drop it, do not re-push.
            continue;
        }

        let in_scope = restrict.map_or(true, |set| set.contains(&pid));
        if in_scope {
            let count = state.hits[c].entry(pid).or_insert(0);
            *count += 1;
            if *count as usize == m {
                let first_time = state.retrieved.insert(pid);
                if first_time {
                    let ranking_distance = if budget.blind { gap.0 } else { distance(pid) };
                    push_finalist(
                        &mut state.topk,
                        Candidate {
                            distance: OrderedFloat(ranking_distance),
                            pid,
                        },
                        budget.top_n,
                    );
                }
            }
        }

        if let Some((next_gap, next_pid)) = cursor.advance(&composites[c][s]) {
            let seq = state.next_seq();
            state.heap.push(Reverse(HeapItem {
                gap: OrderedFloat(next_gap),
                seq,
                composite,
                simple,
                pid: next_pid,
                cursor,
            }));
        }
    }

    let mut out: Vec<Candidate> = state.topk.drain().collect();
    out.sort_unstable();
    out
}

/// Maintains a bounded max-heap of finalists: once `cap` entries are
/// held, a new candidate only enters if it beats the current worst.
fn push_finalist(heap: &mut BinaryHeap<Candidate>, candidate: Candidate, cap: usize) {
    if cap == 0 {
        return;
    }
    if heap.len() < cap {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek() {
        if candidate < *worst {
            heap.pop();
            heap.push(candidate);
        }
    }
}
