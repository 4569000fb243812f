use std::cmp::Ordering;

use ordered_float::OrderedFloat;

/// Identifies a point by its row index in the backing point matrix.
///
/// The sentinel [`PointId::INVALID`] (`-1`) pads result rows that fall
/// short of `k`, per the matrix contract in spec §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointId(pub i32);

impl PointId {
    pub const INVALID: PointId = PointId(-1);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self.is_valid());
        self.0 as usize
    }
}

impl From<usize> for PointId {
    fn from(i: usize) -> Self {
        PointId(i as i32)
    }
}

/// A finalist in the top-k max-heap: a point id together with its true
/// distance to the query. Ordered by distance so the top-k `BinaryHeap`
/// pops the *furthest* finalist first, letting it be evicted when a
/// closer candidate arrives.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub distance: OrderedFloat<f64>,
    pub pid: PointId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.pid == other.pid
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Ties broken by ascending id, per spec §4.3's tie-breaking rule.
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.pid.cmp(&other.pid))
    }
}
