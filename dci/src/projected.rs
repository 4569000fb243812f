//! Per-direction sorted projection arrays (spec §4.2).

use crate::types::PointId;

/// One projected value paired with the point it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    pub value: f64,
    pub id: PointId,
}

/// A single simple index: `N` points projected onto one direction,
/// sorted ascending by projected value, ties broken by ascending id.
#[derive(Clone, Debug, Default)]
pub struct SimpleIndex {
    entries: Vec<Entry>,
}

impl SimpleIndex {
    /// Builds a simple index from `(value, id)` pairs produced by
    /// projecting every point onto one direction.
    pub fn build(mut entries: Vec<Entry>) -> Self {
        entries.sort_unstable_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .expect("non-finite projections are rejected before indexing")
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Standard lower-bound: the smallest index `p` such that
    /// `value[p] >= v`. May equal `self.len()` if every value is smaller.
    pub fn position_of(&self, v: f64) -> usize {
        self.entries.partition_point(|e| e.value < v)
    }

    /// Validates the sortedness invariant (spec §8, property 1). Exposed
    /// for tests; not used on the hot path.
    #[cfg(test)]
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].value <= w[1].value)
    }
}

/// The two-cursor nearest-gap walk from spec §4.2's `nth_from`.
///
/// Starts straddling `position_of(query_value)` and on each call to
/// [`Cursor::advance`] emits the not-yet-visited entry with the smallest
/// `|value - query_value|`, alternating sides as their gaps dictate.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    query_value: f64,
    left: isize,
    right: usize,
    len: usize,
}

impl Cursor {
    pub fn new(index: &SimpleIndex, query_value: f64) -> Self {
        let p = index.position_of(query_value);
        Cursor {
            query_value,
            left: p as isize - 1,
            right: p,
            len: index.len(),
        }
    }

    /// Returns the next `(|gap|, id)` pair in increasing order of gap, or
    /// `None` once every entry has been visited.
    pub fn advance(&mut self, index: &SimpleIndex) -> Option<(f64, PointId)> {
        let entries = index.entries();
        let left_gap = if self.left >= 0 {
            Some((self.query_value - entries[self.left as usize].value).abs())
        } else {
            None
        };
        let right_gap = if self.right < self.len {
            Some((entries[self.right].value - self.query_value).abs())
        } else {
            None
        };

        match (left_gap, right_gap) {
            (None, None) => None,
            (Some(lg), None) => {
                let id = entries[self.left as usize].id;
                self.left -= 1;
                Some((lg, id))
            }
            (None, Some(rg)) => {
                let id = entries[self.right].id;
                self.right += 1;
                Some((rg, id))
            }
            (Some(lg), Some(rg)) if lg <= rg => {
                let id = entries[self.left as usize].id;
                self.left -= 1;
                Some((lg, id))
            }
            (Some(_), Some(rg)) => {
                let id = entries[self.right].id;
                self.right += 1;
                Some((rg, id))
            }
        }
    }
}
