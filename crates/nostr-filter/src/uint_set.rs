//! Sorted integer sets with exact matching
//!
//! Used for event kinds. Unlike `PrefixSet` there are no prefix semantics:
//! membership is plain equality over a sorted, deduplicated slice.

/// Sorted, deduplicated set of unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UintSet {
    items: Vec<u64>,
}

impl UintSet {
    /// Build a set, sorting and removing duplicates.
    pub fn new(mut items: Vec<u64>) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items }
    }

    /// Check whether `candidate` is a member.
    pub fn matches(&self, candidate: u64) -> bool {
        self.items.binary_search(&candidate).is_ok()
    }

    /// The n-th member in ascending order.
    ///
    /// Panics when `n >= len()`, as with [`crate::PrefixSet::at`].
    pub fn at(&self, n: usize) -> u64 {
        self.items[n]
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
