//! Abstract numeric domain for multi-value evaluation results
//!
//! When the multi-value engine resolves a node to several values that are all
//! numeric, it reports them as a [`NumberSet`]: either a bounded interval or
//! an explicit finite set of integers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An abstract numeric value: interval or explicit finite set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberSet {
    /// A bounded interval `[min, max]`
    Interval { min: i64, max: i64 },
    /// An explicit finite set of integers
    Concrete(BTreeSet<i64>),
}

impl NumberSet {
    pub fn interval(min: i64, max: i64) -> Self {
        NumberSet::Interval { min, max }
    }

    pub fn concrete(values: impl IntoIterator<Item = i64>) -> Self {
        NumberSet::Concrete(values.into_iter().collect())
    }

    /// Smallest value in the set, if any.
    pub fn min(&self) -> Option<i64> {
        match self {
            NumberSet::Interval { min, .. } => Some(*min),
            NumberSet::Concrete(set) => set.iter().next().copied(),
        }
    }

    /// Largest value in the set, if any.
    pub fn max(&self) -> Option<i64> {
        match self {
            NumberSet::Interval { max, .. } => Some(*max),
            NumberSet::Concrete(set) => set.iter().next_back().copied(),
        }
    }

    /// Whether `value` may be in the set.
    pub fn maybe(&self, value: i64) -> bool {
        match self {
            NumberSet::Interval { min, max } => *min <= value && value <= *max,
            NumberSet::Concrete(set) => set.contains(&value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            NumberSet::Interval { min, max } => min > max,
            NumberSet::Concrete(set) => set.is_empty(),
        }
    }
}
