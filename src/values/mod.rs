//! Sets of scalar values labelling flat arcs.

pub mod bitset;
pub mod flat_set;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use thiserror::Error;

/// The capability required from the sets of values stored on flat arcs.
///
/// Implementations must provide structural equality and a stable hash:
/// two sets holding the same values compare and hash equal for the whole
/// lifetime of the process, as the unique tables rely on it.
pub trait ValueSet: Clone + Eq + Hash + Ord + Debug + Display {
    /// The set containing no value.
    fn empty() -> Self;

    fn is_empty(&self) -> bool;

    /// Number of values in the set.
    fn len(&self) -> u64;

    fn union(&self, other: &Self) -> Self;

    fn intersection(&self, other: &Self) -> Self;

    /// Values of `self` not in `other`.
    fn difference(&self, other: &Self) -> Self;
}

/// Overflow signal of the value layer: a user function produced a set that
/// exceeds the universe it is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value set exceeded its universe")]
pub struct TopError;
