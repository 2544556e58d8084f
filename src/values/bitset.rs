use std::fmt::Display;
use std::ops::{BitAnd, BitOr, Not};

use bitvec::prelude::*;

use crate::values::ValueSet;

/// A set of small unsigned values backed by a bit vector.
///
/// Suited to dense universes such as Petri net markings bounded by a few
/// hundred tokens. The backing vector is kept trimmed of trailing zero bits
/// so that equal sets are bit-for-bit identical regardless of how they were
/// produced, which the unique tables rely on.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct BitSet {
    bits: BitVec,
}

impl BitSet {
    #[must_use]
    pub fn new() -> BitSet {
        BitSet { bits: BitVec::new() }
    }

    pub fn insert(&mut self, value: u32) {
        let value = value as usize;
        if value >= self.bits.len() {
            self.bits.resize(value + 1, false);
        }
        self.bits.set(value, true);
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        self.bits.get(value as usize).is_some_and(|bit| *bit)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter_ones().map(|v| v as u32)
    }

    /// Drop trailing zero bits so structural equality is canonical.
    fn trim(mut bits: BitVec) -> BitSet {
        while bits.last().is_some_and(|bit| !*bit) {
            bits.pop();
        }
        BitSet { bits }
    }

    /// Align `self`'s backing vector to `len` bits.
    fn widened(&self, len: usize) -> BitVec {
        let mut bits = self.bits.clone();
        bits.resize(len, false);
        bits
    }
}

impl FromIterator<u32> for BitSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = BitSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl ValueSet for BitSet {
    fn empty() -> Self {
        BitSet::new()
    }

    fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    fn len(&self) -> u64 {
        self.bits.count_ones() as u64
    }

    fn union(&self, other: &Self) -> Self {
        let len = self.bits.len().max(other.bits.len());
        BitSet::trim(self.widened(len).bitor(&other.widened(len)))
    }

    fn intersection(&self, other: &Self) -> Self {
        let len = self.bits.len().max(other.bits.len());
        BitSet::trim(self.widened(len).bitand(&other.widened(len)))
    }

    fn difference(&self, other: &Self) -> Self {
        let len = self.bits.len().max(other.bits.len());
        BitSet::trim(self.widened(len).bitand(&other.widened(len).not()))
    }
}

impl Display for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.bits.iter_ones().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}
