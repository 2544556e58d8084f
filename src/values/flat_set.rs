use std::collections::BTreeSet;
use std::fmt::Display;

use crate::values::ValueSet;

/// Construct a [`FlatSet`] from a list of values.
#[macro_export]
macro_rules! flat_set {
    ( $( $value:expr ),* $(,)? ) => {
        {
            #[allow(unused_mut)]
            let mut set = $crate::values::flat_set::FlatSet::new();
            $( set.insert($value); )*
            set
        }
    };
}

/// A sorted set of unsigned scalar values.
///
/// This is the general-purpose valuation: unbounded universe, values kept in
/// a [`BTreeSet`] so that equal sets always hash and compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct FlatSet(BTreeSet<u32>);

impl FlatSet {
    #[must_use]
    pub fn new() -> FlatSet {
        FlatSet(BTreeSet::new())
    }

    pub fn insert(&mut self, value: u32) {
        self.0.insert(value);
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        self.0.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// The set with every value shifted by `amount`, saturating at `u32::MAX`.
    #[must_use]
    pub fn shifted(&self, amount: u32) -> FlatSet {
        FlatSet(self.0.iter().map(|v| v.saturating_add(amount)).collect())
    }
}

impl FromIterator<u32> for FlatSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        FlatSet(iter.into_iter().collect())
    }
}

impl ValueSet for FlatSet {
    fn empty() -> Self {
        FlatSet::new()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn len(&self) -> u64 {
        self.0.len() as u64
    }

    fn union(&self, other: &Self) -> Self {
        FlatSet(self.0.union(&other.0).copied().collect())
    }

    fn intersection(&self, other: &Self) -> Self {
        FlatSet(self.0.intersection(&other.0).copied().collect())
    }

    fn difference(&self, other: &Self) -> Self {
        FlatSet(self.0.difference(&other.0).copied().collect())
    }
}

impl Display for FlatSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::FlatSet;
    use crate::values::ValueSet;

    #[test]
    fn operations() {
        let fst = flat_set![0, 1, 2];
        let snd = flat_set![2, 3];

        assert_eq!(fst.union(&snd), flat_set![0, 1, 2, 3]);
        assert_eq!(fst.intersection(&snd), flat_set![2]);
        assert_eq!(fst.difference(&snd), flat_set![0, 1]);
        assert_eq!(snd.difference(&fst), flat_set![3]);

        assert!(FlatSet::empty().is_empty());
        assert_eq!(fst.len(), 3);
        assert_eq!(format!("{fst}"), "{0,1,2}");
    }
}
