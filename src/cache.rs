//! Memoization of diagram and homomorphism operations.

use std::hash::Hash;

use fxhash::FxHashMap;

/// High bit of the packed entry state: set while the entry is being
/// constructed, so a cleanup triggered further down the call stack never
/// evicts an entry whose result is still travelling back to its caller.
const IN_USE_MASK: u32 = 1 << 31;

struct CacheEntry<R> {
    result: R,
    /// 31-bit last-access date plus the in-use flag in the high bit.
    date: u32,
}

impl<R> CacheEntry<R> {
    fn new(result: R) -> CacheEntry<R> {
        CacheEntry {
            result,
            date: IN_USE_MASK,
        }
    }

    fn date(&self) -> u32 {
        self.date & !IN_USE_MASK
    }

    fn set_date(&mut self, date: u32) {
        self.date = date | (self.date & IN_USE_MASK);
    }

    /// Back to a 'never accessed' state.
    fn reset_date(&mut self) {
        self.date &= IN_USE_MASK;
    }

    fn reset_in_use(&mut self) {
        self.date &= !IN_USE_MASK;
    }

    fn in_use(&self) -> bool {
        self.date & IN_USE_MASK != 0
    }
}

/// Counters between two cleanups.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Round {
    pub(crate) hits: usize,
    pub(crate) misses: usize,
    pub(crate) filtered: usize,
}

/// An operation cache with an LRU halving strategy.
///
/// The cache never grows past `size` entries: committing an entry at the
/// bound first evicts the least recently used half (or every evictable
/// entry, when fewer than half of them remain). Lookups stamp entries with
/// a monotonically increasing date; cleanup resets all dates so the
/// 31 bits never wrap in practice.
pub(crate) struct Cache<K, R> {
    name: &'static str,
    entries: FxHashMap<K, CacheEntry<R>>,
    max_size: usize,
    date: u32,
    rounds: Vec<Round>,
}

impl<K: Clone + Eq + Hash, R: Clone> Cache<K, R> {
    pub(crate) fn new(name: &'static str, size: usize) -> Cache<K, R> {
        assert!(size >= 2, "cache '{name}' needs room for at least two entries");
        Cache {
            name,
            entries: FxHashMap::with_capacity_and_hasher(size, Default::default()),
            max_size: size,
            date: 0,
            rounds: vec![Round::default()],
        }
    }

    /// Probe the cache; a hit refreshes the entry's date.
    pub(crate) fn get(&mut self, key: &K) -> Option<R> {
        let round = self.rounds.last_mut().expect("cache always has a round");
        match self.entries.get_mut(key) {
            Some(entry) => {
                round.hits += 1;
                self.date += 1;
                entry.set_date(self.date);
                Some(entry.result.clone())
            }
            None => {
                round.misses += 1;
                None
            }
        }
    }

    /// Commit the result of an operation that missed earlier.
    pub(crate) fn insert(&mut self, key: K, result: R) {
        let mut entry = CacheEntry::new(result);
        entry.reset_in_use();

        self.cleanup();

        self.date += 1;
        entry.set_date(self.date);
        self.entries.insert(key, entry);
    }

    /// Undo the miss counted by a failed lookup whose evaluation errored;
    /// such results are never committed.
    pub(crate) fn miss_rollback(&mut self) {
        let round = self.rounds.last_mut().expect("cache always has a round");
        round.misses = round.misses.saturating_sub(1);
    }

    /// Record an operation rejected by the should-cache filter.
    pub(crate) fn note_filtered(&mut self) {
        let round = self.rounds.last_mut().expect("cache always has a round");
        round.filtered += 1;
    }

    /// Undo the count of a filtered operation whose evaluation errored.
    pub(crate) fn filtered_rollback(&mut self) {
        let round = self.rounds.last_mut().expect("cache always has a round");
        round.filtered = round.filtered.saturating_sub(1);
    }

    /// Evict the least recently used half once the bound is reached.
    fn cleanup(&mut self) {
        if self.entries.len() < self.max_size {
            return;
        }
        tracing::debug!(cache = self.name, entries = self.entries.len(), "cleanup");
        self.rounds.push(Round::default());

        let mut evictable: Vec<(K, u32)> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.in_use())
            .map(|(key, entry)| (key.clone(), entry.date()))
            .collect();
        if evictable.is_empty() {
            // Everything is in use further up the stack, try again later.
            return;
        }

        let cut = self.max_size / 2;
        if evictable.len() <= cut {
            // Not enough evictable entries to halve the cache, drop them all.
            for (key, _) in &evictable {
                self.entries.remove(key);
            }
        } else {
            // Entries after the cut point are more recent than the median.
            evictable.select_nth_unstable_by_key(cut, |(_, date)| *date);
            for (key, _) in &evictable[..cut] {
                self.entries.remove(key);
            }
        }

        for entry in self.entries.values_mut() {
            entry.reset_date();
        }
        self.date = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.date = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of performed cleanups.
    pub(crate) fn cleanups(&self) -> usize {
        self.rounds.len() - 1
    }

    /// Counters summed over all rounds.
    pub(crate) fn total(&self) -> Round {
        self.rounds.iter().fold(Round::default(), |acc, round| Round {
            hits: acc.hits + round.hits,
            misses: acc.misses + round.misses,
            filtered: acc.filtered + round.filtered,
        })
    }
}
