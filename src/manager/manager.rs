use std::cell::{Cell, RefCell};
use std::collections::btree_map::Entry as BTreeEntry;
use std::collections::hash_map::Entry;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fxhash::FxHashMap;
use num_bigint::BigUint;
use tracing::instrument;

use crate::cache::Cache;
use crate::config::Config;
use crate::hom::{Hom, HomId, HomRef};
use crate::manager::options::SddOptions;
use crate::order::{OrderIdx, VarIdx};
use crate::sdd::{ArcTo, Node, SddData, SddId, SddRef};
use crate::values::ValueSet;

#[derive(Clone, Eq, PartialEq, Hash, Debug, Copy)]
pub(crate) enum OpKind {
    Sum,
    Intersection,
    Difference,
}

/// Key of a memoized binary diagram operation.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
struct OpKey {
    kind: OpKind,
    fst: SddId,
    snd: SddId,
}

impl OpKey {
    /// Commutative operations share an entry for both operand orders.
    fn commutative(kind: OpKind, fst: SddId, snd: SddId) -> OpKey {
        OpKey {
            kind,
            fst: fst.min(snd),
            snd: fst.max(snd),
        }
    }
}

/// Key of a memoized homomorphism application.
///
/// The order index takes part: per-level variables repeat across nesting
/// levels, so `(hom, diagram)` alone could alias two distinct positions.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub(crate) struct EvalKey {
    pub(crate) hom: HomId,
    pub(crate) sdd: SddId,
    pub(crate) order: OrderIdx,
}

/// Key of a memoized saturation rewriting.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub(crate) struct RewriteKey {
    pub(crate) hom: HomId,
    pub(crate) order: OrderIdx,
}

#[derive(Debug, Clone, Default)]
pub struct GcStatistics {
    pub nodes_collected: usize,
    pub gc_triggered: usize,
}

impl GcStatistics {
    fn collected(&mut self, nodes_collected: usize) {
        self.gc_triggered += 1;
        self.nodes_collected += nodes_collected;
    }
}

/// The context every diagram and homomorphism belongs to.
///
/// The manager owns the unique tables enforcing hash-consing and the three
/// operation caches. It is single-threaded; share it between components of
/// one program with `Rc<SddManager<_>>`. Diagrams from different managers
/// must never be mixed, as identity equality only holds within one set of
/// unique tables.
pub struct SddManager<C: Config> {
    options: SddOptions,

    // Unique tables holding every diagram node and homomorphism, keyed by
    // structure so that equal data always resolves to the same handle.
    unique_table: RefCell<FxHashMap<SddData<C>, SddRef<C>>>,
    pub(crate) hom_table: RefCell<FxHashMap<Hom<C>, HomRef<C>>>,

    // Caches all the computations.
    op_cache: RefCell<Cache<OpKey, SddRef<C>>>,
    pub(crate) eval_cache: RefCell<Cache<EvalKey, SddRef<C>>>,
    pub(crate) rewrite_cache: RefCell<Cache<RewriteKey, HomRef<C>>>,

    next_sdd_id: Cell<u32>,
    pub(crate) next_hom_id: Cell<u32>,

    zero: SddRef<C>,
    one: SddRef<C>,

    interrupted: Arc<AtomicBool>,

    gc_stats: RefCell<GcStatistics>,
}

// The terminals keep these ids for the whole computation.
pub(crate) const ZERO_SDD_IDX: SddId = SddId(0);
pub(crate) const ONE_SDD_IDX: SddId = SddId(1);

impl<C: Config> SddManager<C> {
    #[must_use]
    pub fn new(options: SddOptions) -> SddManager<C> {
        let zero = SddRef::new(ZERO_SDD_IDX, SddData::Zero);
        let one = SddRef::new(ONE_SDD_IDX, SddData::One);

        let mut unique_table =
            FxHashMap::with_capacity_and_hasher(options.unique_table_capacity, Default::default());
        unique_table.insert(SddData::Zero, zero.clone());
        unique_table.insert(SddData::One, one.clone());

        SddManager {
            unique_table: RefCell::new(unique_table),
            hom_table: RefCell::new(FxHashMap::default()),
            op_cache: RefCell::new(Cache::new("sdd", options.sdd_cache_size)),
            eval_cache: RefCell::new(Cache::new("hom", options.hom_cache_size)),
            rewrite_cache: RefCell::new(Cache::new("rewrite", options.rewrite_cache_size)),
            next_sdd_id: Cell::new(2), // Account for the terminals created above.
            next_hom_id: Cell::new(0),
            zero,
            one,
            interrupted: Arc::new(AtomicBool::new(false)),
            gc_stats: RefCell::new(GcStatistics::default()),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SddOptions {
        &self.options
    }

    /// The empty set `|0|`.
    #[must_use]
    pub fn zero(&self) -> SddRef<C> {
        self.zero.clone()
    }

    /// The set `|1|` containing only the empty tuple.
    #[must_use]
    pub fn one(&self) -> SddRef<C> {
        self.one.clone()
    }

    /// Return the canonical handle for `data`, allocating it on first sight.
    pub(crate) fn unify(&self, data: SddData<C>) -> SddRef<C> {
        let mut table = self.unique_table.borrow_mut();
        match table.entry(data) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let id = SddId(self.next_sdd_id.get());
                self.next_sdd_id.set(id.0 + 1);
                let sdd = SddRef::new(id, entry.key().clone());
                entry.insert(sdd.clone());
                sdd
            }
        }
    }

    /// Build the diagram `{ v.t | v in values, t in successor }`.
    ///
    /// Returns `|0|` when `values` is empty or `successor` is `|0|`.
    #[must_use]
    pub fn flat(&self, variable: VarIdx, values: &C::Values, successor: &SddRef<C>) -> SddRef<C> {
        if values.is_empty() || successor.is_zero() {
            return self.zero();
        }
        self.unify(SddData::Flat(Node {
            variable,
            arcs: Box::new([ArcTo {
                valuation: values.clone(),
                successor: successor.clone(),
            }]),
        }))
    }

    /// Build the diagram `{ v.t | v in nested, t in successor }` where the
    /// valuation is itself a diagram.
    ///
    /// Returns `|0|` when `nested` or `successor` is `|0|`.
    #[must_use]
    pub fn hierarchical(
        &self,
        variable: VarIdx,
        nested: &SddRef<C>,
        successor: &SddRef<C>,
    ) -> SddRef<C> {
        if nested.is_zero() || successor.is_zero() {
            return self.zero();
        }
        self.unify(SddData::Hierarchical(Node {
            variable,
            arcs: Box::new([ArcTo {
                valuation: nested.clone(),
                successor: successor.clone(),
            }]),
        }))
    }

    /// Build a flat node from an arbitrary arc list, canonicalizing it
    /// through the square union. Arcs with empty valuations or `|0|`
    /// successors are dropped; an empty result is `|0|`.
    #[must_use]
    pub fn from_flat_alpha(
        &self,
        variable: VarIdx,
        arcs: Vec<(C::Values, SddRef<C>)>,
    ) -> SddRef<C> {
        self.square_union(&FlatOps, variable, arcs)
    }

    /// Hierarchical counterpart of [`SddManager::from_flat_alpha`].
    #[must_use]
    pub fn from_hierarchical_alpha(
        &self,
        variable: VarIdx,
        arcs: Vec<(SddRef<C>, SddRef<C>)>,
    ) -> SddRef<C> {
        self.square_union(&HierOps, variable, arcs)
    }

    /// Union of the two sets.
    ///
    /// # Panics
    ///
    /// Panics when the operands are not at the same level: both nodes of the
    /// same kind at the same variable, or equal terminals.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::TRACE)]
    pub fn sum(&self, fst: &SddRef<C>, snd: &SddRef<C>) -> SddRef<C> {
        if fst == snd {
            return fst.clone();
        }
        if fst.is_zero() {
            return snd.clone();
        }
        if snd.is_zero() {
            return fst.clone();
        }

        let key = OpKey::commutative(OpKind::Sum, fst.id(), snd.id());
        if let Some(hit) = self.op_cache.borrow_mut().get(&key) {
            return hit;
        }

        let result = match (fst.data(), snd.data()) {
            (SddData::Flat(lhs), SddData::Flat(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.sum_nodes(&FlatOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            (SddData::Hierarchical(lhs), SddData::Hierarchical(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.sum_nodes(&HierOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            _ => panic!(
                "sum applied to diagrams at different levels ({} and {})",
                fst.data().name(),
                snd.data().name()
            ),
        };

        self.op_cache.borrow_mut().insert(key, result.clone());
        result
    }

    /// Intersection of the two sets.
    ///
    /// # Panics
    ///
    /// Panics when two nodes are not at the same level.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::TRACE)]
    pub fn intersection(&self, fst: &SddRef<C>, snd: &SddRef<C>) -> SddRef<C> {
        if fst == snd {
            return fst.clone();
        }
        if fst.is_zero() || snd.is_zero() {
            return self.zero();
        }

        let key = OpKey::commutative(OpKind::Intersection, fst.id(), snd.id());
        if let Some(hit) = self.op_cache.borrow_mut().get(&key) {
            return hit;
        }

        let result = match (fst.data(), snd.data()) {
            (SddData::Flat(lhs), SddData::Flat(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.intersection_nodes(&FlatOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            (SddData::Hierarchical(lhs), SddData::Hierarchical(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.intersection_nodes(&HierOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            _ => panic!(
                "intersection applied to diagrams at different levels ({} and {})",
                fst.data().name(),
                snd.data().name()
            ),
        };

        self.op_cache.borrow_mut().insert(key, result.clone());
        result
    }

    /// Values of `fst` not in `snd`.
    ///
    /// # Panics
    ///
    /// Panics when two nodes are not at the same level.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::TRACE)]
    pub fn difference(&self, fst: &SddRef<C>, snd: &SddRef<C>) -> SddRef<C> {
        if fst == snd || fst.is_zero() {
            return self.zero();
        }
        if snd.is_zero() {
            return fst.clone();
        }

        let key = OpKey {
            kind: OpKind::Difference,
            fst: fst.id(),
            snd: snd.id(),
        };
        if let Some(hit) = self.op_cache.borrow_mut().get(&key) {
            return hit;
        }

        let result = match (fst.data(), snd.data()) {
            (SddData::Flat(lhs), SddData::Flat(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.difference_nodes(&FlatOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            (SddData::Hierarchical(lhs), SddData::Hierarchical(rhs)) => {
                Self::assert_same_level(fst, snd, lhs.variable, rhs.variable);
                self.difference_nodes(&HierOps, lhs.variable, &lhs.arcs, &rhs.arcs)
            }
            _ => panic!(
                "difference applied to diagrams at different levels ({} and {})",
                fst.data().name(),
                snd.data().name()
            ),
        };

        self.op_cache.borrow_mut().insert(key, result.clone());
        result
    }

    /// Union of arbitrarily many diagrams; the union of none is `|0|`.
    #[must_use]
    pub fn sum_many(&self, operands: impl IntoIterator<Item = SddRef<C>>) -> SddRef<C> {
        let mut operands: Vec<_> = operands.into_iter().filter(|s| !s.is_zero()).collect();
        operands.sort();
        operands.dedup();

        let mut result = self.zero();
        for operand in operands {
            result = self.sum(&result, &operand);
        }
        result
    }

    fn assert_same_level(fst: &SddRef<C>, snd: &SddRef<C>, lhs: VarIdx, rhs: VarIdx) {
        assert!(
            lhs == rhs,
            "operation applied to nodes at different variables ({lhs} and {rhs}, \
             ids {} and {})",
            fst.id(),
            snd.id()
        );
    }

    /// Number of tuples in the represented set.
    #[must_use]
    pub fn count(&self, sdd: &SddRef<C>) -> BigUint {
        fn rec<C: Config>(sdd: &SddRef<C>, memo: &mut FxHashMap<SddId, BigUint>) -> BigUint {
            if let Some(cached) = memo.get(&sdd.id()) {
                return cached.clone();
            }
            let result = match sdd.data() {
                SddData::Zero => BigUint::from(0_u32),
                SddData::One => BigUint::from(1_u32),
                SddData::Flat(node) => node
                    .arcs
                    .iter()
                    .map(|arc| BigUint::from(arc.valuation.len()) * rec(&arc.successor, memo))
                    .sum(),
                SddData::Hierarchical(node) => node
                    .arcs
                    .iter()
                    .map(|arc| rec(&arc.valuation, memo) * rec(&arc.successor, memo))
                    .sum(),
            };
            memo.insert(sdd.id(), result.clone());
            result
        }

        rec(sdd, &mut FxHashMap::default())
    }

    /// Reclaim every node no handle outside the unique table points to.
    ///
    /// Nodes held by a user handle, by a live node, or by a live cache entry
    /// survive; collection cascades through the arcs of removed nodes.
    #[instrument(skip_all, level = tracing::Level::DEBUG)]
    pub fn collect_garbage(&self) {
        let mut collected = 0;
        loop {
            let dead: Vec<SddData<C>> = self
                .unique_table
                .borrow()
                .iter()
                // The only reference left is the unique table's own handle:
                // no user handle, no parent arc, no cache entry.
                .filter(|(_, sdd)| !sdd.is_terminal() && sdd.strong_count() == 1)
                .map(|(data, _)| data.clone())
                .collect();
            if dead.is_empty() {
                break;
            }

            collected += dead.len();
            let mut table = self.unique_table.borrow_mut();
            for data in &dead {
                table.remove(data);
            }
        }

        tracing::debug!(collected, "collected garbage");
        self.gc_stats.borrow_mut().collected(collected);
    }

    #[must_use]
    pub fn gc_statistics(&self) -> GcStatistics {
        self.gc_stats.borrow().clone()
    }

    /// Drop every memoized result. Correctness is unaffected: hash-consing
    /// guarantees recomputed operations return the same handles.
    pub fn clear_caches(&self) {
        self.op_cache.borrow_mut().clear();
        self.eval_cache.borrow_mut().clear();
        self.rewrite_cache.borrow_mut().clear();
    }

    /// Flag aborting in-flight evaluations. Set it (possibly from a signal
    /// handler) to make every pending [`SddManager::evaluate`] unwind with
    /// an interrupt error; the manager stays usable afterwards.
    #[must_use]
    pub fn interrupter(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::Relaxed);
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.unique_table.borrow().len()
    }

    // -- Generic node algebra -----------------------------------------------
    //
    // Flat and hierarchical nodes run the same algorithms; only the
    // valuation operations differ.

    /// Canonicalize an arc list: drop dead arcs, merge arcs sharing a
    /// successor, merge arcs sharing a valuation, and emit the node (or a
    /// terminal) through the unique table.
    pub(crate) fn square_union<V, O>(
        &self,
        ops: &O,
        variable: VarIdx,
        arcs: Vec<(V, SddRef<C>)>,
    ) -> SddRef<C>
    where
        V: Clone + Eq + Hash + Ord,
        O: ValuationOps<C, V>,
    {
        let mut arcs: Vec<(V, SddRef<C>)> = arcs
            .into_iter()
            .filter(|(valuation, successor)| !ops.is_empty(valuation) && !successor.is_zero())
            .collect();
        if arcs.is_empty() {
            return self.zero();
        }

        loop {
            // Arcs leading to the same place hold one valuation.
            let mut by_successor: BTreeMap<SddRef<C>, V> = BTreeMap::new();
            for (valuation, successor) in arcs {
                match by_successor.entry(successor) {
                    BTreeEntry::Occupied(mut entry) => {
                        let merged = ops.union(self, entry.get(), &valuation);
                        *entry.get_mut() = merged;
                    }
                    BTreeEntry::Vacant(entry) => {
                        entry.insert(valuation);
                    }
                }
            }

            // Arcs labelled the same lead to one place.
            let mut by_valuation: BTreeMap<V, Vec<SddRef<C>>> = BTreeMap::new();
            for (successor, valuation) in by_successor {
                by_valuation.entry(valuation).or_default().push(successor);
            }
            let merged_successors = by_valuation.values().any(|succs| succs.len() > 1);

            arcs = by_valuation
                .into_iter()
                .map(|(valuation, successors)| (valuation, self.sum_many(successors)))
                .collect();

            // Merging successors may have produced equal arcs again.
            if !merged_successors {
                assert!(
                    Self::successors_uniform(&arcs),
                    "node built with successors at different levels"
                );
                return ops.make(self, variable, arcs);
            }
        }
    }

    fn successors_uniform<V>(arcs: &[(V, SddRef<C>)]) -> bool {
        let mut iter = arcs.iter();
        let Some((_, first)) = iter.next() else {
            return true;
        };
        let level = (first.data().name(), first.variable());
        iter.all(|(_, successor)| (successor.data().name(), successor.variable()) == level)
    }

    fn sum_nodes<V, O>(
        &self,
        ops: &O,
        variable: VarIdx,
        lhs: &[ArcTo<C, V>],
        rhs: &[ArcTo<C, V>],
    ) -> SddRef<C>
    where
        V: Clone + Eq + Hash + Ord,
        O: ValuationOps<C, V>,
    {
        let mut alpha = Vec::with_capacity(lhs.len() + rhs.len());

        // Refine both partitions: shared pieces point at the union of the
        // two successors, leftovers keep theirs.
        for l in lhs {
            let mut remainder = l.valuation.clone();
            for r in rhs {
                if ops.is_empty(&remainder) {
                    break;
                }
                let common = ops.intersection(self, &remainder, &r.valuation);
                if ops.is_empty(&common) {
                    continue;
                }
                remainder = ops.difference(self, &remainder, &common);
                alpha.push((common, self.sum(&l.successor, &r.successor)));
            }
            if !ops.is_empty(&remainder) {
                alpha.push((remainder, l.successor.clone()));
            }
        }
        for r in rhs {
            let mut remainder = r.valuation.clone();
            for l in lhs {
                if ops.is_empty(&remainder) {
                    break;
                }
                remainder = ops.difference(self, &remainder, &l.valuation);
            }
            if !ops.is_empty(&remainder) {
                alpha.push((remainder, r.successor.clone()));
            }
        }

        self.square_union(ops, variable, alpha)
    }

    fn intersection_nodes<V, O>(
        &self,
        ops: &O,
        variable: VarIdx,
        lhs: &[ArcTo<C, V>],
        rhs: &[ArcTo<C, V>],
    ) -> SddRef<C>
    where
        V: Clone + Eq + Hash + Ord,
        O: ValuationOps<C, V>,
    {
        let mut alpha = Vec::new();
        for l in lhs {
            for r in rhs {
                let common = ops.intersection(self, &l.valuation, &r.valuation);
                if ops.is_empty(&common) {
                    continue;
                }
                let successor = self.intersection(&l.successor, &r.successor);
                if !successor.is_zero() {
                    alpha.push((common, successor));
                }
            }
        }
        self.square_union(ops, variable, alpha)
    }

    fn difference_nodes<V, O>(
        &self,
        ops: &O,
        variable: VarIdx,
        lhs: &[ArcTo<C, V>],
        rhs: &[ArcTo<C, V>],
    ) -> SddRef<C>
    where
        V: Clone + Eq + Hash + Ord,
        O: ValuationOps<C, V>,
    {
        let mut alpha = Vec::new();
        for l in lhs {
            let mut remainder = l.valuation.clone();
            for r in rhs {
                if ops.is_empty(&remainder) {
                    break;
                }
                let common = ops.intersection(self, &remainder, &r.valuation);
                if ops.is_empty(&common) {
                    continue;
                }
                remainder = ops.difference(self, &remainder, &common);
                let successor = self.difference(&l.successor, &r.successor);
                if !successor.is_zero() {
                    alpha.push((common, successor));
                }
            }
            if !ops.is_empty(&remainder) {
                alpha.push((remainder, l.successor.clone()));
            }
        }
        self.square_union(ops, variable, alpha)
    }
}

/// The valuation operations a node algorithm needs, abstracting over flat
/// and hierarchical arcs.
pub(crate) trait ValuationOps<C: Config, V> {
    fn union(&self, manager: &SddManager<C>, fst: &V, snd: &V) -> V;
    fn intersection(&self, manager: &SddManager<C>, fst: &V, snd: &V) -> V;
    fn difference(&self, manager: &SddManager<C>, fst: &V, snd: &V) -> V;
    fn is_empty(&self, valuation: &V) -> bool;
    fn make(&self, manager: &SddManager<C>, variable: VarIdx, arcs: Vec<(V, SddRef<C>)>)
        -> SddRef<C>;
}

/// Arc valuations are sets of values.
pub(crate) struct FlatOps;

impl<C: Config> ValuationOps<C, C::Values> for FlatOps {
    fn union(&self, _manager: &SddManager<C>, fst: &C::Values, snd: &C::Values) -> C::Values {
        fst.union(snd)
    }

    fn intersection(
        &self,
        _manager: &SddManager<C>,
        fst: &C::Values,
        snd: &C::Values,
    ) -> C::Values {
        fst.intersection(snd)
    }

    fn difference(&self, _manager: &SddManager<C>, fst: &C::Values, snd: &C::Values) -> C::Values {
        fst.difference(snd)
    }

    fn is_empty(&self, valuation: &C::Values) -> bool {
        valuation.is_empty()
    }

    fn make(
        &self,
        manager: &SddManager<C>,
        variable: VarIdx,
        arcs: Vec<(C::Values, SddRef<C>)>,
    ) -> SddRef<C> {
        manager.unify(SddData::Flat(Node {
            variable,
            arcs: arcs
                .into_iter()
                .map(|(valuation, successor)| ArcTo {
                    valuation,
                    successor,
                })
                .collect(),
        }))
    }
}

/// Arc valuations are nested diagrams.
pub(crate) struct HierOps;

impl<C: Config> ValuationOps<C, SddRef<C>> for HierOps {
    fn union(&self, manager: &SddManager<C>, fst: &SddRef<C>, snd: &SddRef<C>) -> SddRef<C> {
        manager.sum(fst, snd)
    }

    fn intersection(
        &self,
        manager: &SddManager<C>,
        fst: &SddRef<C>,
        snd: &SddRef<C>,
    ) -> SddRef<C> {
        manager.intersection(fst, snd)
    }

    fn difference(&self, manager: &SddManager<C>, fst: &SddRef<C>, snd: &SddRef<C>) -> SddRef<C> {
        manager.difference(fst, snd)
    }

    fn is_empty(&self, valuation: &SddRef<C>) -> bool {
        valuation.is_zero()
    }

    fn make(
        &self,
        manager: &SddManager<C>,
        variable: VarIdx,
        arcs: Vec<(SddRef<C>, SddRef<C>)>,
    ) -> SddRef<C> {
        manager.unify(SddData::Hierarchical(Node {
            variable,
            arcs: arcs
                .into_iter()
                .map(|(valuation, successor)| ArcTo {
                    valuation,
                    successor,
                })
                .collect(),
        }))
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use num_bigint::BigUint;

    use crate::flat_set;
    use crate::manager::{options::SddOptions, SddManager};
    use crate::order::{test::Conf, VarIdx};

    fn manager() -> SddManager<Conf> {
        SddManager::new(SddOptions::default())
    }

    #[test]
    fn canonicity() {
        let manager = manager();
        let one = manager.one();

        let fst = manager.flat(VarIdx(0), &flat_set![0, 1], &one);
        let snd = manager.flat(VarIdx(0), &flat_set![0, 1], &one);

        assert_eq!(fst, snd);
        assert!(Rc::ptr_eq(&fst.0, &snd.0));

        let other = manager.flat(VarIdx(0), &flat_set![0, 2], &one);
        assert_ne!(fst, other);
    }

    #[test]
    fn dead_arcs_collapse_to_zero() {
        let manager = manager();

        assert!(manager.flat(VarIdx(0), &flat_set![], &manager.one()).is_zero());
        assert!(manager
            .flat(VarIdx(0), &flat_set![0], &manager.zero())
            .is_zero());
        assert!(manager
            .hierarchical(VarIdx(0), &manager.zero(), &manager.one())
            .is_zero());
        assert!(manager.from_flat_alpha(VarIdx(0), vec![]).is_zero());
    }

    #[test]
    fn square_union_merges_shared_successors() {
        let manager = manager();
        let one = manager.one();

        let merged = manager.from_flat_alpha(
            VarIdx(0),
            vec![(flat_set![0], one.clone()), (flat_set![1], one.clone())],
        );
        let direct = manager.flat(VarIdx(0), &flat_set![0, 1], &one);

        assert_eq!(merged, direct);
    }

    #[test]
    fn square_union_merges_shared_valuations() {
        let manager = manager();
        let one = manager.one();

        // Two levels: valuations at variable 0, successors at variable 1.
        let tail_fst = manager.flat(VarIdx(1), &flat_set![7], &one);
        let tail_snd = manager.flat(VarIdx(1), &flat_set![8], &one);

        let merged = manager.from_flat_alpha(
            VarIdx(0),
            vec![
                (flat_set![0], tail_fst.clone()),
                (flat_set![0], tail_snd.clone()),
            ],
        );
        let direct = manager.flat(VarIdx(0), &flat_set![0], &manager.sum(&tail_fst, &tail_snd));

        assert_eq!(merged, direct);
    }

    #[test]
    fn count() {
        let manager = manager();
        let one = manager.one();

        assert_eq!(manager.count(&manager.zero()), BigUint::from(0_u32));
        assert_eq!(manager.count(&one), BigUint::from(1_u32));

        let tail = manager.flat(VarIdx(1), &flat_set![0, 1, 2], &one);
        let sdd = manager.flat(VarIdx(0), &flat_set![0, 1], &tail);
        assert_eq!(manager.count(&sdd), BigUint::from(6_u32));

        let nested = manager.hierarchical(VarIdx(0), &sdd, &one);
        assert_eq!(manager.count(&nested), BigUint::from(6_u32));
    }

    #[test]
    fn garbage_collection() {
        let manager = manager();
        let one = manager.one();

        let kept = manager.flat(VarIdx(0), &flat_set![0], &one);
        {
            let _dropped = manager.flat(VarIdx(0), &flat_set![1], &one);
        }

        // Caches pin their results; drop them so only user handles count.
        manager.clear_caches();
        let before = manager.node_count();
        manager.collect_garbage();
        let after = manager.node_count();

        assert_eq!(before - after, 1);
        assert_eq!(manager.gc_statistics().nodes_collected, 1);

        // The kept diagram is untouched and still canonical.
        let again = manager.flat(VarIdx(0), &flat_set![0], &one);
        assert_eq!(again, kept);
    }

    #[test]
    fn garbage_collection_cascades() {
        let manager = manager();
        let one = manager.one();

        {
            let tail = manager.flat(VarIdx(1), &flat_set![7], &one);
            let _head = manager.flat(VarIdx(0), &flat_set![0], &tail);
        }

        manager.clear_caches();
        let before = manager.node_count();
        manager.collect_garbage();
        assert_eq!(before - manager.node_count(), 2);
    }

    #[test]
    #[should_panic(expected = "different levels")]
    fn level_mismatch() {
        let manager = manager();
        let node = manager.flat(VarIdx(0), &flat_set![0], &manager.one());
        let _ = manager.sum(&manager.one(), &node);
    }
}
