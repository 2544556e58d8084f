use std::collections::hash_map::Entry;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use derive_more::derive::{Add, AddAssign, From};

use crate::config::Config;
use crate::hom::inductive::{Inductive, InductiveRef};
use crate::hom::values_function::{ValuesFunction, ValuesFunctionRef};
use crate::manager::SddManager;
use crate::order::{Order, VarIdx};
use crate::sdd::SddRef;

#[derive(Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Clone, Copy, Add, AddAssign, From)]
pub struct HomId(pub u32);

impl Display for HomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HomId({})", self.0)
    }
}

/// What a cons homomorphism prepends: a value set for a flat level, a
/// nested diagram for a hierarchical one.
pub enum Head<C: Config> {
    Values(C::Values),
    Sdd(SddRef<C>),
}

impl<C: Config> Clone for Head<C> {
    fn clone(&self) -> Self {
        match self {
            Head::Values(values) => Head::Values(values.clone()),
            Head::Sdd(sdd) => Head::Sdd(sdd.clone()),
        }
    }
}

impl<C: Config> PartialEq for Head<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Head::Values(lhs), Head::Values(rhs)) => lhs == rhs,
            (Head::Sdd(lhs), Head::Sdd(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl<C: Config> Eq for Head<C> {}

impl<C: Config> Hash for Head<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Head::Values(values) => {
                state.write_u8(0);
                values.hash(state);
            }
            Head::Sdd(sdd) => {
                state.write_u8(1);
                sdd.hash(state);
            }
        }
    }
}

impl<C: Config> Display for Head<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Head::Values(values) => write!(f, "{values}"),
            Head::Sdd(sdd) => write!(f, "{sdd}"),
        }
    }
}

/// The closed sum of homomorphism shapes. The saturation variants only
/// arise from [`SddManager::rewrite`].
pub(crate) enum Hom<C: Config> {
    Identity,
    Constant(SddRef<C>),
    Composition {
        outer: HomRef<C>,
        inner: HomRef<C>,
    },
    /// Sorted, deduplicated, with nested sums flattened away.
    Sum(Box<[HomRef<C>]>),
    Fixpoint(HomRef<C>),
    Inductive(InductiveRef<C>),
    Local {
        identifier: C::Identifier,
        hom: HomRef<C>,
    },
    ValuesFunction {
        identifier: C::Identifier,
        fun: ValuesFunctionRef<C>,
    },
    Cons {
        variable: VarIdx,
        identifier: C::Identifier,
        head: Head<C>,
        next: HomRef<C>,
    },
    SaturationSum {
        variable: VarIdx,
        f: Option<HomRef<C>>,
        g: Box<[HomRef<C>]>,
        l: Option<HomRef<C>>,
    },
    SaturationFixpoint {
        variable: VarIdx,
        f: Option<HomRef<C>>,
        g: Box<[HomRef<C>]>,
        l: Option<HomRef<C>>,
    },
}

impl<C: Config> Clone for Hom<C> {
    fn clone(&self) -> Self {
        match self {
            Hom::Identity => Hom::Identity,
            Hom::Constant(sdd) => Hom::Constant(sdd.clone()),
            Hom::Composition { outer, inner } => Hom::Composition {
                outer: outer.clone(),
                inner: inner.clone(),
            },
            Hom::Sum(operands) => Hom::Sum(operands.clone()),
            Hom::Fixpoint(hom) => Hom::Fixpoint(hom.clone()),
            Hom::Inductive(user) => Hom::Inductive(user.clone()),
            Hom::Local { identifier, hom } => Hom::Local {
                identifier: identifier.clone(),
                hom: hom.clone(),
            },
            Hom::ValuesFunction { identifier, fun } => Hom::ValuesFunction {
                identifier: identifier.clone(),
                fun: fun.clone(),
            },
            Hom::Cons {
                variable,
                identifier,
                head,
                next,
            } => Hom::Cons {
                variable: *variable,
                identifier: identifier.clone(),
                head: head.clone(),
                next: next.clone(),
            },
            Hom::SaturationSum { variable, f, g, l } => Hom::SaturationSum {
                variable: *variable,
                f: f.clone(),
                g: g.clone(),
                l: l.clone(),
            },
            Hom::SaturationFixpoint { variable, f, g, l } => Hom::SaturationFixpoint {
                variable: *variable,
                f: f.clone(),
                g: g.clone(),
                l: l.clone(),
            },
        }
    }
}

impl<C: Config> PartialEq for Hom<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Hom::Identity, Hom::Identity) => true,
            (Hom::Constant(lhs), Hom::Constant(rhs)) => lhs == rhs,
            (
                Hom::Composition {
                    outer: lo,
                    inner: li,
                },
                Hom::Composition {
                    outer: ro,
                    inner: ri,
                },
            ) => lo == ro && li == ri,
            (Hom::Sum(lhs), Hom::Sum(rhs)) => lhs == rhs,
            (Hom::Fixpoint(lhs), Hom::Fixpoint(rhs)) => lhs == rhs,
            (Hom::Inductive(lhs), Hom::Inductive(rhs)) => lhs == rhs,
            (
                Hom::Local {
                    identifier: li,
                    hom: lh,
                },
                Hom::Local {
                    identifier: ri,
                    hom: rh,
                },
            ) => li == ri && lh == rh,
            (
                Hom::ValuesFunction {
                    identifier: li,
                    fun: lf,
                },
                Hom::ValuesFunction {
                    identifier: ri,
                    fun: rf,
                },
            ) => li == ri && lf == rf,
            (
                Hom::Cons {
                    identifier: li,
                    head: lh,
                    next: ln,
                    ..
                },
                Hom::Cons {
                    identifier: ri,
                    head: rh,
                    next: rn,
                    ..
                },
            ) => li == ri && lh == rh && ln == rn,
            (
                Hom::SaturationSum {
                    variable: lv,
                    f: lf,
                    g: lg,
                    l: ll,
                },
                Hom::SaturationSum {
                    variable: rv,
                    f: rf,
                    g: rg,
                    l: rl,
                },
            )
            | (
                Hom::SaturationFixpoint {
                    variable: lv,
                    f: lf,
                    g: lg,
                    l: ll,
                },
                Hom::SaturationFixpoint {
                    variable: rv,
                    f: rf,
                    g: rg,
                    l: rl,
                },
            ) => lv == rv && lf == rf && lg == rg && ll == rl,
            _ => false,
        }
    }
}

impl<C: Config> Eq for Hom<C> {}

impl<C: Config> Hash for Hom<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Hom::Identity => state.write_u8(0),
            Hom::Constant(sdd) => {
                state.write_u8(1);
                sdd.hash(state);
            }
            Hom::Composition { outer, inner } => {
                state.write_u8(2);
                outer.hash(state);
                inner.hash(state);
            }
            Hom::Sum(operands) => {
                state.write_u8(3);
                operands.hash(state);
            }
            Hom::Fixpoint(hom) => {
                state.write_u8(4);
                hom.hash(state);
            }
            Hom::Inductive(user) => {
                state.write_u8(5);
                user.hash(state);
            }
            Hom::Local { identifier, hom } => {
                state.write_u8(6);
                identifier.hash(state);
                hom.hash(state);
            }
            Hom::ValuesFunction { identifier, fun } => {
                state.write_u8(7);
                identifier.hash(state);
                fun.hash(state);
            }
            Hom::Cons {
                identifier,
                head,
                next,
                ..
            } => {
                state.write_u8(8);
                identifier.hash(state);
                head.hash(state);
                next.hash(state);
            }
            Hom::SaturationSum { variable, f, g, l } => {
                state.write_u8(9);
                variable.hash(state);
                f.hash(state);
                g.hash(state);
                l.hash(state);
            }
            Hom::SaturationFixpoint { variable, f, g, l } => {
                state.write_u8(10);
                variable.hash(state);
                f.hash(state);
                g.hash(state);
                l.hash(state);
            }
        }
    }
}

pub(crate) struct HomNode<C: Config> {
    id: HomId,
    data: Hom<C>,
}

/// A hash-consed homomorphism handle; cheap to clone, compares by identity.
pub struct HomRef<C: Config>(Rc<HomNode<C>>);

impl<C: Config> Clone for HomRef<C> {
    fn clone(&self) -> Self {
        HomRef(self.0.clone())
    }
}

impl<C: Config> PartialEq for HomRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<C: Config> Eq for HomRef<C> {}

impl<C: Config> Ord for HomRef<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl<C: Config> PartialOrd for HomRef<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Config> Hash for HomRef<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<C: Config> HomRef<C> {
    fn new(id: HomId, data: Hom<C>) -> Self {
        HomRef(Rc::new(HomNode { id, data }))
    }

    #[must_use]
    pub fn id(&self) -> HomId {
        self.0.id
    }

    pub(crate) fn data(&self) -> &Hom<C> {
        &self.0.data
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self.0.data, Hom::Identity)
    }

    /// Whether this homomorphism is a no-op at the head of `order` and may
    /// be pushed under a node at that level unchanged.
    #[must_use]
    pub fn skip(&self, order: &Order<C>) -> bool {
        match self.data() {
            Hom::Identity => true,
            Hom::Constant(..) | Hom::Cons { .. } => false,
            Hom::Composition { outer, inner } => outer.skip(order) && inner.skip(order),
            Hom::Sum(operands) => operands.iter().all(|hom| hom.skip(order)),
            Hom::Fixpoint(hom) => hom.skip(order),
            Hom::Inductive(user) => user.0.skip(order.identifier()),
            Hom::Local { identifier, .. } | Hom::ValuesFunction { identifier, .. } => {
                order.identifier() != identifier
            }
            Hom::SaturationSum { variable, .. } | Hom::SaturationFixpoint { variable, .. } => {
                order.variable() != *variable
            }
        }
    }

    /// Whether the result is always a subset of the input.
    #[must_use]
    pub fn selector(&self) -> bool {
        match self.data() {
            Hom::Identity => true,
            Hom::Constant(..) | Hom::Cons { .. } => false,
            Hom::Composition { outer, inner } => outer.selector() && inner.selector(),
            Hom::Sum(operands) => operands.iter().all(HomRef::selector),
            Hom::Fixpoint(hom) => hom.selector(),
            Hom::Inductive(user) => user.0.selector(),
            Hom::Local { hom, .. } => hom.selector(),
            Hom::ValuesFunction { fun, .. } => fun.0.selector(),
            Hom::SaturationSum { f, g, l, .. } | Hom::SaturationFixpoint { f, g, l, .. } => {
                f.as_ref().map_or(true, HomRef::selector)
                    && l.as_ref().map_or(true, HomRef::selector)
                    && g.iter().all(HomRef::selector)
            }
        }
    }

    /// Cheap shapes bypass the evaluation cache entirely.
    pub(crate) fn should_cache(&self) -> bool {
        !matches!(
            self.data(),
            Hom::Identity | Hom::Constant(..) | Hom::Cons { .. }
        )
    }
}

impl<C: Config> Debug for HomRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hom({}, {self})", self.id().0)
    }
}

impl<C: Config> Display for HomRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<C: Config>(
            f: &mut fmt::Formatter<'_>,
            operands: &[HomRef<C>],
            separator: &str,
        ) -> fmt::Result {
            for (i, operand) in operands.iter().enumerate() {
                if i != 0 {
                    write!(f, "{separator}")?;
                }
                write!(f, "{operand}")?;
            }
            Ok(())
        }

        match self.data() {
            Hom::Identity => write!(f, "Id"),
            Hom::Constant(sdd) => write!(f, "Constant({})", sdd.id().0),
            Hom::Composition { outer, inner } => write!(f, "({outer} o {inner})"),
            Hom::Sum(operands) => {
                write!(f, "(")?;
                join(f, operands, " + ")?;
                write!(f, ")")
            }
            Hom::Fixpoint(hom) => write!(f, "({hom})*"),
            Hom::Inductive(user) => write!(f, "{user}"),
            Hom::Local { identifier, hom } => write!(f, "@({identifier}, {hom})"),
            Hom::ValuesFunction { identifier, fun } => write!(f, "Function({identifier}, {fun})"),
            Hom::Cons {
                identifier,
                head,
                next,
                ..
            } => write!(f, "cons({identifier}, {head}, {next})"),
            Hom::SaturationSum { variable, f: ff, g, l } => {
                write!(f, "SatSum(@{variable}")?;
                if let Some(ff) = ff {
                    write!(f, ", F={ff}")?;
                }
                if let Some(l) = l {
                    write!(f, ", L={l}")?;
                }
                if !g.is_empty() {
                    write!(f, ", G=")?;
                    join(f, g, " + ")?;
                }
                write!(f, ")")
            }
            Hom::SaturationFixpoint { variable, f: ff, g, l } => {
                write!(f, "Sat(@{variable}")?;
                if let Some(ff) = ff {
                    write!(f, ", F={ff}")?;
                }
                if let Some(l) = l {
                    write!(f, ", L={l}")?;
                }
                if !g.is_empty() {
                    write!(f, ", G=")?;
                    join(f, g, " + ")?;
                }
                write!(f, ")*")
            }
        }
    }
}

impl<C: Config> SddManager<C> {
    /// Return the canonical handle for `data`, allocating it on first sight.
    pub(crate) fn unify_hom(&self, data: Hom<C>) -> HomRef<C> {
        let mut table = self.hom_table.borrow_mut();
        match table.entry(data) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let id = HomId(self.next_hom_id.get());
                self.next_hom_id.set(id.0 + 1);
                let hom = HomRef::new(id, entry.key().clone());
                entry.insert(hom.clone());
                hom
            }
        }
    }

    /// The homomorphism returning its input unchanged.
    #[must_use]
    pub fn identity(&self) -> HomRef<C> {
        self.unify_hom(Hom::Identity)
    }

    /// The homomorphism returning `sdd` whatever its input.
    #[must_use]
    pub fn constant(&self, sdd: &SddRef<C>) -> HomRef<C> {
        self.unify_hom(Hom::Constant(sdd.clone()))
    }

    /// `outer` after `inner`.
    #[must_use]
    pub fn composition(&self, outer: &HomRef<C>, inner: &HomRef<C>) -> HomRef<C> {
        if outer.is_identity() {
            return inner.clone();
        }
        if inner.is_identity() {
            return outer.clone();
        }
        self.unify_hom(Hom::Composition {
            outer: outer.clone(),
            inner: inner.clone(),
        })
    }

    /// Union of the applications of `operands`.
    ///
    /// Nested sums are flattened and duplicates removed; a singleton is
    /// returned as-is.
    ///
    /// # Panics
    ///
    /// Panics on an empty operand list.
    #[must_use]
    pub fn hom_sum(&self, operands: &[HomRef<C>]) -> HomRef<C> {
        assert!(
            !operands.is_empty(),
            "sum of homomorphisms needs at least one operand"
        );

        let mut flattened = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand.data() {
                Hom::Sum(inner) => flattened.extend(inner.iter().cloned()),
                _ => flattened.push(operand.clone()),
            }
        }
        flattened.sort();
        flattened.dedup();

        if flattened.len() == 1 {
            return flattened[0].clone();
        }
        self.unify_hom(Hom::Sum(flattened.into_boxed_slice()))
    }

    /// Least fixpoint of `x <- x U hom(x)`.
    #[must_use]
    pub fn fixpoint(&self, hom: &HomRef<C>) -> HomRef<C> {
        if hom.is_identity() || matches!(hom.data(), Hom::Fixpoint(..)) {
            return hom.clone();
        }
        self.unify_hom(Hom::Fixpoint(hom.clone()))
    }

    /// Wrap a user inductive homomorphism.
    #[must_use]
    pub fn inductive(&self, user: Rc<dyn Inductive<C>>) -> HomRef<C> {
        self.unify_hom(Hom::Inductive(InductiveRef::new(user)))
    }

    /// Apply `hom` inside the level nested under `identifier`.
    ///
    /// # Panics
    ///
    /// Panics when `identifier` does not appear in `order`.
    #[must_use]
    pub fn local(
        &self,
        identifier: &C::Identifier,
        order: &Order<C>,
        hom: &HomRef<C>,
    ) -> HomRef<C> {
        assert!(
            order.node(identifier).is_some(),
            "identifier '{identifier}' is not part of the order"
        );
        self.local_unchecked(identifier.clone(), hom)
    }

    pub(crate) fn local_unchecked(
        &self,
        identifier: C::Identifier,
        hom: &HomRef<C>,
    ) -> HomRef<C> {
        if hom.is_identity() {
            return hom.clone();
        }
        self.unify_hom(Hom::Local {
            identifier,
            hom: hom.clone(),
        })
    }

    /// Apply a user function to every valuation of the flat node at
    /// `identifier`.
    ///
    /// # Panics
    ///
    /// Panics when `identifier` does not appear in `order`.
    #[must_use]
    pub fn values_function(
        &self,
        order: &Order<C>,
        identifier: &C::Identifier,
        fun: Rc<dyn ValuesFunction<C>>,
    ) -> HomRef<C> {
        assert!(
            order.node(identifier).is_some(),
            "identifier '{identifier}' is not part of the order"
        );
        self.unify_hom(Hom::ValuesFunction {
            identifier: identifier.clone(),
            fun: ValuesFunctionRef::new(fun),
        })
    }

    /// Prepend a node at `identifier`'s level: the result of
    /// `cons(id, o, head, next)` on `x` is the diagram
    /// `head . next(o.next(), x)`.
    ///
    /// # Panics
    ///
    /// Panics when `identifier` does not appear in `order`.
    #[must_use]
    pub fn cons(
        &self,
        identifier: &C::Identifier,
        order: &Order<C>,
        head: Head<C>,
        next: &HomRef<C>,
    ) -> HomRef<C> {
        let node = order
            .node(identifier)
            .unwrap_or_else(|| panic!("identifier '{identifier}' is not part of the order"));
        self.unify_hom(Hom::Cons {
            variable: node.variable(),
            identifier: identifier.clone(),
            head,
            next: next.clone(),
        })
    }

    /// Saturation grouping of a sum at one level: `f` gathers the operands
    /// acting deeper, `l` the operands confined to the nested level, `g`
    /// the operands acting here. Only the rewriting pass builds these.
    pub(crate) fn saturation_sum(
        &self,
        variable: VarIdx,
        f: Option<HomRef<C>>,
        mut g: Vec<HomRef<C>>,
        l: Option<HomRef<C>>,
    ) -> HomRef<C> {
        g.sort();
        g.dedup();

        if g.is_empty() {
            match (&f, &l) {
                (Some(f), None) => return f.clone(),
                (None, Some(l)) => return l.clone(),
                _ => {}
            }
        }
        if f.is_none() && l.is_none() && g.len() == 1 {
            return g[0].clone();
        }
        self.unify_hom(Hom::SaturationSum {
            variable,
            f,
            g: g.into_boxed_slice(),
            l,
        })
    }

    /// Saturation grouping of a fixpoint at one level; the parts follow
    /// [`SddManager::saturation_sum`], each already a fixpoint of its own.
    pub(crate) fn saturation_fixpoint(
        &self,
        variable: VarIdx,
        f: Option<HomRef<C>>,
        mut g: Vec<HomRef<C>>,
        l: Option<HomRef<C>>,
    ) -> HomRef<C> {
        g.sort();
        g.dedup();

        if g.is_empty() {
            match (&f, &l) {
                (Some(f), None) => return f.clone(),
                (None, Some(l)) => return l.clone(),
                (None, None) => return self.identity(),
                _ => {}
            }
        }
        self.unify_hom(Hom::SaturationFixpoint {
            variable,
            f,
            g: g.into_boxed_slice(),
            l,
        })
    }
}
