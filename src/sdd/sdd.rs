use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use derive_more::derive::{Add, AddAssign, From};

use crate::config::Config;
use crate::order::VarIdx;
use crate::sdd::Node;

#[derive(Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Clone, Copy, Add, AddAssign, From)]
pub struct SddId(pub u32);

impl Display for SddId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SddId({})", self.0)
    }
}

/// The data of a node: one of the two terminals, a flat node whose arcs are
/// labelled by value sets, or a hierarchical node whose arcs are labelled by
/// nested diagrams.
pub(crate) enum SddData<C: Config> {
    Zero,
    One,
    Flat(Node<C, C::Values>),
    Hierarchical(Node<C, SddRef<C>>),
}

impl<C: Config> SddData<C> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SddData::Zero => "|0|",
            SddData::One => "|1|",
            SddData::Flat(..) => "flat",
            SddData::Hierarchical(..) => "hierarchical",
        }
    }
}

impl<C: Config> Clone for SddData<C> {
    fn clone(&self) -> Self {
        match self {
            SddData::Zero => SddData::Zero,
            SddData::One => SddData::One,
            SddData::Flat(node) => SddData::Flat(node.clone()),
            SddData::Hierarchical(node) => SddData::Hierarchical(node.clone()),
        }
    }
}

impl<C: Config> PartialEq for SddData<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SddData::Zero, SddData::Zero) | (SddData::One, SddData::One) => true,
            (SddData::Flat(lhs), SddData::Flat(rhs)) => lhs == rhs,
            (SddData::Hierarchical(lhs), SddData::Hierarchical(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl<C: Config> Eq for SddData<C> {}

impl<C: Config> Hash for SddData<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SddData::Zero => state.write_u8(0),
            SddData::One => state.write_u8(1),
            SddData::Flat(node) => {
                state.write_u8(2);
                node.hash(state);
            }
            SddData::Hierarchical(node) => {
                state.write_u8(3);
                node.hash(state);
            }
        }
    }
}

pub(crate) struct Sdd<C: Config> {
    pub(crate) id: SddId,
    pub(crate) data: SddData<C>,
}

/// A set decision diagram that can be queried and combined.
///
/// Handles are cheap to clone and compare by identity; hash-consing in
/// [`crate::manager::SddManager`] guarantees that identity equality and
/// structural equality coincide.
pub struct SddRef<C: Config>(pub(crate) Rc<Sdd<C>>);

impl<C: Config> Clone for SddRef<C> {
    fn clone(&self) -> Self {
        SddRef(self.0.clone())
    }
}

impl<C: Config> PartialEq for SddRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<C: Config> Eq for SddRef<C> {}

impl<C: Config> Ord for SddRef<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl<C: Config> PartialOrd for SddRef<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Config> Hash for SddRef<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<C: Config> SddRef<C> {
    pub(crate) fn new(id: SddId, data: SddData<C>) -> Self {
        SddRef(Rc::new(Sdd { id, data }))
    }

    #[must_use]
    pub fn id(&self) -> SddId {
        self.0.id
    }

    pub(crate) fn data(&self) -> &SddData<C> {
        &self.0.data
    }

    /// Check whether the diagram is the empty set `|0|`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self.0.data, SddData::Zero)
    }

    /// Check whether the diagram is `|1|`, the set holding the empty tuple.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self.0.data, SddData::One)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_zero() || self.is_one()
    }

    #[must_use]
    pub fn is_flat(&self) -> bool {
        matches!(self.0.data, SddData::Flat(..))
    }

    #[must_use]
    pub fn is_hierarchical(&self) -> bool {
        matches!(self.0.data, SddData::Hierarchical(..))
    }

    /// Variable of the topmost node, if the diagram is not a terminal.
    #[must_use]
    pub fn variable(&self) -> Option<VarIdx> {
        match &self.0.data {
            SddData::Flat(node) => Some(node.variable),
            SddData::Hierarchical(node) => Some(node.variable),
            _ => None,
        }
    }

    /// Number of arcs reachable from this diagram.
    #[must_use]
    pub fn size(&self) -> u64 {
        let mut seen: Vec<SddId> = Vec::new();
        let mut queue = vec![self.clone()];
        let mut size = 0;

        while let Some(sdd) = queue.pop() {
            if seen.contains(&sdd.id()) {
                continue;
            }
            seen.push(sdd.id());
            match sdd.data() {
                SddData::Flat(node) => {
                    size += node.arcs.len() as u64;
                    queue.extend(node.arcs.iter().map(|arc| arc.successor.clone()));
                }
                SddData::Hierarchical(node) => {
                    size += node.arcs.len() as u64;
                    for arc in node.arcs.iter() {
                        queue.push(arc.valuation.clone());
                        queue.push(arc.successor.clone());
                    }
                }
                _ => {}
            }
        }

        size
    }

    pub(crate) fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Enumerate the paths of the diagram in canonical arc order. Each path
    /// holds one item per level; `|0|` has no path, `|1|` has the empty one.
    ///
    /// Paths enumerate the symbolic structure, not the represented tuples:
    /// a flat item stands for every value of its set.
    #[must_use]
    pub fn paths(&self) -> Vec<Vec<PathItem<C>>> {
        match &self.0.data {
            SddData::Zero => Vec::new(),
            SddData::One => vec![Vec::new()],
            SddData::Flat(node) => node
                .arcs
                .iter()
                .flat_map(|arc| {
                    arc.successor.paths().into_iter().map(|mut path| {
                        path.insert(0, PathItem::Values(arc.valuation.clone()));
                        path
                    })
                })
                .collect(),
            SddData::Hierarchical(node) => node
                .arcs
                .iter()
                .flat_map(|arc| {
                    arc.successor.paths().into_iter().map(|mut path| {
                        path.insert(0, PathItem::Nested(arc.valuation.clone()));
                        path
                    })
                })
                .collect(),
        }
    }
}

/// One step of a path: the valuation of the arc it went through.
pub enum PathItem<C: Config> {
    Values(C::Values),
    Nested(SddRef<C>),
}

impl<C: Config> Clone for PathItem<C> {
    fn clone(&self) -> Self {
        match self {
            PathItem::Values(values) => PathItem::Values(values.clone()),
            PathItem::Nested(sdd) => PathItem::Nested(sdd.clone()),
        }
    }
}

impl<C: Config> PartialEq for PathItem<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathItem::Values(lhs), PathItem::Values(rhs)) => lhs == rhs,
            (PathItem::Nested(lhs), PathItem::Nested(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl<C: Config> Eq for PathItem<C> {}

impl<C: Config> Debug for PathItem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathItem::Values(values) => write!(f, "{values:?}"),
            PathItem::Nested(sdd) => write!(f, "{sdd:?}"),
        }
    }
}

impl<C: Config> Debug for SddRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdd")
            .field("id", &self.id().0)
            .field("kind", &self.0.data.name())
            .finish()
    }
}

impl<C: Config> Display for SddRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            SddData::Zero => write!(f, "|0|"),
            SddData::One => write!(f, "|1|"),
            SddData::Flat(node) => write!(f, "{node}"),
            SddData::Hierarchical(node) => write!(f, "{node}"),
        }
    }
}
