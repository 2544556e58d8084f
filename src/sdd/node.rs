use std::fmt::Display;
use std::hash::{Hash, Hasher};

use crate::config::Config;
use crate::order::VarIdx;
use crate::sdd::SddRef;

/// An arc of a node: a valuation and the diagram it leads to.
///
/// The valuation is a set of values on flat nodes and a nested diagram on
/// hierarchical ones.
pub(crate) struct ArcTo<C: Config, V> {
    pub(crate) valuation: V,
    pub(crate) successor: SddRef<C>,
}

impl<C: Config, V: Clone> Clone for ArcTo<C, V> {
    fn clone(&self) -> Self {
        ArcTo {
            valuation: self.valuation.clone(),
            successor: self.successor.clone(),
        }
    }
}

impl<C: Config, V: PartialEq> PartialEq for ArcTo<C, V> {
    fn eq(&self, other: &Self) -> bool {
        self.valuation == other.valuation && self.successor == other.successor
    }
}

impl<C: Config, V: Eq> Eq for ArcTo<C, V> {}

impl<C: Config, V: Hash> Hash for ArcTo<C, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.valuation.hash(state);
        self.successor.hash(state);
    }
}

/// A non-terminal node: a variable and its arcs, sorted by valuation.
///
/// Nodes own their arc slice in a single boxed allocation, so a handle is
/// one indirection away from the arcs. A node is never mutated once it has
/// entered the unique table.
pub(crate) struct Node<C: Config, V> {
    pub(crate) variable: VarIdx,
    pub(crate) arcs: Box<[ArcTo<C, V>]>,
}

impl<C: Config, V: Clone> Clone for Node<C, V> {
    fn clone(&self) -> Self {
        Node {
            variable: self.variable,
            arcs: self.arcs.clone(),
        }
    }
}

impl<C: Config, V: PartialEq> PartialEq for Node<C, V> {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable && self.arcs == other.arcs
    }
}

impl<C: Config, V: Eq> Eq for Node<C, V> {}

impl<C: Config, V: Hash> Hash for Node<C, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variable.hash(state);
        self.arcs.hash(state);
    }
}

impl<C: Config, V: Display> Display for Node<C, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.variable)?;
        for (i, arc) in self.arcs.iter().enumerate() {
            if i != 0 {
                write!(f, " || ")?;
            }
            write!(f, "{} --> {}", arc.valuation, arc.successor)?;
        }
        write!(f, "]")
    }
}
