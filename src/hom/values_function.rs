//! User-defined functions rewriting the valuations of flat arcs.

use std::any::Any;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::config::Config;
use crate::values::TopError;

/// A user-supplied function on value sets, applied arc by arc to the flat
/// node at its target identifier.
///
/// Like [`crate::hom::inductive::Inductive`], implementations are
/// hash-consed through `eq_dyn`/`hash_dyn`.
pub trait ValuesFunction<C: Config>: Debug + Display {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another user object.
    fn eq_dyn(&self, other: &dyn Any) -> bool;

    /// Stable hash consistent with [`ValuesFunction::eq_dyn`].
    fn hash_dyn(&self) -> u64;

    /// Whether the result is always a subset of the input. Selector
    /// functions preserve the partition of a node, which lets evaluation
    /// rebuild it without resorting to a sum.
    fn selector(&self) -> bool;

    /// Rewrite one valuation. Returning [`TopError`] aborts the enclosing
    /// evaluation.
    fn apply(&self, values: &C::Values) -> Result<C::Values, TopError>;
}

/// Shared handle on a user values function with structural equality.
pub struct ValuesFunctionRef<C: Config>(pub(crate) Rc<dyn ValuesFunction<C>>);

impl<C: Config> ValuesFunctionRef<C> {
    pub(crate) fn new(user: Rc<dyn ValuesFunction<C>>) -> Self {
        ValuesFunctionRef(user)
    }
}

impl<C: Config> Clone for ValuesFunctionRef<C> {
    fn clone(&self) -> Self {
        ValuesFunctionRef(self.0.clone())
    }
}

impl<C: Config> PartialEq for ValuesFunctionRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_any())
    }
}

impl<C: Config> Eq for ValuesFunctionRef<C> {}

impl<C: Config> Hash for ValuesFunctionRef<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash_dyn());
    }
}

impl<C: Config> Display for ValuesFunctionRef<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
