//! User-defined homomorphisms recursing over one diagram level.

use std::any::Any;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::config::Config;
use crate::hom::HomRef;
use crate::manager::SddManager;
use crate::order::Order;
use crate::sdd::SddRef;

/// A user-supplied inductive homomorphism.
///
/// Evaluation walks the arcs of the node it fires on: for each arc the user
/// returns the homomorphism to apply to the successor, and the results are
/// unioned. Implementations are hash-consed through `eq_dyn`/`hash_dyn`, so
/// two structurally equal user objects yield the same homomorphism handle;
/// equal objects must return equal hashes for the lifetime of the process.
pub trait Inductive<C: Config>: Debug + Display {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another user object.
    fn eq_dyn(&self, other: &dyn Any) -> bool;

    /// Stable hash consistent with [`Inductive::eq_dyn`].
    fn hash_dyn(&self) -> u64;

    /// Whether this homomorphism is the identity at `identifier`'s level.
    fn skip(&self, identifier: &C::Identifier) -> bool;

    /// Whether the result is always a subset of the input.
    fn selector(&self) -> bool;

    /// Value on the `|1|` terminal.
    fn terminal(&self, manager: &SddManager<C>) -> SddRef<C>;

    /// Homomorphism to apply to the successor of a flat arc.
    fn on_flat(
        &self,
        manager: &SddManager<C>,
        order: &Order<C>,
        values: &C::Values,
    ) -> HomRef<C>;

    /// Homomorphism to apply to the successor of a hierarchical arc.
    fn on_hierarchical(
        &self,
        manager: &SddManager<C>,
        order: &Order<C>,
        nested: &SddRef<C>,
    ) -> HomRef<C>;
}

/// Shared handle on a user inductive with structural equality.
pub struct InductiveRef<C: Config>(pub(crate) Rc<dyn Inductive<C>>);

impl<C: Config> InductiveRef<C> {
    pub(crate) fn new(user: Rc<dyn Inductive<C>>) -> Self {
        InductiveRef(user)
    }
}

impl<C: Config> Clone for InductiveRef<C> {
    fn clone(&self) -> Self {
        InductiveRef(self.0.clone())
    }
}

impl<C: Config> PartialEq for InductiveRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_any())
    }
}

impl<C: Config> Eq for InductiveRef<C> {}

impl<C: Config> Hash for InductiveRef<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash_dyn());
    }
}

impl<C: Config> Display for InductiveRef<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
