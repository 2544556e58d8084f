//! Compile-time parameterization of the library.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::values::ValueSet;

/// Static configuration of a manager and of every diagram and homomorphism
/// it produces.
///
/// The configuration fixes the type of user-visible identifiers appearing in
/// orders and the type of the value sets labelling flat arcs. Dense variable
/// integers are always [`crate::order::VarIdx`].
pub trait Config: 'static {
    /// User-visible name of a variable, e.g. `String` or a place index.
    type Identifier: Clone + Eq + Hash + Ord + Debug + Display;

    /// The sets of scalar values labelling flat arcs.
    type Values: ValueSet;
}
