//! Variable orders: immutable trees of identifiers describing nesting.

#[allow(clippy::module_inception)]
mod order;

pub use order::{Order, OrderBuilder, OrderIdx, VarIdx};

#[cfg(test)]
pub(crate) use order::test;
