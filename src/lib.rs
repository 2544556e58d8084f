//! # Hierarchical Set Decision Diagrams.
//!
//! Build, combine, and transform [Set Decision Diagrams (SDD)]: a canonical,
//! hash-consed representation of very large sets of structured tuples, used
//! to compute state spaces of discrete systems that are far too large to
//! enumerate.
//!
//! The library currently supports:
//! * canonical diagrams with *flat* arcs (labelled by sets of values) and
//!   *hierarchical* arcs (labelled by nested diagrams),
//! * the diagram algebra: union, intersection, and difference, memoized per
//!   manager,
//! * an algebra of *homomorphisms* (identity, constant, composition, sum,
//!   fixpoint, local, inductive, value functions, cons) evaluated with a
//!   cached structural recursion,
//! * an automatic saturation rewriting pass that applies every operation at
//!   the deepest variable it acts on,
//! * garbage collection of dead nodes.
//!
//! The following snippet builds the set `{<0>, <1>, <2>}` over a single
//! variable `a` and doubles it into `{<0>, <1>, <2>, <10>, <11>, <12>}`:
//!
//! ```rust
//! use setdd::config::Config;
//! use setdd::manager::{options::SddOptions, SddManager};
//! use setdd::order::{Order, OrderBuilder};
//! use setdd::values::flat_set::FlatSet;
//! use setdd::flat_set;
//!
//! struct Conf;
//! impl Config for Conf {
//!     type Identifier = String;
//!     type Values = FlatSet;
//! }
//!
//! let manager: SddManager<Conf> = SddManager::new(SddOptions::default());
//! let order: Order<Conf> = OrderBuilder::new().push("a".to_string()).build();
//!
//! let var = order.variable();
//! let low = manager.flat(var, &flat_set![0, 1, 2], &manager.one());
//! let high = manager.flat(var, &flat_set![10, 11, 12], &manager.one());
//! let both = manager.sum(&low, &high);
//!
//! assert_eq!(manager.count(&both), num_bigint::BigUint::from(6u32));
//! ```
//!
//! Main entry points:
//!
//! * [`crate::manager::SddManager::flat`] / [`crate::manager::SddManager::hierarchical`] --
//!   canonical node constructors
//! * [`crate::manager::SddManager::sum`] / [`crate::manager::SddManager::intersection`] /
//!   [`crate::manager::SddManager::difference`] -- the diagram algebra
//! * [`crate::manager::SddManager::evaluate`] -- apply a homomorphism to a diagram
//! * [`crate::manager::SddManager::rewrite`] -- saturate a homomorphism for an order
//! * [`crate::manager::SddManager::collect_garbage`] -- reclaim unreferenced nodes
//!
//! Additional resources:
//!
//! * [Hierarchical Set Decision Diagrams and Regular Models - Couvreur, Thierry-Mieg](https://doi.org/10.1007/978-3-540-78800-3_1):
//!   paper introducing hierarchical SDDs
//! * [Building Efficient Model Checkers using Hierarchical Set Decision Diagrams and Automatic Saturation - Hamez, Thierry-Mieg, Kordon](https://doi.org/10.3233/FI-2009-125):
//!   paper describing the automatic saturation rewriting

pub mod config;
pub(crate) mod cache;
pub mod hom;
pub mod manager;
pub mod order;
pub mod sdd;
pub mod values;

#[cfg(test)]
mod sdd_test;
