//! Homomorphisms: composable set-to-set transformations over diagrams.

mod eval;
#[allow(clippy::module_inception)]
mod hom;
pub mod inductive;
mod rewrite;
pub mod values_function;

pub(crate) use hom::Hom;
pub use hom::{Head, HomId, HomRef};

use std::fmt::{self, Debug};

use thiserror::Error;

use crate::config::Config;
use crate::sdd::SddRef;

/// A homomorphism could not be evaluated.
///
/// The trace accumulates one frame per enclosing evaluation as the error
/// unwinds; no frame on this path ever enters the caches.
#[derive(Error)]
pub enum EvaluationError<C: Config> {
    /// A homomorphism reached a diagram it cannot process, e.g. a value
    /// function meeting a hierarchical node.
    #[error("homomorphism applied to an operand it cannot process")]
    InvalidOperand {
        operand: SddRef<C>,
        trace: Vec<String>,
    },

    /// The value layer overflowed while rewriting a valuation.
    #[error("value set exceeded its universe during evaluation")]
    Top {
        operand: SddRef<C>,
        trace: Vec<String>,
    },

    /// The manager's interrupt flag was raised; the manager is still usable.
    #[error("evaluation interrupted")]
    Interrupted,
}

impl<C: Config> EvaluationError<C> {
    /// The diagram on which evaluation failed, where one is known.
    #[must_use]
    pub fn operand(&self) -> Option<&SddRef<C>> {
        match self {
            EvaluationError::InvalidOperand { operand, .. }
            | EvaluationError::Top { operand, .. } => Some(operand),
            EvaluationError::Interrupted => None,
        }
    }

    /// The evaluations the error travelled through, innermost first.
    #[must_use]
    pub fn trace(&self) -> &[String] {
        match self {
            EvaluationError::InvalidOperand { trace, .. }
            | EvaluationError::Top { trace, .. } => trace,
            EvaluationError::Interrupted => &[],
        }
    }

    pub(crate) fn with_step(mut self, step: String) -> Self {
        match &mut self {
            EvaluationError::InvalidOperand { trace, .. }
            | EvaluationError::Top { trace, .. } => trace.push(step),
            EvaluationError::Interrupted => {}
        }
        self
    }
}

impl<C: Config> PartialEq for EvaluationError<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                EvaluationError::InvalidOperand {
                    operand: lo,
                    trace: lt,
                },
                EvaluationError::InvalidOperand {
                    operand: ro,
                    trace: rt,
                },
            )
            | (
                EvaluationError::Top {
                    operand: lo,
                    trace: lt,
                },
                EvaluationError::Top {
                    operand: ro,
                    trace: rt,
                },
            ) => lo == ro && lt == rt,
            (EvaluationError::Interrupted, EvaluationError::Interrupted) => true,
            _ => false,
        }
    }
}

impl<C: Config> Eq for EvaluationError<C> {}

impl<C: Config> Debug for EvaluationError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::InvalidOperand { operand, trace } => f
                .debug_struct("InvalidOperand")
                .field("operand", operand)
                .field("trace", trace)
                .finish(),
            EvaluationError::Top { operand, trace } => f
                .debug_struct("Top")
                .field("operand", operand)
                .field("trace", trace)
                .finish(),
            EvaluationError::Interrupted => write!(f, "Interrupted"),
        }
    }
}
