//! Structural recursion applying a homomorphism to a diagram.

use tracing::instrument;

use crate::config::Config;
use crate::hom::inductive::InductiveRef;
use crate::hom::values_function::ValuesFunctionRef;
use crate::hom::{EvaluationError, Head, Hom, HomRef};
use crate::manager::{EvalKey, FlatOps, HierOps, SddManager};
use crate::order::Order;
use crate::sdd::{SddData, SddRef};

#[allow(type_alias_bounds)]
type EvalResult<C: Config> = Result<SddRef<C>, EvaluationError<C>>;

impl<C: Config> SddManager<C> {
    /// Apply `hom` to `sdd` against `order`.
    ///
    /// `|0|` is returned unchanged: the empty set is a fixpoint of every
    /// homomorphism and the recursion below never meets it. Results are
    /// memoized; repeated applications return the same handle.
    ///
    /// # Errors
    ///
    /// Returns the error of the deepest failing evaluation, with one trace
    /// frame per enclosing application. Failed evaluations are never cached.
    #[instrument(skip_all, level = tracing::Level::DEBUG)]
    pub fn evaluate(&self, hom: &HomRef<C>, order: &Order<C>, sdd: &SddRef<C>) -> EvalResult<C> {
        tracing::debug!(hom = hom.id().0, sdd = sdd.id().0);
        if sdd.is_zero() {
            return Ok(sdd.clone());
        }
        self.eval_rec(hom, order, sdd)
    }

    pub(crate) fn eval_rec(
        &self,
        hom: &HomRef<C>,
        order: &Order<C>,
        sdd: &SddRef<C>,
    ) -> EvalResult<C> {
        debug_assert!(!sdd.is_zero(), "homomorphism applied to |0|");

        if hom.is_identity() {
            return Ok(sdd.clone());
        }

        // A skipped operator is a no-op at this level: rebuild the arcs with
        // the operator pushed onto the successors, bypassing the cache.
        if !sdd.is_terminal() && hom.skip(order) {
            return self.eval_skip(hom, order, sdd);
        }

        if !hom.should_cache() {
            self.eval_cache.borrow_mut().note_filtered();
            return match self.eval_dispatch(hom, order, sdd) {
                Ok(result) => Ok(result),
                Err(error) => {
                    self.eval_cache.borrow_mut().filtered_rollback();
                    Err(error.with_step(format!("{hom} on {}", sdd.id())))
                }
            };
        }

        if self.is_interrupted() {
            return Err(EvaluationError::Interrupted);
        }

        let key = EvalKey {
            hom: hom.id(),
            sdd: sdd.id(),
            order: order.idx(),
        };
        if let Some(hit) = self.eval_cache.borrow_mut().get(&key) {
            return Ok(hit);
        }

        match self.eval_dispatch(hom, order, sdd) {
            Ok(result) => {
                self.eval_cache.borrow_mut().insert(key, result.clone());
                Ok(result)
            }
            Err(error) => {
                self.eval_cache.borrow_mut().miss_rollback();
                Err(error.with_step(format!("{hom} on {}", sdd.id())))
            }
        }
    }

    /// Push a skipped operator under every arc and rebuild the node.
    fn eval_skip(&self, hom: &HomRef<C>, order: &Order<C>, sdd: &SddRef<C>) -> EvalResult<C> {
        let next_order = order.next();
        match sdd.data() {
            SddData::Flat(node) => {
                let mut alpha = Vec::with_capacity(node.arcs.len());
                for arc in node.arcs.iter() {
                    let successor = self.eval_rec(hom, &next_order, &arc.successor)?;
                    alpha.push((arc.valuation.clone(), successor));
                }
                Ok(self.square_union(&FlatOps, node.variable, alpha))
            }
            SddData::Hierarchical(node) => {
                let mut alpha = Vec::with_capacity(node.arcs.len());
                for arc in node.arcs.iter() {
                    let successor = self.eval_rec(hom, &next_order, &arc.successor)?;
                    alpha.push((arc.valuation.clone(), successor));
                }
                Ok(self.square_union(&HierOps, node.variable, alpha))
            }
            SddData::Zero | SddData::One => unreachable!("terminals are never skipped"),
        }
    }

    fn eval_dispatch(&self, hom: &HomRef<C>, order: &Order<C>, sdd: &SddRef<C>) -> EvalResult<C> {
        match hom.data() {
            Hom::Identity => Ok(sdd.clone()),
            Hom::Constant(constant) => Ok(constant.clone()),
            Hom::Composition { outer, inner } => {
                let intermediate = self.eval_rec(inner, order, sdd)?;
                if intermediate.is_zero() {
                    return Ok(intermediate);
                }
                self.eval_rec(outer, order, &intermediate)
            }
            Hom::Sum(operands) => {
                let mut parts = Vec::with_capacity(operands.len());
                for operand in operands.iter() {
                    parts.push(self.eval_rec(operand, order, sdd)?);
                }
                Ok(self.sum_many(parts))
            }
            Hom::Fixpoint(inner) => {
                let mut current = sdd.clone();
                loop {
                    let step = self.eval_rec(inner, order, &current)?;
                    let merged = self.sum(&current, &step);
                    if merged == current {
                        return Ok(current);
                    }
                    current = merged;
                }
            }
            Hom::Inductive(user) => self.eval_inductive(user, order, sdd),
            Hom::Local { hom: nested, .. } => self.eval_local(nested, order, sdd),
            Hom::ValuesFunction { fun, .. } => self.eval_values_function(fun, sdd),
            Hom::Cons {
                variable,
                head,
                next,
                ..
            } => {
                let successor = self.eval_rec(next, &order.next(), sdd)?;
                Ok(match head {
                    Head::Values(values) => self.flat(*variable, values, &successor),
                    Head::Sdd(nested) => self.hierarchical(*variable, nested, &successor),
                })
            }
            Hom::SaturationSum { f, g, l, .. } => {
                let mut parts = Vec::with_capacity(g.len() + 2);
                if let Some(f) = f {
                    parts.push(self.eval_rec(f, order, sdd)?);
                }
                if let Some(l) = l {
                    parts.push(self.eval_rec(l, order, sdd)?);
                }
                for operand in g.iter() {
                    parts.push(self.eval_rec(operand, order, sdd)?);
                }
                Ok(self.sum_many(parts))
            }
            Hom::SaturationFixpoint { f, g, l, .. } => {
                // Exhaust the deeper part, then the nested part, then chain
                // the local operations, until nothing new shows up. The f
                // and l parts are fixpoints over their operands plus the
                // identity, so applying them can only grow the set.
                let mut current = sdd.clone();
                loop {
                    let previous = current.clone();
                    if let Some(f) = f {
                        current = self.eval_rec(f, order, &current)?;
                    }
                    if let Some(l) = l {
                        current = self.eval_rec(l, order, &current)?;
                    }
                    for operand in g.iter() {
                        let step = self.eval_rec(operand, order, &current)?;
                        current = self.sum(&current, &step);
                    }
                    if current == previous {
                        return Ok(current);
                    }
                }
            }
        }
    }

    fn eval_inductive(
        &self,
        user: &InductiveRef<C>,
        order: &Order<C>,
        sdd: &SddRef<C>,
    ) -> EvalResult<C> {
        match sdd.data() {
            SddData::One => Ok(user.0.terminal(self)),
            SddData::Flat(node) => {
                let mut parts = Vec::with_capacity(node.arcs.len());
                for arc in node.arcs.iter() {
                    let next_hom = user.0.on_flat(self, order, &arc.valuation);
                    parts.push(self.eval_rec(&next_hom, order, &arc.successor)?);
                }
                Ok(self.sum_many(parts))
            }
            SddData::Hierarchical(node) => {
                let mut parts = Vec::with_capacity(node.arcs.len());
                for arc in node.arcs.iter() {
                    let next_hom = user.0.on_hierarchical(self, order, &arc.valuation);
                    parts.push(self.eval_rec(&next_hom, order, &arc.successor)?);
                }
                Ok(self.sum_many(parts))
            }
            SddData::Zero => unreachable!("homomorphism applied to |0|"),
        }
    }

    fn eval_local(&self, nested: &HomRef<C>, order: &Order<C>, sdd: &SddRef<C>) -> EvalResult<C> {
        let SddData::Hierarchical(node) = sdd.data() else {
            panic!(
                "local homomorphism applied on a non-hierarchical operand ({})",
                sdd.data().name()
            );
        };

        let nested_order = order.nested();
        if nested.selector() {
            // The rewritten valuations shrink, the partition stands.
            let mut alpha = Vec::with_capacity(node.arcs.len());
            for arc in node.arcs.iter() {
                let valuation = self.eval_rec(nested, &nested_order, &arc.valuation)?;
                alpha.push((valuation, arc.successor.clone()));
            }
            Ok(self.square_union(&HierOps, node.variable, alpha))
        } else {
            // The rewritten valuations may overlap, rebuild through a sum.
            let mut parts = Vec::with_capacity(node.arcs.len());
            for arc in node.arcs.iter() {
                let valuation = self.eval_rec(nested, &nested_order, &arc.valuation)?;
                parts.push(self.hierarchical(node.variable, &valuation, &arc.successor));
            }
            Ok(self.sum_many(parts))
        }
    }

    fn eval_values_function(&self, fun: &ValuesFunctionRef<C>, sdd: &SddRef<C>) -> EvalResult<C> {
        match sdd.data() {
            SddData::One => Ok(self.one()),
            SddData::Hierarchical(..) => Err(EvaluationError::InvalidOperand {
                operand: sdd.clone(),
                trace: Vec::new(),
            }),
            SddData::Flat(node) => {
                let apply = |values: &C::Values| {
                    fun.0.apply(values).map_err(|_| EvaluationError::Top {
                        operand: sdd.clone(),
                        trace: Vec::new(),
                    })
                };

                if fun.0.selector() {
                    let mut alpha = Vec::with_capacity(node.arcs.len());
                    for arc in node.arcs.iter() {
                        alpha.push((apply(&arc.valuation)?, arc.successor.clone()));
                    }
                    Ok(self.square_union(&FlatOps, node.variable, alpha))
                } else {
                    let mut parts = Vec::with_capacity(node.arcs.len());
                    for arc in node.arcs.iter() {
                        let valuation = apply(&arc.valuation)?;
                        parts.push(self.flat(node.variable, &valuation, &arc.successor));
                    }
                    Ok(self.sum_many(parts))
                }
            }
            SddData::Zero => unreachable!("homomorphism applied to |0|"),
        }
    }
}
