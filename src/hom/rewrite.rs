//! Automatic saturation: rewrite an expression so that every operation is
//! applied at the deepest variable it acts on.

use tracing::instrument;

use crate::config::Config;
use crate::hom::{Hom, HomRef};
use crate::manager::{RewriteKey, SddManager};
use crate::order::Order;

impl<C: Config> SddManager<C> {
    /// Rewrite `hom` into an equivalent form exploiting locality at every
    /// level of `order`.
    ///
    /// Sums and fixpoints of sums are split per level into the operands
    /// that propagate deeper, the operands confined to the nested level,
    /// and the operands acting at the level itself; the grouped form
    /// evaluates the first two before chaining the third, which keeps
    /// intermediate diagrams small. The result only differs in shape:
    /// applying it yields the same diagram as applying `hom`.
    ///
    /// Results are memoized per `(hom, order)`; rewriting is cheap after
    /// the first call.
    #[instrument(skip_all, level = tracing::Level::DEBUG)]
    pub fn rewrite(&self, hom: &HomRef<C>, order: &Order<C>) -> HomRef<C> {
        if order.is_empty() {
            return hom.clone();
        }

        let key = RewriteKey {
            hom: hom.id(),
            order: order.idx(),
        };
        if let Some(hit) = self.rewrite_cache.borrow_mut().get(&key) {
            return hit;
        }

        let result = match hom.data() {
            Hom::Fixpoint(inner) => match inner.data() {
                // Saturation needs the identity among the operands so that
                // every round only grows the set.
                Hom::Sum(operands) if operands.iter().any(HomRef::is_identity) => {
                    self.rewrite_fixpoint_sum(operands, order)
                }
                _ => self.fixpoint(&self.rewrite(inner, order)),
            },
            Hom::Sum(operands) => self.rewrite_sum(operands, order),
            Hom::Composition { outer, inner } => self.composition(
                &self.rewrite(outer, order),
                &self.rewrite(inner, order),
            ),
            Hom::Local {
                identifier,
                hom: nested,
            } => match order.node(identifier) {
                Some(node) if !node.nested().is_empty() => self.local_unchecked(
                    identifier.clone(),
                    &self.rewrite(nested, &node.nested()),
                ),
                _ => hom.clone(),
            },
            _ => hom.clone(),
        };

        tracing::debug!(from = hom.id().0, to = result.id().0, "rewritten");
        self.rewrite_cache.borrow_mut().insert(key, result.clone());
        result
    }

    /// Split sum operands at the head of `order` into the three saturation
    /// groups: `f` skips the level, `l` gathers the bodies of locals
    /// targeting the level's nested part, `g` acts here.
    fn partition(
        &self,
        operands: &[HomRef<C>],
        order: &Order<C>,
    ) -> (Vec<HomRef<C>>, Vec<HomRef<C>>, Vec<HomRef<C>>) {
        let has_nested = !order.nested().is_empty();
        let mut f = Vec::new();
        let mut g = Vec::new();
        let mut l = Vec::new();

        for operand in operands {
            if operand.skip(order) {
                f.push(operand.clone());
            } else if let Hom::Local {
                identifier,
                hom: nested,
            } = operand.data()
            {
                if has_nested && identifier == order.identifier() {
                    l.push(nested.clone());
                } else {
                    g.push(operand.clone());
                }
            } else {
                g.push(operand.clone());
            }
        }

        (f, g, l)
    }

    fn rewrite_fixpoint_sum(&self, operands: &[HomRef<C>], order: &Order<C>) -> HomRef<C> {
        let (f, g, l) = self.partition(operands, order);

        // Grouping only pays off when something propagates away from this
        // level; the identity alone does not count.
        let deep = f.iter().any(|hom| !hom.is_identity());
        if !deep && l.is_empty() {
            let rewritten: Vec<_> = operands
                .iter()
                .map(|operand| self.rewrite(operand, order))
                .collect();
            return self.fixpoint(&self.hom_sum(&rewritten));
        }

        let f_part = deep.then(|| {
            let mut operands = f;
            operands.push(self.identity());
            self.rewrite(&self.fixpoint(&self.hom_sum(&operands)), &order.next())
        });
        let l_part = (!l.is_empty()).then(|| {
            let mut operands = l;
            operands.push(self.identity());
            let nested = self.rewrite(&self.fixpoint(&self.hom_sum(&operands)), &order.nested());
            self.local_unchecked(order.identifier().clone(), &nested)
        });
        let g_parts: Vec<_> = g
            .iter()
            .map(|operand| self.rewrite(operand, order))
            .collect();

        self.saturation_fixpoint(order.variable(), f_part, g_parts, l_part)
    }

    fn rewrite_sum(&self, operands: &[HomRef<C>], order: &Order<C>) -> HomRef<C> {
        let (f, g, l) = self.partition(operands, order);

        if f.is_empty() && l.is_empty() {
            let rewritten: Vec<_> = operands
                .iter()
                .map(|operand| self.rewrite(operand, order))
                .collect();
            return self.hom_sum(&rewritten);
        }

        let f_part = (!f.is_empty()).then(|| self.rewrite(&self.hom_sum(&f), &order.next()));
        let l_part = (!l.is_empty()).then(|| {
            let nested = self.rewrite(&self.hom_sum(&l), &order.nested());
            self.local_unchecked(order.identifier().clone(), &nested)
        });
        let g_parts: Vec<_> = g
            .iter()
            .map(|operand| self.rewrite(operand, order))
            .collect();

        self.saturation_sum(order.variable(), f_part, g_parts, l_part)
    }
}
