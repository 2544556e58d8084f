use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display};
use std::rc::Rc;

use derive_more::derive::{Add, AddAssign, From};

use crate::config::Config;

/// Dense index of a variable within its nesting level. The head of a level
/// gets variable `0`, the element after it `1`, and so on; nested levels
/// restart at `0`.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Debug, Copy, Hash, Add, AddAssign, From)]
pub struct VarIdx(pub u32);

impl Display for VarIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an order node in the depth-first traversal of the whole
/// order (head, then nested subtree, then the rest of the level). Unique
/// across all nesting levels, unlike [`VarIdx`].
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Debug, Copy, Hash, Add, AddAssign, From)]
pub struct OrderIdx(pub u32);

/// Index reserved for the empty order.
pub(crate) const EMPTY_ORDER_IDX: OrderIdx = OrderIdx(u32::MAX);

impl Display for OrderIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accumulates identifiers before an [`Order`] is frozen.
///
/// `push` prepends: building `a` on top of `b` reads
/// `OrderBuilder::new().push(b).push(a)` and yields the order `<a, b>`.
pub struct OrderBuilder<C: Config> {
    items: Vec<(C::Identifier, Option<OrderBuilder<C>>)>,
}

impl<C: Config> Default for OrderBuilder<C> {
    fn default() -> Self {
        OrderBuilder::new()
    }
}

impl<C: Config> OrderBuilder<C> {
    #[must_use]
    pub fn new() -> OrderBuilder<C> {
        OrderBuilder { items: Vec::new() }
    }

    /// Prepend a flat identifier.
    #[must_use]
    pub fn push(mut self, identifier: C::Identifier) -> Self {
        self.items.insert(0, (identifier, None));
        self
    }

    /// Prepend an identifier carrying a nested level.
    #[must_use]
    pub fn push_nested(mut self, identifier: C::Identifier, nested: OrderBuilder<C>) -> Self {
        self.items.insert(0, (identifier, Some(nested)));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Freeze the builder into an immutable order, assigning depth-first
    /// indices and per-level dense variables.
    ///
    /// # Panics
    ///
    /// Panics if an identifier appears more than once anywhere in the order.
    #[must_use]
    pub fn build(&self) -> Order<C> {
        let mut seen = BTreeSet::new();
        self.check_duplicates(&mut seen);

        let mut counter = 0;
        OrderBuilder::build_level(&self.items, 0, &mut counter)
    }

    fn check_duplicates(&self, seen: &mut BTreeSet<C::Identifier>) {
        for (identifier, nested) in &self.items {
            assert!(
                seen.insert(identifier.clone()),
                "identifier '{identifier}' appears twice in the order"
            );
            if let Some(nested) = nested {
                nested.check_duplicates(seen);
            }
        }
    }

    fn build_level(
        items: &[(C::Identifier, Option<OrderBuilder<C>>)],
        position: usize,
        counter: &mut u32,
    ) -> Order<C> {
        let Some((identifier, nested)) = items.get(position) else {
            return Order(None);
        };

        let idx = OrderIdx(*counter);
        *counter += 1;

        let nested = match nested {
            Some(builder) => OrderBuilder::build_level(&builder.items, 0, counter),
            None => Order(None),
        };
        let nested_last = OrderIdx(*counter - 1);
        let next = OrderBuilder::build_level(items, position + 1, counter);

        Order(Some(Rc::new(OrderNode {
            idx,
            variable: VarIdx(position as u32),
            identifier: identifier.clone(),
            nested,
            nested_last,
            next,
        })))
    }
}

struct OrderNode<C: Config> {
    idx: OrderIdx,
    variable: VarIdx,
    identifier: C::Identifier,
    nested: Order<C>,
    // Largest depth-first index inside the nested subtree; equals `idx`
    // when there is no nested level.
    nested_last: OrderIdx,
    next: Order<C>,
}

/// A cheap-clone handle on a position in a frozen order. The handle built by
/// [`OrderBuilder::build`] points at the head; `next` and `nested` walk the
/// same immutable tree.
pub struct Order<C: Config>(Option<Rc<OrderNode<C>>>);

impl<C: Config> Clone for Order<C> {
    fn clone(&self) -> Self {
        Order(self.0.clone())
    }
}

impl<C: Config> Order<C> {
    #[must_use]
    pub fn empty() -> Order<C> {
        Order(None)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn node_ref(&self) -> &OrderNode<C> {
        self.0
            .as_ref()
            .expect("operation on the empty order")
    }

    /// Identifier of the head.
    ///
    /// # Panics
    ///
    /// Panics on the empty order.
    #[must_use]
    pub fn identifier(&self) -> &C::Identifier {
        &self.node_ref().identifier
    }

    /// Variable of the head within its level.
    ///
    /// # Panics
    ///
    /// Panics on the empty order.
    #[must_use]
    pub fn variable(&self) -> VarIdx {
        self.node_ref().variable
    }

    /// The level nested under the head, possibly empty.
    ///
    /// # Panics
    ///
    /// Panics on the empty order.
    #[must_use]
    pub fn nested(&self) -> Order<C> {
        self.node_ref().nested.clone()
    }

    /// The rest of the current level, possibly empty.
    ///
    /// # Panics
    ///
    /// Panics on the empty order.
    #[must_use]
    pub fn next(&self) -> Order<C> {
        self.node_ref().next.clone()
    }

    /// Depth-first index of the head, or a reserved sentinel for the empty
    /// order. Used to key evaluation caches.
    #[must_use]
    pub(crate) fn idx(&self) -> OrderIdx {
        self.0.as_ref().map_or(EMPTY_ORDER_IDX, |node| node.idx)
    }

    /// Find the position whose head is `identifier`, searching nested levels
    /// as well.
    #[must_use]
    pub fn node(&self, identifier: &C::Identifier) -> Option<Order<C>> {
        let node = self.0.as_ref()?;
        if node.identifier == *identifier {
            return Some(self.clone());
        }
        node.nested
            .node(identifier)
            .or_else(|| node.next.node(identifier))
    }

    /// Whether `inner` lies in the level nested under `outer`, at any depth.
    #[must_use]
    pub fn contains(&self, outer: &C::Identifier, inner: &C::Identifier) -> bool {
        let (Some(outer), Some(inner)) = (self.node(outer), self.node(inner)) else {
            return false;
        };
        let outer = outer.node_ref();
        outer.idx < inner.idx() && inner.idx() <= outer.nested_last
    }

    /// Strict total order on the identifiers of this order: their position
    /// in the depth-first traversal.
    ///
    /// # Panics
    ///
    /// Panics if either identifier does not appear in the order.
    #[must_use]
    pub fn compare(&self, lhs: &C::Identifier, rhs: &C::Identifier) -> Ordering {
        let position = |id: &C::Identifier| {
            self.node(id)
                .unwrap_or_else(|| panic!("identifier '{id}' is not part of the order"))
                .idx()
        };
        position(lhs).cmp(&position(rhs))
    }
}

impl<C: Config> Debug for Order<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            None => write!(f, "<>"),
            Some(node) => {
                write!(f, "{}", node.identifier)?;
                if !node.nested.is_empty() {
                    write!(f, "[{:?}]", node.nested)?;
                }
                if !node.next.is_empty() {
                    write!(f, " {:?}", node.next)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::cmp::Ordering;

    use super::{Order, OrderBuilder};
    use crate::config::Config;
    use crate::values::flat_set::FlatSet;

    pub(crate) struct Conf;

    impl Config for Conf {
        type Identifier = String;
        type Values = FlatSet;
    }

    fn id(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn builder() {
        let order: Order<Conf> = OrderBuilder::new().build();
        assert!(order.is_empty());

        let order: Order<Conf> = OrderBuilder::new().push(id("a")).build();
        assert_eq!(order.identifier(), "a");
        assert!(order.nested().is_empty());
        assert!(order.next().is_empty());

        // push prepends: "a" ends up before "b".
        let order: Order<Conf> = OrderBuilder::new().push(id("b")).push(id("a")).build();
        assert_eq!(order.identifier(), "a");
        assert!(order.nested().is_empty());
        assert_eq!(order.next().identifier(), "b");
        assert!(order.next().next().is_empty());
    }

    #[test]
    fn nested_builder() {
        let order: Order<Conf> = OrderBuilder::new()
            .push_nested(id("y"), OrderBuilder::new().push(id("b")))
            .push_nested(id("x"), OrderBuilder::new().push(id("a")))
            .build();

        assert_eq!(order.identifier(), "x");
        assert_eq!(order.nested().identifier(), "a");
        assert!(order.nested().nested().is_empty());
        assert!(order.nested().next().is_empty());

        assert_eq!(order.next().identifier(), "y");
        assert_eq!(order.next().nested().identifier(), "b");
        assert!(order.next().next().is_empty());
    }

    #[test]
    fn variables_are_dense_per_level() {
        let order: Order<Conf> = OrderBuilder::new()
            .push_nested(id("y"), OrderBuilder::new().push(id("b")))
            .push(id("m"))
            .push_nested(id("x"), OrderBuilder::new().push(id("a")))
            .build();

        assert_eq!(order.variable().0, 0);
        assert_eq!(order.next().variable().0, 1);
        assert_eq!(order.next().next().variable().0, 2);
        // Nested levels restart at zero.
        assert_eq!(order.nested().variable().0, 0);
        assert_eq!(order.next().next().nested().variable().0, 0);
    }

    #[test]
    fn compare_is_depth_first() {
        //  a, x[z[b]], y[c]
        let order: Order<Conf> = OrderBuilder::new()
            .push_nested(id("y"), OrderBuilder::new().push(id("c")))
            .push_nested(
                id("x"),
                OrderBuilder::new().push_nested(id("z"), OrderBuilder::new().push(id("b"))),
            )
            .push(id("a"))
            .build();

        let mut identifiers = vec![id("a"), id("b"), id("c"), id("x"), id("y"), id("z")];
        identifiers.sort_by(|lhs, rhs| order.compare(lhs, rhs));
        assert_eq!(
            identifiers,
            vec![id("a"), id("x"), id("z"), id("b"), id("y"), id("c")]
        );

        assert_eq!(order.compare(&id("a"), &id("a")), Ordering::Equal);
    }

    #[test]
    fn contains() {
        let order: Order<Conf> = OrderBuilder::new()
            .push_nested(id("y"), OrderBuilder::new().push(id("c")))
            .push_nested(
                id("x"),
                OrderBuilder::new().push_nested(id("z"), OrderBuilder::new().push(id("b"))),
            )
            .push(id("a"))
            .build();

        assert!(order.contains(&id("y"), &id("c")));
        assert!(order.contains(&id("x"), &id("z")));
        assert!(order.contains(&id("x"), &id("b")));
        assert!(order.contains(&id("z"), &id("b")));

        assert!(!order.contains(&id("y"), &id("b")));
        assert!(!order.contains(&id("x"), &id("c")));
        assert!(!order.contains(&id("x"), &id("y")));
        assert!(!order.contains(&id("x"), &id("x")));
        assert!(!order.contains(&id("a"), &id("y")));
        assert!(!order.contains(&id("a"), &id("a")));
        assert!(!order.contains(&id("a"), &id("unknown")));
    }

    #[test]
    #[should_panic(expected = "appears twice")]
    fn duplicate_identifier() {
        let _ = OrderBuilder::<Conf>::new()
            .push_nested(id("x"), OrderBuilder::new().push(id("a")))
            .push(id("a"))
            .build();
    }
}
