//! Algebraic laws of the diagram operations.

use std::rc::Rc;

use num_bigint::BigUint;

use crate::flat_set;
use crate::manager::{options::SddOptions, SddManager};
use crate::order::{test::Conf, Order, OrderBuilder};
use crate::sdd::{PathItem, SddRef};

fn manager() -> SddManager<Conf> {
    SddManager::new(SddOptions::default())
}

fn id(name: &str) -> String {
    name.to_string()
}

fn two_level_order() -> Order<Conf> {
    OrderBuilder::new().push(id("b")).push(id("a")).build()
}

/// A few structurally different diagrams over `<a, b>` to quantify over.
fn samples(manager: &SddManager<Conf>, order: &Order<Conf>) -> Vec<SddRef<Conf>> {
    let one = manager.one();
    let var_a = order.variable();
    let var_b = order.next().variable();

    let tail_fst = manager.flat(var_b, &flat_set![0, 1], &one);
    let tail_snd = manager.flat(var_b, &flat_set![1, 2], &one);

    vec![
        manager.zero(),
        manager.flat(var_a, &flat_set![0], &tail_fst),
        manager.flat(var_a, &flat_set![0, 1], &tail_snd),
        manager.from_flat_alpha(
            var_a,
            vec![
                (flat_set![0], tail_fst.clone()),
                (flat_set![1, 2], tail_snd.clone()),
            ],
        ),
        manager.from_flat_alpha(
            var_a,
            vec![(flat_set![2], tail_fst), (flat_set![5], tail_snd)],
        ),
    ]
}

#[test]
fn sum_is_commutative_and_associative() {
    let manager = manager();
    let order = two_level_order();
    let diagrams = samples(&manager, &order);

    for a in &diagrams {
        for b in &diagrams {
            assert_eq!(manager.sum(a, b), manager.sum(b, a));
            for c in &diagrams {
                assert_eq!(
                    manager.sum(a, &manager.sum(b, c)),
                    manager.sum(&manager.sum(a, b), c)
                );
            }
        }
    }
}

#[test]
fn intersection_is_commutative_and_associative() {
    let manager = manager();
    let order = two_level_order();
    let diagrams = samples(&manager, &order);

    for a in &diagrams {
        for b in &diagrams {
            assert_eq!(manager.intersection(a, b), manager.intersection(b, a));
            for c in &diagrams {
                assert_eq!(
                    manager.intersection(a, &manager.intersection(b, c)),
                    manager.intersection(&manager.intersection(a, b), c)
                );
            }
        }
    }
}

#[test]
fn neutral_elements_and_absorption() {
    let manager = manager();
    let order = two_level_order();

    for a in &samples(&manager, &order) {
        assert_eq!(manager.sum(a, &manager.zero()), *a);
        assert_eq!(manager.intersection(a, &manager.zero()), manager.zero());
        assert_eq!(manager.difference(a, &manager.zero()), *a);
        assert_eq!(manager.difference(&manager.zero(), a), manager.zero());
        assert_eq!(manager.difference(a, a), manager.zero());
        for b in &samples(&manager, &order) {
            // a U (a ^ b) = a
            assert_eq!(manager.sum(a, &manager.intersection(a, b)), *a);
        }
    }
}

#[test]
fn terminal_boundaries() {
    let manager = manager();
    let zero = manager.zero();
    let one = manager.one();

    assert_eq!(manager.sum(&zero, &zero), zero);
    assert_eq!(manager.sum(&one, &one), one);
    assert_eq!(manager.intersection(&zero, &one), zero);
    assert_eq!(manager.intersection(&one, &one), one);
    assert_eq!(manager.difference(&one, &one), zero);
    assert_eq!(manager.difference(&one, &zero), one);
}

#[test]
fn canonicity_is_pointer_equality() {
    let manager = manager();
    let order = two_level_order();
    let diagrams = samples(&manager, &order);

    for a in &diagrams {
        for b in &diagrams {
            let union_fst = manager.sum(a, b);
            let union_snd = manager.sum(b, a);
            assert_eq!(
                union_fst == union_snd,
                Rc::ptr_eq(&union_fst.0, &union_snd.0)
            );
        }
    }
}

#[test]
fn set_semantics_on_values() {
    let manager = manager();
    let order = two_level_order();
    let one = manager.one();
    let var_a = order.variable();
    let var_b = order.next().variable();

    let tail = manager.flat(var_b, &flat_set![9], &one);
    let low = manager.flat(var_a, &flat_set![0, 1, 2], &tail);
    let high = manager.flat(var_a, &flat_set![2, 3], &tail);

    assert_eq!(
        manager.sum(&low, &high),
        manager.flat(var_a, &flat_set![0, 1, 2, 3], &tail)
    );
    assert_eq!(
        manager.intersection(&low, &high),
        manager.flat(var_a, &flat_set![2], &tail)
    );
    assert_eq!(
        manager.difference(&low, &high),
        manager.flat(var_a, &flat_set![0, 1], &tail)
    );
}

#[test]
fn partition_is_refined_on_differing_successors() {
    let manager = manager();
    let order = two_level_order();
    let one = manager.one();
    let var_a = order.variable();
    let var_b = order.next().variable();

    let tail_fst = manager.flat(var_b, &flat_set![7], &one);
    let tail_snd = manager.flat(var_b, &flat_set![8], &one);

    let fst = manager.flat(var_a, &flat_set![0, 1], &tail_fst);
    let snd = manager.flat(var_a, &flat_set![1, 2], &tail_snd);
    let union = manager.sum(&fst, &snd);

    // {0} keeps 7, {1} reaches both, {2} keeps 8.
    let expected = manager.from_flat_alpha(
        var_a,
        vec![
            (flat_set![0], tail_fst.clone()),
            (flat_set![1], manager.sum(&tail_fst, &tail_snd)),
            (flat_set![2], tail_snd.clone()),
        ],
    );
    assert_eq!(union, expected);
    assert_eq!(manager.count(&union), BigUint::from(4_u32));
}

#[test]
fn hierarchical_operations() {
    let manager = manager();
    let one = manager.one();
    let order: Order<Conf> = OrderBuilder::new()
        .push_nested(id("x"), OrderBuilder::new().push(id("a")))
        .build();
    let var_x = order.variable();
    let var_a = order.nested().variable();

    let low = manager.hierarchical(var_x, &manager.flat(var_a, &flat_set![0, 1], &one), &one);
    let high = manager.hierarchical(var_x, &manager.flat(var_a, &flat_set![1, 2], &one), &one);

    let union = manager.sum(&low, &high);
    let expected =
        manager.hierarchical(var_x, &manager.flat(var_a, &flat_set![0, 1, 2], &one), &one);
    assert_eq!(union, expected);

    let common = manager.intersection(&low, &high);
    let expected = manager.hierarchical(var_x, &manager.flat(var_a, &flat_set![1], &one), &one);
    assert_eq!(common, expected);

    let only_low = manager.difference(&low, &high);
    let expected = manager.hierarchical(var_x, &manager.flat(var_a, &flat_set![0], &one), &one);
    assert_eq!(only_low, expected);
}

#[test]
fn paths_enumeration() {
    let manager = manager();
    let order = two_level_order();
    let one = manager.one();
    let var_a = order.variable();
    let var_b = order.next().variable();

    assert!(manager.zero().paths().is_empty());
    assert_eq!(one.paths(), vec![vec![]]);

    let tail_fst = manager.flat(var_b, &flat_set![7], &one);
    let tail_snd = manager.flat(var_b, &flat_set![8], &one);
    let sdd = manager.from_flat_alpha(
        var_a,
        vec![
            (flat_set![0], tail_fst.clone()),
            (flat_set![1], tail_snd.clone()),
        ],
    );

    let paths = sdd.paths();
    assert_eq!(
        paths,
        vec![
            vec![
                PathItem::Values(flat_set![0]),
                PathItem::Values(flat_set![7])
            ],
            vec![
                PathItem::Values(flat_set![1]),
                PathItem::Values(flat_set![8])
            ],
        ]
    );
}

#[test]
fn operations_are_memoized() {
    let manager = manager();
    let order = two_level_order();
    let diagrams = samples(&manager, &order);

    let fst = manager.sum(&diagrams[1], &diagrams[2]);
    let snd = manager.sum(&diagrams[1], &diagrams[2]);
    assert_eq!(fst, snd);

    manager.clear_caches();
    assert_eq!(manager.sum(&diagrams[1], &diagrams[2]), fst);
}
