//! Dispatch policy tests: group creation, extension, and the
//! load/store grouping rules.

use crate::common::{Harness, amo, load, store};

// ══════════════════════════════════════════════════════════
// 1. Load grouping
// ══════════════════════════════════════════════════════════

#[test]
fn consecutive_loads_share_a_group() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(load().at(0x0, 8));
    let g2 = h.dispatch(load().at(0x10, 8));
    assert_eq!(g1, g2);
    assert_eq!(h.lsu.base().get_group(g1).num_instructions(), 2);
    assert_eq!(h.lsu.base().used_lq_entries(), 2);
    assert_eq!(h.lsu.base().num_groups(), 1);
}

#[test]
fn loads_do_not_join_an_issuing_group() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(load().at(0x0, 8));
    h.issue(0);

    let g2 = h.dispatch(load().at(0x10, 8));
    assert_ne!(g1, g2);
    // Nothing orders the new load group; it is born ready.
    assert_eq!(h.lsu.base().get_group(g2).num_predecessors(), 0);
    assert!(h.lsu.base().get_group(g2).is_ready());
}

#[test]
fn intervening_store_splits_load_groups() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(load().at(0x0, 8));
    assert_eq!(h.dispatch(load().at(0x8, 8)), g1);

    let g2 = h.dispatch(store().at(0x20, 4));
    assert_ne!(g2, g1);

    // Loads and stores never share a group, even though this load could
    // not alias the store.
    let g3 = h.dispatch(load().at(0x40, 8));
    assert_ne!(g3, g2);
    assert_ne!(g3, g1);

    // Later loads fold into the new group again.
    assert_eq!(h.dispatch(load().at(0x48, 8)), g3);
}

// ══════════════════════════════════════════════════════════
// 2. Store grouping
// ══════════════════════════════════════════════════════════

#[test]
fn stores_never_share_a_group() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(store().at(0x0, 8));
    let g2 = h.dispatch(store().at(0x100, 8));
    assert_ne!(g1, g2);
    assert_eq!(h.lsu.base().get_group(g1).num_instructions(), 1);
    assert_eq!(h.lsu.base().get_group(g2).num_instructions(), 1);
}

#[test]
fn store_after_load_depends_on_the_load_group() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(load());
    let g2 = h.dispatch(store());
    assert_ne!(g1, g2);

    let store_group = h.lsu.base().get_group(g2);
    assert_eq!(store_group.num_predecessors(), 1);
    assert!(!store_group.is_ready());
    // Without metadata on either side the edge is conservatively
    // data-dependent.
    assert_eq!(h.lsu.base().get_group(g1).data_successors(), &[g2]);
}

#[test]
fn store_chain_orders_store_to_store() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(store().at(0x0, 8));
    let g2 = h.dispatch(store().at(0x0, 8));
    // Overlapping stores: the younger one carries a data edge.
    assert_eq!(h.lsu.base().get_group(g1).data_successors(), &[g2]);
    assert_eq!(h.lsu.base().get_group(g2).num_predecessors(), 1);
}

// ══════════════════════════════════════════════════════════
// 3. Combined load/store ops
// ══════════════════════════════════════════════════════════

#[test]
fn amo_sets_both_current_pointers() {
    let mut h = Harness::new(4, 4);
    let g1 = h.dispatch(amo().at(0x0, 8));
    assert_eq!(h.lsu.current_load_group(), Some(g1));
    assert_eq!(h.lsu.current_store_group(), Some(g1));

    // A later load sees a store younger than every load and opens a new
    // group instead of joining.
    let g2 = h.dispatch(load().at(0x100, 8));
    assert_ne!(g2, g1);
    assert_eq!(h.lsu.current_load_group(), Some(g2));
    assert_eq!(h.lsu.current_store_group(), Some(g1));
}
