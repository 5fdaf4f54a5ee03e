//! End-to-end replay of instruction sequences through the reference
//! scheduler, checking queue drain, group accounting, and ordering effects
//! on the cycle count.

use lsu_core::config::Config;
use lsu_core::sim::trace::{TraceAccess, TraceKind, TraceOp};
use lsu_core::sim::Simulator;

fn op(kind: TraceKind, addr: u64, size: u32) -> TraceOp {
    TraceOp {
        kind,
        accesses: vec![TraceAccess {
            store: None,
            addr,
            size,
        }],
        latency: None,
    }
}

fn op_with_latency(kind: TraceKind, addr: u64, size: u32, latency: u32) -> TraceOp {
    TraceOp {
        latency: Some(latency),
        ..op(kind, addr, size)
    }
}

fn run(ops: &[TraceOp], config: &Config) -> Simulator {
    let mut sim = Simulator::from_trace(ops, config);
    sim.run(10_000);
    assert!(sim.is_done(), "trace failed to drain");
    sim
}

fn small_queues() -> Config {
    let mut config = Config::default();
    config.lsu.lq_size = 4;
    config.lsu.sq_size = 4;
    config
}

// ══════════════════════════════════════════════════════════
// 1. Grouping observed through the stats
// ══════════════════════════════════════════════════════════

#[test]
fn back_to_back_loads_share_one_group() {
    let ops = [op(TraceKind::Load, 0x0, 8), op(TraceKind::Load, 0x10, 8)];
    let sim = run(&ops, &small_queues());

    assert_eq!(sim.stats.groups_created, 1);
    assert_eq!(sim.stats.groups_extended, 1);
    assert_eq!(sim.stats.max_lq_used, 2);
    assert_eq!(sim.stats.retired, 2);

    // Independent loads: no edges, no stalls, nothing blocking.
    assert_eq!(sim.stats.order_edges, 0);
    assert_eq!(sim.stats.data_edges, 0);
    assert_eq!(sim.stats.waiting_stall_cycles, 0);
    assert_eq!(sim.stats.pending_stall_cycles, 0);
    assert_eq!(sim.stats.blocking_executed, 0);
}

#[test]
fn load_store_load_chain_drains_completely() {
    let ops = [
        op(TraceKind::Load, 0x0, 8),
        op(TraceKind::Load, 0x8, 8),
        op(TraceKind::Store, 0x20, 4),
        op(TraceKind::Load, 0x40, 8),
    ];
    let sim = run(&ops, &small_queues());

    // First two loads fold together; the store and the last load each open
    // a group of their own.
    assert_eq!(sim.stats.groups_created, 3);
    assert_eq!(sim.stats.groups_extended, 1);
    assert_eq!(sim.stats.loads_dispatched, 3);
    assert_eq!(sim.stats.stores_dispatched, 1);
    assert_eq!(sim.stats.retired, 4);

    // All ranges are disjoint: the load-then-store edge is demoted to
    // ordering-only and the store-then-load edge is skipped.
    assert_eq!(sim.stats.order_edges, 1);
    assert_eq!(sim.stats.data_edges, 0);
    assert_eq!(sim.stats.alias_edges_elided, 2);
    // The store still pends behind the load group it must not pass, and
    // both loads of that group count as blocking it.
    assert!(sim.stats.pending_stall_cycles > 0);
    assert_eq!(sim.stats.waiting_stall_cycles, 0);
    assert_eq!(sim.stats.blocking_executed, 2);

    // Every slot released, every group reclaimed.
    assert_eq!(sim.lsu().base().used_lq_entries(), 0);
    assert_eq!(sim.lsu().base().used_sq_entries(), 0);
    assert_eq!(sim.lsu().base().num_groups(), 0);
}

#[test]
fn fence_trace_parses_and_drains() {
    let ops: Vec<TraceOp> = serde_json::from_str(
        r#"[
            { "kind": "load", "accesses": [ { "addr": 0, "size": 8 } ] },
            { "kind": "fence" },
            { "kind": "store", "accesses": [ { "addr": 64, "size": 8 } ] }
        ]"#,
    )
    .unwrap();
    let sim = run(&ops, &small_queues());
    assert_eq!(sim.stats.groups_created, 3);
    assert_eq!(sim.stats.retired, 3);
    assert_eq!(sim.lsu().base().num_groups(), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Ordering is visible in the cycle count
// ══════════════════════════════════════════════════════════

#[test]
fn aliasing_load_waits_for_the_store() {
    let slow_store_then_aliasing_load = [
        op_with_latency(TraceKind::Store, 0x0, 8, 10),
        op_with_latency(TraceKind::Load, 0x0, 8, 1),
    ];
    let slow_store_then_disjoint_load = [
        op_with_latency(TraceKind::Store, 0x0, 8, 10),
        op_with_latency(TraceKind::Load, 0x400, 8, 1),
    ];

    let config = small_queues();
    let aliased = run(&slow_store_then_aliasing_load, &config);
    let disjoint = run(&slow_store_then_disjoint_load, &config);

    // The aliasing load may not issue until the store executes; the
    // disjoint one overlaps with it and finishes earlier.
    assert!(aliased.stats.cycles > disjoint.stats.cycles);

    assert_eq!(aliased.stats.data_edges, 1);
    assert_eq!(aliased.stats.alias_edges_elided, 0);
    assert!(aliased.stats.pending_stall_cycles > 0);
    assert_eq!(aliased.stats.blocking_executed, 1);

    assert_eq!(disjoint.stats.data_edges, 0);
    assert_eq!(disjoint.stats.alias_edges_elided, 1);
    assert_eq!(disjoint.stats.blocking_executed, 0);
}

// ══════════════════════════════════════════════════════════
// 3. Queue pressure
// ══════════════════════════════════════════════════════════

#[test]
fn full_load_queue_stalls_dispatch_until_retirement() {
    let mut config = Config::default();
    config.lsu.lq_size = 2;
    config.lsu.sq_size = 2;

    let ops = [
        op_with_latency(TraceKind::Load, 0x0, 8, 8),
        op_with_latency(TraceKind::Load, 0x40, 8, 8),
        op_with_latency(TraceKind::Load, 0x80, 8, 8),
        op_with_latency(TraceKind::Load, 0xC0, 8, 8),
    ];
    let sim = run(&ops, &config);

    assert!(sim.stats.lq_full_stalls > 0);
    assert_eq!(sim.stats.max_lq_used, 2);
    assert_eq!(sim.stats.retired, 4);
    assert_eq!(sim.lsu().base().used_lq_entries(), 0);
}
