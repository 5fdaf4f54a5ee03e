//! Simulation statistics collection and reporting.
//!
//! This module tracks metrics for a trace run through the load/store unit.
//! It provides:
//! 1. **Progress:** Cycles, dispatched/executed/retired instruction counts.
//! 2. **Mix:** Loads and stores dispatched.
//! 3. **Stalls:** Dispatch stalls split by full load queue / full store
//!    queue, and issue stalls split by predecessor state.
//! 4. **Grouping:** Memory groups created vs. loads folded into an existing
//!    group, dependency edges split by kind, elided alias edges, and queue
//!    high-water marks.

/// Counters collected over one simulation run.
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    /// Total simulated cycles.
    pub cycles: u64,
    /// Instructions dispatched to the LSU.
    pub dispatched: u64,
    /// Instructions that finished executing.
    pub executed: u64,
    /// Instructions retired.
    pub retired: u64,

    /// Load-queue occupants dispatched (instructions with `may_load`).
    pub loads_dispatched: u64,
    /// Store-queue occupants dispatched.
    pub stores_dispatched: u64,

    /// Dispatch stalls caused by a full load queue.
    pub lq_full_stalls: u64,
    /// Dispatch stalls caused by a full store queue.
    pub sq_full_stalls: u64,

    /// Instruction-cycles stalled on a predecessor that has not issued.
    pub waiting_stall_cycles: u64,
    /// Instruction-cycles stalled on predecessors that have all issued but
    /// not yet executed.
    pub pending_stall_cycles: u64,

    /// Memory groups created.
    pub groups_created: u64,
    /// Loads folded into an already open load group.
    pub groups_extended: u64,

    /// Ordering-only dependency edges wired.
    pub order_edges: u64,
    /// Data-dependent edges wired.
    pub data_edges: u64,
    /// Data dependencies elided by the alias test (edge skipped or demoted
    /// to ordering-only).
    pub alias_edges_elided: u64,

    /// Executed instructions that younger groups were waiting on.
    pub blocking_executed: u64,

    /// Most load-queue slots in use at once.
    pub max_lq_used: u64,
    /// Most store-queue slots in use at once.
    pub max_sq_used: u64,
}

impl SimStats {
    /// Prints the report to stdout.
    pub fn print(&self) {
        println!("=== simulation statistics ===");
        println!("cycles:             {}", self.cycles);
        println!("dispatched:         {}", self.dispatched);
        println!("  loads:            {}", self.loads_dispatched);
        println!("  stores:           {}", self.stores_dispatched);
        println!("executed:           {}", self.executed);
        println!("retired:            {}", self.retired);
        println!("dispatch stalls:");
        println!("  load queue full:  {}", self.lq_full_stalls);
        println!("  store queue full: {}", self.sq_full_stalls);
        println!("issue stalls (instruction-cycles):");
        println!("  preds not issued: {}", self.waiting_stall_cycles);
        println!("  preds in flight:  {}", self.pending_stall_cycles);
        println!("memory groups:");
        println!("  created:          {}", self.groups_created);
        println!("  loads folded in:  {}", self.groups_extended);
        println!("dependency edges:");
        println!("  ordering only:    {}", self.order_edges);
        println!("  data-dependent:   {}", self.data_edges);
        println!("  alias elided:     {}", self.alias_edges_elided);
        println!("blocking executed:  {}", self.blocking_executed);
        println!("queue high-water marks:");
        println!("  load queue:       {}", self.max_lq_used);
        println!("  store queue:      {}", self.max_sq_used);
        if self.cycles > 0 {
            let ipc = self.retired as f64 / self.cycles as f64;
            println!("retired per cycle:  {ipc:.3}");
        }
    }
}
