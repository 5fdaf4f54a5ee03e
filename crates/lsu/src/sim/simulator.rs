//! Reference scheduler driving the LSU cycle by cycle.
//!
//! Replays a program of memory instructions through the full unit contract:
//! `is_available` gates dispatch, groups issue only once ready, execution
//! takes the instruction's fixed latency, and retirement runs in program
//! order. A configurable number of instructions dispatch per cycle; issue
//! and completion are otherwise unconstrained, which is enough to observe
//! every ordering edge the unit builds.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::config::Config;
use crate::insn::{InstRef, Instruction};
use crate::lsu::group::GroupId;
use crate::lsu::unit::{Lsu, LsuBase, Status};
use crate::sim::trace::{self, TraceOp};
use crate::stats::SimStats;

/// Lifecycle phase of a simulated instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    Dispatched,
    Issued,
    Executed,
    Retired,
}

/// Top-level simulator: the LSU plus the program it replays.
pub struct Simulator {
    lsu: Lsu,
    insts: Vec<Instruction>,
    phase: Vec<Phase>,
    next_dispatch: usize,
    next_retire: usize,
    /// Instructions dispatched to the unit per cycle.
    pub dispatch_width: usize,
    /// Emit the unit's debug dump after every cycle.
    pub dump_each_cycle: bool,
    /// Counters collected so far.
    pub stats: SimStats,
    last_group: Option<GroupId>,
}

impl Simulator {
    /// Builds a simulator for an already-lowered program.
    pub fn new(lsu: Lsu, insts: Vec<Instruction>) -> Self {
        let phase = vec![Phase::Pending; insts.len()];
        Self {
            lsu,
            insts,
            phase,
            next_dispatch: 0,
            next_retire: 0,
            dispatch_width: 4,
            dump_each_cycle: false,
            stats: SimStats::default(),
            last_group: None,
        }
    }

    /// Builds a simulator from a trace: lowers the ops, fills the metadata
    /// registry, and constructs the unit from `config`.
    pub fn from_trace(ops: &[TraceOp], config: &Config) -> Self {
        let (insts, registry) = trace::assemble(ops, &config.timing);
        let lsu = Lsu::from_config(config, Some(Rc::new(RefCell::new(registry))));
        let mut sim = Self::new(lsu, insts);
        sim.dispatch_width = config.timing.dispatch_width.max(1);
        sim
    }

    /// The unit under simulation.
    pub fn lsu(&self) -> &Lsu {
        &self.lsu
    }

    /// The program being replayed.
    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    /// Returns true once every instruction has retired.
    pub fn is_done(&self) -> bool {
        self.next_retire == self.insts.len()
    }

    /// Advances the simulation by one clock cycle.
    pub fn tick(&mut self) {
        self.stats.cycles += 1;

        self.complete_executions();
        self.issue_ready();
        self.dispatch_group();
        self.retire_in_order();

        let base = self.lsu.base();
        self.stats.order_edges = base.order_edges();
        self.stats.data_edges = base.data_edges();
        self.stats.alias_edges_elided = base.alias_edges_elided();

        self.lsu.cycle_event();
        if self.dump_each_cycle {
            self.lsu.dump();
        }
    }

    /// Runs until the program drains or `max_cycles` elapse.
    ///
    /// Returns the number of cycles simulated.
    pub fn run(&mut self, max_cycles: u64) -> u64 {
        while !self.is_done() {
            if self.stats.cycles >= max_cycles {
                warn!("simulation hit the {max_cycles}-cycle limit before draining");
                break;
            }
            self.tick();
        }
        self.stats.cycles
    }

    /// Ages issued instructions; the ones that finish notify the unit.
    fn complete_executions(&mut self) {
        for i in 0..self.insts.len() {
            if self.phase[i] != Phase::Issued {
                continue;
            }
            let inst = &mut self.insts[i];
            if inst.cycles_left > 0 {
                inst.cycles_left -= 1;
            }
            if inst.cycles_left == 0 {
                self.phase[i] = Phase::Executed;
                self.stats.executed += 1;
                let ir = InstRef::new(i as u64, &self.insts[i]);
                if self.lsu.base().has_dependent_users(ir) {
                    self.stats.blocking_executed += 1;
                }
                self.lsu.on_instruction_executed(ir);
            }
        }
    }

    /// Issues every dispatched instruction whose group is ready; the rest
    /// are charged a stall cycle classified by their predecessor state.
    fn issue_ready(&mut self) {
        for i in 0..self.insts.len() {
            if self.phase[i] != Phase::Dispatched {
                continue;
            }
            let ir = InstRef::new(i as u64, &self.insts[i]);
            if self.lsu.base().is_ready(ir) {
                self.lsu.on_instruction_issued(ir);
                self.phase[i] = Phase::Issued;
            } else if self.lsu.base().is_waiting(ir) {
                self.stats.waiting_stall_cycles += 1;
            } else if self.lsu.base().is_pending(ir) {
                self.stats.pending_stall_cycles += 1;
            }
        }
    }

    /// Dispatches up to `dispatch_width` instructions, stopping at the first
    /// queue-full verdict.
    fn dispatch_group(&mut self) {
        for _ in 0..self.dispatch_width {
            let i = self.next_dispatch;
            if i == self.insts.len() {
                return;
            }

            let ir = InstRef::new(i as u64, &self.insts[i]);
            match self.lsu.is_available(ir) {
                Status::LoadQueueFull => {
                    self.stats.lq_full_stalls += 1;
                    return;
                }
                Status::StoreQueueFull => {
                    self.stats.sq_full_stalls += 1;
                    return;
                }
                Status::Available => {}
            }

            let desc = ir.instruction().desc;
            let access = self.lsu.base().memory_access_md(ir);
            if desc.may_load {
                self.stats.loads_dispatched += 1;
            }
            if LsuBase::is_store(&desc, access.as_ref()) {
                self.stats.stores_dispatched += 1;
            }

            let gid = self.lsu.dispatch(ir);
            self.insts[i].lsu_token = Some(gid);
            self.phase[i] = Phase::Dispatched;
            self.next_dispatch += 1;

            self.stats.dispatched += 1;
            if self.last_group == Some(gid) {
                self.stats.groups_extended += 1;
            } else {
                self.stats.groups_created += 1;
            }
            self.last_group = Some(gid);

            let base = self.lsu.base();
            self.stats.max_lq_used = self.stats.max_lq_used.max(base.used_lq_entries() as u64);
            self.stats.max_sq_used = self.stats.max_sq_used.max(base.used_sq_entries() as u64);
        }
    }

    /// Retires executed instructions from the head, in program order.
    fn retire_in_order(&mut self) {
        while self.next_retire < self.insts.len() && self.phase[self.next_retire] == Phase::Executed
        {
            let i = self.next_retire;
            let ir = InstRef::new(i as u64, &self.insts[i]);
            self.lsu.on_instruction_retired(ir);
            self.phase[i] = Phase::Retired;
            self.next_retire += 1;
            self.stats.retired += 1;
        }
    }
}
