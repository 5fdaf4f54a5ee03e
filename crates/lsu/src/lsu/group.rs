//! Memory groups: nodes of the in-flight dependency DAG.
//!
//! A [`MemoryGroup`] represents one or more concurrently dispatched memory
//! instructions that share the same ordering constraints. It tracks:
//! 1. **Edges:** Successor ids split into ordering-only and data-dependent
//!    lists, plus predecessor counters mirrored on the successor side.
//! 2. **Progress:** How many of its instructions have been issued and
//!    executed, how many predecessors have issued/executed, and how many
//!    cycles the group has spent blocked on predecessors.
//! 3. **Accesses:** The bundled [`MemAccess`] descriptors used for precise
//!    alias checks against incoming instructions.
//!
//! Groups are owned exclusively by the unit's group table; edges are plain
//! ids, so all cross-group notifications are mediated by the owner.

use crate::lsu::access::MemAccess;
use std::fmt;

/// Unique identifier of a live memory group.
///
/// Ids are allocated from 1 and never reused; `Option<GroupId>` is the
/// nullable form. Program order follows id order, so the policy layer
/// compares ids directly to find dominators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the memory dependency DAG.
#[derive(Debug, Default)]
pub struct MemoryGroup {
    num_predecessors: u32,
    num_executing_predecessors: u32,
    num_executed_predecessors: u32,

    num_instructions: u32,
    num_executing: u32,
    num_executed: u32,

    order_succ: Vec<GroupId>,
    data_succ: Vec<GroupId>,

    wait_cycles: u32,

    mem_accesses: Vec<MemAccess>,
}

impl MemoryGroup {
    /// Total predecessor edges wired into this group.
    #[inline]
    pub fn num_predecessors(&self) -> u32 {
        self.num_predecessors
    }

    /// Predecessor groups currently executing.
    #[inline]
    pub fn num_executing_predecessors(&self) -> u32 {
        self.num_executing_predecessors
    }

    /// Predecessor groups fully executed.
    #[inline]
    pub fn num_executed_predecessors(&self) -> u32 {
        self.num_executed_predecessors
    }

    /// Instructions bundled into this group.
    #[inline]
    pub fn num_instructions(&self) -> u32 {
        self.num_instructions
    }

    /// Instructions issued so far.
    #[inline]
    pub fn num_executing(&self) -> u32 {
        self.num_executing
    }

    /// Instructions that finished executing.
    #[inline]
    pub fn num_executed(&self) -> u32 {
        self.num_executed
    }

    /// Ordering-only successor ids.
    pub fn order_successors(&self) -> &[GroupId] {
        &self.order_succ
    }

    /// Data-dependent successor ids.
    pub fn data_successors(&self) -> &[GroupId] {
        &self.data_succ
    }

    /// Total successor edges out of this group.
    pub fn num_successors(&self) -> usize {
        self.order_succ.len() + self.data_succ.len()
    }

    /// Cycles this group has spent with at least one unexecuted predecessor.
    #[inline]
    pub fn wait_cycles(&self) -> u32 {
        self.wait_cycles
    }

    /// Some predecessor has neither issued nor executed yet.
    pub fn is_waiting(&self) -> bool {
        self.num_predecessors > self.num_executing_predecessors + self.num_executed_predecessors
    }

    /// Every predecessor has at least issued, and at least one is still executing.
    pub fn is_pending(&self) -> bool {
        self.num_executing_predecessors > 0
            && self.num_executed_predecessors + self.num_executing_predecessors
                == self.num_predecessors
    }

    /// All predecessors have fully executed.
    pub fn is_ready(&self) -> bool {
        self.num_executed_predecessors == self.num_predecessors
    }

    /// At least one instruction has issued and at least one has not executed.
    pub fn is_executing(&self) -> bool {
        self.num_executing > 0 && self.num_executed < self.num_instructions
    }

    /// Every instruction in the group has executed.
    pub fn is_executed(&self) -> bool {
        self.num_executed == self.num_instructions
    }

    /// Adds one instruction to the group.
    ///
    /// Only legal while the group is still accumulating: the policy layer
    /// never extends a group once younger groups depend on it.
    pub fn add_instruction(&mut self) {
        debug_assert!(
            self.num_successors() == 0,
            "group with successors can no longer accumulate instructions"
        );
        self.num_instructions += 1;
    }

    /// Records the instruction's memory access, if it has one.
    pub fn add_mem_access(&mut self, access: Option<MemAccess>) {
        if let Some(access) = access {
            self.mem_accesses.push(access);
        }
    }

    /// Returns true if any instruction in the group registered an access.
    pub fn has_mem_accesses(&self) -> bool {
        !self.mem_accesses.is_empty()
    }

    /// Returns true if any access in the group overlaps `access`.
    pub fn is_mem_access_alias(&self, access: &MemAccess) -> bool {
        self.mem_accesses.iter().any(|own| own.overlaps(access))
    }

    /// Records `succ` as a successor; the owner bumps the counters on the
    /// successor side.
    pub(crate) fn record_successor(&mut self, succ: GroupId, is_data_dependent: bool) {
        if is_data_dependent {
            self.data_succ.push(succ);
        } else {
            self.order_succ.push(succ);
        }
    }

    /// One more predecessor edge now points at this group.
    pub(crate) fn on_predecessor_added(&mut self) {
        self.num_predecessors += 1;
    }

    /// A predecessor group started executing.
    pub(crate) fn on_group_issued(&mut self) {
        debug_assert!(!self.is_ready(), "issue event on a ready group");
        self.num_executing_predecessors += 1;
    }

    /// A predecessor group finished executing.
    pub(crate) fn on_group_executed(&mut self) {
        debug_assert!(
            self.num_executing_predecessors > 0,
            "executed event without a matching issue"
        );
        self.num_executing_predecessors -= 1;
        self.num_executed_predecessors += 1;
    }

    /// One of the group's instructions was issued.
    ///
    /// Returns true when this is the issue that puts the group in the
    /// executing state; the owner then notifies every successor.
    pub(crate) fn on_instruction_issued(&mut self) -> bool {
        debug_assert!(
            self.num_executing < self.num_instructions,
            "issued more instructions than the group holds"
        );
        let was_executing = self.is_executing();
        self.num_executing += 1;
        !was_executing
    }

    /// One of the group's instructions finished executing.
    ///
    /// Returns true when this completes the whole group; the owner then
    /// notifies every successor and removes the group.
    pub(crate) fn on_instruction_executed(&mut self) -> bool {
        debug_assert!(
            self.num_executed < self.num_executing,
            "executed an instruction that never issued"
        );
        self.num_executed += 1;
        self.is_executed()
    }

    /// Per-cycle tick: accumulates the time spent blocked on predecessors.
    pub fn cycle_event(&mut self) {
        if !self.is_ready() {
            self.wait_cycles += 1;
        }
    }
}
