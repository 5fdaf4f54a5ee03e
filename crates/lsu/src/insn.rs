//! Instruction contract consumed by the load/store unit.
//!
//! The LSU never decodes anything; it only consults a handful of facts about
//! each instruction. This module provides:
//! 1. **Descriptor:** Static `may_load`/`may_store` flags ([`InstrDesc`]).
//! 2. **Instance state:** Barrier flags, metadata token, the stamped group id,
//!    and the remaining execution latency ([`Instruction`]).
//! 3. **Reference:** A source-indexed borrow handed to every LSU callback
//!    ([`InstRef`]).

use crate::lsu::group::GroupId;

/// Static properties of an instruction relevant to memory scheduling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstrDesc {
    /// The instruction may read memory.
    pub may_load: bool,
    /// The instruction may write memory.
    pub may_store: bool,
}

impl InstrDesc {
    /// Returns true if the instruction touches memory at all.
    #[inline]
    pub fn is_mem_op(&self) -> bool {
        self.may_load || self.may_store
    }
}

/// One in-flight instruction, as seen by the LSU and its scheduler.
///
/// The scheduler owns the instruction; the LSU only reads it. After
/// `dispatch` returns, the scheduler stamps the allocated group id into
/// `lsu_token` so later callbacks can find the owning group.
#[derive(Clone, Debug, Default)]
pub struct Instruction {
    /// Static descriptor.
    pub desc: InstrDesc,
    /// Younger loads may not pass this instruction.
    pub is_load_barrier: bool,
    /// Younger stores may not pass this instruction.
    pub is_store_barrier: bool,
    /// Token for the metadata registry, if an access was registered.
    pub metadata_token: Option<u32>,
    /// Group id stamped by the scheduler after dispatch.
    pub lsu_token: Option<GroupId>,
    /// Execution cycles remaining once issued.
    pub cycles_left: u32,
}

impl Instruction {
    /// Creates an instruction from its descriptor; everything else defaults.
    pub fn new(desc: InstrDesc) -> Self {
        Self {
            desc,
            ..Self::default()
        }
    }

    /// Returns true if the instruction touches memory at all.
    #[inline]
    pub fn is_mem_op(&self) -> bool {
        self.desc.is_mem_op()
    }
}

/// A borrowed instruction paired with its program-order index.
#[derive(Clone, Copy)]
pub struct InstRef<'a> {
    idx: u64,
    inst: &'a Instruction,
}

impl<'a> InstRef<'a> {
    /// Pairs an instruction with its source index.
    pub fn new(idx: u64, inst: &'a Instruction) -> Self {
        Self { idx, inst }
    }

    /// Program-order index of the instruction.
    #[inline]
    pub fn source_index(&self) -> u64 {
        self.idx
    }

    /// The referenced instruction.
    #[inline]
    pub fn instruction(&self) -> &'a Instruction {
        self.inst
    }
}
