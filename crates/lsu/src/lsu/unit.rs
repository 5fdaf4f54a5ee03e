//! The load/store unit: queue accounting and dispatch policy.
//!
//! Split in two layers, mirroring the hardware's bookkeeping/decision split:
//! 1. **[`LsuBase`]:** Owns the group table, the LQ/SQ counters, the alias
//!    policy, and the metadata lookup; forwards lifecycle events to groups
//!    and erases them once fully executed.
//! 2. **[`Lsu`]:** The dispatch decision procedure. Maintains the four
//!    "current" pointers (load, store, load barrier, store barrier), decides
//!    whether an incoming instruction starts a new group or extends the
//!    current load group, and wires dependency edges to older groups.
//!
//! Queue-full conditions are reported through [`Status`] and are the only
//! recoverable errors; every other misuse (dispatching a non-memory
//! instruction, touching a dead group, releasing an empty queue) is a caller
//! bug and panics with a diagnostic.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::config::ProcModel;
use crate::insn::{InstRef, InstrDesc};
use crate::lsu::access::MemAccess;
use crate::lsu::group::{GroupId, MemoryGroup};
use crate::metadata::MetadataRegistry;

/// Verdict of the availability pre-check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Both queues can accept the instruction.
    Available,
    /// The load queue is full; the scheduler must stall the instruction.
    LoadQueueFull,
    /// The store queue is full; the scheduler must stall the instruction.
    StoreQueueFull,
}

/// Bookkeeping layer: group table, queue counters, alias policy.
pub struct LsuBase {
    lq_size: u32,
    sq_size: u32,
    used_lq: u32,
    used_sq: u32,
    assume_no_alias: bool,
    next_group_id: u32,
    groups: BTreeMap<GroupId, MemoryGroup>,
    metadata: Option<Rc<RefCell<MetadataRegistry>>>,
    order_edges: u64,
    data_edges: u64,
    alias_edges_elided: u64,
}

impl LsuBase {
    /// Creates the unit with the given queue sizes.
    ///
    /// A size of zero defers to the processor model's extra-info record; if
    /// the model does not carry one either, the queue is unbounded.
    pub fn new(
        model: &ProcModel,
        lq_size: u32,
        sq_size: u32,
        assume_no_alias: bool,
        metadata: Option<Rc<RefCell<MetadataRegistry>>>,
    ) -> Self {
        let mut lq_size = lq_size;
        let mut sq_size = sq_size;
        if let Some(extra) = &model.extra {
            if lq_size == 0 {
                lq_size = extra.load_queue_size;
            }
            if sq_size == 0 {
                sq_size = extra.store_queue_size;
            }
        }
        Self {
            lq_size,
            sq_size,
            used_lq: 0,
            used_sq: 0,
            assume_no_alias,
            next_group_id: 1,
            groups: BTreeMap::new(),
            metadata,
            order_edges: 0,
            data_edges: 0,
            alias_edges_elided: 0,
        }
    }

    /// Load queue capacity (0 = unbounded).
    #[inline]
    pub fn lq_size(&self) -> u32 {
        self.lq_size
    }

    /// Store queue capacity (0 = unbounded).
    #[inline]
    pub fn sq_size(&self) -> u32 {
        self.sq_size
    }

    /// Occupied load queue slots.
    #[inline]
    pub fn used_lq_entries(&self) -> u32 {
        self.used_lq
    }

    /// Occupied store queue slots.
    #[inline]
    pub fn used_sq_entries(&self) -> u32 {
        self.used_sq
    }

    /// Returns true if a bounded load queue has no free slot.
    #[inline]
    pub fn is_lq_full(&self) -> bool {
        self.lq_size != 0 && self.used_lq == self.lq_size
    }

    /// Returns true if a bounded store queue has no free slot.
    #[inline]
    pub fn is_sq_full(&self) -> bool {
        self.sq_size != 0 && self.used_sq == self.sq_size
    }

    /// Reserves one load queue slot.
    pub fn acquire_lq_slot(&mut self) {
        self.used_lq += 1;
    }

    /// Reserves one store queue slot.
    pub fn acquire_sq_slot(&mut self) {
        self.used_sq += 1;
    }

    /// Releases one load queue slot.
    pub fn release_lq_slot(&mut self) {
        assert!(self.used_lq > 0, "released a load queue slot twice");
        self.used_lq -= 1;
    }

    /// Releases one store queue slot.
    pub fn release_sq_slot(&mut self) {
        assert!(self.used_sq > 0, "released a store queue slot twice");
        self.used_sq -= 1;
    }

    /// Allocates the next group id and inserts an empty group.
    pub fn create_memory_group(&mut self) -> GroupId {
        let gid = GroupId(self.next_group_id);
        self.next_group_id += 1;
        self.groups.insert(gid, MemoryGroup::default());
        gid
    }

    /// Returns true if `gid` names a live group.
    #[inline]
    pub fn is_valid_group(&self, gid: GroupId) -> bool {
        self.groups.contains_key(&gid)
    }

    /// Number of live groups.
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Looks up a live group; panics on a dead or unknown id.
    pub fn get_group(&self, gid: GroupId) -> &MemoryGroup {
        self.groups
            .get(&gid)
            .unwrap_or_else(|| panic!("group {gid} is not live"))
    }

    /// Mutable group lookup; panics on a dead or unknown id.
    pub fn get_group_mut(&mut self, gid: GroupId) -> &mut MemoryGroup {
        self.groups
            .get_mut(&gid)
            .unwrap_or_else(|| panic!("group {gid} is not live"))
    }

    /// Resolves the instruction's registered memory access, if any.
    pub fn memory_access_md(&self, ir: InstRef<'_>) -> Option<MemAccess> {
        let registry = self.metadata.as_ref()?;
        let token = ir.instruction().metadata_token?;
        let registry = registry.borrow();
        registry.mem_access(token).cloned()
    }

    /// An instruction is a store if its descriptor says so or its registered
    /// access writes memory. Metadata may reclassify an opaque instruction.
    pub fn is_store(desc: &InstrDesc, access: Option<&MemAccess>) -> bool {
        desc.may_store || access.is_some_and(|a| a.is_store())
    }

    /// Returns true if `access` provably does not alias group `gid`.
    ///
    /// The interval test needs descriptors on both sides; when either the
    /// incoming instruction or the whole group lacks one, the global
    /// `assume_no_alias` policy decides. A barrier group with no registered
    /// access therefore stays conservative under the default policy.
    pub fn no_alias(&self, gid: GroupId, access: Option<&MemAccess>) -> bool {
        if let Some(access) = access {
            let group = self.get_group(gid);
            if group.has_mem_accesses() {
                trace!("[LSU] comparing group ({gid}) with access {access}");
                let aliases = group.is_mem_access_alias(access);
                if aliases {
                    debug!("[LSU] group ({gid}) aliases {access}");
                }
                return !aliases;
            }
        }
        self.assume_no_alias
    }

    /// Group id stamped on the instruction at dispatch.
    fn group_id_of(ir: InstRef<'_>) -> GroupId {
        ir.instruction()
            .lsu_token
            .expect("instruction was not dispatched to the LS unit")
    }

    /// Returns true if the instruction's group still waits on a predecessor
    /// that has not issued.
    pub fn is_waiting(&self, ir: InstRef<'_>) -> bool {
        self.get_group(Self::group_id_of(ir)).is_waiting()
    }

    /// Returns true if every predecessor of the instruction's group has at
    /// least issued, but not all have executed.
    pub fn is_pending(&self, ir: InstRef<'_>) -> bool {
        self.get_group(Self::group_id_of(ir)).is_pending()
    }

    /// Returns true if the instruction's group may issue.
    pub fn is_ready(&self, ir: InstRef<'_>) -> bool {
        self.get_group(Self::group_id_of(ir)).is_ready()
    }

    /// Returns true if younger groups depend on the instruction's group.
    pub fn has_dependent_users(&self, ir: InstRef<'_>) -> bool {
        self.get_group(Self::group_id_of(ir)).num_successors() > 0
    }

    /// Ordering-only dependency edges wired since construction.
    #[inline]
    pub fn order_edges(&self) -> u64 {
        self.order_edges
    }

    /// Data-dependent edges wired since construction.
    #[inline]
    pub fn data_edges(&self) -> u64 {
        self.data_edges
    }

    /// Data dependencies avoided because the alias test (or the
    /// `assume_no_alias` policy) proved the ranges disjoint. Counts both
    /// edges skipped outright and edges demoted to ordering-only.
    #[inline]
    pub fn alias_edges_elided(&self) -> u64 {
        self.alias_edges_elided
    }

    /// Ticks every live group once per simulated cycle.
    pub fn cycle_event(&mut self) {
        for group in self.groups.values_mut() {
            group.cycle_event();
        }
    }

    /// Wires a dependency edge `pred -> succ`.
    ///
    /// If the predecessor is already executing, the successor immediately
    /// observes the issue.
    pub(crate) fn add_dependency(&mut self, pred: GroupId, succ: GroupId, is_data_dependent: bool) {
        debug!("[LSU] GROUP DEP: ({pred}) --> ({succ})");
        if is_data_dependent {
            self.data_edges += 1;
        } else {
            self.order_edges += 1;
        }

        let pred_group = self.get_group_mut(pred);
        debug_assert!(
            !pred_group.is_executed(),
            "executed groups are erased before new edges can reach them"
        );
        let pred_executing = pred_group.is_executing();
        pred_group.record_successor(succ, is_data_dependent);

        let succ_group = self.get_group_mut(succ);
        succ_group.on_predecessor_added();
        if pred_executing {
            succ_group.on_group_issued();
        }
    }

    /// Notes that one of the group's instructions was issued and, when the
    /// group thereby starts executing, notifies its successors.
    pub fn on_instruction_issued(&mut self, ir: InstRef<'_>) {
        let gid = Self::group_id_of(ir);
        let group = self.get_group_mut(gid);
        if group.on_instruction_issued() {
            let order: Vec<GroupId> = group.order_successors().to_vec();
            let data: Vec<GroupId> = group.data_successors().to_vec();
            for succ in order.into_iter().chain(data) {
                self.get_group_mut(succ).on_group_issued();
            }
        }
    }

    /// Forwards the execute event and erases the group once every one of its
    /// instructions has executed.
    ///
    /// Erasure is safe at that point: the group has already propagated its
    /// completion to every successor, so no back-traversal ever needs it.
    pub fn on_instruction_executed(&mut self, ir: InstRef<'_>) {
        let gid = Self::group_id_of(ir);
        let group = self
            .groups
            .get_mut(&gid)
            .unwrap_or_else(|| panic!("instruction was not dispatched to the LS unit"));
        if group.on_instruction_executed() {
            let group = self.groups.remove(&gid).expect("group vanished");
            for &succ in group.order_successors() {
                self.get_group_mut(succ).on_group_executed();
            }
            for &succ in group.data_successors() {
                self.get_group_mut(succ).on_group_executed();
            }
        }
    }

    /// Releases the queue slots the instruction held.
    pub fn on_instruction_retired(&mut self, ir: InstRef<'_>) {
        let desc = &ir.instruction().desc;
        let access = self.memory_access_md(ir);
        let is_load = desc.may_load;
        let is_store = Self::is_store(desc, access.as_ref());
        assert!(is_load || is_store, "retired a non-memory instruction");

        if is_load {
            self.release_lq_slot();
            debug!(
                "[LSU] instruction idx={} left the load queue",
                ir.source_index()
            );
        }
        if is_store {
            self.release_sq_slot();
            debug!(
                "[LSU] instruction idx={} left the store queue",
                ir.source_index()
            );
        }
    }

    /// Logs queue occupancy, edge totals, and per-group counters.
    pub fn dump(&self) {
        debug!("[LSU] LQ size = {}", self.lq_size);
        debug!("[LSU] SQ size = {}", self.sq_size);
        debug!("[LSU] LQ used = {}", self.used_lq);
        debug!("[LSU] SQ used = {}", self.used_sq);
        debug!(
            "[LSU] edges: order = {}, data = {}, alias elided = {}",
            self.order_edges, self.data_edges, self.alias_edges_elided,
        );
        for (gid, group) in &self.groups {
            debug!(
                "[LSU] group ({gid}): preds = {}, preds issued = {}, preds executed = {}, \
                 insts = {}, issued = {}, executed = {}, blocked cycles = {}",
                group.num_predecessors(),
                group.num_executing_predecessors(),
                group.num_executed_predecessors(),
                group.num_instructions(),
                group.num_executing(),
                group.num_executed(),
                group.wait_cycles(),
            );
        }
    }
}

/// The full load/store unit: bookkeeping plus the dispatch policy.
pub struct Lsu {
    base: LsuBase,
    current_load: Option<GroupId>,
    current_store: Option<GroupId>,
    current_load_barrier: Option<GroupId>,
    current_store_barrier: Option<GroupId>,
}

impl Lsu {
    /// Creates the unit; see [`LsuBase::new`] for the size rules.
    pub fn new(
        model: &ProcModel,
        lq_size: u32,
        sq_size: u32,
        assume_no_alias: bool,
        metadata: Option<Rc<RefCell<MetadataRegistry>>>,
    ) -> Self {
        Self {
            base: LsuBase::new(model, lq_size, sq_size, assume_no_alias, metadata),
            current_load: None,
            current_store: None,
            current_load_barrier: None,
            current_store_barrier: None,
        }
    }

    /// Creates the unit from a full simulator configuration.
    pub fn from_config(
        config: &crate::config::Config,
        metadata: Option<Rc<RefCell<MetadataRegistry>>>,
    ) -> Self {
        Self::new(
            &config.proc,
            config.lsu.lq_size,
            config.lsu.sq_size,
            config.lsu.assume_no_alias,
            metadata,
        )
    }

    /// The bookkeeping layer.
    #[inline]
    pub fn base(&self) -> &LsuBase {
        &self.base
    }

    /// Mutable access to the bookkeeping layer.
    #[inline]
    pub fn base_mut(&mut self) -> &mut LsuBase {
        &mut self.base
    }

    /// Group accumulating pure loads, if any.
    #[inline]
    pub fn current_load_group(&self) -> Option<GroupId> {
        self.current_load
    }

    /// Youngest store group, if any.
    #[inline]
    pub fn current_store_group(&self) -> Option<GroupId> {
        self.current_store
    }

    /// Youngest load-barrier group, if any.
    #[inline]
    pub fn current_load_barrier_group(&self) -> Option<GroupId> {
        self.current_load_barrier
    }

    /// Youngest store-barrier group, if any.
    #[inline]
    pub fn current_store_barrier_group(&self) -> Option<GroupId> {
        self.current_store_barrier
    }

    /// Checks whether the queues can accept the instruction.
    ///
    /// The scheduler must honor the verdict before calling [`Lsu::dispatch`].
    pub fn is_available(&self, ir: InstRef<'_>) -> Status {
        let desc = &ir.instruction().desc;
        let access = self.base.memory_access_md(ir);
        if desc.may_load && self.base.is_lq_full() {
            return Status::LoadQueueFull;
        }
        if LsuBase::is_store(desc, access.as_ref()) && self.base.is_sq_full() {
            return Status::StoreQueueFull;
        }
        Status::Available
    }

    /// Dispatches a memory instruction and returns its group id.
    ///
    /// The caller stamps the id into the instruction's `lsu_token`; all later
    /// lifecycle callbacks find the group through it.
    pub fn dispatch(&mut self, ir: InstRef<'_>) -> GroupId {
        let inst = ir.instruction();
        let desc = &inst.desc;
        let access = self.base.memory_access_md(ir);
        let is_load_barrier = inst.is_load_barrier;
        let is_store_barrier = inst.is_store_barrier;
        assert!(desc.is_mem_op(), "dispatched a non-memory instruction");

        if desc.may_load {
            self.base.acquire_lq_slot();
        }
        let is_store = LsuBase::is_store(desc, access.as_ref());
        if is_store {
            self.base.acquire_sq_slot();
        }

        if is_store {
            return self.dispatch_store(ir, access, is_load_barrier, is_store_barrier);
        }

        assert!(desc.may_load, "expected a load");
        self.dispatch_load(ir, access, is_load_barrier)
    }

    /// Stores always open a new group of size one.
    fn dispatch_store(
        &mut self,
        ir: InstRef<'_>,
        access: Option<MemAccess>,
        is_load_barrier: bool,
        is_store_barrier: bool,
    ) -> GroupId {
        let new_gid = self.base.create_memory_group();
        {
            let group = self.base.get_group_mut(new_gid);
            group.add_instruction();
            group.add_mem_access(access.clone());
        }
        if let Some(access) = &access {
            debug!("[LSU] group ({new_gid}) holds access {access}");
        }

        // A store may not pass a previous load or load barrier.
        let load_dominator = self.current_load.max(self.current_load_barrier);
        if let Some(dom) = load_dominator {
            let is_data = !self.base.no_alias(dom, access.as_ref());
            if !is_data {
                self.base.alias_edges_elided += 1;
            }
            self.base.add_dependency(dom, new_gid, is_data);
        }

        // A store may not pass a previous store barrier.
        if let Some(barrier) = self.current_store_barrier {
            self.base.add_dependency(barrier, new_gid, true);
        }

        // A store may not pass a previous store. Skipped when the youngest
        // store is the barrier just wired above.
        if let Some(store) = self.current_store
            && Some(store) != self.current_store_barrier
        {
            let is_data = !self.base.no_alias(store, access.as_ref());
            if !is_data {
                self.base.alias_edges_elided += 1;
            }
            self.base.add_dependency(store, new_gid, is_data);
        }

        self.current_store = Some(new_gid);
        if is_store_barrier {
            self.current_store_barrier = Some(new_gid);
        }

        if ir.instruction().desc.may_load {
            self.current_load = Some(new_gid);
            if is_load_barrier {
                self.current_load_barrier = Some(new_gid);
            }
        }

        new_gid
    }

    /// Pure loads join the current load group when they can.
    fn dispatch_load(
        &mut self,
        ir: InstRef<'_>,
        access: Option<MemAccess>,
        is_load_barrier: bool,
    ) -> GroupId {
        let load_dominator = self.current_load.max(self.current_load_barrier);

        // A new load group is needed when any of these hold:
        //  - this load is itself a barrier;
        //  - no load is in flight;
        //  - the youngest load-side group is a barrier;
        //  - a store is younger than every in-flight load (loads and stores
        //    never share a group);
        //  - the current load group already started issuing.
        let new_group_needed = is_load_barrier
            || match load_dominator {
                None => true,
                Some(dom) => {
                    self.current_load_barrier == Some(dom)
                        || Some(dom) <= self.current_store
                        || self.base.get_group(dom).is_executing()
                }
            };

        if !new_group_needed {
            // A load may pass a previous load.
            let gid = self.current_load.expect("load group must be live here");
            let group = self.base.get_group_mut(gid);
            group.add_instruction();
            group.add_mem_access(access.clone());
            if let Some(access) = &access {
                debug!("[LSU] group ({gid}) holds access {access}");
            }
            return gid;
        }

        let new_gid = self.base.create_memory_group();
        {
            let group = self.base.get_group_mut(new_gid);
            group.add_instruction();
            group.add_mem_access(access.clone());
        }
        if let Some(access) = &access {
            debug!("[LSU] group ({new_gid}) holds access {access}");
        }

        // A load may not pass a previous store unless the ranges provably
        // do not alias.
        if let Some(store) = self.current_store {
            if self.base.no_alias(store, access.as_ref()) {
                self.base.alias_edges_elided += 1;
            } else {
                self.base.add_dependency(store, new_gid, true);
            }
        }

        if is_load_barrier {
            // A load barrier may not pass a previous load or load barrier.
            if let Some(dom) = load_dominator {
                self.base.add_dependency(dom, new_gid, true);
            }
        } else if let Some(barrier) = self.current_load_barrier {
            // A younger load may not pass an older load barrier.
            self.base.add_dependency(barrier, new_gid, true);
        }

        self.current_load = Some(new_gid);
        if is_load_barrier {
            self.current_load_barrier = Some(new_gid);
        }
        new_gid
    }

    /// Per-cycle tick for every live group.
    pub fn cycle_event(&mut self) {
        self.base.cycle_event();
    }

    /// Forwards the issue event to the instruction's group.
    pub fn on_instruction_issued(&mut self, ir: InstRef<'_>) {
        self.base.on_instruction_issued(ir);
    }

    /// Forwards the execute event, then clears any current pointer whose
    /// group the base erased so the next dispatch starts a fresh chain.
    pub fn on_instruction_executed(&mut self, ir: InstRef<'_>) {
        let inst = ir.instruction();
        if !inst.is_mem_op() {
            return;
        }

        self.base.on_instruction_executed(ir);
        let gid = inst
            .lsu_token
            .expect("instruction was not dispatched to the LS unit");
        if !self.base.is_valid_group(gid) {
            for slot in [
                &mut self.current_load,
                &mut self.current_store,
                &mut self.current_load_barrier,
                &mut self.current_store_barrier,
            ] {
                if *slot == Some(gid) {
                    *slot = None;
                }
            }
        }
    }

    /// Releases the retired instruction's queue slots.
    pub fn on_instruction_retired(&mut self, ir: InstRef<'_>) {
        self.base.on_instruction_retired(ir);
    }

    /// Logs queue occupancy, current pointers, and per-group counters.
    pub fn dump(&self) {
        self.base.dump();
        debug!(
            "[LSU] current: load = {:?}, store = {:?}, load barrier = {:?}, store barrier = {:?}",
            self.current_load,
            self.current_store,
            self.current_load_barrier,
            self.current_store_barrier,
        );
    }
}
