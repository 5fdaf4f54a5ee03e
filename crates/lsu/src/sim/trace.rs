//! Memory-operation traces.
//!
//! A trace is a JSON array of memory operations replayed through the LSU in
//! program order. This module provides:
//! 1. **Format:** [`TraceOp`] / [`TraceAccess`], serde-deserialized.
//! 2. **Loader:** [`load_trace`] with error reporting via [`TraceError`].
//! 3. **Assembly:** [`assemble`] lowers trace ops to instructions and a
//!    populated metadata registry.

use std::path::Path;
use std::{fmt, fs, io};

use serde::Deserialize;

use crate::config::TimingParams;
use crate::insn::{InstrDesc, Instruction};
use crate::lsu::access::MemAccess;
use crate::metadata::MetadataRegistry;

/// Kind of a traced memory operation.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TraceKind {
    /// Plain load.
    Load,
    /// Plain store.
    Store,
    /// Load that younger loads may not pass.
    LoadBarrier,
    /// Store that younger stores may not pass.
    StoreBarrier,
    /// Full fence: barrier for both classes.
    Fence,
}

/// One byte range touched by a traced operation.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct TraceAccess {
    /// Whether this particular range is written. Defaults to the kind's
    /// natural direction when omitted.
    #[serde(default)]
    pub store: Option<bool>,
    /// Start address.
    pub addr: u64,
    /// Size in bytes.
    pub size: u32,
}

/// One traced memory operation.
#[derive(Clone, Debug, Deserialize)]
pub struct TraceOp {
    /// Operation kind.
    pub kind: TraceKind,
    /// Byte ranges touched; empty means no metadata is registered and the
    /// alias policy falls back to the global flag.
    #[serde(default)]
    pub accesses: Vec<TraceAccess>,
    /// Execution latency override in cycles.
    #[serde(default)]
    pub latency: Option<u32>,
}

/// Errors raised while loading a trace file.
#[derive(Debug)]
pub enum TraceError {
    /// The file could not be read.
    Io(io::Error),
    /// The file is not a valid trace.
    Parse(serde_json::Error),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "cannot read trace: {e}"),
            TraceError::Parse(e) => write!(f, "malformed trace: {e}"),
        }
    }
}

impl std::error::Error for TraceError {}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        TraceError::Io(e)
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(e: serde_json::Error) -> Self {
        TraceError::Parse(e)
    }
}

/// Reads a JSON trace from disk.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<TraceOp>, TraceError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

impl TraceKind {
    fn desc(self) -> InstrDesc {
        match self {
            TraceKind::Load | TraceKind::LoadBarrier => InstrDesc {
                may_load: true,
                may_store: false,
            },
            TraceKind::Store | TraceKind::StoreBarrier => InstrDesc {
                may_load: false,
                may_store: true,
            },
            TraceKind::Fence => InstrDesc {
                may_load: true,
                may_store: true,
            },
        }
    }

    fn writes_by_default(self) -> bool {
        matches!(
            self,
            TraceKind::Store | TraceKind::StoreBarrier | TraceKind::Fence
        )
    }
}

/// Lowers trace ops to instructions and fills the metadata registry.
///
/// Latencies default per direction from `timing` and are clamped to at least
/// one cycle.
pub fn assemble(
    ops: &[TraceOp],
    timing: &TimingParams,
) -> (Vec<Instruction>, MetadataRegistry) {
    let mut registry = MetadataRegistry::new();
    let mut insts = Vec::with_capacity(ops.len());

    for op in ops {
        let mut inst = Instruction::new(op.kind.desc());
        inst.is_load_barrier = matches!(op.kind, TraceKind::LoadBarrier | TraceKind::Fence);
        inst.is_store_barrier = matches!(op.kind, TraceKind::StoreBarrier | TraceKind::Fence);

        let mut accesses = op.accesses.iter();
        if let Some(first) = accesses.next() {
            let store = first.store.unwrap_or(op.kind.writes_by_default());
            let mut access = MemAccess::new(store, first.addr, first.size);
            for extra in accesses {
                let store = extra.store.unwrap_or(op.kind.writes_by_default());
                access.append(store, extra.addr, extra.size);
            }
            inst.metadata_token = Some(registry.add_mem_access(access));
        }

        let default_latency = if op.kind.writes_by_default() {
            timing.store_latency
        } else {
            timing.load_latency
        };
        inst.cycles_left = op.latency.unwrap_or(default_latency).max(1);

        insts.push(inst);
    }

    (insts, registry)
}
