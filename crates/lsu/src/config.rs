//! Configuration for the load/store unit simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation run. It provides:
//! 1. **Defaults:** Baseline hardware constants (queue sizes, latencies).
//! 2. **Processor model:** The descriptor whose extra-info record supplies
//!    queue sizes when no explicit sizes are given.
//! 3. **Run parameters:** LSU sizing/alias policy and fixed op latencies.
//!
//! Configuration is supplied as JSON (see the CLI) or built in code with
//! `Config::default()`.

use serde::Deserialize;

/// Default configuration constants.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden.
mod defaults {
    /// Default load queue capacity, in entries.
    ///
    /// Matches a mid-sized out-of-order core. Zero would mean unbounded.
    pub const LOAD_QUEUE_SIZE: u32 = 16;

    /// Default store queue capacity, in entries.
    pub const STORE_QUEUE_SIZE: u32 = 16;

    /// Execution latency charged to a load, in cycles.
    ///
    /// Stands in for an L1 hit; the model has no cache hierarchy.
    pub const LOAD_LATENCY: u32 = 4;

    /// Execution latency charged to a store, in cycles.
    ///
    /// Stores complete once their data lands in the store queue.
    pub const STORE_LATENCY: u32 = 1;

    /// Instructions dispatched to the LSU per cycle.
    pub const DISPATCH_WIDTH: usize = 4;
}

/// Processor model descriptor.
///
/// Only the extra-info record is consulted: it supplies the queue sizes used
/// when the explicit sizes passed at construction are zero.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProcModel {
    /// Human-readable model name, reported in logs only.
    pub name: String,
    /// Optional record of additional buffer descriptors.
    pub extra: Option<ExtraProcInfo>,
}

impl Default for ProcModel {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            extra: Some(ExtraProcInfo::default()),
        }
    }
}

/// Buffer sizes the processor model advertises beyond its core descriptor.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ExtraProcInfo {
    /// Load queue capacity (0 = unbounded).
    pub load_queue_size: u32,
    /// Store queue capacity (0 = unbounded).
    pub store_queue_size: u32,
}

impl Default for ExtraProcInfo {
    fn default() -> Self {
        Self {
            load_queue_size: defaults::LOAD_QUEUE_SIZE,
            store_queue_size: defaults::STORE_QUEUE_SIZE,
        }
    }
}

/// Load/store unit parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct LsuParams {
    /// Explicit load queue size; 0 defers to the processor model.
    pub lq_size: u32,
    /// Explicit store queue size; 0 defers to the processor model.
    pub sq_size: u32,
    /// Treat accesses without metadata as never aliasing.
    pub assume_no_alias: bool,
}

impl Default for LsuParams {
    fn default() -> Self {
        Self {
            lq_size: 0,
            sq_size: 0,
            assume_no_alias: false,
        }
    }
}

/// Pacing parameters for the reference scheduler.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TimingParams {
    /// Cycles a load spends executing once issued.
    pub load_latency: u32,
    /// Cycles a store spends executing once issued.
    pub store_latency: u32,
    /// Instructions dispatched per cycle.
    pub dispatch_width: usize,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            load_latency: defaults::LOAD_LATENCY,
            store_latency: defaults::STORE_LATENCY,
            dispatch_width: defaults::DISPATCH_WIDTH,
        }
    }
}

/// Root configuration type; use `Config::default()` or deserialize from JSON.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Processor model descriptor.
    pub proc: ProcModel,
    /// Load/store unit parameters.
    pub lsu: LsuParams,
    /// Fixed op latencies.
    pub timing: TimingParams,
}
