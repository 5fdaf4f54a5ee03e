//! Cycle-accurate load/store unit model for out-of-order processors.
//!
//! This crate models the hardware structures that track in-flight memory
//! operations and decide when they may execute relative to one another:
//! 1. **LSU:** Load/store queues, memory groups, dependency edges, barriers,
//!    and alias-informed edge elision.
//! 2. **Instructions:** The minimal contract the unit reads from each
//!    instruction (descriptor flags, barrier bits, metadata token).
//! 3. **Metadata:** A registry of per-instruction memory accesses used for
//!    precise interval alias tests.
//! 4. **Simulation:** A trace format and a reference scheduler that replays
//!    memory operations through the full unit lifecycle.
//! 5. **Configuration & stats:** JSON-deserializable parameters and run
//!    counters.

/// Simulator configuration (defaults, processor model, latencies).
pub mod config;
/// Instruction descriptor and reference types.
pub mod insn;
/// Load/store unit (accesses, groups, dispatch policy).
pub mod lsu;
/// Per-instruction metadata registry.
pub mod metadata;
/// Trace replay (format, loader, reference scheduler).
pub mod sim;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The load/store unit; construct with `Lsu::new` or `Lsu::from_config`.
pub use crate::lsu::{Lsu, Status};
/// Trace-driven reference scheduler.
pub use crate::sim::Simulator;
