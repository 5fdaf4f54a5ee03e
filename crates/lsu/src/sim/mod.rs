//! Trace replay: format, loader, and the reference scheduler.

pub mod simulator;
pub mod trace;

pub use simulator::Simulator;
pub use trace::{TraceError, TraceKind, TraceOp, load_trace};
