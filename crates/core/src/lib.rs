//! Cycle-accurate simulator for an out-of-order superscalar pipeline.
//!
//! This crate implements Tomasulo-style dynamic scheduling over a trace of
//! decoded instructions:
//! 1. **Pipeline:** Fetch → Dispatch → Schedule → Execute → State Update,
//!    with a register scoreboard resolving RAW hazards and a bounded
//!    reservation station feeding three classes of function units.
//! 2. **Timing:** each cycle splits into two half-cycles so results
//!    broadcast in the first half wake consumers in the same cycle.
//! 3. **Trace:** a pull interface over decoded records; a text reader is
//!    provided, and anything implementing [`trace::TraceSource`] works.
//! 4. **Output:** per-cycle stage-transition events on a pluggable sink,
//!    plus aggregate statistics (fired/retired rates, dispatch-queue depth).

/// Machine configuration and validation.
pub mod config;
/// Stage-transition events and sinks.
pub mod events;
/// Pipeline components (scoreboard, function units, reservation station).
pub mod pipeline;
/// The cycle-loop driver.
pub mod sim;
/// Statistics accumulation and reporting.
pub mod stats;
/// Trace input boundary.
pub mod trace;

/// Machine configuration; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// The pipeline driver; owns all machine state.
pub use crate::sim::Simulator;
/// Final run statistics.
pub use crate::stats::{SimStats, StatsReport};
