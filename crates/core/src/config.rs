//! Configuration for the simulated machine.
//!
//! This module defines the structures that parameterize the pipeline. It
//! provides:
//! 1. **Defaults:** Baseline hardware constants (result buses, FU counts, fetch rate).
//! 2. **Structure:** `SimConfig`, deserializable from JSON via the CLI's `--config`.
//! 3. **Validation:** Rejection of degenerate (zero-sized) resources before setup.

use serde::Deserialize;
use std::fmt;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden
/// by a configuration file or command-line flags.
mod defaults {
    /// Number of result buses (State Update bandwidth per cycle).
    pub const RESULT_BUSES: usize = 8;

    /// Number of class-0 function units.
    pub const K0: usize = 1;

    /// Number of class-1 function units.
    ///
    /// Class 1 also absorbs instructions whose opcode carries no FU class.
    pub const K1: usize = 2;

    /// Number of class-2 function units.
    pub const K2: usize = 3;

    /// Instructions fetched per cycle.
    pub const FETCH_RATE: usize = 4;
}

/// Number of architectural registers visible to the trace.
///
/// Fixed by the trace format; register operands are indices in
/// `[0, NUM_REGS)` or the "none" sentinel.
pub const NUM_REGS: usize = 128;

/// Machine configuration: result buses, per-class FU counts, and fetch rate.
///
/// The reservation station capacity is derived, not configured: twice the
/// total function-unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Result buses: at most this many instructions complete State Update per cycle.
    pub result_buses: usize,
    /// Class-0 function unit count.
    pub k0: usize,
    /// Class-1 function unit count.
    pub k1: usize,
    /// Class-2 function unit count.
    pub k2: usize,
    /// Instructions fetched from the trace per cycle.
    pub fetch_rate: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            result_buses: defaults::RESULT_BUSES,
            k0: defaults::K0,
            k1: defaults::K1,
            k2: defaults::K2,
            fetch_rate: defaults::FETCH_RATE,
        }
    }
}

impl SimConfig {
    /// Derived reservation station capacity: `2 * (k0 + k1 + k2)`.
    pub fn rs_capacity(&self) -> usize {
        2 * (self.k0 + self.k1 + self.k2)
    }

    /// Rejects configurations the core cannot run.
    ///
    /// Every resource count must be positive; the pipeline assumes at least
    /// one unit of each kind and makes no progress otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("result_buses", self.result_buses),
            ("k0", self.k0),
            ("k1", self.k1),
            ("k2", self.k2),
            ("fetch_rate", self.fetch_rate),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigError::ZeroResource(name));
            }
        }
        Ok(())
    }
}

/// Error produced by [`SimConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A resource count that must be positive was zero.
    ZeroResource(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroResource(field) => {
                write!(f, "configuration field `{}` must be positive", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
