//! Live memory-clock reconfiguration library.
//!
//! This crate changes a GPU's memory clock while the GPU keeps running. It provides:
//! 1. **Script:** A cached, write-coalescing register facade that records MEMX scripts.
//! 2. **Mode Registers:** Per-technology calculators for GDDR5, GDDR3, DDR2 and DDR3.
//! 3. **Clock:** Divider and PLL coefficient search and the clock-mode planner.
//! 4. **RAM:** The reconfiguration orchestrator and the per-technology sequences.
//! 5. **Simulation:** A host-side script interpreter for dry runs, plus statistics.
//!
//! A reconfiguration is a two-step affair: [`Ram::calc`](crate::ram::Ram::calc) plans and
//! records a script without touching the hardware beyond reads, then
//! [`Ram::prog`](crate::ram::Ram::prog) hands it to the execution context or
//! [`Ram::tidy`](crate::ram::Ram::tidy) throws it away.

/// Clock modes, divider and PLL coefficient search, and the transition planner.
pub mod clock;
/// Common types and constants (register names, bit-field helpers, errors).
pub mod common;
/// Sequencer configuration (defaults, timeouts, interpreter settings).
pub mod config;
/// Mode-register calculators and the parsed memory timing tables they read.
pub mod mr;
/// RAM reconfiguration orchestrator, generation profiles and per-technology sequences.
pub mod ram;
/// Script model, register cache, write-coalescing sink and execution trigger.
pub mod script;
/// Host-side MEMX interpreter and register file for dry runs.
pub mod sim;
/// Collaborator traits (register space, clock sources, display probe).
pub mod soc;
/// Per-reconfiguration statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Orchestrator that owns the pending reconfiguration for one device.
pub use crate::ram::Ram;
/// Ordered MEMX micro-program produced by a reconfiguration.
pub use crate::script::Script;
