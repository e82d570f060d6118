//! Common types and constants shared by every stage of a reclock.
//!
//! This module provides the building blocks the planner, calculators and orchestrator share:
//! 1. **Constants:** Register addresses, bit masks and MEMX protocol ids.
//! 2. **Bit Fields:** Helpers to extract and insert masked fields.
//! 3. **Error Handling:** The calculation, planning, execution and caller-facing error types.

/// Bit-field extraction and insertion helpers.
pub mod bits;

/// Register, bit and protocol constants.
pub mod constants;

/// Error types for every reclock stage.
pub mod error;

pub use error::{CalcError, ConfigError, ExecError, PlanError, ReconfigError};
