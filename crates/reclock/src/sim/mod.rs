//! Host-side simulation of the script execution context.
//!
//! Dry runs and tests replay scripts without a power-management microcontroller:
//! 1. **Register File:** A sparse, pinnable register space that can be shared.
//! 2. **Interpreter:** An [`ExecutionContext`](crate::script::ExecutionContext) that decodes
//!    uploaded scripts and runs them with simulated time.

/// MEMX script interpreter.
pub mod interpreter;
/// Simulated register file.
pub mod registers;

pub use interpreter::{ScriptInterpreter, TraceEvent};
pub use registers::{RegisterFile, SharedRegisters};
