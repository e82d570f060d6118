//! Error taxonomy for memory reclocking.
//!
//! This module defines the errors raised by each stage of a reconfiguration. It provides:
//! 1. **Calculation Errors:** Unsupported table formats and untranslatable timing values.
//! 2. **Planning Errors:** Targets no clock source can reach.
//! 3. **Execution Errors:** Failures reported by, or while talking to, the MEMX process.
//! 4. **Reconfiguration Errors:** The single caller-facing type all of the above flatten into.
//!
//! Planning-class errors (`Unreachable`, `UnsupportedFormat`, `InvalidTimingValue`, ...) are
//! raised before any script is submitted, so the hardware is untouched. Execution-class errors
//! (`LockTimeout`, `Exec`) mean the script already ran, at least in part.

use thiserror::Error;

use crate::clock::ClockMode;
use crate::ram::RamType;
use crate::ram::state::ReclockState;

/// Errors raised by the mode-register calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalcError {
    /// A table version the calculator has no bit layout for.
    #[error("unsupported {table} table version {version:#04x}")]
    UnsupportedFormat {
        /// Which table carried the version (`"timing"` or `"ramcfg"`).
        table: &'static str,
        /// The raw version byte.
        version: u8,
    },
    /// A field value missing from its translation table.
    #[error("{field} value {value} has no hardware encoding")]
    InvalidTimingValue {
        /// Field name, e.g. `"CL"`.
        field: &'static str,
        /// Untranslated value.
        value: i32,
    },
}

/// Errors raised by the clock-mode planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Neither the divider nor any permitted PLL path can produce the target.
    #[error("{target_khz} kHz is not reachable with the permitted clock sources")]
    Unreachable {
        /// Requested frequency.
        target_khz: u32,
    },
}

/// Errors raised while handing a script to, or hearing back from, the execution context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The execution context did not answer a message.
    #[error("execution context did not reply to message {message:#x}")]
    Unresponsive {
        /// Message id that went unanswered.
        message: u32,
    },
    /// The execution context answered with a failure status.
    #[error("execution context rejected the script with status {status:#x}")]
    Rejected {
        /// Raw status word.
        status: u32,
    },
    /// The encoded script is larger than the data segment the context offered.
    #[error("script of {words} words does not fit the {capacity}-word data segment")]
    SegmentOverflow {
        /// Encoded script size.
        words: usize,
        /// Segment capacity.
        capacity: usize,
    },
    /// Training results are larger than the caller's buffer.
    #[error("training result of {size} words exceeds the {capacity}-word buffer")]
    TrainResultTooLarge {
        /// Words reported by the context.
        size: usize,
        /// Words the caller can accept.
        capacity: usize,
    },
    /// The context could not grant host access to its data segment.
    #[error("data segment at {base:#x} could not be acquired")]
    SegmentUnavailable {
        /// Requested base offset.
        base: u32,
    },
    /// Uploaded words do not decode into a script.
    #[error("malformed script at word {offset}")]
    MalformedScript {
        /// Word offset of the offending header.
        offset: usize,
    },
}

/// Caller-facing result of a reconfiguration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconfigError {
    /// Neither the divider nor a permitted PLL path reaches the target.
    #[error("{target_khz} kHz is not reachable")]
    Unreachable {
        /// Requested frequency.
        target_khz: u32,
    },
    /// A timing or ramcfg table version with no known bit layout.
    #[error("unsupported {table} table version {version:#04x}")]
    UnsupportedFormat {
        /// Table name.
        table: &'static str,
        /// Raw version byte.
        version: u8,
    },
    /// A timing value missing from its hardware translation table.
    #[error("{field} value {value} has no hardware encoding")]
    InvalidTimingValue {
        /// Field name.
        field: &'static str,
        /// Untranslated value.
        value: i32,
    },
    /// No sequence exists for this pair of clock modes.
    #[error("no {ram_type} sequence for a {from:?} -> {to:?} transition")]
    UnsupportedTransition {
        /// Memory technology.
        ram_type: RamType,
        /// Mode the memory clock is currently in.
        from: ClockMode,
        /// Mode the plan selected.
        to: ClockMode,
    },
    /// The memory technology has calculators but no reclock sequence.
    #[error("reclocking {0} memory is not supported")]
    UnsupportedRamType(RamType),
    /// No parsed table entry covers the target frequency.
    #[error("no memory configuration covers {khz} kHz")]
    NoConfiguration {
        /// Requested frequency.
        khz: u32,
    },
    /// A script is already pending for this device.
    #[error("a reconfiguration is already in flight")]
    Busy,
    /// `prog`/`tidy` was called without a pending script.
    #[error("no reconfiguration is pending")]
    NothingPending,
    /// The orchestrator tried to leave the state machine's order.
    #[error("illegal reclock state transition {from:?} -> {to:?}")]
    InvalidState {
        /// State the machine was in.
        from: ReclockState,
        /// State that was requested.
        to: ReclockState,
    },
    /// A wait in the submitted script timed out; the device may be mid-transition.
    #[error("lock wait timed out after {elapsed_ns} ns")]
    LockTimeout {
        /// Execution time reported by the context.
        elapsed_ns: u32,
    },
    /// The execution context failed or refused the script.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl ReconfigError {
    /// Returns `true` if the error was raised before anything reached the hardware.
    pub const fn is_planning(&self) -> bool {
        !matches!(self, Self::LockTimeout { .. } | Self::Exec(_))
    }
}

impl From<CalcError> for ReconfigError {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::UnsupportedFormat { table, version } => {
                Self::UnsupportedFormat { table, version }
            }
            CalcError::InvalidTimingValue { field, value } => {
                Self::InvalidTimingValue { field, value }
            }
        }
    }
}

impl From<PlanError> for ReconfigError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Unreachable { target_khz } => Self::Unreachable { target_khz },
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid JSON for [`Config`](crate::config::Config).
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value parsed but is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
