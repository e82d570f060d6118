//! Configuration for the reclock sequencer.
//!
//! This module defines the tunables that shape script generation and execution. It provides:
//! 1. **Defaults:** Baseline batch capacity, timeouts and interpreter parameters.
//! 2. **Structures:** Hierarchical config for the sequencer, timeouts and host-side interpreter.
//! 3. **Loading:** JSON deserialization from a string or a file, with validation.
//!
//! Every field has a serde default, so an empty JSON object yields `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants.
mod defaults {
    use crate::common::constants::memx;

    /// Operand words buffered per MEMX batch before an implicit flush.
    pub const BATCH_CAPACITY: usize = memx::BATCH_CAPACITY;

    /// Timeout for the memory PLL to report lock (64 us).
    pub const MPLL_LOCK_NS: u32 = 64_000;

    /// Timeout for per-partition training to complete (500 us).
    pub const TRAIN_NS: u32 = 500_000;

    /// Timeout for a PLL reset to be acknowledged (2 ms).
    pub const RESET_ACK_NS: u32 = 2_000_000;

    /// Settle delay between controller commands (1 us).
    pub const SETTLE_NS: u32 = 1_000;

    /// Delay after FB access is restored before post-enable training (100 us).
    pub const POST_ENABLE_NS: u32 = 100_000;

    /// Interpreter polling interval for waits (1 us of simulated time).
    pub const POLL_INTERVAL_NS: u32 = 1_000;

    /// Interpreter data segment size in words.
    pub const SEGMENT_WORDS: usize = 0x1000;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use reclock_core::config::Config;
///
/// let config = Config::from_json(r#"{ "sequencer": { "batch_capacity": 32 } }"#).unwrap();
/// assert_eq!(config.sequencer.batch_capacity, 32);
/// assert!(config.sequencer.skip_unchanged_mode_registers);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Script generation behaviour.
    #[serde(default)]
    pub sequencer: SequencerConfig,
    /// Wait and delay durations emitted into scripts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Host-side script interpreter parameters.
    #[serde(default)]
    pub interpreter: InterpreterConfig,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks values serde cannot constrain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A batch needs room for a Wait (four operand words) and the `>=` flush rule.
        if self.sequencer.batch_capacity < 5 || self.sequencer.batch_capacity > 0xffff {
            return Err(ConfigError::Invalid {
                field: "sequencer.batch_capacity",
                reason: "must be within 5..=65535",
            });
        }
        if self.interpreter.poll_interval_ns == 0 {
            return Err(ConfigError::Invalid {
                field: "interpreter.poll_interval_ns",
                reason: "must be non-zero",
            });
        }
        Ok(())
    }
}

/// Script generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SequencerConfig {
    /// Maximum operand words per MEMX batch.
    #[serde(default = "SequencerConfig::default_batch_capacity")]
    pub batch_capacity: usize,

    /// Skip mode-register writes whose value matches the last applied value.
    ///
    /// Matches observed vendor behaviour; whether the hardware needs it is unconfirmed,
    /// so it can be turned off to force every mode-register write.
    #[serde(default = "SequencerConfig::default_true")]
    pub skip_unchanged_mode_registers: bool,

    /// Submit scripts for execution. When off, `prog` discards scripts instead.
    #[serde(default = "SequencerConfig::default_true")]
    pub exec_enabled: bool,

    /// Insert the FB partition workaround delays.
    #[serde(default = "SequencerConfig::default_true")]
    pub fbpa_workaround: bool,
}

impl SequencerConfig {
    /// Returns the default batch capacity.
    fn default_batch_capacity() -> usize {
        defaults::BATCH_CAPACITY
    }

    /// Serde helper for flags that default on.
    fn default_true() -> bool {
        true
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            batch_capacity: defaults::BATCH_CAPACITY,
            skip_unchanged_mode_registers: true,
            exec_enabled: true,
            fbpa_workaround: true,
        }
    }
}

/// Durations emitted into scripts, in nanoseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Memory/reference PLL lock wait.
    #[serde(default = "TimeoutConfig::default_mpll_lock")]
    pub mpll_lock_ns: u32,

    /// Per-partition training completion wait.
    #[serde(default = "TimeoutConfig::default_train")]
    pub train_ns: u32,

    /// PLL reset acknowledge wait.
    #[serde(default = "TimeoutConfig::default_reset_ack")]
    pub reset_ack_ns: u32,

    /// Settle delay between controller commands.
    #[serde(default = "TimeoutConfig::default_settle")]
    pub settle_ns: u32,

    /// Delay after FB access is restored, before post-enable training.
    #[serde(default = "TimeoutConfig::default_post_enable")]
    pub post_enable_ns: u32,
}

impl TimeoutConfig {
    /// Returns the default PLL lock timeout.
    fn default_mpll_lock() -> u32 {
        defaults::MPLL_LOCK_NS
    }

    /// Returns the default training timeout.
    fn default_train() -> u32 {
        defaults::TRAIN_NS
    }

    /// Returns the default reset acknowledge timeout.
    fn default_reset_ack() -> u32 {
        defaults::RESET_ACK_NS
    }

    /// Returns the default settle delay.
    fn default_settle() -> u32 {
        defaults::SETTLE_NS
    }

    /// Returns the default post-enable delay.
    fn default_post_enable() -> u32 {
        defaults::POST_ENABLE_NS
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            mpll_lock_ns: defaults::MPLL_LOCK_NS,
            train_ns: defaults::TRAIN_NS,
            reset_ack_ns: defaults::RESET_ACK_NS,
            settle_ns: defaults::SETTLE_NS,
            post_enable_ns: defaults::POST_ENABLE_NS,
        }
    }
}

/// Host-side interpreter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InterpreterConfig {
    /// Simulated time between two polls of a wait condition.
    #[serde(default = "InterpreterConfig::default_poll_interval")]
    pub poll_interval_ns: u32,

    /// Size of the data segment offered to scripts, in words.
    #[serde(default = "InterpreterConfig::default_segment_words")]
    pub segment_words: usize,

    /// Offset of the script area within the data segment.
    #[serde(default)]
    pub segment_base: u32,
}

impl InterpreterConfig {
    /// Returns the default polling interval.
    fn default_poll_interval() -> u32 {
        defaults::POLL_INTERVAL_NS
    }

    /// Returns the default segment size.
    fn default_segment_words() -> usize {
        defaults::SEGMENT_WORDS
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ns: defaults::POLL_INTERVAL_NS,
            segment_words: defaults::SEGMENT_WORDS,
            segment_base: 0,
        }
    }
}
