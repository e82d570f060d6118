//! Execution Trigger and Tidy.
//!
//! A finished script is either submitted to the MEMX process or discarded. This module provides:
//! 1. **Protocol:** The Info/Exec messages and their two-word replies.
//! 2. **Context:** The [`ExecutionContext`] trait over the data segment and mailbox.
//! 3. **Submit:** Upload, execute and interpret the reply.
//! 4. **Tidy:** Discard without executing.
//! 5. **Training Results:** Read back the training result packet.

use tracing::{debug, info, warn};

use super::Script;
use crate::common::constants::memx;
use crate::common::{ExecError, ReconfigError};

/// Info request selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    /// Location and size of the script data segment.
    Data,
    /// Location and size of the training result packet.
    Train,
}

/// Message sent to the MEMX process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Query a segment; the reply is `[base, size_in_bytes]`.
    Info(InfoKind),
    /// Run the script uploaded between `base` and `finish`; the reply is `[elapsed_ns, status]`.
    Exec {
        /// Byte offset the script was uploaded to.
        base: u32,
        /// Byte offset one past the last uploaded word.
        finish: u32,
    },
}

impl Message {
    /// Returns the MEMX message id.
    pub const fn id(&self) -> u32 {
        match self {
            Self::Info(_) => memx::MSG_INFO,
            Self::Exec { .. } => memx::MSG_EXEC,
        }
    }

    /// Returns the two argument words.
    pub const fn args(&self) -> [u32; 2] {
        match *self {
            Self::Info(InfoKind::Data) => [memx::INFO_DATA, 0],
            Self::Info(InfoKind::Train) => [memx::INFO_TRAIN, 0],
            Self::Exec { base, finish } => [base, finish],
        }
    }
}

/// Two-word reply from the MEMX process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reply(pub [u32; 2]);

/// Mailbox and data-segment access to the process that runs scripts.
pub trait ExecutionContext {
    /// Sends `msg` and blocks until the reply arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Unresponsive`] if no reply arrives.
    fn send(&mut self, msg: Message) -> Result<Reply, ExecError>;

    /// Acquires host access to the data segment and positions the upload pointer at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::SegmentUnavailable`] if access cannot be granted.
    fn acquire(&mut self, base: u32) -> Result<(), ExecError>;

    /// Appends `words` at the upload pointer.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::SegmentOverflow`] if the words do not fit.
    fn push(&mut self, words: &[u32]) -> Result<(), ExecError>;

    /// Releases the data segment and returns the upload pointer.
    fn release(&mut self) -> u32;

    /// Reads `len` words starting at byte offset `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::SegmentUnavailable`] if the range cannot be read.
    fn read(&mut self, base: u32, len: usize) -> Result<Vec<u32>, ExecError>;
}

/// Outcome of an executed script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecReport {
    /// Execution time reported by the context.
    pub elapsed_ns: u32,
    /// Raw status word.
    pub status: u32,
    /// Encoded script size in words.
    pub words: usize,
}

/// Uploads `script`, runs it and interprets the reply.
///
/// # Errors
///
/// Returns [`ReconfigError::LockTimeout`] if a wait in the script expired, and
/// [`ReconfigError::Exec`] for protocol failures or any other non-zero status.
pub fn submit(exec: &mut dyn ExecutionContext, script: Script) -> Result<ExecReport, ReconfigError> {
    let Reply([base, size]) = exec.send(Message::Info(InfoKind::Data))?;
    let words = script.encode();
    let capacity = (size >> 2) as usize;
    if words.len() > capacity {
        return Err(ExecError::SegmentOverflow {
            words: words.len(),
            capacity,
        }
        .into());
    }

    exec.acquire(base)?;
    let pushed = exec.push(&words);
    let finish = exec.release();
    pushed?;

    let Reply([elapsed_ns, status]) = exec.send(Message::Exec { base, finish })?;
    info!(
        words = words.len(),
        batches = script.batches().len(),
        elapsed_ns,
        status,
        "script executed"
    );

    match status {
        memx::STATUS_OK => Ok(ExecReport {
            elapsed_ns,
            status,
            words: words.len(),
        }),
        memx::STATUS_WAIT_TIMEOUT => Err(ReconfigError::LockTimeout { elapsed_ns }),
        _ => Err(ExecError::Rejected { status }.into()),
    }
}

/// Discards `script` without executing it.
pub fn tidy(script: Script) {
    if script.is_empty() {
        debug!("tidy: empty script");
    } else {
        warn!(
            batches = script.batches().len(),
            words = script.encoded_len(),
            "discarding unexecuted script"
        );
    }
    drop(script);
}

/// Reads the training result packet, at most `max_words` long.
///
/// # Errors
///
/// Returns [`ExecError::TrainResultTooLarge`] if the packet exceeds `max_words`, or any error
/// from the context.
pub fn read_train_result(
    exec: &mut dyn ExecutionContext,
    max_words: usize,
) -> Result<Vec<u32>, ExecError> {
    let Reply([base, size]) = exec.send(Message::Info(InfoKind::Train))?;
    let size = (size >> 2) as usize;
    if size > max_words {
        return Err(ExecError::TrainResultTooLarge {
            size,
            capacity: max_words,
        });
    }
    exec.read(base, size)
}
