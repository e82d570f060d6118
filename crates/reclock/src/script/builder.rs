//! MEMX batch builder.
//!
//! Operations are appended to a pending batch. The batch is closed when the method changes or
//! when the next operation would reach the batch capacity, matching the MEMX process's fixed
//! command buffer.

use tracing::trace;

use super::{Batch, Method, Script};

/// Accumulates operations into capacity-bounded batches.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    capacity: usize,
    pending: Option<Method>,
    words: Vec<u32>,
    batches: Vec<Batch>,
}

impl ScriptBuilder {
    /// Creates a builder closing batches at `capacity` operand words.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: None,
            words: Vec::with_capacity(capacity),
            batches: Vec::new(),
        }
    }

    /// Appends one operation of `method` with its operand words.
    pub fn emit(&mut self, method: Method, words: &[u32]) {
        let full = self.words.len() + words.len() >= self.capacity;
        let switch = self.pending.is_some_and(|m| m != method);
        if full || switch {
            self.flush();
        }
        self.words.extend_from_slice(words);
        self.pending = Some(method);
    }

    /// Closes the pending batch, if any.
    pub fn flush(&mut self) {
        if let Some(method) = self.pending.take() {
            trace!(?method, len = self.words.len(), "batch closed");
            self.batches.push(Batch {
                method,
                words: std::mem::take(&mut self.words),
            });
        }
    }

    /// Returns the method of the pending batch.
    pub const fn pending(&self) -> Option<Method> {
        self.pending
    }

    /// Returns the operand words buffered in the pending batch.
    pub fn pending_words(&self) -> usize {
        self.words.len()
    }

    /// Returns the number of closed batches.
    pub fn closed(&self) -> usize {
        self.batches.len()
    }

    /// Returns the configured batch capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Closes the pending batch and returns the script.
    pub fn finish(mut self) -> Script {
        self.flush();
        Script::from_batches(self.batches)
    }
}
