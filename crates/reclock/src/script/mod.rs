//! MEMX Script Model.
//!
//! A reconfiguration is recorded as a script before anything reaches the hardware. This module
//! provides:
//! 1. **Operations:** The register operations the sequences are written in.
//! 2. **Script:** Ordered batches of MEMX method words and their wire encoding.
//! 3. **Recording:** The register cache, batch builder and write-coalescing sink.
//! 4. **Execution:** Submitting a finished script to the execution context, or discarding it.
//!
//! On the wire each batch is a header word `(len << 16) | method` followed by `len` operand
//! words.

/// Batch builder that coalesces consecutive operations of the same method.
pub mod builder;
/// Register cache consulted by masked writes.
pub mod cache;
/// Execution context interface, submit and tidy.
pub mod exec;
/// Write-coalescing register facade that records scripts.
pub mod sink;

use std::fmt;

use crate::common::ExecError;

pub use builder::ScriptBuilder;
pub use cache::RegisterCache;
pub use exec::{ExecReport, ExecutionContext, InfoKind, Message, Reply};
pub use sink::{MaskOpts, RegisterSink};

/// MEMX method identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Method {
    /// Block host framebuffer access.
    Enter = 1,
    /// Unblock host framebuffer access.
    Leave = 2,
    /// Register writes, operands are `(addr, data)` pairs.
    Wr32 = 3,
    /// Poll `(addr, mask, data, ns)` until `rd32(addr) & mask == data` or `ns` elapse.
    Wait = 4,
    /// Busy-wait for `ns`.
    Delay = 5,
    /// Wait for vblank on the given head.
    Vblank = 6,
    /// Run memory training.
    Train = 7,
}

impl Method {
    /// Returns the method for a raw id, if it is known.
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Enter),
            2 => Some(Self::Leave),
            3 => Some(Self::Wr32),
            4 => Some(Self::Wait),
            5 => Some(Self::Delay),
            6 => Some(Self::Vblank),
            7 => Some(Self::Train),
            _ => None,
        }
    }

    /// Returns the raw method id.
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// One register-level step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOperation {
    /// Unconditional write.
    Write {
        /// Register address.
        addr: u32,
        /// Value written.
        value: u32,
    },
    /// Read-modify-write of the bits in `mask`.
    MaskedWrite {
        /// Register address.
        addr: u32,
        /// Bits replaced.
        mask: u32,
        /// New value of those bits; must lie inside `mask`.
        value: u32,
        /// Write even if the register already holds the result.
        force: bool,
    },
    /// Poll until the masked register equals `value` or the timeout expires.
    WaitUntil {
        /// Register address.
        addr: u32,
        /// Bits compared.
        mask: u32,
        /// Expected value of those bits.
        value: u32,
        /// Timeout in nanoseconds.
        timeout_ns: u32,
    },
    /// Fixed delay.
    Delay {
        /// Delay in nanoseconds.
        ns: u32,
    },
}

impl RegisterOperation {
    /// Returns `false` for a non-forced masked write whose value strays outside its mask.
    pub const fn validate(&self) -> bool {
        match *self {
            Self::MaskedWrite {
                mask, value, force, ..
            } => force || value & !mask == 0,
            _ => true,
        }
    }
}

/// A closed run of operand words sharing one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Method applied to every operand group in the batch.
    pub method: Method,
    /// Operand words, without the header.
    pub words: Vec<u32>,
}

impl Batch {
    /// Returns the wire header word.
    pub fn header(&self) -> u32 {
        ((self.words.len() as u32) << 16) | self.method.id()
    }
}

/// An ordered MEMX micro-program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    batches: Vec<Batch>,
}

impl Script {
    /// Wraps already-closed batches.
    pub const fn from_batches(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Returns the batches in execution order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns `true` if the script has no batches.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Returns the encoded size in words, headers included.
    pub fn encoded_len(&self) -> usize {
        self.batches.iter().map(|b| b.words.len() + 1).sum()
    }

    /// Returns the number of batches using `method`.
    pub fn count(&self, method: Method) -> usize {
        self.batches.iter().filter(|b| b.method == method).count()
    }

    /// Returns every `(addr, data)` pair written by `Wr32` batches, in order.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.batches
            .iter()
            .filter(|b| b.method == Method::Wr32)
            .flat_map(|b| b.words.chunks_exact(2).map(|p| (p[0], p[1])))
            .collect()
    }

    /// Encodes the script into MEMX wire words.
    pub fn encode(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for batch in &self.batches {
            out.push(batch.header());
            out.extend_from_slice(&batch.words);
        }
        out
    }

    /// Decodes MEMX wire words.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MalformedScript`] at the offset of an unknown method id or of a
    /// header whose length runs past the end of `words`.
    pub fn decode(words: &[u32]) -> Result<Self, ExecError> {
        let mut batches = Vec::new();
        let mut pos = 0;
        while pos < words.len() {
            let header = words[pos];
            let method = Method::from_id(header & 0xffff)
                .ok_or(ExecError::MalformedScript { offset: pos })?;
            let len = (header >> 16) as usize;
            let body = words
                .get(pos + 1..pos + 1 + len)
                .ok_or(ExecError::MalformedScript { offset: pos })?;
            batches.push(Batch {
                method,
                words: body.to_vec(),
            });
            pos += 1 + len;
        }
        Ok(Self { batches })
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for batch in &self.batches {
            match batch.method {
                Method::Wr32 => {
                    for pair in batch.words.chunks_exact(2) {
                        writeln!(f, "R[{:06x}] = {:08x}", pair[0], pair[1])?;
                    }
                }
                Method::Wait => {
                    for op in batch.words.chunks_exact(4) {
                        writeln!(
                            f,
                            "R[{:06x}] & {:08x} == {:08x}, {} ns",
                            op[0], op[1], op[2], op[3]
                        )?;
                    }
                }
                Method::Delay => {
                    for ns in &batch.words {
                        writeln!(f, "DELAY = {ns} ns")?;
                    }
                }
                Method::Vblank => {
                    for head in &batch.words {
                        writeln!(f, "WAIT VBLANK HEAD{head}")?;
                    }
                }
                Method::Enter => writeln!(f, "HOST BLOCKED")?,
                Method::Leave => writeln!(f, "HOST UNBLOCKED")?,
                Method::Train => writeln!(f, "MEM TRAIN")?,
            }
        }
        Ok(())
    }
}
