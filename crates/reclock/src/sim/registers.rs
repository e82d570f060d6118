//! Simulated register file.
//!
//! A sparse map of register values with optional pinned bits, so status registers can be made
//! to report lock or idle regardless of what a script writes to them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::soc::RegisterSpace;

/// Sparse register file; unwritten registers read as zero.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    values: HashMap<u32, u32>,
    pins: HashMap<u32, (u32, u32)>,
    log: Vec<(u32, u32)>,
    reads: u64,
}

impl RegisterFile {
    /// Creates an empty register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::set`].
    #[must_use]
    pub fn with(mut self, addr: u32, value: u32) -> Self {
        self.set(addr, value);
        self
    }

    /// Builder form of [`Self::pin`].
    #[must_use]
    pub fn with_pin(mut self, addr: u32, mask: u32, value: u32) -> Self {
        self.pin(addr, mask, value);
        self
    }

    /// Sets a register without logging a write.
    pub fn set(&mut self, addr: u32, value: u32) {
        let _ = self.values.insert(addr, value);
    }

    /// Returns the value a read of `addr` would see, without counting it.
    pub fn get(&self, addr: u32) -> u32 {
        let raw = self.values.get(&addr).copied().unwrap_or(0);
        match self.pins.get(&addr) {
            Some(&(mask, value)) => (raw & !mask) | (value & mask),
            None => raw,
        }
    }

    /// Makes the bits in `mask` of `addr` always read as `value`.
    pub fn pin(&mut self, addr: u32, mask: u32, value: u32) {
        let _ = self.pins.insert(addr, (mask, value));
    }

    /// Removes the pin on `addr`.
    pub fn unpin(&mut self, addr: u32) {
        let _ = self.pins.remove(&addr);
    }

    /// Returns every write made through [`RegisterSpace::wr32`], in order.
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.log
    }

    /// Returns the writes made to `addr`, in order.
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.log
            .iter()
            .filter(|&&(a, _)| a == addr)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Clears the write log.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Returns the number of reads made through [`RegisterSpace::rd32`].
    pub const fn reads(&self) -> u64 {
        self.reads
    }
}

impl RegisterSpace for RegisterFile {
    fn rd32(&mut self, addr: u32) -> u32 {
        self.reads += 1;
        self.get(addr)
    }

    fn wr32(&mut self, addr: u32, value: u32) {
        trace!("sim R[{addr:06x}] <- {value:08x}");
        self.log.push((addr, value));
        let _ = self.values.insert(addr, value);
    }
}

/// A register file shared between the caller and an interpreter.
#[derive(Debug, Clone, Default)]
pub struct SharedRegisters(Arc<Mutex<RegisterFile>>);

impl SharedRegisters {
    /// Wraps `file`.
    pub fn new(file: RegisterFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    /// Locks the register file, recovering from a poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, RegisterFile> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegisterSpace for SharedRegisters {
    fn rd32(&mut self, addr: u32) -> u32 {
        self.lock().rd32(addr)
    }

    fn wr32(&mut self, addr: u32, value: u32) {
        self.lock().wr32(addr, value);
    }
}
