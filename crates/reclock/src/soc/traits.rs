//! Collaborator traits.
//!
//! This module defines the seams between the sequencer and the device it drives. It provides:
//! 1. **Register Space:** `rd32`/`wr32` on absolute register addresses, plus a read-modify-write.
//! 2. **Clock Source:** Frequencies of named clocks in kHz.
//! 3. **Display Probe:** Per-head activity and resolution.
//!
//! Implementations live with the caller (a kernel driver, a simulator, a test mock).

/// Raw 32-bit register access.
pub trait RegisterSpace {
    /// Reads the register at `addr`.
    fn rd32(&mut self, addr: u32) -> u32;

    /// Writes `value` to the register at `addr`.
    fn wr32(&mut self, addr: u32, value: u32);

    /// Replaces the bits selected by `mask` with `data` and returns the previous value.
    fn mask(&mut self, addr: u32, mask: u32, data: u32) -> u32 {
        let prev = self.rd32(addr);
        self.wr32(addr, (prev & !mask) | data);
        prev
    }
}

/// Clocks the planner and orchestrator read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockId {
    /// Source PLL 0.
    Sppll0,
    /// Source PLL 1.
    Sppll1,
    /// The memory clock as currently running.
    Mem,
}

/// Clock frequency readout.
pub trait ClockSource {
    /// Returns the frequency of `id` in kHz, or `None` if it cannot be determined.
    fn read_khz(&self, id: ClockId) -> Option<u32>;
}

/// One display head as seen by the vblank heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadState {
    /// Head index, used as the MEMX vblank operand.
    pub id: u32,
    /// Whether the head is currently scanning out.
    pub active: bool,
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
}

impl HeadState {
    /// Returns the pixel count of the scanout.
    pub const fn pixels(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }
}

/// Display engine probe.
pub trait DisplayProbe {
    /// Returns every head the display engine exposes, active or not.
    fn heads(&self) -> Vec<HeadState>;
}
