//! Collaborators of the Sequencer.
//!
//! The sequencer never touches hardware directly. Everything it reads or observes comes through
//! the traits defined here, bundled per call into a [`Hardware`] view:
//! 1. **Registers:** Raw 32-bit register reads and writes.
//! 2. **Clocks:** Current frequencies of the source PLLs and the memory clock.
//! 3. **Display:** Active heads, used to hide the FB-off window inside a vblank.

/// Collaborator trait definitions.
pub mod traits;

pub use traits::{ClockId, ClockSource, DisplayProbe, HeadState, RegisterSpace};

/// Borrowed view of the collaborators a reconfiguration reads from.
///
/// Built by the caller for each call into [`Ram`](crate::ram::Ram); the sequencer holds no
/// references beyond the call.
pub struct Hardware<'a> {
    /// Raw register access.
    pub regs: &'a mut dyn RegisterSpace,
    /// Source and memory clock frequencies.
    pub clocks: &'a dyn ClockSource,
    /// Display engine, if the device has one.
    pub display: Option<&'a dyn DisplayProbe>,
}

impl<'a> Hardware<'a> {
    /// Creates a view without a display engine.
    pub fn new(regs: &'a mut dyn RegisterSpace, clocks: &'a dyn ClockSource) -> Self {
        Self {
            regs,
            clocks,
            display: None,
        }
    }

    /// Attaches a display engine.
    #[must_use]
    pub fn with_display(mut self, display: &'a dyn DisplayProbe) -> Self {
        self.display = Some(display);
        self
    }
}

impl std::fmt::Debug for Hardware<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hardware")
            .field("display", &self.display.is_some())
            .finish_non_exhaustive()
    }
}
