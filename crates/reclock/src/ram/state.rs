//! Reconfiguration state machine.
//!
//! A reconfiguration moves strictly forward through its phases; `Aborted` can be entered from
//! any phase that has not finished. Anything else is a sequencing bug in the orchestrator.

use tracing::trace;

use crate::common::ReconfigError;

/// Phase of a reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReclockState {
    /// Nothing in progress.
    Idle,
    /// Table lookup, mode detection, planning and mode-register calculation.
    Planning,
    /// PLL and divider setup recorded ahead of the FB-off window.
    Preparing,
    /// Host framebuffer access is being shut off.
    Disabling,
    /// Clock source, training patterns, mode registers and timings.
    Reprogramming,
    /// Lock, training and DLL settle waits.
    AwaitingLock,
    /// Host framebuffer access is being restored.
    ReEnabling,
    /// Script complete and held pending.
    Done,
    /// Given up; nothing is pending.
    Aborted,
}

impl ReclockState {
    /// Returns the phase that follows `self`, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Planning),
            Self::Planning => Some(Self::Preparing),
            Self::Preparing => Some(Self::Disabling),
            Self::Disabling => Some(Self::Reprogramming),
            Self::Reprogramming => Some(Self::AwaitingLock),
            Self::AwaitingLock => Some(Self::ReEnabling),
            Self::ReEnabling => Some(Self::Done),
            Self::Done | Self::Aborted => None,
        }
    }

    /// Returns `true` for `Done` and `Aborted`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns `true` if `self -> to` is a legal transition.
    pub fn can_advance(self, to: Self) -> bool {
        if to == Self::Aborted {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

/// Tracks the phase of one reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachine {
    state: ReclockState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Starts in `Idle`.
    pub const fn new() -> Self {
        Self {
            state: ReclockState::Idle,
        }
    }

    /// Returns the current phase.
    pub const fn state(&self) -> ReclockState {
        self.state
    }

    /// Moves to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigError::InvalidState`] if `to` does not follow the current phase.
    pub fn advance(&mut self, to: ReclockState) -> Result<(), ReconfigError> {
        if !self.state.can_advance(to) {
            return Err(ReconfigError::InvalidState {
                from: self.state,
                to,
            });
        }
        trace!(from = ?self.state, ?to, "reclock state");
        self.state = to;
        Ok(())
    }

    /// Moves to `Aborted` unless already terminal.
    pub fn abort(&mut self) {
        if !self.state.is_terminal() {
            trace!(from = ?self.state, "reclock aborted");
            self.state = ReclockState::Aborted;
        }
    }
}
