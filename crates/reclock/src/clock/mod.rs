//! Memory Clock Sources and Planning.
//!
//! The memory clock can be fed from three paths. This module provides:
//! 1. **Modes:** [`ClockMode`] names the paths and [`current_mode`] decodes the active one.
//! 2. **PLL Search:** Coefficient search within a PLL's limits.
//! 3. **Planner:** Chooses a path and coefficients for a target frequency.

/// PLL limits and coefficient search.
pub mod pll;
/// Clock transition planner.
pub mod planner;

use std::ops::BitOr;

use serde::Deserialize;

pub use planner::{
    ClockTransitionPlan, DividerRegs, DividerSolution, PlanInput, PllSolution, RefSource, plan,
};
pub use pll::{PllCoefs, PllLimits};

use crate::common::constants::clk;
use crate::soc::RegisterSpace;

/// Path feeding the memory clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ClockMode {
    /// Integer divider off a source PLL.
    Div,
    /// Memory PLL.
    Pll,
    /// Reference PLL feeding the memory PLL.
    Pll2,
    /// Not yet determined.
    Invalid,
}

/// Restrictions on the paths the planner may choose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClockFlags(u8);

impl ClockFlags {
    /// No restriction.
    pub const NONE: Self = Self(0);
    /// Do not use the divider path.
    pub const NO_DIV: Self = Self(0x01);
    /// Do not use a PLL path.
    pub const NO_PLL: Self = Self(0x02);

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ClockFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Decodes the mode the memory clock currently runs in.
pub fn current_mode(regs: &mut dyn RegisterSpace) -> ClockMode {
    let mode = regs.rd32(clk::MODE);
    if mode & 0x0000_0002 != 0 {
        if mode & 0x0000_0001 != 0 {
            ClockMode::Div
        } else {
            ClockMode::Pll
        }
    } else if regs.rd32(clk::PATH_STATUS) & 0x0000_0002 != 0 {
        ClockMode::Pll2
    } else {
        ClockMode::Div
    }
}
