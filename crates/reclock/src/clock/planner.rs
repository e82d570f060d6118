//! Clock Transition Planner.
//!
//! Given a target frequency and the permitted paths, the planner decides how the memory clock
//! will be produced. It tries, in order:
//! 1. **Divider:** `divisor = (ref * 2) / target - 2`, usable when it lies in `0..=63`.
//! 2. **PLL:** A memory PLL (DDR-class memory) or a reference PLL feeding the memory PLL (GDDR5),
//!    from whichever source PLL lands closest to the target.
//!
//! If neither is permitted or possible the target is unreachable.

use tracing::debug;

use super::pll::{self, PllCoefs, PllLimits};
use super::{ClockFlags, ClockMode};
use crate::common::PlanError;
use crate::common::bits;
use crate::common::constants::clk;
use crate::ram::RamType;

/// Largest divisor the divider field holds.
const DIVISOR_MAX: u32 = 63;

/// Intermediate frequency the reference PLL is tuned to on the two-stage path.
pub const PLL2_INTERMEDIATE_KHZ: u32 = 108_000;

/// Source PLL feeding the divider or the PLL chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefSource {
    /// Source PLL 0.
    Sppll0,
    /// Source PLL 1.
    Sppll1,
}

impl RefSource {
    /// Returns the source-select bit pattern for the divider and PLL source registers.
    pub const fn select(self) -> u32 {
        match self {
            Self::Sppll0 => 0,
            Self::Sppll1 => clk::DIV_SRC_SPPLL1,
        }
    }
}

/// Divider source and control register values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DividerRegs {
    /// Value for the divider source register.
    pub dsrc: u32,
    /// Value for the divider control register.
    pub dctl: u32,
}

/// A divider setting that reaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerSolution {
    /// Source PLL used as reference.
    pub source: RefSource,
    /// Reference frequency in kHz.
    pub ref_khz: u32,
    /// Divisor written to the control register.
    pub divisor: u32,
    /// Achieved frequency, `ref * 2 / (divisor + 2)`.
    pub khz: u32,
}

/// A PLL setting that approximates the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllSolution {
    /// Source PLL feeding the chain.
    pub source: RefSource,
    /// Reference PLL coefficients, on the two-stage path only.
    pub refpll: Option<PllCoefs>,
    /// Memory PLL coefficients.
    pub mpll: PllCoefs,
}

impl PllSolution {
    /// Returns the achieved frequency.
    pub const fn khz(&self) -> u32 {
        self.mpll.khz
    }
}

/// Everything the planner reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanInput {
    /// Requested frequency in kHz.
    pub target_khz: u32,
    /// Path restrictions.
    pub flags: ClockFlags,
    /// Memory technology; GDDR5 uses the two-stage PLL path.
    pub ram_type: RamType,
    /// Mode the memory clock is in now.
    pub from: ClockMode,
    /// Current divider source register value.
    pub dsrc: u32,
    /// Current divider control register value.
    pub dctl: u32,
    /// Source PLL 0 frequency, if known.
    pub sppll0_khz: Option<u32>,
    /// Source PLL 1 frequency, if known.
    pub sppll1_khz: Option<u32>,
    /// Reference PLL limits.
    pub refpll: PllLimits,
    /// Memory PLL limits.
    pub mpll: PllLimits,
}

/// The decided transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTransitionPlan {
    /// Mode before the transition.
    pub from: ClockMode,
    /// Mode after the transition.
    pub to: ClockMode,
    /// Divider registers; also used as the intermediate clock while a PLL is reprogrammed.
    pub divider: DividerRegs,
    /// Divider setting, if the divider reaches the target.
    pub divisor: Option<DividerSolution>,
    /// PLL setting, if a PLL path was chosen.
    pub pll: Option<PllSolution>,
    /// Frequency the chosen path produces.
    pub achieved_khz: u32,
}

/// Plans a transition to `input.target_khz`.
///
/// # Errors
///
/// Returns [`PlanError::Unreachable`] if no permitted path produces the target.
pub fn plan(input: &PlanInput) -> Result<ClockTransitionPlan, PlanError> {
    let (divider, solution) = divider(input);
    let mut out = ClockTransitionPlan {
        from: input.from,
        to: ClockMode::Invalid,
        divider,
        divisor: None,
        pll: None,
        achieved_khz: 0,
    };

    if !input.flags.contains(ClockFlags::NO_DIV)
        && let Some(div) = solution
    {
        out.to = ClockMode::Div;
        out.divisor = Some(div);
        out.achieved_khz = div.khz;
    } else if !input.flags.contains(ClockFlags::NO_PLL)
        && let Some(pll) = pll_path(input)
    {
        out.to = if input.ram_type == RamType::Gddr5 {
            ClockMode::Pll2
        } else {
            ClockMode::Pll
        };
        out.pll = Some(pll);
        out.achieved_khz = pll.khz();
    } else {
        return Err(PlanError::Unreachable {
            target_khz: input.target_khz,
        });
    }

    debug!(
        from = ?out.from,
        to = ?out.to,
        target_khz = input.target_khz,
        achieved_khz = out.achieved_khz,
        "clock plan"
    );
    Ok(out)
}

/// Computes the divider registers and, if reachable, the divider solution.
fn divider(input: &PlanInput) -> (DividerRegs, Option<DividerSolution>) {
    let dsrc = input.dsrc | clk::DIV_SRC_ENABLE;
    let mut regs = DividerRegs {
        dsrc,
        dctl: input.dctl,
    };
    let (source, field, ref_khz) = if dsrc & clk::DIV_SRC_SPPLL1 == 0 {
        (RefSource::Sppll0, clk::DIV_CTRL_SPPLL0, input.sppll0_khz)
    } else {
        (RefSource::Sppll1, clk::DIV_CTRL_SPPLL1, input.sppll1_khz)
    };
    let Some(ref_khz) = ref_khz else {
        return (regs, None);
    };
    if input.target_khz == 0 {
        return (regs, None);
    }

    let twice = u64::from(ref_khz) * 2;
    let quotient = twice / u64::from(input.target_khz);
    let Some(divisor) = quotient.checked_sub(2) else {
        return (regs, None);
    };
    if divisor > u64::from(DIVISOR_MAX) {
        return (regs, None);
    }
    let divisor = divisor as u32;
    regs.dctl = bits::replace(regs.dctl, field, divisor);
    let khz = (twice / u64::from(divisor + 2)) as u32;
    (
        regs,
        Some(DividerSolution {
            source,
            ref_khz,
            divisor,
            khz,
        }),
    )
}

/// Tries both source PLLs and keeps the one landing closest to the target.
fn pll_path(input: &PlanInput) -> Option<PllSolution> {
    let paths = [
        (RefSource::Sppll0, input.sppll0_khz),
        (RefSource::Sppll1, input.sppll1_khz),
    ];
    let mut best: Option<(u32, PllSolution)> = None;
    for (source, ref_khz) in paths {
        let Some(ref_khz) = ref_khz else { continue };
        let Some(solution) = pll_chain(input, source, ref_khz) else {
            continue;
        };
        let err = solution.khz().abs_diff(input.target_khz);
        if best.is_none_or(|(e, _)| err < e) {
            best = Some((err, solution));
        }
    }
    best.map(|(_, s)| s)
}

fn pll_chain(input: &PlanInput, source: RefSource, ref_khz: u32) -> Option<PllSolution> {
    if input.ram_type == RamType::Gddr5 {
        let refpll = pll::calc(&input.refpll, ref_khz, PLL2_INTERMEDIATE_KHZ)?;
        let mpll = pll::calc(&input.mpll, refpll.khz, input.target_khz)?;
        Some(PllSolution {
            source,
            refpll: Some(refpll),
            mpll,
        })
    } else {
        let mpll = pll::calc(&input.mpll, ref_khz, input.target_khz)?;
        Some(PllSolution {
            source,
            refpll: None,
            mpll,
        })
    }
}
