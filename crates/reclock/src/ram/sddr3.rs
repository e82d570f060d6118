//! DDR3 reclock sequence.
//!
//! DDR3 runs from the divider or from the memory PLL, and moves freely between the two. While
//! the memory PLL is reprogrammed the divider carries the clock, so a `Pll -> Pll` change is
//! routed through it inside the FB-off window.

use super::{RamSequence, RamType, ReclockContext};
use crate::clock::{ClockMode, ClockTransitionPlan};
use crate::common::CalcError;
use crate::common::constants::{clk, fb};
use crate::mr::{self, ModeRegisterSet, RamCfg};

/// Targets at or below this run the controller in low-speed mode.
const LOWSPEED_KHZ: u32 = 750_000;

/// Targets below this keep the clock-path DLL bits set.
const DLL_LOWFREQ_KHZ: u32 = 405_000;

/// DLL lock time scale; the wait is `ceil(DLL_LOCK_KHZ / khz)` microseconds.
const DLL_LOCK_KHZ: u32 = 540_000;

/// DDR3 sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ddr3Sequence;

fn is_lowspeed(ctx: &ReclockContext<'_>) -> bool {
    ctx.next.freq <= LOWSPEED_KHZ
}

fn lock_nsec(khz: u32) -> u32 {
    DLL_LOCK_KHZ.div_ceil(khz.max(1)) * 1_000
}

fn r10f830(ctx: &mut ReclockContext<'_>, on: bool) {
    ctx.sink
        .mask(fb::CLK_PATH, 0x0000_0006, 0x0000_0006 * u32::from(on));
}

fn r137370(ctx: &mut ReclockContext<'_>, enable: bool) {
    let (parts, trigger) = if enable {
        (ctx.partitions.fbpa_mask, 0x0000_0001)
    } else {
        (0, 0)
    };
    ctx.sink.wr32(clk::PART_ENABLE, parts);
    ctx.sink.wr32(clk::PART_TRIGGER, trigger);
}

fn r132018(ctx: &mut ReclockContext<'_>, lowspeed: bool) {
    let data = 0x0000_1000
        | (u32::from(lowspeed) << 28)
        | (u32::from(ctx.to() == ClockMode::Div) << 15);
    ctx.sink.mask(clk::MPLL_MODE, 0x1000_9000, data);
}

/// Pulses the DLL reset bit of MR0 unless MR1 has the DLL disabled.
fn dll_reset(ctx: &mut ReclockContext<'_>) {
    if ctx.sink.rd32(fb::MR1) & 0x0000_0001 != 0 {
        return;
    }
    ctx.sink.mask_force(fb::MR0, 0x0000_0100, 0x0000_0100);
    ctx.settle();
    ctx.sink.mask(fb::MR0, 0x0000_0100, 0x0000_0000);
    ctx.settle();
}

/// Records the memory PLL source and coefficients and enables it.
fn program_mpll(ctx: &mut ReclockContext<'_>) {
    let Some(pll) = ctx.plan.pll else {
        return;
    };
    ctx.sink.wr32(clk::REFPLL_SRC, clk::DIV_SRC_ENABLE | pll.source.select());
    ctx.sink.wr32(clk::MPLL_COEF, pll.mpll.encode());
    ctx.sink.mask(clk::MPLL_CTRL, clk::MPLL_ENABLE, clk::MPLL_ENABLE);
}

fn wait_mpll_lock(ctx: &mut ReclockContext<'_>) {
    let lock = ctx.config.timeouts.mpll_lock_ns;
    ctx.sink.wait(
        clk::PLL_STATUS,
        clk::STATUS_MPLL_LOCK,
        clk::STATUS_MPLL_LOCK,
        lock,
    );
}

impl RamSequence for Ddr3Sequence {
    fn ram_type(&self) -> RamType {
        RamType::Ddr3
    }

    fn supports(&self, from: ClockMode, to: ClockMode) -> bool {
        matches!(from, ClockMode::Div | ClockMode::Pll)
            && matches!(to, ClockMode::Div | ClockMode::Pll)
    }

    fn mode_registers(
        &self,
        cfg: &RamCfg,
        _plan: &ClockTransitionPlan,
    ) -> Result<ModeRegisterSet, CalcError> {
        mr::sddr3::calc(cfg)
    }

    fn prepare(&self, ctx: &mut ReclockContext<'_>) {
        let (from, to) = (ctx.from(), ctx.to());
        if from != ClockMode::Div {
            // Divider carries the clock while the memory PLL is down.
            let divider = ctx.plan.divider;
            ctx.sink.wr32(clk::DIV_CTRL, divider.dctl);
            ctx.sink.wr32(clk::DIV_SRC, divider.dsrc);
        } else if to != ClockMode::Div {
            program_mpll(ctx);
            wait_mpll_lock(ctx);
            let lowspeed = is_lowspeed(ctx);
            r132018(ctx, lowspeed);
        }

        if from != ClockMode::Div || to != ClockMode::Div {
            r137370(ctx, true);
        }
    }

    fn reprogram(&self, ctx: &mut ReclockContext<'_>) {
        let (from, to) = (ctx.from(), ctx.to());

        ctx.sink.mask(fb::CFG, 0x0000_0800, 0x0000_0000);
        ctx.sink.wr32(fb::REFRESH_TRIGGER, 0x0000_0001);
        ctx.sink.wr32(fb::REFRESH, 0x0000_0000);
        ctx.sink.wr32(fb::PRECHARGE, 0x0000_0001);
        ctx.sink.wr32(fb::PRECHARGE, 0x0000_0001);
        ctx.settle();
        ctx.sink.wr32(fb::CMD, 0x0000_0060);
        ctx.sink.wr32(fb::CMD, 0xc000_007e);

        if from != ClockMode::Div {
            ctx.sink.mask(clk::MODE, 0x0000_0001, 0x0000_0001);
            if ctx.sink.rd32(fb::CLK_PATH) & 0x0000_0006 == 0 {
                let on = ctx.next.freq < DLL_LOWFREQ_KHZ;
                r10f830(ctx, on);
            }
            r137370(ctx, false);
            ctx.sink.mask(clk::MPLL_MODE, 0x0000_4000, 0x0000_0000);
            ctx.sink.mask(clk::MPLL_CTRL, clk::MPLL_ENABLE, 0x0000_0000);
        }

        if from != ClockMode::Div && to != ClockMode::Div {
            program_mpll(ctx);
        }

        if from == ClockMode::Div && to == ClockMode::Div {
            let dctl = ctx.plan.divider.dctl;
            ctx.sink.wr32(clk::DIV_CTRL, dctl);
        }
    }

    fn await_lock(&self, ctx: &mut ReclockContext<'_>) {
        let (from, to) = (ctx.from(), ctx.to());
        let lowspeed = is_lowspeed(ctx);
        let locknsec = lock_nsec(ctx.next.freq);

        if from != ClockMode::Div && to != ClockMode::Div {
            wait_mpll_lock(ctx);
        }

        ctx.sink
            .mask(fb::LOWSPEED, 0x0400_0000, u32::from(lowspeed) << 26);
        r132018(ctx, lowspeed);
        ctx.sink.wr32(fb::DDR_TUNE, 0x0000_1010);
        ctx.sink.mask(fb::DLL_CTRL, 0x0000_6000, 0x0000_6000);

        if to != ClockMode::Div {
            let on = ctx.next.freq < DLL_LOWFREQ_KHZ;
            r10f830(ctx, on);
            r137370(ctx, true);
            ctx.sink.mask(clk::MODE, 0x0000_0001, 0x0000_0000);
        }

        ctx.sink.wr32(fb::CMD, 0x4000_007f);
        ctx.sink.wr32(fb::REFRESH, 0x8000_0000);
        ctx.sink.nsec(locknsec);
        dll_reset(ctx);
        ctx.write_mr(fb::MR2, 2, false);
        ctx.write_mr(fb::MR1, 1, false);
        ctx.write_mr(fb::MR0, 0, true);
        ctx.settle();
        ctx.sink.mask(fb::PAD_CAL, 0x1000_0020, 0x0000_0000);
        dll_reset(ctx);
        ctx.sink.nsec(locknsec);
        ctx.sink.mask(fb::CLK_PATH, 0x0100_0000, 0x0100_0000);
        ctx.sink.mask(fb::CLK_PATH, 0x0100_0000, 0x0000_0000);

        ctx.timing();
    }
}
