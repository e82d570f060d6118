//! GDDR5 reclock sequence.
//!
//! GDDR5 moves between the divider and the two-stage PLL path (reference PLL feeding the
//! memory PLL). Any transition must touch the divider on one side: `Div -> Div`,
//! `Div -> Pll2` and `Pll2 -> Div` are supported.
//!
//! The reference and memory PLLs are brought up and locked before FB access is shut off, so
//! the window itself only switches the clock path and retrains the link.

use super::train::calc_train;
use super::{FBPA_WAR_SCALE, RamSequence, RamType, ReclockContext};
use crate::clock::{ClockMode, ClockTransitionPlan};
use crate::common::CalcError;
use crate::common::constants::{clk, fb};
use crate::mr::gddr5::{self, Gddr5Options};
use crate::mr::{ModeRegisterSet, RamCfg};

/// Delay after the self-refresh exit command and the PLL path trigger.
const CMD_SETTLE_NS: u32 = 2_000;

/// Interface timings for the PLL path.
const IF_TIMING_PLL: [u32; 4] = [0x2004ff00, 0x003fc040, 0x20012001, 0x00011a00];

/// Interface timings for the divider path.
const IF_TIMING_DIV: [u32; 4] = [0x20010000, 0x00000000, 0x20012001, 0x00010a00];

/// GDDR5 sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gddr5Sequence;

impl Gddr5Sequence {
    fn reset_refpll(ctx: &mut ReclockContext<'_>) {
        let ctl = ctx.sink.rd32(fb::REFPLL_CTRL);
        let status = ctx.sink.rd32(clk::PLL_STATUS);
        if ctl & 0x0000_0002 == 0 && status & clk::STATUS_REFPLL_IDLE != 0 {
            return;
        }
        ctx.sink.mask_force(fb::REFPLL_CTRL, 0x0000_0002, 0x0000_0002);
        ctx.sink.mask(fb::REFPLL_CTRL, 0x0000_0002, 0x0000_0000);
        let timeout = ctx.config.timeouts.reset_ack_ns;
        ctx.sink
            .wait(clk::REFPLL_STATUS, 0x0001_0000, 0x0001_0000, timeout);
    }

    fn if_timing(ctx: &mut ReclockContext<'_>, values: [u32; 4]) {
        let regs = [fb::IF_TIMING0, fb::IF_TIMING1, fb::IF_TIMING2, fb::IF_TIMING3];
        for (addr, value) in regs.into_iter().zip(values) {
            ctx.sink.wr32(addr, value);
        }
    }
}

impl RamSequence for Gddr5Sequence {
    fn ram_type(&self) -> RamType {
        RamType::Gddr5
    }

    fn supports(&self, from: ClockMode, to: ClockMode) -> bool {
        match from {
            ClockMode::Div => matches!(to, ClockMode::Div | ClockMode::Pll2),
            ClockMode::Invalid => false,
            _ => to == ClockMode::Div,
        }
    }

    fn mode_registers(
        &self,
        cfg: &RamCfg,
        plan: &ClockTransitionPlan,
    ) -> Result<ModeRegisterSet, CalcError> {
        let opts = Gddr5Options {
            nuts: false,
            rq: i32::from(plan.to == ClockMode::Div),
            l3: 0,
        };
        gddr5::calc(cfg, opts)
    }

    fn prepare(&self, ctx: &mut ReclockContext<'_>) {
        ctx.sink.mask_force(clk::MCLK_GATE, 0x0000_0001, 0x0000_0001);

        if ctx.to() == ClockMode::Div {
            if ctx.from() != ClockMode::Div {
                let divider = ctx.plan.divider;
                ctx.sink.wr32(clk::DIV_CTRL, divider.dctl);
                ctx.sink.wr32(clk::DIV_SRC, divider.dsrc);
            }
            Self::if_timing(ctx, IF_TIMING_DIV);
            return;
        }

        let Some(pll) = ctx.plan.pll else {
            return;
        };
        let lock = ctx.config.timeouts.mpll_lock_ns;
        Self::reset_refpll(ctx);

        ctx.sink.mask_force(fb::REFPLL_CTRL, 0x0000_0005, 0x0000_0000);
        ctx.sink.wr32(clk::REFPLL_SRC, clk::DIV_SRC_ENABLE | pll.source.select());
        if let Some(refpll) = pll.refpll {
            ctx.sink
                .wr32(clk::REFPLL_COEF, clk::REFPLL_ENABLE | refpll.encode());
            ctx.sink.mask(fb::REFPLL_COEF, 0xffff_ffff, refpll.encode());
        }
        ctx.sink.mask(fb::REFPLL_CTRL, 0x0000_0001, 0x0000_0001);
        ctx.sink.wait(
            clk::PLL_STATUS,
            clk::STATUS_REFPLL_LOCK,
            clk::STATUS_REFPLL_LOCK,
            lock,
        );
        ctx.sink.mask(fb::REFPLL_CTRL, 0x0000_0004, 0x0000_0004);

        ctx.sink.wr32(clk::MPLL_COEF, pll.mpll.encode());
        ctx.sink.mask(
            clk::MPLL_CTRL,
            clk::MPLL_BYPASS | clk::MPLL_ENABLE,
            clk::MPLL_BYPASS | clk::MPLL_ENABLE,
        );
        ctx.sink.wait(
            clk::PLL_STATUS,
            clk::STATUS_MPLL_LOCK,
            clk::STATUS_MPLL_LOCK,
            lock,
        );

        ctx.sink.mask_force(fb::WRLVL0, 0x0000_ffff, 0x0000_0000);
        ctx.sink.mask_force(fb::WRLVL1, 0x0000_ffff, 0x0000_0000);
        Self::if_timing(ctx, IF_TIMING_PLL);
    }

    fn reprogram(&self, ctx: &mut ReclockContext<'_>) {
        let (from, to) = (ctx.from(), ctx.to());
        let dctl = ctx.plan.divider.dctl;
        let khz = ctx.next.freq.max(1);

        // Stop refresh and put the DRAM into self-refresh.
        ctx.sink.mask(fb::CFG, 0x0000_0800, 0x0000_0000);
        if to == ClockMode::Div {
            ctx.sink.mask_force(fb::DLL_CTRL, 0, 0);
        }
        ctx.sink.wr32(fb::REFRESH, 0x0000_0000);
        ctx.settle();
        if from != ClockMode::Div {
            calc_train(ctx, 0xffff_ffff, 0x000c_1001);
        }
        ctx.sink.wr32(fb::PRECHARGE, 0x0000_0001);
        ctx.settle();
        ctx.sink.wr32(fb::CMD, 0x0000_0061);
        ctx.sink.wr32(fb::CMD, 0xc000_007f);
        ctx.settle();

        if to != ClockMode::Div {
            ctx.sink.mask(fb::DLL_CTRL, 0xffff_ffff, 0x0000_7fd4);
        }

        if from != ClockMode::Div {
            ctx.sink.mask(fb::PAD_CAL, 0x0008_0000, 0x0000_0000);
            ctx.sink.mask(fb::CFG, 0x0000_8000, 0x0000_8000);
            ctx.sink.mask(fb::CLK_PATH, 0x4100_0000, 0x4100_0000);
            ctx.sink.mask(fb::CLK_PATH, 0x0100_0000, 0x0000_0000);
            ctx.sink.mask(clk::MCLK_GATE, 0x0000_0100, 0x0000_0100);
            ctx.sink.wr32(clk::DIV_CTRL, dctl);
            ctx.sink.mask_force(fb::SYNC, 0, 0);
            ctx.sink.mask(clk::PATH_SELECT, 0x0000_3f3f, 0x0000_0f0f);
            ctx.sink.mask(clk::PATH_STATUS, 0x0000_0001, 0x0000_0001);
        }

        if to == ClockMode::Div {
            ctx.sink.wr32(clk::DIV_CTRL, dctl & !clk::DIV_CTRL_GATE);
        }

        if from != ClockMode::Div {
            ctx.sink.mask(clk::MCLK_GATE, 0x0000_0100, 0x0000_0000);
            ctx.sink.fbpa_war_nsec(FBPA_WAR_SCALE / khz + 1);
            ctx.sink.mask(fb::CLK_PATH, 0x4070_0007, 0x0030_0007);
            ctx.sink.mask(clk::PATH_STATUS, 0x0000_0002, 0x0000_0000);
            ctx.sink.mask(fb::DLL_CTRL, 0xffff_f9ff, 0x0000_7877);
            ctx.sink.mask(clk::MPLL_CTRL, clk::MPLL_BYPASS, 0x0000_0000);
        }

        if to != ClockMode::Div {
            ctx.sink.mask_force(fb::PAD_CTRL, 0x0000_00ff, 0x0000_0000);
            ctx.sink.mask_force(clk::PATH_SELECT, 0x0000_3f3f, 0x0000_0000);
            ctx.sink.mask_force(clk::PATH_STATUS, 0x0000_0002, 0x0000_0002);
            ctx.sink.wr32(fb::CLK_PATH, 0x4070_0010);
            ctx.sink.mask(fb::CLK_PATH, 0x0020_0000, 0x0000_0000);
            ctx.sink.mask_force(clk::PATH_TRIGGER, 0x0000_2000, 0x0000_0000);
            ctx.sink.mask_force(clk::MCLK_GATE, 0x0000_0100, 0x0000_0100);
            ctx.sink.mask(clk::DIV_CTRL, clk::DIV_CTRL_GATE, clk::DIV_CTRL_GATE);
            ctx.sink.mask_force(fb::SYNC, 0, 0);
            ctx.sink.mask_force(clk::PATH_SELECT, 0x0003_0000, 0x0003_0000);
            ctx.sink.mask_force(clk::PATH_STATUS, 0x0000_0001, 0x0000_0000);
            ctx.sink.fbpa_war_nsec(FBPA_WAR_SCALE / khz);
            ctx.sink.mask(clk::MCLK_GATE, 0x0000_0100, 0x0000_0000);
            ctx.sink.mask(clk::PATH_TRIGGER, 0x0000_2000, 0x0000_2000);
            ctx.sink.nsec(CMD_SETTLE_NS);
            ctx.sink.mask_force(fb::PAD_CAL, 0x0008_0000, 0x0008_0000);
            ctx.sink.mask_force(fb::CLK_PATH, 0x4000_0000, 0x0000_0000);
            ctx.sink.mask_force(fb::CFG, 0x0000_8000, 0x0000_0000);
        }

        // Leave self-refresh and restart refresh.
        ctx.sink.wr32(fb::CMD, 0x4000_007e);
        ctx.sink.nsec(CMD_SETTLE_NS);
        ctx.sink.wr32(fb::REFRESH_TRIGGER, 0x0000_0001);
        ctx.sink.wr32(fb::REFRESH, 0x8000_0000);

        ctx.write_mr(fb::MR3, 3, false);
        ctx.write_mr(fb::MR0, 0, true);
        ctx.settle();

        ctx.timing();
    }

    fn await_lock(&self, ctx: &mut ReclockContext<'_>) {
        if ctx.to() == ClockMode::Div {
            ctx.sink.mask_force(fb::CLK_PATH, 0, 0);
            calc_train(ctx, 0xffff_ffff, 0x8002_1001);
            calc_train(ctx, 0xffff_ffff, 0x8008_1001);
            ctx.sink.mask(fb::CLK_PATH, 0x0100_0000, 0x0100_0000);
            ctx.sink.mask(fb::CLK_PATH, 0x0100_0000, 0x0000_0000);
        } else {
            calc_train(ctx, 0xffff_ffff, 0x800e_1008);
            ctx.settle();
            ctx.sink.mask(fb::PAD_CTRL, 0x0000_0004, 0x0000_0004);
        }
    }

    fn post_enable(&self, ctx: &mut ReclockContext<'_>) {
        if ctx.to() == ClockMode::Div {
            return;
        }
        let delay = ctx.config.timeouts.post_enable_ns;
        ctx.sink.nsec(delay);
        ctx.sink.wr32(fb::TUNE0, 0x0531_3f41);
        ctx.sink.wr32(fb::TUNE1, 0x0000_2f50);
        calc_train(ctx, 0xffff_ffff, 0x010c_1001);
    }
}
