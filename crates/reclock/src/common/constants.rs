//! Register and Protocol Constants.
//!
//! This module names every register, bit and protocol value the sequencer touches. It includes:
//! 1. **Framebuffer (PFB):** Refresh/precharge command, training and mode-register ports.
//! 2. **Clock (PCLK):** Divider, reference PLL and memory PLL control/status.
//! 3. **Display:** The head notification register written around the FB-off window.
//! 4. **MEMX Protocol:** Method ids, message ids and reply status codes for the PMU process.
//!
//! Bit positions are kept as named masks rather than language-level bit-fields so
//! the layouts stay visible and testable.

/// Framebuffer controller (PFB) registers.
pub mod fb {
    /// Init-time control; bit 4 is set once before link training is uploaded.
    pub const INIT_CTRL: u32 = 0x10f160;
    /// Controller sync; touched to flush posted configuration.
    pub const SYNC: u32 = 0x10f050;
    /// Refresh/precharge command register.
    pub const CMD: u32 = 0x10f090;
    /// Controller configuration; bit 11 gates automatic refresh, bit 15 holds self-refresh.
    pub const CFG: u32 = 0x10f200;
    /// Refresh enable (bit 31).
    pub const REFRESH: u32 = 0x10f210;
    /// Timing register programmed per technology.
    pub const TIMING: u32 = 0x10f298;
    /// Mode register 0.
    pub const MR0: u32 = 0x10f300;
    /// Mode register 1.
    pub const MR1: u32 = 0x10f304;
    /// Precharge-all trigger.
    pub const PRECHARGE: u32 = 0x10f310;
    /// Refresh trigger.
    pub const REFRESH_TRIGGER: u32 = 0x10f314;
    /// Mode register 2.
    pub const MR2: u32 = 0x10f320;
    /// Mode register 3.
    pub const MR3: u32 = 0x10f338;
    /// DDR3 ODT/drive tuning.
    pub const DDR_TUNE: u32 = 0x10f660;
    /// Pad control.
    pub const PAD_CTRL: u32 = 0x10f800;
    /// Pad calibration.
    pub const PAD_CAL: u32 = 0x10f808;
    /// DLL control.
    pub const DLL_CTRL: u32 = 0x10f824;
    /// Clock-path control (DLL enable, interface mode).
    pub const CLK_PATH: u32 = 0x10f830;
    /// Low-speed mode select (bit 26).
    pub const LOWSPEED: u32 = 0x10f874;
    /// Training type-04 table data port.
    pub const TRAIN_TYPE04: u32 = 0x10f900;
    /// Training control, first half of the partitions.
    pub const TRAIN_CTRL0: u32 = 0x10f910;
    /// Training control, second half of the partitions.
    pub const TRAIN_CTRL1: u32 = 0x10f914;
    /// Training pattern data port.
    pub const TRAIN_DATA: u32 = 0x10f918;
    /// Training pattern select port.
    pub const TRAIN_SELECT: u32 = 0x10f920;
    /// Training pattern index port.
    pub const TRAIN_INDEX: u32 = 0x10f968;
    /// Interface timing 0.
    pub const IF_TIMING0: u32 = 0x10f988;
    /// Interface timing 1.
    pub const IF_TIMING1: u32 = 0x10f98c;
    /// Interface timing 2.
    pub const IF_TIMING2: u32 = 0x10f990;
    /// Interface timing 3.
    pub const IF_TIMING3: u32 = 0x10f998;
    /// Post-enable tuning 0.
    pub const TUNE0: u32 = 0x10f9b0;
    /// Post-enable tuning 1.
    pub const TUNE1: u32 = 0x10f9b4;
    /// Write leveling 0.
    pub const WRLVL0: u32 = 0x10fb04;
    /// Write leveling 1.
    pub const WRLVL1: u32 = 0x10fb08;
    /// GDDR5 reference PLL control.
    pub const REFPLL_CTRL: u32 = 0x10fe20;
    /// GDDR5 reference PLL coefficients.
    pub const REFPLL_COEF: u32 = 0x10fe24;
    /// Host-visible FB notify register; the low byte is swapped around the FB-off window.
    pub const NOTIFY: u32 = 0x100b0c;
    /// Notify value held while FB access is disabled.
    pub const NOTIFY_BLOCKED: u32 = 0x12;
    /// GF104 partition configuration hook.
    pub const PART_CFG: u32 = 0x100c00;

    /// Per-partition training status; stride [`PART_STRIDE`].
    pub const TRAIN_STATUS: u32 = 0x110974;
    /// Register stride between framebuffer partitions.
    pub const PART_STRIDE: u32 = 0x1000;

    /// Start of the FB partition register window watched by the FBPA workaround.
    pub const WINDOW_START: u32 = 0x10f000;
    /// End (exclusive) of the FB partition register window.
    pub const WINDOW_END: u32 = 0x110000;
    /// Counted sub-ranges inside the FB partition window.
    pub const WAR_RANGES: [(u32, u32); 2] = [(0x10f604, 0x10f910), (0x10fb04, 0x10fe20)];
    /// Per-FBP workaround register base; stride 0x40.
    pub const WAR_BASE: u32 = 0x13d834;
    /// Stride of the workaround register between FBPs.
    pub const WAR_STRIDE: u32 = 0x40;
}

/// Clock (PCLK) registers.
pub mod clk {
    /// Memory PLL control; bit 0 enables, bit 1 resets, bit 8 bypasses.
    pub const MPLL_CTRL: u32 = 0x132000;
    /// Memory PLL coefficients, `(p << 16) | (n << 8) | m`.
    pub const MPLL_COEF: u32 = 0x132004;
    /// Memory PLL mode control (low-speed bit 28, divider-mode bit 15).
    pub const MPLL_MODE: u32 = 0x132018;
    /// GDDR5 reference PLL status; bit 16 acknowledges a reset.
    pub const REFPLL_STATUS: u32 = 0x132020;
    /// Memory clock gating.
    pub const MCLK_GATE: u32 = 0x132100;
    /// Divider source select; bit 8 picks SPPLL1 over SPPLL0.
    pub const DIV_SRC: u32 = 0x137300;
    /// Divider control; divisor in `[5:0]` (SPPLL0) or `[13:8]` (SPPLL1).
    pub const DIV_CTRL: u32 = 0x137310;
    /// Reference PLL source select.
    pub const REFPLL_SRC: u32 = 0x137320;
    /// Reference PLL coefficients.
    pub const REFPLL_COEF: u32 = 0x137330;
    /// Clock-mode select/status; bit 1 = divider path engaged, bit 0 = divider output selected.
    pub const MODE: u32 = 0x137360;
    /// Partition clock enable mask.
    pub const PART_ENABLE: u32 = 0x137370;
    /// Partition clock enable trigger.
    pub const PART_TRIGGER: u32 = 0x137380;
    /// PLL status; bit 0 = MPLL idle, bit 1 = MPLL locked, bit 17 = REFPLL locked.
    pub const PLL_STATUS: u32 = 0x137390;
    /// GDDR5 clock-path select.
    pub const PATH_SELECT: u32 = 0x1373ec;
    /// GDDR5 clock-path status; bit 1 = two-stage PLL path in use.
    pub const PATH_STATUS: u32 = 0x1373f0;
    /// GDDR5 clock-path trigger.
    pub const PATH_TRIGGER: u32 = 0x1373f8;

    /// [`MPLL_CTRL`] enable.
    pub const MPLL_ENABLE: u32 = 0x00000001;
    /// [`MPLL_CTRL`] reset.
    pub const MPLL_RESET: u32 = 0x00000002;
    /// [`MPLL_CTRL`] bypass.
    pub const MPLL_BYPASS: u32 = 0x00000100;
    /// [`MPLL_CTRL`] reset acknowledge.
    pub const MPLL_RESET_ACK: u32 = 0x00010000;
    /// [`PLL_STATUS`] MPLL idle.
    pub const STATUS_MPLL_IDLE: u32 = 0x00000001;
    /// [`PLL_STATUS`] MPLL locked.
    pub const STATUS_MPLL_LOCK: u32 = 0x00000002;
    /// [`PLL_STATUS`] reference PLL idle.
    pub const STATUS_REFPLL_IDLE: u32 = 0x00010000;
    /// [`PLL_STATUS`] reference PLL locked.
    pub const STATUS_REFPLL_LOCK: u32 = 0x00020000;
    /// [`DIV_SRC`] selects SPPLL1 as the divider reference.
    pub const DIV_SRC_SPPLL1: u32 = 0x00000100;
    /// [`DIV_SRC`] enable bits forced on when programming the divider.
    pub const DIV_SRC_ENABLE: u32 = 0x00000003;
    /// Divisor field when referenced from SPPLL0.
    pub const DIV_CTRL_SPPLL0: u32 = 0x0000003f;
    /// Divisor field when referenced from SPPLL1.
    pub const DIV_CTRL_SPPLL1: u32 = 0x00003f00;
    /// Divider output gate in [`DIV_CTRL`].
    pub const DIV_CTRL_GATE: u32 = 0x08000000;
    /// Reference PLL enable bits in its coefficient register.
    pub const REFPLL_ENABLE: u32 = 0x81000000;
}

/// Display registers.
pub mod disp {
    /// Head notification register written around the FB-off window.
    pub const HEAD_NOTIFY: u32 = 0x611200;
    /// Per-head value while FB access is blocked.
    pub const HEAD_BLOCKED: u32 = 0x00001100;
    /// Per-head value once FB access is restored.
    pub const HEAD_RESTORED: u32 = 0x00001110;
}

/// Partition topology probe registers.
pub mod topo {
    /// Number of framebuffer partitions.
    pub const FBP_COUNT: u32 = 0x022438;
    /// Number of partition address units on GF108-class parts.
    pub const FBPA_COUNT: u32 = 0x02243c;
    /// Disabled-partition mask.
    pub const FBP_DISABLE: u32 = 0x022554;
}

/// MEMX process protocol.
pub mod memx {
    /// Process id of the MEMX process (`"MEMX"` as a little-endian fourcc).
    pub const PROC_MEMX: u32 = u32::from_le_bytes(*b"MEMX");
    /// Info request message.
    pub const MSG_INFO: u32 = 0;
    /// Execute request message.
    pub const MSG_EXEC: u32 = 1;
    /// Info request: script data segment.
    pub const INFO_DATA: u32 = 0;
    /// Info request: training results.
    pub const INFO_TRAIN: u32 = 1;
    /// Reply status: script ran to completion.
    pub const STATUS_OK: u32 = 0;
    /// Reply status: a wait did not observe its condition before the deadline.
    pub const STATUS_WAIT_TIMEOUT: u32 = 1;
    /// Reply status: the script contained an unknown method or truncated batch.
    pub const STATUS_BAD_SCRIPT: u32 = 2;
    /// Default number of operand words buffered per batch.
    pub const BATCH_CAPACITY: usize = 64;
}
