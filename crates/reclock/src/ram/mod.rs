//! RAM Reconfiguration Orchestrator.
//!
//! This module drives one memory-clock change from target frequency to a finished script. It
//! provides:
//! 1. **Parameters:** Memory technology, generation, parsed tables and PLL limits of a device.
//! 2. **Context:** [`ReclockContext`], the per-call recording state every sequence writes into.
//! 3. **Sequences:** The [`RamSequence`] strategy with GDDR5 and DDR3 implementations.
//! 4. **Orchestrator:** [`Ram`], which plans, records, submits or discards, and keeps statistics.
//!
//! A reconfiguration walks the phases of [`ReclockState`]. Everything up to and including
//! mode-register calculation is planning: failures there leave no script behind. After that
//! the sequence cannot fail; the script is held pending until `prog` or `tidy`.

pub(crate) mod access;
/// GDDR5 reclock sequence.
pub mod gddr5;
/// Generation capability profiles.
pub mod generation;
/// Framebuffer partition probe.
pub mod probe;
/// DDR3 reclock sequence.
pub mod sddr3;
/// Reconfiguration phase tracking.
pub mod state;
/// Link-training control and pattern upload.
pub mod train;

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info, warn};

pub use gddr5::Gddr5Sequence;
pub use generation::{FbpaSource, Generation, GenerationCaps};
pub use probe::Partitions;
pub use sddr3::Ddr3Sequence;
pub use state::{ReclockState, StateMachine};
pub use train::{TrainingData, upload_patterns};

use crate::clock::{self, ClockFlags, ClockMode, ClockTransitionPlan, PlanInput, PllLimits};
use crate::common::constants::{clk, fb};
use crate::common::{CalcError, ReconfigError};
use crate::config::Config;
use crate::mr::{self, ModeRegisterSet, RamCfg, RamCfgDiff, RamData, RamTable};
use crate::script::exec::{self, ExecReport, ExecutionContext};
use crate::script::sink::SinkStats;
use crate::script::{MaskOpts, RegisterSink, Script};
use crate::soc::{ClockId, DisplayProbe, Hardware, RegisterSpace};
use crate::stats::ReclockStats;

/// Scale of the FB partition workaround delay: `FBPA_WAR_SCALE / khz` ns per access.
pub(crate) const FBPA_WAR_SCALE: u32 = 25_000_000;

/// Memory technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum RamType {
    /// DDR2 SDRAM.
    Ddr2,
    /// DDR3 SDRAM.
    Ddr3,
    /// GDDR3 SGRAM.
    Gddr3,
    /// GDDR5 SGRAM.
    Gddr5,
}

impl RamType {
    /// Runs the mode-register calculator for this technology with its default options.
    ///
    /// # Errors
    ///
    /// Returns the calculator's [`CalcError`].
    pub fn mode_registers(self, cfg: &RamCfg) -> Result<ModeRegisterSet, CalcError> {
        match self {
            Self::Ddr2 => mr::sddr2::calc(cfg),
            Self::Ddr3 => mr::sddr3::calc(cfg),
            Self::Gddr3 => mr::gddr3::calc(cfg),
            Self::Gddr5 => mr::gddr5::calc(cfg, mr::gddr5::Gddr5Options::default()),
        }
    }
}

impl fmt::Display for RamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ddr2 => "DDR2",
            Self::Ddr3 => "DDR3",
            Self::Gddr3 => "GDDR3",
            Self::Gddr5 => "GDDR5",
        })
    }
}

/// Static description of the memory subsystem of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamParams {
    /// Memory technology.
    pub ram_type: RamType,
    /// GPU generation.
    pub generation: Generation,
    /// Parsed rammap/ramcfg/timing entries.
    pub table: RamTable,
    /// Reference PLL limits (GDDR5 two-stage path).
    pub refpll: PllLimits,
    /// Memory PLL limits.
    pub mpll: PllLimits,
    /// Link-training tables, if the BIOS carried any.
    pub training: Option<TrainingData>,
}

impl RamParams {
    /// Creates parameters with the stock PLL limits and no training tables.
    pub const fn new(ram_type: RamType, generation: Generation, table: RamTable) -> Self {
        Self {
            ram_type,
            generation,
            table,
            refpll: PllLimits::REFPLL,
            mpll: PllLimits::MPLL,
            training: None,
        }
    }

    /// Attaches link-training tables.
    #[must_use]
    pub fn with_training(mut self, training: TrainingData) -> Self {
        self.training = Some(training);
        self
    }
}

/// Per-call recording state handed to a [`RamSequence`].
pub struct ReclockContext<'a> {
    /// Cached, recording register facade.
    pub sink: RegisterSink<'a>,
    /// The decided clock transition.
    pub plan: ClockTransitionPlan,
    /// Mode registers for the target.
    pub mr: ModeRegisterSet,
    /// Target frequency and table entry.
    pub next: RamData,
    /// Fields that differ between table entries.
    pub diff: RamCfgDiff,
    /// Present partitions.
    pub partitions: Partitions,
    /// Generation capabilities.
    pub caps: GenerationCaps,
    /// Memory technology.
    pub ram_type: RamType,
    /// Sequencer configuration.
    pub config: &'a Config,
    /// Display engine, if any.
    pub display: Option<&'a dyn DisplayProbe>,
}

impl fmt::Debug for ReclockContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclockContext")
            .field("sink", &self.sink)
            .field("plan", &self.plan)
            .field("next", &self.next.freq)
            .field("ram_type", &self.ram_type)
            .finish_non_exhaustive()
    }
}

impl ReclockContext<'_> {
    /// Mode the memory clock leaves.
    pub const fn from(&self) -> ClockMode {
        self.plan.from
    }

    /// Mode the memory clock enters.
    pub const fn to(&self) -> ClockMode {
        self.plan.to
    }

    /// Records the configured settle delay.
    pub fn settle(&mut self) {
        let ns = self.config.timeouts.settle_ns;
        self.sink.nsec(ns);
    }

    /// Writes mode register `index` to `addr`.
    ///
    /// Unchanged values are skipped unless `force` is set or skipping is configured off.
    pub fn write_mr(&mut self, addr: u32, index: usize, force: bool) {
        let mr = self.mr.get(index);
        let opts = MaskOpts {
            force: force || !self.config.sequencer.skip_unchanged_mode_registers,
            diff: false,
        };
        let _ = self.sink.mask_opts(addr, mr.mask, mr.data, opts);
    }

    /// Records the technology timing register.
    pub fn timing(&mut self) {
        let (mask, data) = if self.ram_type == RamType::Gddr5 {
            (0x0000_00ff, 0x0000_0011 * u32::from(self.to() == ClockMode::Div))
        } else {
            (0, 0)
        };
        self.sink.mask(fb::TIMING, mask, data);
    }

    /// Records the partition configuration hook on generations that have one.
    ///
    /// Only touched when the controlling bit differs between table entries.
    pub fn partition_hook(&mut self) {
        if !self.caps.partition_hook {
            return;
        }
        let (mask, data) = if self.diff.ramcfg_10_02_20 {
            (
                0x0400_0000,
                0x0400_0000 * u32::from(self.next.bios.ramcfg_10_02_20),
            )
        } else {
            (0, 0)
        };
        self.sink.mask(fb::PART_CFG, mask, data);
    }

    /// Resets the memory PLL if it is held in reset or not idle.
    pub(crate) fn reset_mpll(&mut self) {
        let ctl = self.sink.rd32(clk::MPLL_CTRL);
        let status = self.sink.rd32(clk::PLL_STATUS);
        if ctl & clk::MPLL_RESET == 0 && status & clk::STATUS_MPLL_IDLE != 0 {
            return;
        }
        debug!("resetting MPLL");
        self.sink.mask_force(clk::MPLL_CTRL, clk::MPLL_RESET, clk::MPLL_RESET);
        self.sink.mask(clk::MPLL_CTRL, clk::MPLL_RESET, 0);
        let timeout = self.config.timeouts.reset_ack_ns;
        self.sink
            .wait(clk::MPLL_CTRL, clk::MPLL_RESET_ACK, clk::MPLL_RESET_ACK, timeout);
    }
}

/// Technology-specific reclock sequence.
///
/// The orchestrator calls the hooks in phase order, recording the FB access window and the
/// common bookends itself.
pub trait RamSequence {
    /// Technology this sequence drives.
    fn ram_type(&self) -> RamType;

    /// Returns `true` if a sequence exists for `from -> to`.
    fn supports(&self, from: ClockMode, to: ClockMode) -> bool;

    /// Computes the mode registers for `cfg` under `plan`.
    ///
    /// # Errors
    ///
    /// Returns the calculator's [`CalcError`].
    fn mode_registers(
        &self,
        cfg: &RamCfg,
        plan: &ClockTransitionPlan,
    ) -> Result<ModeRegisterSet, CalcError>;

    /// PLL and divider setup recorded while the host still has FB access.
    fn prepare(&self, ctx: &mut ReclockContext<'_>);

    /// Source-clock switch, mode registers and timings, with FB access off.
    fn reprogram(&self, ctx: &mut ReclockContext<'_>);

    /// Lock, training and DLL settle waits, with FB access off.
    fn await_lock(&self, ctx: &mut ReclockContext<'_>);

    /// Work recorded after FB access is restored.
    fn post_enable(&self, _ctx: &mut ReclockContext<'_>) {}
}

/// Returns the reclock sequence for `ram_type`, if one exists.
pub fn sequence_for(ram_type: RamType) -> Option<&'static dyn RamSequence> {
    match ram_type {
        RamType::Gddr5 => Some(&Gddr5Sequence),
        RamType::Ddr3 => Some(&Ddr3Sequence),
        RamType::Ddr2 | RamType::Gddr3 => None,
    }
}

#[derive(Debug)]
struct Pending {
    script: Script,
    plan: ClockTransitionPlan,
    target: RamData,
}

/// Output of a successful build.
struct Built {
    pending: Pending,
    sink: SinkStats,
    hits: u64,
    misses: u64,
}

/// Memory reclocking orchestrator for one device.
///
/// Owns at most one pending reconfiguration. [`Ram::calc`] records it, [`Ram::prog`] executes
/// it and [`Ram::tidy`] discards it.
#[derive(Debug)]
pub struct Ram {
    config: Config,
    params: RamParams,
    partitions: Partitions,
    pending: Option<Pending>,
    last_state: ReclockState,
    stats: ReclockStats,
}

impl Ram {
    /// Creates an orchestrator for a device with a known partition topology.
    pub fn new(config: Config, params: RamParams, partitions: Partitions) -> Self {
        Self {
            config,
            params,
            partitions,
            pending: None,
            last_state: ReclockState::Idle,
            stats: ReclockStats::default(),
        }
    }

    /// Creates an orchestrator, probing the partition topology from the hardware.
    pub fn probe(config: Config, params: RamParams, regs: &mut dyn RegisterSpace) -> Self {
        let partitions = Partitions::probe(regs, params.generation);
        Self::new(config, params, partitions)
    }

    /// One-time initialisation: controller init bit and, on GDDR5, link-training patterns.
    ///
    /// Writes go straight to the hardware; this is not a reconfiguration.
    pub fn init(&self, regs: &mut dyn RegisterSpace) {
        let _ = regs.mask(fb::INIT_CTRL, 0x0000_0010, 0x0000_0010);
        if self.params.ram_type == RamType::Gddr5 {
            let _ = regs.mask(clk::MODE, 0x0000_0002, 0x0000_0000);
            let fallback = TrainingData::default();
            let training = self.params.training.as_ref().unwrap_or(&fallback);
            upload_patterns(regs, training);
        }
    }

    /// Plans a transition to `target_khz` and records its script.
    ///
    /// Reads the hardware through `hw` but writes nothing to it.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigError::Busy`] if a script is already pending. Any other error is a
    /// planning failure; the state ends in `Aborted` and nothing is pending.
    pub fn calc(
        &mut self,
        hw: &mut Hardware<'_>,
        target_khz: u32,
        flags: ClockFlags,
    ) -> Result<(), ReconfigError> {
        if self.pending.is_some() {
            return Err(ReconfigError::Busy);
        }
        self.stats.calcs += 1;

        let mut sm = StateMachine::new();
        match self.build(hw, target_khz, flags, &mut sm) {
            Ok(built) => {
                let plan = built.pending.plan;
                self.stats
                    .record_build(&plan, built.sink, built.hits, built.misses);
                info!(
                    ram_type = %self.params.ram_type,
                    from = ?plan.from,
                    to = ?plan.to,
                    target_khz,
                    achieved_khz = plan.achieved_khz,
                    words = built.pending.script.encoded_len(),
                    "reclock script ready"
                );
                self.pending = Some(built.pending);
                self.last_state = sm.state();
                Ok(())
            }
            Err(err) => {
                sm.abort();
                self.last_state = sm.state();
                self.stats.record_error(&err);
                warn!(target_khz, %err, "reclock calc aborted");
                Err(err)
            }
        }
    }

    fn build(
        &self,
        hw: &mut Hardware<'_>,
        target_khz: u32,
        flags: ClockFlags,
        sm: &mut StateMachine,
    ) -> Result<Built, ReconfigError> {
        let ram_type = self.params.ram_type;

        sm.advance(ReclockState::Planning)?;
        let next = self
            .params
            .table
            .lookup(target_khz)
            .ok_or(ReconfigError::NoConfiguration { khz: target_khz })?;
        let seq = sequence_for(ram_type).ok_or(ReconfigError::UnsupportedRamType(ram_type))?;
        let input = PlanInput {
            target_khz: next.freq,
            flags,
            ram_type,
            from: clock::current_mode(&mut *hw.regs),
            dsrc: hw.regs.rd32(clk::DIV_SRC),
            dctl: hw.regs.rd32(clk::DIV_CTRL),
            sppll0_khz: hw.clocks.read_khz(ClockId::Sppll0),
            sppll1_khz: hw.clocks.read_khz(ClockId::Sppll1),
            refpll: self.params.refpll,
            mpll: self.params.mpll,
        };
        let plan = clock::plan(&input)?;
        if !seq.supports(plan.from, plan.to) {
            return Err(ReconfigError::UnsupportedTransition {
                ram_type,
                from: plan.from,
                to: plan.to,
            });
        }
        let mr = seq.mode_registers(&next.bios, &plan)?;

        let mut sink = RegisterSink::new(&mut *hw.regs, self.config.sequencer.batch_capacity)
            .with_fbpa_workaround(
                self.config.sequencer.fbpa_workaround,
                self.partitions.fbps(),
            );
        if let Some(khz) = hw.clocks.read_khz(ClockId::Mem).filter(|&khz| khz != 0) {
            sink.fbpa_war_nsec(FBPA_WAR_SCALE / khz + 1);
        }
        let mut ctx = ReclockContext {
            sink,
            plan,
            mr,
            next,
            diff: self.params.table.diff(),
            partitions: self.partitions,
            caps: self.params.generation.caps(),
            ram_type,
            config: &self.config,
            display: hw.display,
        };

        sm.advance(ReclockState::Preparing)?;
        if plan.to != ClockMode::Div {
            ctx.reset_mpll();
        }
        seq.prepare(&mut ctx);

        sm.advance(ReclockState::Disabling)?;
        let r100b0c = access::fb_access(&mut ctx, false, fb::NOTIFY_BLOCKED as u8);

        sm.advance(ReclockState::Reprogramming)?;
        seq.reprogram(&mut ctx);
        ctx.partition_hook();

        sm.advance(ReclockState::AwaitingLock)?;
        seq.await_lock(&mut ctx);

        sm.advance(ReclockState::ReEnabling)?;
        let _ = access::fb_access(&mut ctx, true, r100b0c);
        seq.post_enable(&mut ctx);
        ctx.sink.mask(fb::CFG, 0x0000_0800, 0x0000_0800);

        sm.advance(ReclockState::Done)?;
        let ReclockContext { sink, next, .. } = ctx;
        let (script, sink, cache) = sink.finish();
        Ok(Built {
            pending: Pending {
                script,
                plan,
                target: next,
            },
            sink,
            hits: cache.hits(),
            misses: cache.misses(),
        })
    }

    /// Executes the pending script and applies the post-commit fixups.
    ///
    /// Returns `Ok(None)` without executing when script execution is configured off; the
    /// script is discarded either way.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigError::NothingPending`] without a pending script,
    /// [`ReconfigError::LockTimeout`] if a wait expired, or [`ReconfigError::Exec`].
    pub fn prog(
        &mut self,
        regs: &mut dyn RegisterSpace,
        exec: &mut dyn ExecutionContext,
    ) -> Result<Option<ExecReport>, ReconfigError> {
        let Some(pending) = self.pending.take() else {
            return Err(ReconfigError::NothingPending);
        };
        if !self.config.sequencer.exec_enabled {
            info!("script execution disabled");
            exec::tidy(pending.script);
            self.stats.record_discard();
            return Ok(None);
        }

        match exec::submit(exec, pending.script) {
            Ok(report) => {
                self.post_commit(regs, &pending.plan);
                self.stats.record_exec(&report);
                info!(
                    khz = pending.target.freq,
                    elapsed_ns = report.elapsed_ns,
                    "memory reclocked"
                );
                Ok(Some(report))
            }
            Err(err) => {
                self.stats.record_error(&err);
                warn!(khz = pending.target.freq, %err, "reclock execution failed");
                Err(err)
            }
        }
    }

    fn post_commit(&self, regs: &mut dyn RegisterSpace, plan: &ClockTransitionPlan) {
        let gddr5 = self.params.ram_type == RamType::Gddr5;
        if !gddr5 {
            let _ = regs.mask(clk::MPLL_MODE, 0, 0);
            let _ = regs.mask(fb::DLL_CTRL, 0, 0);
        }
        let _ = regs.mask(fb::DLL_CTRL, 0, 0);
        let _ = regs.mask(fb::PAD_CAL, 0, 0);

        if plan.to == ClockMode::Div {
            if !gddr5 {
                regs.wr32(clk::PART_ENABLE, 0);
                regs.wr32(clk::PART_TRIGGER, 0);
            }
            let _ = regs.mask(clk::MPLL_CTRL, clk::MPLL_ENABLE, 0);
        }
    }

    /// Discards the pending script without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigError::NothingPending`] without a pending script.
    pub fn tidy(&mut self) -> Result<(), ReconfigError> {
        let pending = self.pending.take().ok_or(ReconfigError::NothingPending)?;
        exec::tidy(pending.script);
        self.stats.record_discard();
        Ok(())
    }

    /// Plans, records and executes a transition in one call.
    ///
    /// Planning failures leave nothing pending.
    ///
    /// # Errors
    ///
    /// Any error of [`Ram::calc`] or [`Ram::prog`].
    pub fn reclock(
        &mut self,
        hw: &mut Hardware<'_>,
        exec: &mut dyn ExecutionContext,
        target_khz: u32,
        flags: ClockFlags,
    ) -> Result<Option<ExecReport>, ReconfigError> {
        self.calc(hw, target_khz, flags)?;
        self.prog(&mut *hw.regs, exec)
    }

    /// Returns the pending script, if any.
    pub fn pending_script(&self) -> Option<&Script> {
        self.pending.as_ref().map(|p| &p.script)
    }

    /// Returns the plan of the pending script, if any.
    pub fn pending_plan(&self) -> Option<&ClockTransitionPlan> {
        self.pending.as_ref().map(|p| &p.plan)
    }

    /// Returns the phase the last `calc` ended in.
    pub const fn last_state(&self) -> ReclockState {
        self.last_state
    }

    /// Returns the accumulated statistics.
    pub const fn stats(&self) -> &ReclockStats {
        &self.stats
    }

    /// Returns the partition topology.
    pub const fn partitions(&self) -> Partitions {
        self.partitions
    }

    /// Returns the device parameters.
    pub const fn params(&self) -> &RamParams {
        &self.params
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }
}
