//! # Orchestrator Tests
//!
//! Full `calc`/`prog` cycles on the test bench: transition coverage per memory
//! technology, planning failures, pending-script lifecycle and the generation
//! specific parts of the FB-off window.

use pretty_assertions::assert_eq;
use reclock_core::clock::{ClockFlags, ClockMode};
use reclock_core::common::ReconfigError;
use reclock_core::common::constants::{clk, disp, fb, topo};
use reclock_core::config::Config;
use reclock_core::mr::{RamCfg, RamTable};
use reclock_core::ram::{Generation, Partitions, Ram, RamParams, RamType, ReclockState, TrainingData};
use reclock_core::script::Method;
use reclock_core::sim::{RegisterFile, TraceEvent};
use reclock_core::soc::Hardware;
use rstest::rstest;

use crate::common::harness::*;
use crate::common::mocks::device::{display, head};

/// Registers that only PLL bring-up and reset touch.
const PLL_REGS: [u32; 6] = [
    clk::MPLL_CTRL,
    clk::MPLL_COEF,
    clk::REFPLL_SRC,
    clk::REFPLL_COEF,
    fb::REFPLL_CTRL,
    fb::REFPLL_COEF,
];

/// Registers polled for PLL lock or reset acknowledge.
const PLL_WAIT_REGS: [u32; 3] = [clk::PLL_STATUS, clk::MPLL_CTRL, clk::REFPLL_STATUS];

fn params(ram_type: RamType, generation: Generation, table: RamTable) -> RamParams {
    RamParams::new(ram_type, generation, table)
}

// ══════════════════════════════════════════════════════════
// Transitions
// ══════════════════════════════════════════════════════════

#[rstest]
fn test_div_to_div_emits_no_pll_operations(
    #[values(RamType::Ddr3, RamType::Gddr5)] ram_type: RamType,
) {
    // A pending MPLL reset must not be serviced on a divider-only change.
    let file = regs_in(ClockMode::Div, STATUS_LOCKED).with(clk::MPLL_CTRL, clk::MPLL_RESET);
    let mut bench = Bench::new(ram_type, file);
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();

    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Div, ClockMode::Div));
    assert_eq!(plan.achieved_khz, DIV_TARGET_KHZ);

    let script = bench.script();
    for addr in PLL_REGS {
        assert_eq!(writes_to(script, addr), Vec::<u32>::new(), "R[{addr:06x}]");
    }
    for [addr, ..] in waits(script) {
        assert!(!PLL_WAIT_REGS.contains(&addr), "wait on R[{addr:06x}]");
    }

    let report = bench.prog().unwrap().unwrap();
    assert_eq!(report.status, 0);
    assert!(bench.interp.trace().contains(&TraceEvent::Enter));
    assert!(bench.interp.trace().contains(&TraceEvent::Leave));
    assert!(!bench.interp.blocked());
}

#[test]
fn test_calc_only_reads_hardware() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV).unwrap();
    assert!(bench.regs.lock().writes().is_empty());
    assert!(bench.regs.lock().reads() > 0);
}

#[test]
fn test_ddr3_div_to_pll() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV).unwrap();

    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Div, ClockMode::Pll));
    let mpll = plan.pll.unwrap().mpll;

    let script = bench.script();
    assert_eq!(writes_to(script, clk::MPLL_COEF), vec![mpll.encode()]);
    assert!(
        waits(script)
            .iter()
            .any(|w| w[0] == clk::PLL_STATUS && w[1] == clk::STATUS_MPLL_LOCK)
    );

    let report = bench.prog().unwrap().unwrap();
    assert_eq!(report.words, bench.ram.stats().words_uploaded as usize);
    assert_eq!(bench.regs.lock().get(clk::MPLL_COEF), mpll.encode());
    assert!(!bench.interp.blocked());
}

#[test]
fn test_ddr3_pll_to_pll_routes_through_divider() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Pll, STATUS_LOCKED));
    bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV).unwrap();

    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Pll, ClockMode::Pll));

    let script = bench.script();
    let writes = script.writes();
    let div = writes.iter().position(|&(a, _)| a == clk::DIV_CTRL).unwrap();
    let coef = writes.iter().position(|&(a, _)| a == clk::MPLL_COEF).unwrap();
    assert!(div < coef, "divider must carry the clock before the MPLL is reprogrammed");

    let _ = bench.prog().unwrap();
}

#[test]
fn test_ddr3_pll_to_div() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Pll, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Pll, ClockMode::Div));
    assert_eq!(writes_to(bench.script(), clk::MPLL_COEF), Vec::<u32>::new());

    let _ = bench.prog().unwrap();
    // Post-commit fixups switch the idle MPLL off on the hardware.
    let regs = bench.regs.lock();
    assert_eq!(regs.get(clk::MPLL_CTRL) & clk::MPLL_ENABLE, 0);
    assert_eq!(regs.get(clk::PART_ENABLE), 0);
}

#[test]
fn test_gddr5_div_to_pll2() {
    let mut bench = Bench::new(RamType::Gddr5, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(1_000_000, ClockFlags::NO_DIV).unwrap();

    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Div, ClockMode::Pll2));
    let pll = plan.pll.unwrap();
    let refpll = pll.refpll.unwrap();

    let script = bench.script();
    assert_eq!(
        writes_to(script, clk::REFPLL_COEF),
        vec![clk::REFPLL_ENABLE | refpll.encode()]
    );
    assert_eq!(writes_to(script, clk::MPLL_COEF), vec![pll.mpll.encode()]);
    let lock_waits: Vec<u32> = waits(script)
        .iter()
        .filter(|w| w[0] == clk::PLL_STATUS)
        .map(|w| w[1])
        .collect();
    assert_eq!(
        lock_waits,
        vec![clk::STATUS_REFPLL_LOCK, clk::STATUS_MPLL_LOCK]
    );

    let report = bench.prog().unwrap().unwrap();
    assert_eq!(report.status, 0);
    assert!(bench.interp.trace().contains(&TraceEvent::Leave));
}

#[test]
fn test_gddr5_pll2_to_div() {
    let mut bench = Bench::new(RamType::Gddr5, regs_in(ClockMode::Pll2, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    let plan = *bench.ram.pending_plan().unwrap();
    assert_eq!((plan.from, plan.to), (ClockMode::Pll2, ClockMode::Div));
    assert!(!writes_to(bench.script(), clk::DIV_CTRL).is_empty());
    let _ = bench.prog().unwrap();
}

#[test]
fn test_mpll_reset_is_serviced_before_pll_bringup() {
    let file = regs_in(ClockMode::Div, STATUS_LOCKED).with(clk::MPLL_CTRL, clk::MPLL_RESET);
    let mut bench = Bench::new(RamType::Ddr3, file);
    bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV).unwrap();
    let first = waits(bench.script())[0];
    assert_eq!(
        first,
        [
            clk::MPLL_CTRL,
            clk::MPLL_RESET_ACK,
            clk::MPLL_RESET_ACK,
            Config::default().timeouts.reset_ack_ns,
        ]
    );
}

// ══════════════════════════════════════════════════════════
// Lock failures
// ══════════════════════════════════════════════════════════

#[test]
fn test_lock_never_set_times_out_with_host_blocked() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Pll, STATUS_NO_LOCK));
    bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV).unwrap();

    let err = bench.prog().unwrap_err();
    let ReconfigError::LockTimeout { elapsed_ns } = err else {
        panic!("expected a lock timeout, got {err:?}");
    };
    assert!(elapsed_ns >= Config::default().timeouts.mpll_lock_ns);
    assert!(!err.is_planning());

    let trace = bench.interp.trace();
    assert!(trace.contains(&TraceEvent::Enter));
    assert!(!trace.contains(&TraceEvent::Leave));
    assert!(trace.iter().any(|e| matches!(
        e,
        TraceEvent::WaitTimeout {
            addr: clk::PLL_STATUS,
            ..
        }
    )));
    assert!(bench.interp.blocked());

    assert_eq!(bench.ram.stats().lock_timeouts, 1);
    assert_eq!(bench.ram.stats().scripts_executed, 0);
    assert!(bench.ram.pending_script().is_none());
}

#[test]
fn test_refpll_lock_timeout_happens_before_window() {
    let mut bench = Bench::new(RamType::Gddr5, regs_in(ClockMode::Div, STATUS_NO_LOCK));
    bench.calc(1_000_000, ClockFlags::NO_DIV).unwrap();
    assert!(matches!(
        bench.prog(),
        Err(ReconfigError::LockTimeout { .. })
    ));
    assert!(!bench.interp.trace().contains(&TraceEvent::Enter));
    assert!(!bench.interp.blocked());
}

// ══════════════════════════════════════════════════════════
// Planning failures
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::gddr5_pll2_to_pll2(RamType::Gddr5, ClockMode::Pll2, ClockFlags::NO_DIV, ClockMode::Pll2)]
#[case::ddr3_from_pll2(RamType::Ddr3, ClockMode::Pll2, ClockFlags::NONE, ClockMode::Div)]
fn test_unsupported_transition(
    #[case] ram_type: RamType,
    #[case] from: ClockMode,
    #[case] flags: ClockFlags,
    #[case] to: ClockMode,
) {
    let mut bench = Bench::new(ram_type, regs_in(from, STATUS_LOCKED));
    let target = if flags.contains(ClockFlags::NO_DIV) {
        1_000_000
    } else {
        DIV_TARGET_KHZ
    };
    assert_eq!(
        bench.calc(target, flags),
        Err(ReconfigError::UnsupportedTransition { ram_type, from, to })
    );
    assert_eq!(bench.ram.last_state(), ReclockState::Aborted);
    assert!(bench.ram.pending_script().is_none());
    assert_eq!(bench.ram.stats().aborts, 1);
}

#[rstest]
#[case(RamType::Ddr2)]
#[case(RamType::Gddr3)]
fn test_ram_type_without_sequence(#[case] ram_type: RamType) {
    let p = params(ram_type, Generation::Gf100, table(RamType::Ddr3));
    let mut bench = Bench::with(Config::default(), p, regs_in(ClockMode::Div, STATUS_LOCKED));
    assert_eq!(
        bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE),
        Err(ReconfigError::UnsupportedRamType(ram_type))
    );
}

#[test]
fn test_target_outside_table() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    assert_eq!(
        bench.calc(50_000, ClockFlags::NONE),
        Err(ReconfigError::NoConfiguration { khz: 50_000 })
    );
}

#[test]
fn test_no_permitted_path() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    assert_eq!(
        bench.calc(DIV_TARGET_KHZ, ClockFlags::NO_DIV | ClockFlags::NO_PLL),
        Err(ReconfigError::Unreachable {
            target_khz: DIV_TARGET_KHZ
        })
    );
}

#[test]
fn test_untranslatable_timing_aborts_calc() {
    let entry = RamCfg {
        timing: timing_v20(6, 4, 8),
        ..ddr3_entry(100_000, 2_000_000)
    };
    let p = params(RamType::Ddr3, Generation::Gf100, RamTable::new(vec![entry]));
    let mut bench = Bench::with(Config::default(), p, regs_in(ClockMode::Div, STATUS_LOCKED));
    let err = bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap_err();
    assert_eq!(
        err,
        ReconfigError::InvalidTimingValue {
            field: "CL",
            value: 4
        }
    );
    assert!(err.is_planning());
    assert!(bench.ram.pending_script().is_none());
}

// ══════════════════════════════════════════════════════════
// Pending script lifecycle
// ══════════════════════════════════════════════════════════

#[test]
fn test_second_calc_is_busy() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    let before = bench.script().clone();
    assert_eq!(
        bench.calc(PLL_TARGET_KHZ, ClockFlags::NO_DIV),
        Err(ReconfigError::Busy)
    );
    assert_eq!(bench.script(), &before);
    assert_eq!(bench.ram.stats().calcs, 1);
    assert_eq!(bench.ram.stats().aborts, 0);
}

#[test]
fn test_prog_and_tidy_need_a_pending_script() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    assert_eq!(bench.prog(), Err(ReconfigError::NothingPending));
    assert_eq!(bench.ram.tidy(), Err(ReconfigError::NothingPending));
    assert_eq!(bench.interp.executions(), 0);
}

#[test]
fn test_tidy_discards_and_frees_the_slot() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert_eq!(bench.ram.last_state(), ReclockState::Done);
    bench.ram.tidy().unwrap();
    assert!(bench.ram.pending_script().is_none());
    assert_eq!(bench.ram.stats().scripts_discarded, 1);
    assert_eq!(bench.interp.executions(), 0);
    assert!(bench.regs.lock().writes().is_empty());

    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert!(bench.ram.pending_script().is_some());
}

#[test]
fn test_exec_disabled_discards_in_prog() {
    let mut config = Config::default();
    config.sequencer.exec_enabled = false;
    let p = params(RamType::Ddr3, Generation::Gf100, table(RamType::Ddr3));
    let mut bench = Bench::with(config, p, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert_eq!(bench.prog(), Ok(None));
    assert_eq!(bench.interp.executions(), 0);
    assert!(bench.ram.pending_script().is_none());
    assert_eq!(bench.ram.stats().scripts_discarded, 1);
}

#[test]
fn test_reclock_in_one_call() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    let Bench {
        regs,
        interp,
        clocks,
        ram,
    } = &mut bench;
    let mut hw = Hardware::new(regs, &*clocks);
    let report = ram
        .reclock(&mut hw, interp, DIV_TARGET_KHZ, ClockFlags::NONE)
        .unwrap()
        .unwrap();
    assert_eq!(report.status, 0);

    let stats = bench.ram.stats();
    assert_eq!(stats.scripts_built, 1);
    assert_eq!(stats.scripts_executed, 1);
    assert_eq!(stats.to_div, 1);
    assert_eq!(stats.last_achieved_khz, DIV_TARGET_KHZ);
    assert!(stats.writes > 0);
    assert!(stats.cache_misses > 0);
    assert_eq!(bench.interp.executions(), 1);
}

// ══════════════════════════════════════════════════════════
// Mode registers
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::skipped_when_unchanged(true, 0)]
#[case::forced_when_configured(false, 1)]
fn test_unchanged_mode_register_skip(#[case] skip: bool, #[case] mr2_writes: usize) {
    let mut config = Config::default();
    config.sequencer.skip_unchanged_mode_registers = skip;
    let p = params(RamType::Ddr3, Generation::Gf100, table(RamType::Ddr3));
    // MR2 already holds CWL 6.
    let file = regs_in(ClockMode::Div, STATUS_LOCKED).with(fb::MR2, 0x0000_0008);
    let mut bench = Bench::with(config, p, file);
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();

    let script = bench.script();
    assert_eq!(writes_to(script, fb::MR2).len(), mr2_writes);
    // MR0 is always written.
    assert!(writes_to(script, fb::MR0).contains(&0x0000_0830));
}

#[test]
fn test_changed_mode_register_is_written() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert_eq!(writes_to(bench.script(), fb::MR2), vec![0x0000_0008]);
}

// ══════════════════════════════════════════════════════════
// FB-off window
// ══════════════════════════════════════════════════════════

#[test]
fn test_notify_byte_swapped_and_restored() {
    let file = regs_in(ClockMode::Div, STATUS_LOCKED).with(fb::NOTIFY, 0x0000_5634);
    let mut bench = Bench::new(RamType::Ddr3, file);
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    let script = bench.script();
    assert_eq!(
        writes_to(script, fb::NOTIFY),
        vec![0x0000_5600 | fb::NOTIFY_BLOCKED, 0x0000_5634]
    );
    let methods: Vec<Method> = script.batches().iter().map(|b| b.method).collect();
    let enter = methods.iter().position(|&m| m == Method::Enter).unwrap();
    let leave = methods.iter().position(|&m| m == Method::Leave).unwrap();
    assert!(enter < leave);
}

#[rstest]
#[case::heuristic(Generation::Gf100, 1)]
#[case::no_heuristic(Generation::Gf119, 0)]
fn test_vblank_wait_per_generation(#[case] generation: Generation, #[case] vblanks: usize) {
    let probe = display(vec![head(0, 1024, 768), head(1, 1920, 1080)]);
    let p = params(RamType::Ddr3, generation, table(RamType::Ddr3));
    let mut bench = Bench::with(Config::default(), p, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench
        .calc_with_display(&probe, DIV_TARGET_KHZ, ClockFlags::NONE)
        .unwrap();

    let script = bench.script();
    assert_eq!(script.count(Method::Vblank), vblanks);
    if vblanks > 0 {
        let vblank = script
            .batches()
            .iter()
            .find(|b| b.method == Method::Vblank)
            .unwrap();
        assert_eq!(vblank.words, vec![1]);
    }
    assert_eq!(
        writes_to(script, disp::HEAD_NOTIFY),
        vec![disp::HEAD_BLOCKED * 3, disp::HEAD_RESTORED * 3]
    );
}

#[test]
fn test_no_display_no_head_notify() {
    let mut bench = Bench::new(RamType::Ddr3, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert_eq!(bench.script().count(Method::Vblank), 0);
    assert!(writes_to(bench.script(), disp::HEAD_NOTIFY).is_empty());
}

#[rstest]
#[case::gf104_differing(Generation::Gf104, false, vec![0x0400_0000])]
#[case::gf104_uniform(Generation::Gf104, true, vec![])]
#[case::gf100(Generation::Gf100, false, vec![])]
fn test_partition_hook(
    #[case] generation: Generation,
    #[case] uniform: bool,
    #[case] expected: Vec<u32>,
) {
    let low = RamCfg {
        ramcfg_10_02_20: true,
        ..ddr3_entry(100_000, 600_000)
    };
    let high = RamCfg {
        ramcfg_10_02_20: uniform,
        ..ddr3_entry(600_001, 2_000_000)
    };
    let p = params(RamType::Ddr3, generation, RamTable::new(vec![low, high]));
    let mut bench = Bench::with(Config::default(), p, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    assert_eq!(writes_to(bench.script(), fb::PART_CFG), expected);
}

#[test]
fn test_training_waits_on_present_partitions_only() {
    let file = regs_in(ClockMode::Div, STATUS_LOCKED)
        .with(topo::FBP_COUNT, 4)
        .with(topo::FBP_DISABLE, 0b0100);
    let mut bench = Bench::new(RamType::Gddr5, file);
    assert_eq!(bench.ram.partitions().fbpas(), 3);
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();

    let polled: Vec<u32> = waits(bench.script())
        .iter()
        .map(|w| w[0])
        .filter(|&a| (fb::TRAIN_STATUS..fb::TRAIN_STATUS + 4 * fb::PART_STRIDE).contains(&a))
        .collect();
    let unit = |i: u32| fb::TRAIN_STATUS + i * fb::PART_STRIDE;
    assert_eq!(polled, vec![unit(0), unit(1), unit(3), unit(0), unit(1), unit(3)]);

    let _ = bench.prog().unwrap();
}

#[rstest]
#[case::enabled(true, false)]
#[case::disabled(false, true)]
fn test_fbpa_workaround_toggle(#[case] enabled: bool, #[case] empty: bool) {
    let mut config = Config::default();
    config.sequencer.fbpa_workaround = enabled;
    let p = params(RamType::Ddr3, Generation::Gf100, table(RamType::Ddr3));
    let mut bench = Bench::with(config, p, regs_in(ClockMode::Div, STATUS_LOCKED));
    bench.calc(DIV_TARGET_KHZ, ClockFlags::NONE).unwrap();
    let war = fb::WAR_BASE + fb::WAR_STRIDE;
    assert_eq!(writes_to(bench.script(), war).is_empty(), empty);
}

// ══════════════════════════════════════════════════════════
// Init
// ══════════════════════════════════════════════════════════

fn ram(ram_type: RamType, training: Option<TrainingData>) -> Ram {
    let mut p = params(ram_type, Generation::Gf100, table(ram_type));
    p.training = training;
    Ram::new(Config::default(), p, partitions(2))
}

#[test]
fn test_gddr5_init_uploads_default_patterns() {
    let mut regs = RegisterFile::new().with(clk::MODE, 0x0000_0003);
    ram(RamType::Gddr5, None).init(&mut regs);
    assert_eq!(regs.get(fb::INIT_CTRL) & 0x10, 0x10);
    assert_eq!(regs.get(clk::MODE), 0x0000_0001);
    assert_eq!(regs.writes_to(fb::TRAIN_INDEX).len(), 0x30);
    assert_eq!(regs.writes_to(fb::TRAIN_INDEX + 4).len(), 0x30);
    assert_eq!(regs.writes_to(fb::TRAIN_DATA)[..2].to_vec(), vec![0, 0]);
    assert!(regs.writes_to(fb::TRAIN_TYPE04).is_empty());
}

#[test]
fn test_gddr5_init_uses_vendor_tables() {
    let training = TrainingData {
        mask: 0x03c3 | 0x0010,
        type00: vec![0xdead_beef; 0x30],
        type01: vec![0x0bad_f00d; 0x30],
        type04: vec![7; 0x100],
        ..TrainingData::default()
    };
    let mut regs = RegisterFile::new();
    ram(RamType::Gddr5, Some(training)).init(&mut regs);
    assert_eq!(
        regs.writes_to(fb::TRAIN_DATA)[..2].to_vec(),
        vec![0xdead_beef, 0x0bad_f00d]
    );
    assert_eq!(regs.writes_to(fb::TRAIN_TYPE04).len(), 0x100);
    assert_eq!(regs.writes_to(fb::TRAIN_TYPE04 + 4).len(), 0x100);
}

#[test]
fn test_ddr3_init_sets_only_controller_bit() {
    let mut regs = RegisterFile::new();
    ram(RamType::Ddr3, None).init(&mut regs);
    assert_eq!(regs.writes(), &[(fb::INIT_CTRL, 0x10)]);
}

#[test]
fn test_probe_reads_topology() {
    let mut regs = RegisterFile::new()
        .with(topo::FBP_COUNT, 4)
        .with(topo::FBP_DISABLE, 0b1000);
    let p = params(RamType::Ddr3, Generation::Gf100, table(RamType::Ddr3));
    let ram = Ram::probe(Config::default(), p, &mut regs);
    assert_eq!(ram.partitions(), Partitions::new(4, 0b1000, 4, 0b1000));
    assert!(regs.writes().is_empty());
}
