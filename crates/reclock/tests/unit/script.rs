//! # Script Recording Tests
//!
//! Tests for the register cache, the batch builder flush rules, the write-coalescing
//! sink and the MEMX wire encoding.

use pretty_assertions::assert_eq;
use reclock_core::common::ExecError;
use reclock_core::common::constants::{clk, fb};
use reclock_core::script::*;
use reclock_core::sim::RegisterFile;
use rstest::rstest;

use crate::common::mocks::device::{display, head};

fn batch(method: Method, words: &[u32]) -> Batch {
    Batch {
        method,
        words: words.to_vec(),
    }
}

// ══════════════════════════════════════════════════════════
// Register cache
// ══════════════════════════════════════════════════════════

#[test]
fn test_cache_counts_hits_and_misses() {
    let mut cache = RegisterCache::new();
    assert_eq!(cache.lookup(0x100), None);
    cache.store(0x100, 7);
    assert_eq!(cache.lookup(0x100), Some(7));
    assert_eq!(cache.lookup(0x100), Some(7));
    assert_eq!((cache.hits(), cache.misses()), (2, 1));
}

#[test]
fn test_cache_invalidate_keeps_counters() {
    let mut cache = RegisterCache::new();
    cache.store(0x100, 7);
    let _ = cache.lookup(0x100);
    cache.invalidate();
    assert!(cache.is_empty());
    assert_eq!(cache.peek(0x100), None);
    assert_eq!(cache.hits(), 1);
}

// ══════════════════════════════════════════════════════════
// Batch builder
// ══════════════════════════════════════════════════════════

#[test]
fn test_builder_coalesces_same_method() {
    let mut b = ScriptBuilder::new(64);
    b.emit(Method::Wr32, &[1, 2]);
    b.emit(Method::Wr32, &[3, 4]);
    assert_eq!(b.pending(), Some(Method::Wr32));
    assert_eq!(b.pending_words(), 4);
    assert_eq!(b.closed(), 0);
    let script = b.finish();
    assert_eq!(script.batches(), &[batch(Method::Wr32, &[1, 2, 3, 4])]);
}

#[test]
fn test_builder_flushes_on_method_change() {
    let mut b = ScriptBuilder::new(64);
    b.emit(Method::Wr32, &[1, 2]);
    b.emit(Method::Delay, &[1000]);
    b.emit(Method::Wr32, &[3, 4]);
    let script = b.finish();
    assert_eq!(
        script.batches(),
        &[
            batch(Method::Wr32, &[1, 2]),
            batch(Method::Delay, &[1000]),
            batch(Method::Wr32, &[3, 4]),
        ]
    );
}

#[test]
fn test_builder_flushes_before_reaching_capacity() {
    let mut b = ScriptBuilder::new(5);
    b.emit(Method::Wr32, &[1, 2]);
    b.emit(Method::Wr32, &[3, 4]);
    // 4 + 2 >= 5 closes the batch first.
    b.emit(Method::Wr32, &[5, 6]);
    assert_eq!(b.closed(), 1);
    let script = b.finish();
    assert_eq!(
        script.batches(),
        &[
            batch(Method::Wr32, &[1, 2, 3, 4]),
            batch(Method::Wr32, &[5, 6]),
        ]
    );
}

#[test]
fn test_builder_exact_capacity_is_already_full() {
    let mut b = ScriptBuilder::new(4);
    b.emit(Method::Wr32, &[1, 2]);
    b.emit(Method::Wr32, &[3, 4]);
    assert_eq!(b.finish().batches().len(), 2);
}

#[test]
fn test_empty_builder_finishes_empty() {
    let script = ScriptBuilder::new(64).finish();
    assert!(script.is_empty());
    assert_eq!(script.encoded_len(), 0);
}

// ══════════════════════════════════════════════════════════
// Sink: masked writes
// ══════════════════════════════════════════════════════════

#[test]
fn test_masked_write_outside_mask_is_flagged() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.mask(fb::CFG, 0x0000_000f, 0x0000_001f);
    assert_eq!(sink.stats().mask_violations, 1);
    assert!(
        !RegisterOperation::MaskedWrite {
            addr: fb::CFG,
            mask: 0x0f,
            value: 0x1f,
            force: false,
        }
        .validate()
    );
}

#[test]
fn test_forced_write_outside_mask_is_valid_operation() {
    let op = RegisterOperation::MaskedWrite {
        addr: fb::CFG,
        mask: 0,
        value: 0x10,
        force: true,
    };
    assert!(op.validate());
}

#[test]
fn test_unchanged_masked_write_is_skipped() {
    let mut regs = RegisterFile::new().with(fb::CFG, 0x0000_0800);
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.mask(fb::CFG, 0x0000_0800, 0x0000_0800);
    assert_eq!(sink.stats().writes, 0);
    assert_eq!(sink.stats().skipped, 1);
    let (script, _, _) = sink.finish();
    assert!(script.is_empty());
}

#[test]
fn test_repeated_masked_write_uses_cached_result() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.mask(fb::CFG, 0x0000_0800, 0x0000_0800);
    sink.mask(fb::CFG, 0x0000_0800, 0x0000_0800);
    sink.mask(fb::CFG, 0x0000_0800, 0x0000_0800);
    let stats = sink.stats();
    assert_eq!((stats.writes, stats.skipped), (1, 2));
    let (script, _, cache) = sink.finish();
    assert_eq!(script.writes(), vec![(fb::CFG, 0x0000_0800)]);
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 2);
}

#[test]
fn test_forced_write_is_always_emitted() {
    let mut regs = RegisterFile::new().with(fb::SYNC, 0x1234);
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.mask_force(fb::SYNC, 0, 0);
    sink.mask_force(fb::SYNC, 0, 0);
    let (script, stats, _) = sink.finish();
    assert_eq!(script.writes(), vec![(fb::SYNC, 0x1234), (fb::SYNC, 0x1234)]);
    assert_eq!(stats.skipped, 0);
}

#[test]
fn test_sink_never_writes_the_hardware() {
    let mut regs = RegisterFile::new().with(clk::MPLL_CTRL, 0x0000_0100);
    {
        let mut sink = RegisterSink::new(&mut regs, 64);
        sink.wr32(clk::MPLL_COEF, 0x0001_1e01);
        sink.mask(clk::MPLL_CTRL, 0x0000_0001, 0x0000_0001);
        assert_eq!(sink.rd32(clk::MPLL_CTRL), 0x0000_0101);
        assert_eq!(sink.rd32(clk::MPLL_COEF), 0x0001_1e01);
    }
    assert!(regs.writes().is_empty());
    assert_eq!(regs.get(clk::MPLL_CTRL), 0x0000_0100);
    assert_eq!(regs.reads(), 1);
}

#[rstest]
#[case::previous(MaskOpts::default(), 0x0000_00f0)]
#[case::diff(MaskOpts::DIFF, 0x0000_00a0)]
#[case::forced(MaskOpts::FORCE, 0x0000_00f0)]
fn test_mask_opts_return_value(#[case] opts: MaskOpts, #[case] expected: u32) {
    let mut regs = RegisterFile::new().with(fb::NOTIFY, 0x0000_00f0);
    let mut sink = RegisterSink::new(&mut regs, 64);
    let ret = sink.mask_opts(fb::NOTIFY, 0x0000_00ff, 0x0000_0050, opts);
    assert_eq!(ret, expected);
    assert_eq!(sink.rd32(fb::NOTIFY), 0x0000_0050);
}

#[test]
fn test_apply_dispatches_operations() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.apply(RegisterOperation::Write {
        addr: 0x100,
        value: 1,
    });
    sink.apply(RegisterOperation::MaskedWrite {
        addr: 0x100,
        mask: 1,
        value: 1,
        force: false,
    });
    sink.apply(RegisterOperation::WaitUntil {
        addr: 0x104,
        mask: 2,
        value: 2,
        timeout_ns: 500,
    });
    sink.apply(RegisterOperation::Delay { ns: 40 });
    let (script, stats, _) = sink.finish();
    assert_eq!(
        script.batches(),
        &[
            batch(Method::Wr32, &[0x100, 1]),
            batch(Method::Wait, &[0x104, 2, 2, 500]),
            batch(Method::Delay, &[40]),
        ]
    );
    assert_eq!(stats.skipped, 1);
}

// ══════════════════════════════════════════════════════════
// Sink: control methods
// ══════════════════════════════════════════════════════════

#[test]
fn test_waits_close_their_batch() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.wait(clk::PLL_STATUS, 2, 2, 64_000);
    sink.wait(clk::PLL_STATUS, 2, 2, 64_000);
    let (script, stats, _) = sink.finish();
    assert_eq!(script.count(Method::Wait), 2);
    assert_eq!(stats.waits, 2);
}

#[test]
fn test_block_and_unblock_bracket_writes() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    sink.block();
    sink.wr32(fb::CMD, 0x0000_0060);
    sink.train();
    sink.unblock();
    let (script, _, _) = sink.finish();
    let methods: Vec<Method> = script.batches().iter().map(|b| b.method).collect();
    assert_eq!(
        methods,
        vec![Method::Enter, Method::Wr32, Method::Train, Method::Leave]
    );
}

#[test]
fn test_vblank_picks_largest_active_head() {
    let mut heads = vec![head(0, 1024, 768), head(1, 1920, 1080), head(2, 3840, 2160)];
    heads[2].active = false;
    let probe = display(heads);
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    assert_eq!(sink.wait_vblank(&probe), Some(1));
    let (script, _, _) = sink.finish();
    assert_eq!(script.batches(), &[batch(Method::Vblank, &[1])]);
}

#[test]
fn test_vblank_without_active_head_records_nothing() {
    let mut idle = head(0, 1920, 1080);
    idle.active = false;
    let probe = display(vec![idle]);
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64);
    assert_eq!(sink.wait_vblank(&probe), None);
    assert!(sink.finish().0.is_empty());
}

// ══════════════════════════════════════════════════════════
// Sink: FB partition workaround
// ══════════════════════════════════════════════════════════

#[test]
fn test_fbpa_workaround_pays_for_counted_accesses() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64).with_fbpa_workaround(true, 2);
    sink.fbpa_war_nsec(100);
    sink.wr32(0x10f700, 1);
    sink.wr32(0x10fb10, 2);
    // Inside the window but outside the counted ranges.
    sink.wr32(fb::CMD, 3);
    sink.wr32(clk::DIV_CTRL, 4);
    let (script, stats, _) = sink.finish();
    let war = fb::WAR_BASE + fb::WAR_STRIDE;
    assert_eq!(
        script.batches(),
        &[
            batch(Method::Wr32, &[0x10f700, 1, 0x10fb10, 2, fb::CMD, 3, war, 0]),
            batch(Method::Delay, &[200]),
            batch(Method::Wr32, &[clk::DIV_CTRL, 4]),
        ]
    );
    assert_eq!(stats.delays, 1);
}

#[test]
fn test_fbpa_workaround_idle_without_counted_accesses() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64).with_fbpa_workaround(true, 2);
    sink.fbpa_war_nsec(100);
    sink.wr32(fb::CMD, 3);
    sink.wr32(clk::DIV_CTRL, 4);
    let (script, _, _) = sink.finish();
    assert_eq!(script.count(Method::Delay), 0);
}

#[test]
fn test_fbpa_workaround_can_be_disabled() {
    let mut regs = RegisterFile::new();
    let mut sink = RegisterSink::new(&mut regs, 64).with_fbpa_workaround(false, 2);
    sink.fbpa_war_nsec(100);
    sink.wr32(0x10f700, 1);
    sink.wr32(clk::DIV_CTRL, 4);
    let (script, _, _) = sink.finish();
    assert_eq!(script.writes(), vec![(0x10f700, 1), (clk::DIV_CTRL, 4)]);
    assert_eq!(script.count(Method::Delay), 0);
}

// ══════════════════════════════════════════════════════════
// Wire encoding
// ══════════════════════════════════════════════════════════

#[test]
fn test_encoding_layout() {
    let script = Script::from_batches(vec![
        batch(Method::Enter, &[]),
        batch(Method::Wr32, &[0x10f090, 0x60, 0x10f210, 0]),
        batch(Method::Wait, &[0x137390, 2, 2, 64_000]),
    ]);
    assert_eq!(
        script.encode(),
        vec![
            0x0000_0001,
            0x0004_0003,
            0x10f090,
            0x60,
            0x10f210,
            0,
            0x0004_0004,
            0x137390,
            2,
            2,
            64_000,
        ]
    );
    assert_eq!(script.encoded_len(), 11);
    assert_eq!(Script::decode(&script.encode()), Ok(script));
}

#[rstest]
#[case::unknown_method(vec![0x0000_0009], 0)]
#[case::zero_method(vec![0x0000_0000], 0)]
#[case::truncated(vec![0x0003_0003, 1], 0)]
#[case::truncated_after_valid(vec![0x0000_0001, 0x0002_0003, 0x100], 1)]
fn test_decode_rejects_malformed(#[case] words: Vec<u32>, #[case] offset: usize) {
    assert_eq!(
        Script::decode(&words),
        Err(ExecError::MalformedScript { offset })
    );
}

#[test]
fn test_display_lists_operations() {
    let script = Script::from_batches(vec![
        batch(Method::Enter, &[]),
        batch(Method::Wr32, &[0x10f090, 0x60]),
        batch(Method::Delay, &[1000]),
        batch(Method::Leave, &[]),
    ]);
    assert_eq!(
        script.to_string(),
        "HOST BLOCKED\nR[10f090] = 00000060\nDELAY = 1000 ns\nHOST UNBLOCKED\n"
    );
}
