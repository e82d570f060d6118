//! # Statistics Tests
//!
//! Counter bookkeeping per outcome and the sectioned text report.

use pretty_assertions::assert_eq;
use reclock_core::clock::{ClockMode, ClockTransitionPlan, DividerRegs};
use reclock_core::common::{ExecError, ReconfigError};
use reclock_core::script::ExecReport;
use reclock_core::script::sink::SinkStats;
use reclock_core::stats::{ReclockStats, STATS_SECTIONS};
use rstest::rstest;

fn plan(to: ClockMode, achieved_khz: u32) -> ClockTransitionPlan {
    ClockTransitionPlan {
        from: ClockMode::Div,
        to,
        divider: DividerRegs::default(),
        divisor: None,
        pll: None,
        achieved_khz,
    }
}

fn sink() -> SinkStats {
    SinkStats {
        writes: 30,
        skipped: 10,
        mask_violations: 1,
        waits: 4,
        delays: 6,
    }
}

#[test]
fn test_build_accumulates_content() {
    let mut stats = ReclockStats::default();
    stats.record_build(&plan(ClockMode::Div, 405_000), sink(), 3, 1);
    stats.record_build(&plan(ClockMode::Pll2, 1_000_000), sink(), 5, 3);

    assert_eq!(stats.scripts_built, 2);
    assert_eq!((stats.to_div, stats.to_pll, stats.to_pll2), (1, 0, 1));
    assert_eq!(stats.last_achieved_khz, 1_000_000);
    assert_eq!(stats.writes, 60);
    assert_eq!(stats.skipped_writes, 20);
    assert_eq!(stats.mask_violations, 2);
    assert_eq!(stats.waits, 8);
    assert_eq!(stats.delays, 12);
    assert_eq!((stats.cache_hits, stats.cache_misses), (8, 4));
}

#[test]
fn test_exec_accumulates_time_and_words() {
    let mut stats = ReclockStats::default();
    let report = ExecReport {
        elapsed_ns: 1_500,
        status: 0,
        words: 120,
    };
    stats.record_exec(&report);
    stats.record_exec(&report);
    assert_eq!(stats.scripts_executed, 2);
    assert_eq!(stats.words_uploaded, 240);
    assert_eq!(stats.exec_ns, 3_000);
}

#[rstest]
#[case::timeout(ReconfigError::LockTimeout { elapsed_ns: 64_000 }, (1, 0, 0), 64_000)]
#[case::exec(ReconfigError::Exec(ExecError::Rejected { status: 2 }), (0, 1, 0), 0)]
#[case::planning(ReconfigError::NoConfiguration { khz: 1 }, (0, 0, 1), 0)]
#[case::busy(ReconfigError::Busy, (0, 0, 0), 0)]
#[case::nothing_pending(ReconfigError::NothingPending, (0, 0, 0), 0)]
fn test_error_classification(
    #[case] err: ReconfigError,
    #[case] counts: (u64, u64, u64),
    #[case] exec_ns: u64,
) {
    let mut stats = ReclockStats::default();
    stats.record_error(&err);
    assert_eq!(
        (stats.lock_timeouts, stats.exec_failures, stats.aborts),
        counts
    );
    assert_eq!(stats.exec_ns, exec_ns);
}

#[test]
fn test_discard_counted() {
    let mut stats = ReclockStats::default();
    stats.record_discard();
    assert_eq!(stats.scripts_discarded, 1);
    assert_eq!(stats.scripts_executed, 0);
}

#[test]
fn test_render_selected_sections() {
    let mut stats = ReclockStats {
        calcs: 3,
        ..ReclockStats::default()
    };
    stats.record_build(&plan(ClockMode::Pll, 810_000), sink(), 3, 1);

    let out = stats.render_sections(&["transitions"]);
    assert!(out.contains("TRANSITIONS"));
    assert!(out.contains("last_achieved          810000 kHz"));
    assert!(!out.contains("reclock.calcs"));
    assert!(!out.contains("SCRIPT CONTENT"));
    assert!(!out.contains("REGISTER CACHE"));

    let out = stats.render_sections(&["script", "cache"]);
    assert!(out.contains("op.skipped             10 (25.00%)"));
    assert!(out.contains("hit_rate: 75.00%"));
    assert!(!out.contains("TRANSITIONS"));
}

#[test]
fn test_display_renders_every_section() {
    let stats = ReclockStats {
        calcs: 7,
        ..ReclockStats::default()
    };
    let out = stats.to_string();
    assert_eq!(out, stats.render_sections(&[]));
    assert_eq!(out, stats.render_sections(STATS_SECTIONS));
    assert!(out.contains("reclock.calcs            7"));
    for header in ["MEMORY RECLOCK STATISTICS", "TRANSITIONS", "SCRIPT CONTENT", "REGISTER CACHE"] {
        assert!(out.contains(header), "missing {header}");
    }
    // Empty counters do not divide by zero.
    assert!(out.contains("(0.00%)"));
}
