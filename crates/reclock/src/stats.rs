//! Reconfiguration statistics collection and reporting.
//!
//! This module tracks what the sequencer did across the lifetime of a [`Ram`](crate::ram::Ram).
//! It provides:
//! 1. **Outcomes:** Calculations, submitted and discarded scripts, aborts and timeouts.
//! 2. **Transitions:** Counts per target clock mode and the last achieved frequency.
//! 3. **Script Content:** Writes, coalesced writes, waits, delays and mask-contract violations.
//! 4. **Register Cache:** Hit/miss counts of the per-script cache.
//! 5. **Execution:** Words uploaded and execution time reported by the MEMX process.

use std::fmt::{self, Write as _};

use crate::clock::{ClockMode, ClockTransitionPlan};
use crate::common::ReconfigError;
use crate::script::ExecReport;
use crate::script::sink::SinkStats;

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"transitions"`, `"script"`, `"cache"`.
/// Pass an empty slice to [`ReclockStats::render_sections`] to render all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "transitions", "script", "cache"];

/// Counters accumulated over every reconfiguration of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclockStats {
    /// `calc` calls that got past the busy check.
    pub calcs: u64,
    /// Scripts built and held pending.
    pub scripts_built: u64,
    /// Scripts executed successfully.
    pub scripts_executed: u64,
    /// Scripts discarded by `tidy`, or by `prog` with execution disabled.
    pub scripts_discarded: u64,
    /// Calculations that aborted before a script was built.
    pub aborts: u64,
    /// Executions that ended on an expired wait.
    pub lock_timeouts: u64,
    /// Executions that failed for any other reason.
    pub exec_failures: u64,

    /// Transitions planned onto the divider.
    pub to_div: u64,
    /// Transitions planned onto the memory PLL.
    pub to_pll: u64,
    /// Transitions planned onto the reference PLL chain.
    pub to_pll2: u64,
    /// Frequency achieved by the last planned transition, in kHz.
    pub last_achieved_khz: u32,

    /// Register writes recorded.
    pub writes: u64,
    /// Masked writes dropped as redundant.
    pub skipped_writes: u64,
    /// Masked writes whose data strayed outside the mask.
    pub mask_violations: u64,
    /// Waits recorded.
    pub waits: u64,
    /// Delays recorded.
    pub delays: u64,

    /// Register cache hits.
    pub cache_hits: u64,
    /// Register cache misses.
    pub cache_misses: u64,

    /// Encoded words uploaded to the execution context.
    pub words_uploaded: u64,
    /// Total execution time reported by the execution context, in nanoseconds.
    pub exec_ns: u64,
}

impl ReclockStats {
    /// Records a planned transition and the content of the script built for it.
    pub fn record_build(&mut self, plan: &ClockTransitionPlan, sink: SinkStats, hits: u64, misses: u64) {
        self.scripts_built += 1;
        match plan.to {
            ClockMode::Div => self.to_div += 1,
            ClockMode::Pll => self.to_pll += 1,
            ClockMode::Pll2 => self.to_pll2 += 1,
            ClockMode::Invalid => {}
        }
        self.last_achieved_khz = plan.achieved_khz;
        self.writes += sink.writes;
        self.skipped_writes += sink.skipped;
        self.mask_violations += sink.mask_violations;
        self.waits += sink.waits;
        self.delays += sink.delays;
        self.cache_hits += hits;
        self.cache_misses += misses;
    }

    /// Records a successful execution.
    pub fn record_exec(&mut self, report: &ExecReport) {
        self.scripts_executed += 1;
        self.words_uploaded += report.words as u64;
        self.exec_ns += u64::from(report.elapsed_ns);
    }

    /// Records a failed calculation or execution.
    pub fn record_error(&mut self, err: &ReconfigError) {
        match err {
            ReconfigError::LockTimeout { elapsed_ns } => {
                self.lock_timeouts += 1;
                self.exec_ns += u64::from(*elapsed_ns);
            }
            ReconfigError::Exec(_) => self.exec_failures += 1,
            ReconfigError::Busy | ReconfigError::NothingPending => {}
            _ => self.aborts += 1,
        }
    }

    /// Records a script thrown away without executing.
    pub fn record_discard(&mut self) {
        self.scripts_discarded += 1;
    }

    /// Renders only the requested sections.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an empty slice to
    /// render every section.
    pub fn render_sections(&self, sections: &[&str]) -> String {
        let want = |s: &str| sections.is_empty() || sections.contains(&s);
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sections(&mut out, &want);
        out
    }

    fn write_sections(&self, out: &mut String, want: &dyn Fn(&str) -> bool) -> fmt::Result {
        writeln!(out, "==========================================================")?;
        writeln!(out, "MEMORY RECLOCK STATISTICS")?;
        writeln!(out, "==========================================================")?;
        if want("summary") {
            writeln!(out, "reclock.calcs            {}", self.calcs)?;
            writeln!(out, "reclock.built            {}", self.scripts_built)?;
            writeln!(out, "reclock.executed         {}", self.scripts_executed)?;
            writeln!(out, "reclock.discarded        {}", self.scripts_discarded)?;
            writeln!(out, "reclock.aborts           {}", self.aborts)?;
            writeln!(out, "reclock.lock_timeouts    {}", self.lock_timeouts)?;
            writeln!(out, "reclock.exec_failures    {}", self.exec_failures)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("transitions") {
            writeln!(out, "TRANSITIONS")?;
            writeln!(out, "  to.div                 {}", self.to_div)?;
            writeln!(out, "  to.pll                 {}", self.to_pll)?;
            writeln!(out, "  to.pll2                {}", self.to_pll2)?;
            writeln!(out, "  last_achieved          {} kHz", self.last_achieved_khz)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("script") {
            let masked = self.writes + self.skipped_writes;
            let coalesced = if masked > 0 {
                (self.skipped_writes as f64 / masked as f64) * 100.0
            } else {
                0.0
            };
            writeln!(out, "SCRIPT CONTENT")?;
            writeln!(out, "  op.wr32                {}", self.writes)?;
            writeln!(out, "  op.skipped             {} ({coalesced:.2}%)", self.skipped_writes)?;
            writeln!(out, "  op.wait                {}", self.waits)?;
            writeln!(out, "  op.delay               {}", self.delays)?;
            writeln!(out, "  mask.violations        {}", self.mask_violations)?;
            writeln!(out, "  exec.words             {}", self.words_uploaded)?;
            writeln!(out, "  exec.ns                {}", self.exec_ns)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("cache") {
            let total = self.cache_hits + self.cache_misses;
            let rate = if total > 0 {
                (self.cache_hits as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            writeln!(out, "REGISTER CACHE")?;
            writeln!(
                out,
                "  regs   accesses: {:<10} | hits: {:<10} | hit_rate: {:.2}%",
                total, self.cache_hits, rate
            )?;
        }
        writeln!(out, "==========================================================")
    }

    /// Prints only the requested sections to stdout.
    pub fn print_sections(&self, sections: &[&str]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

impl fmt::Display for ReclockStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_sections(&[]))
    }
}
