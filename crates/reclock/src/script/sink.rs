//! Write-Coalescing Register Sink.
//!
//! The sink is the register facade every sequence is written against. It implements:
//! 1. **Cached Reads:** `rd32` consults the [`RegisterCache`] before the hardware.
//! 2. **Recorded Writes:** `wr32` and `mask*` append `Wr32` operations to the script instead of
//!    touching the hardware, and update the cache so later reads see the scripted value.
//! 3. **Coalescing:** Masked writes that would not change the register are dropped unless forced.
//! 4. **Control Methods:** Waits, delays, host block/unblock, vblank and training.
//! 5. **FBPA Workaround:** Counts FB partition accesses and pays for them with a delay once the
//!    script leaves the partition window.

use tracing::{debug, warn};

use super::builder::ScriptBuilder;
use super::cache::RegisterCache;
use super::{Method, RegisterOperation, Script};
use crate::common::constants::fb;
use crate::soc::{DisplayProbe, RegisterSpace};

/// Options for [`RegisterSink::mask_opts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskOpts {
    /// Emit the write even if the register already holds the result.
    pub force: bool,
    /// Return `prev ^ next` instead of `prev`.
    pub diff: bool,
}

impl MaskOpts {
    /// Forced write, returning the previous value.
    pub const FORCE: Self = Self {
        force: true,
        diff: false,
    };

    /// Coalesced write, returning the changed bits.
    pub const DIFF: Self = Self {
        force: false,
        diff: true,
    };
}

/// Counters kept while recording one script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// `Wr32` operations emitted.
    pub writes: u64,
    /// Masked writes dropped because the register already held the result.
    pub skipped: u64,
    /// Non-forced masked writes whose data strayed outside the mask.
    pub mask_violations: u64,
    /// `Wait` operations emitted.
    pub waits: u64,
    /// `Delay` operations emitted, workaround delays included.
    pub delays: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct FbpaWar {
    nsec: u32,
    count: u32,
    reg: u32,
}

/// Cached, recording register facade over a [`RegisterSpace`].
pub struct RegisterSink<'a> {
    regs: &'a mut dyn RegisterSpace,
    cache: RegisterCache,
    builder: ScriptBuilder,
    fbpa: FbpaWar,
    fbpa_enabled: bool,
    stats: SinkStats,
}

impl std::fmt::Debug for RegisterSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterSink")
            .field("cache", &self.cache)
            .field("builder", &self.builder)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a> RegisterSink<'a> {
    /// Creates a sink with an empty cache, closing batches at `capacity` words.
    pub fn new(regs: &'a mut dyn RegisterSpace, capacity: usize) -> Self {
        Self {
            regs,
            cache: RegisterCache::new(),
            builder: ScriptBuilder::new(capacity),
            fbpa: FbpaWar::default(),
            fbpa_enabled: true,
            stats: SinkStats::default(),
        }
    }

    /// Enables the FB partition workaround for a device with `fbps` active partitions.
    ///
    /// With `enabled == false` later calls to [`Self::fbpa_war_nsec`] are ignored.
    #[must_use]
    pub fn with_fbpa_workaround(mut self, enabled: bool, fbps: u32) -> Self {
        self.fbpa_enabled = enabled;
        self.fbpa.reg = fb::WAR_BASE + fbps.saturating_sub(1) * fb::WAR_STRIDE;
        self
    }

    /// Reads `addr`, from the cache if it holds a valid value.
    pub fn rd32(&mut self, addr: u32) -> u32 {
        if let Some(value) = self.cache.lookup(addr) {
            return value;
        }
        let value = self.regs.rd32(addr);
        self.cache.store(addr, value);
        value
    }

    /// Records an unconditional write.
    pub fn wr32(&mut self, addr: u32, value: u32) {
        self.fbpa_war(addr);
        debug!("R[{addr:06x}] = {value:08x}");
        self.cache.store(addr, value);
        self.builder.emit(Method::Wr32, &[addr, value]);
        self.stats.writes += 1;
    }

    /// Masked write, dropped if it would not change the register.
    pub fn mask(&mut self, addr: u32, mask: u32, data: u32) {
        let _ = self.mask_opts(addr, mask, data, MaskOpts::default());
    }

    /// Masked write that is emitted even if the register already holds the result.
    pub fn mask_force(&mut self, addr: u32, mask: u32, data: u32) {
        let _ = self.mask_opts(addr, mask, data, MaskOpts::FORCE);
    }

    /// Masked write with explicit options.
    ///
    /// Computes `next = (prev & !mask) | data` from the cached `prev`, emits a write if
    /// `next != prev` or `opts.force`, and returns `prev`, or `prev ^ next` with `opts.diff`.
    pub fn mask_opts(&mut self, addr: u32, mask: u32, data: u32, opts: MaskOpts) -> u32 {
        if data & !mask != 0 {
            self.stats.mask_violations += 1;
            warn!("R[{addr:06x}] data {data:08x} strays outside mask {mask:08x}");
        }
        let prev = self.rd32(addr);
        let next = (prev & !mask) | data;
        if next != prev || opts.force {
            self.wr32(addr, next);
        } else {
            self.stats.skipped += 1;
        }
        if opts.diff { prev ^ next } else { prev }
    }

    /// Records a poll of `addr` until `rd32(addr) & mask == data`, bounded by `nsec`.
    pub fn wait(&mut self, addr: u32, mask: u32, data: u32, nsec: u32) {
        self.fbpa_war(addr);
        debug!("R[{addr:06x}] & {mask:08x} == {data:08x}, {nsec} ns");
        self.builder.emit(Method::Wait, &[addr, mask, data, nsec]);
        self.builder.flush();
        self.stats.waits += 1;
    }

    /// Records a fixed delay.
    pub fn nsec(&mut self, nsec: u32) {
        debug!("    DELAY = {nsec} ns");
        self.builder.emit(Method::Delay, &[nsec]);
        self.builder.flush();
        self.stats.delays += 1;
    }

    /// Blocks host framebuffer access.
    pub fn block(&mut self) {
        debug!("   HOST BLOCKED");
        self.builder.emit(Method::Enter, &[]);
    }

    /// Unblocks host framebuffer access.
    pub fn unblock(&mut self) {
        debug!("   HOST UNBLOCKED");
        self.builder.emit(Method::Leave, &[]);
    }

    /// Requests memory training.
    pub fn train(&mut self) {
        debug!("   MEM TRAIN");
        self.builder.emit(Method::Train, &[]);
    }

    /// Waits for vblank on the active head with the largest resolution.
    ///
    /// Returns the chosen head, or `None` (and records nothing) if no head is active.
    pub fn wait_vblank(&mut self, display: &dyn DisplayProbe) -> Option<u32> {
        let mut best: Option<(u32, u32)> = None;
        for head in display.heads().iter().filter(|h| h.active) {
            let px = head.pixels();
            if px > best.map_or(0, |(_, p)| p) {
                best = Some((head.id, px));
            }
        }
        let Some((head, _)) = best else {
            debug!("WAIT VBLANK !NO ACTIVE HEAD");
            return None;
        };
        debug!("WAIT VBLANK HEAD{head}");
        self.builder.emit(Method::Vblank, &[head]);
        self.builder.flush();
        Some(head)
    }

    /// Sets the per-access delay of the FB partition workaround; 0 disables it.
    pub fn fbpa_war_nsec(&mut self, nsec: u32) {
        if !self.fbpa_enabled {
            return;
        }
        debug!("FBPA_WAR_NSEC {nsec} ns");
        self.fbpa.nsec = nsec;
    }

    fn fbpa_war(&mut self, addr: u32) {
        if self.fbpa.nsec == 0 {
            return;
        }
        if (fb::WINDOW_START..fb::WINDOW_END).contains(&addr) {
            if fb::WAR_RANGES
                .iter()
                .any(|&(lo, hi)| (lo..hi).contains(&addr))
            {
                self.fbpa.count += 1;
            }
            return;
        }
        if self.fbpa.count == 0 {
            return;
        }
        let count = std::mem::take(&mut self.fbpa.count);
        self.wr32(self.fbpa.reg, 0);
        debug!("FBPA_WAR_WAIT {count}");
        let total = count.saturating_mul(self.fbpa.nsec);
        if total != 0 {
            self.builder.emit(Method::Delay, &[total]);
            self.builder.flush();
            self.stats.delays += 1;
        }
    }

    /// Applies one register operation.
    pub fn apply(&mut self, op: RegisterOperation) {
        match op {
            RegisterOperation::Write { addr, value } => self.wr32(addr, value),
            RegisterOperation::MaskedWrite {
                addr,
                mask,
                value,
                force,
            } => {
                let opts = MaskOpts { force, diff: false };
                let _ = self.mask_opts(addr, mask, value, opts);
            }
            RegisterOperation::WaitUntil {
                addr,
                mask,
                value,
                timeout_ns,
            } => self.wait(addr, mask, value, timeout_ns),
            RegisterOperation::Delay { ns } => self.nsec(ns),
        }
    }

    /// Returns the register cache.
    pub const fn cache(&self) -> &RegisterCache {
        &self.cache
    }

    /// Drops every cached value, forcing the next reads through to the hardware.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Returns the counters gathered so far.
    pub const fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Returns the batch builder.
    pub const fn builder(&self) -> &ScriptBuilder {
        &self.builder
    }

    /// Closes the pending batch and returns the script with the sink's counters.
    pub fn finish(self) -> (Script, SinkStats, RegisterCache) {
        (self.builder.finish(), self.stats, self.cache)
    }
}
