//! Host-side MEMX interpreter.
//!
//! Stands in for the MEMX process: it offers a data segment, accepts an uploaded script and
//! replays it onto a [`RegisterSpace`] with simulated time. Waits poll at a fixed interval
//! until their condition holds or their timeout expires; an expired wait stops the script with
//! [`memx::STATUS_WAIT_TIMEOUT`], exactly where the real process would give up.

use tracing::{debug, trace, warn};

use crate::common::ExecError;
use crate::common::constants::memx;
use crate::config::InterpreterConfig;
use crate::script::exec::{ExecutionContext, InfoKind, Message, Reply};
use crate::script::{Method, Script};
use crate::soc::RegisterSpace;

/// One observable step of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// Host framebuffer access blocked.
    Enter,
    /// Host framebuffer access restored.
    Leave,
    /// Register written.
    Write {
        /// Register address.
        addr: u32,
        /// Value written.
        value: u32,
    },
    /// Wait condition observed.
    WaitDone {
        /// Polled register.
        addr: u32,
        /// Simulated time spent polling.
        waited_ns: u32,
    },
    /// Wait condition never observed; execution stopped.
    WaitTimeout {
        /// Polled register.
        addr: u32,
        /// Bits compared.
        mask: u32,
        /// Expected value.
        data: u32,
    },
    /// Fixed delay.
    Delay {
        /// Delay in nanoseconds.
        ns: u32,
    },
    /// Vblank wait on a head.
    Vblank {
        /// Head index.
        head: u32,
    },
    /// Memory training requested.
    Train,
}

enum Outcome {
    Continue,
    Stop(u32),
}

/// Deterministic [`ExecutionContext`] that runs scripts against a register space.
#[derive(Debug)]
pub struct ScriptInterpreter<R: RegisterSpace> {
    regs: R,
    poll_interval_ns: u32,
    base: u32,
    segment: Vec<u32>,
    cursor: Option<usize>,
    train: Vec<u32>,
    now_ns: u64,
    blocked: bool,
    responsive: bool,
    executions: u64,
    trace: Vec<TraceEvent>,
}

impl<R: RegisterSpace> ScriptInterpreter<R> {
    /// Creates an interpreter over `regs` with the data segment described by `config`.
    pub fn new(regs: R, config: &InterpreterConfig) -> Self {
        Self {
            regs,
            poll_interval_ns: config.poll_interval_ns.max(1),
            base: config.segment_base,
            segment: vec![0; config.segment_words],
            cursor: None,
            train: Vec::new(),
            now_ns: 0,
            blocked: false,
            responsive: true,
            executions: 0,
            trace: Vec::new(),
        }
    }

    /// Sets the packet returned for training result queries.
    pub fn set_train_result(&mut self, words: Vec<u32>) {
        self.train = words;
    }

    /// Makes every later message go unanswered (`false`) or answered again (`true`).
    pub fn set_responsive(&mut self, responsive: bool) {
        self.responsive = responsive;
    }

    /// Returns the register space.
    pub const fn regs(&self) -> &R {
        &self.regs
    }

    /// Returns the register space mutably.
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Returns the events of every execution so far.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Clears the recorded events.
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Returns the simulated time in nanoseconds.
    pub const fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Returns `true` if the last script left host access blocked.
    pub const fn blocked(&self) -> bool {
        self.blocked
    }

    /// Returns the number of `Exec` messages handled.
    pub const fn executions(&self) -> u64 {
        self.executions
    }

    fn train_base(&self) -> u32 {
        self.base + (self.segment.len() as u32) * 4
    }

    fn exec(&mut self, base: u32, finish: u32) -> Reply {
        self.executions += 1;
        let start = self.now_ns;
        let status = match self.fetch(base, finish) {
            Some(script) => self.run(&script),
            None => memx::STATUS_BAD_SCRIPT,
        };
        let elapsed = self.now_ns.saturating_sub(start);
        debug!(elapsed_ns = elapsed, status, "memx exec");
        Reply([u32::try_from(elapsed).unwrap_or(u32::MAX), status])
    }

    fn fetch(&self, base: u32, finish: u32) -> Option<Script> {
        let lo = (base.checked_sub(self.base)? / 4) as usize;
        let hi = (finish.checked_sub(self.base)? / 4) as usize;
        let words = self.segment.get(lo..hi)?;
        match Script::decode(words) {
            Ok(script) => Some(script),
            Err(err) => {
                warn!(%err, "memx rejected script");
                None
            }
        }
    }

    fn run(&mut self, script: &Script) -> u32 {
        for batch in script.batches() {
            if let Outcome::Stop(status) = self.step(batch.method, &batch.words) {
                return status;
            }
        }
        memx::STATUS_OK
    }

    fn step(&mut self, method: Method, words: &[u32]) -> Outcome {
        match method {
            Method::Enter => {
                self.blocked = true;
                self.trace.push(TraceEvent::Enter);
            }
            Method::Leave => {
                self.blocked = false;
                self.trace.push(TraceEvent::Leave);
            }
            Method::Wr32 => {
                if words.len() % 2 != 0 {
                    return Outcome::Stop(memx::STATUS_BAD_SCRIPT);
                }
                for pair in words.chunks_exact(2) {
                    self.regs.wr32(pair[0], pair[1]);
                    self.trace.push(TraceEvent::Write {
                        addr: pair[0],
                        value: pair[1],
                    });
                }
            }
            Method::Wait => {
                if words.len() % 4 != 0 {
                    return Outcome::Stop(memx::STATUS_BAD_SCRIPT);
                }
                for op in words.chunks_exact(4) {
                    if !self.wait(op[0], op[1], op[2], op[3]) {
                        return Outcome::Stop(memx::STATUS_WAIT_TIMEOUT);
                    }
                }
            }
            Method::Delay => {
                for &ns in words {
                    self.now_ns += u64::from(ns);
                    self.trace.push(TraceEvent::Delay { ns });
                }
            }
            Method::Vblank => {
                for &head in words {
                    self.trace.push(TraceEvent::Vblank { head });
                }
            }
            Method::Train => self.trace.push(TraceEvent::Train),
        }
        Outcome::Continue
    }

    fn wait(&mut self, addr: u32, mask: u32, data: u32, timeout_ns: u32) -> bool {
        let mut waited = 0u32;
        loop {
            if self.regs.rd32(addr) & mask == data {
                trace!("memx wait R[{addr:06x}] satisfied after {waited} ns");
                self.trace.push(TraceEvent::WaitDone {
                    addr,
                    waited_ns: waited,
                });
                return true;
            }
            if waited >= timeout_ns {
                warn!("memx wait R[{addr:06x}] & {mask:08x} == {data:08x} timed out");
                self.trace.push(TraceEvent::WaitTimeout { addr, mask, data });
                return false;
            }
            let step = self.poll_interval_ns.min(timeout_ns - waited);
            waited += step;
            self.now_ns += u64::from(step);
        }
    }
}

impl<R: RegisterSpace> ExecutionContext for ScriptInterpreter<R> {
    fn send(&mut self, msg: Message) -> Result<Reply, ExecError> {
        if !self.responsive {
            return Err(ExecError::Unresponsive { message: msg.id() });
        }
        Ok(match msg {
            Message::Info(InfoKind::Data) => {
                Reply([self.base, (self.segment.len() as u32) * 4])
            }
            Message::Info(InfoKind::Train) => {
                Reply([self.train_base(), (self.train.len() as u32) * 4])
            }
            Message::Exec { base, finish } => self.exec(base, finish),
        })
    }

    fn acquire(&mut self, base: u32) -> Result<(), ExecError> {
        if base != self.base || self.cursor.is_some() {
            return Err(ExecError::SegmentUnavailable { base });
        }
        self.cursor = Some(0);
        Ok(())
    }

    fn push(&mut self, words: &[u32]) -> Result<(), ExecError> {
        let cursor = self
            .cursor
            .ok_or(ExecError::SegmentUnavailable { base: self.base })?;
        let end = cursor + words.len();
        let capacity = self.segment.len();
        let dst = self
            .segment
            .get_mut(cursor..end)
            .ok_or(ExecError::SegmentOverflow {
                words: end,
                capacity,
            })?;
        dst.copy_from_slice(words);
        self.cursor = Some(end);
        Ok(())
    }

    fn release(&mut self) -> u32 {
        let words = self.cursor.take().unwrap_or(0);
        self.base + (words as u32) * 4
    }

    fn read(&mut self, base: u32, len: usize) -> Result<Vec<u32>, ExecError> {
        if base == self.train_base() {
            return self
                .train
                .get(..len)
                .map(<[u32]>::to_vec)
                .ok_or(ExecError::SegmentUnavailable { base });
        }
        let lo = (base
            .checked_sub(self.base)
            .ok_or(ExecError::SegmentUnavailable { base })?
            / 4) as usize;
        self.segment
            .get(lo..lo + len)
            .map(<[u32]>::to_vec)
            .ok_or(ExecError::SegmentUnavailable { base })
    }
}
