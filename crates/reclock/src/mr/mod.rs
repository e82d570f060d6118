//! Mode-Register Calculators.
//!
//! Each memory technology encodes its timing parameters into a handful of mode registers. This
//! module provides:
//! 1. **Tables:** The parsed rammap/ramcfg/timing entries the calculators read.
//! 2. **Argument Builder:** [`MrArgs`], which tracks which fields were loaded and places them.
//! 3. **Calculators:** One pure function per technology returning a [`ModeRegisterSet`].
//!
//! A field that was never loaded, or whose adjusted value is negative, contributes nothing to
//! any register. A field that fails translation aborts the whole calculation.

/// GDDR3 mode registers.
pub mod gddr3;
/// GDDR5 mode registers.
pub mod gddr5;
/// DDR2 mode registers.
pub mod sddr2;
/// DDR3 mode registers.
pub mod sddr3;
/// Parsed memory configuration tables.
pub mod table;

pub use table::{RamCfg, RamCfgDiff, RamData, RamTable};

use crate::common::CalcError;
use crate::common::bits;

/// Number of mode-register slots.
pub const MR_COUNT: usize = 16;

/// Value placed into one mode register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeRegister {
    /// Bits the calculation defined.
    pub mask: u32,
    /// Values of those bits.
    pub data: u32,
}

/// The output of a calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeRegisterSet {
    /// Mode registers 0 through 15.
    pub mr: [ModeRegister; MR_COUNT],
    /// GDDR5 MR1 value broadcast on configurations without the alternate termination field.
    pub mr1_nuts: u32,
}

impl ModeRegisterSet {
    /// Returns mode register `index`.
    pub fn get(&self, index: usize) -> ModeRegister {
        self.mr.get(index).copied().unwrap_or_default()
    }
}

/// One entry of a value translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xlat {
    /// Value as found in the timing table.
    pub from: u8,
    /// Hardware encoding.
    pub to: u8,
}

/// Shorthand for building translation tables.
pub(crate) const fn xlat(from: u8, to: u8) -> Xlat {
    Xlat { from, to }
}

/// Named integer arguments of a calculation, `-1` meaning unset.
#[derive(Debug, Clone, Default)]
pub struct MrArgs {
    fields: Vec<(&'static str, i32)>,
    set: ModeRegisterSet,
}

impl MrArgs {
    /// Creates an argument set with every field unset and every register cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, `-1` if it was never loaded.
    pub fn get(&self, name: &'static str) -> i32 {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(-1, |&(_, v)| v)
    }

    /// Sets `name` to `value`.
    pub fn load(&mut self, name: &'static str, value: i32) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Sets `name` to `value` only when `cond` holds.
    pub fn cond(&mut self, name: &'static str, value: i32, cond: bool) {
        if cond {
            self.load(name, value);
        }
    }

    /// Replaces `name` with its hardware encoding from `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidTimingValue`] if the current value, unset included, has no
    /// entry in `table`.
    pub fn translate(&mut self, name: &'static str, table: &[Xlat]) -> Result<(), CalcError> {
        let value = self.get(name);
        let hit = table.iter().find(|x| i32::from(x.from) == value);
        match hit {
            Some(x) => {
                self.load(name, i32::from(x.to));
                Ok(())
            }
            None => Err(CalcError::InvalidTimingValue { field: name, value }),
        }
    }

    /// Places the whole of `name` into the field `mask` of register `reg`.
    pub fn mask(&mut self, reg: usize, mask: u32, name: &'static str) {
        let value = self.get(name);
        if value >= 0 {
            self.place(reg, mask, value as u32);
        }
    }

    /// Places the bits `sub` of `name`, right-aligned, into the field `mask` of register `reg`.
    pub fn bits(&mut self, reg: usize, mask: u32, name: &'static str, sub: u32) {
        let value = self.get(name);
        if value >= 0 {
            self.place(reg, mask, bits::extract(value as u32, sub));
        }
    }

    fn place(&mut self, reg: usize, mask: u32, field: u32) {
        if let Some(mr) = self.set.mr.get_mut(reg) {
            mr.mask |= mask;
            mr.data |= bits::insert(field, mask);
        }
    }

    /// Returns the registers placed so far.
    pub const fn set(&self) -> &ModeRegisterSet {
        &self.set
    }

    /// Records the GDDR5 broadcast value.
    pub const fn set_mr1_nuts(&mut self, value: u32) {
        self.set.mr1_nuts = value;
    }

    /// Finishes the calculation.
    pub fn finish(self) -> ModeRegisterSet {
        self.set
    }
}

/// Raw CWL/CL/WR fields of a version 0x20 timing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingFields {
    /// CAS write latency, `timing[1][11:7]`.
    pub cwl: i32,
    /// CAS latency, `timing[1][4:0]`.
    pub cl: i32,
    /// Write recovery, `timing[2][22:16]`.
    pub wr: i32,
}

impl TimingFields {
    /// Extracts the fields from the raw timing words.
    pub const fn v20(timing: &[u32; table::TIMING_WORDS]) -> Self {
        Self {
            cwl: bits::extract(timing[1], 0x0000_0f80) as i32,
            cl: bits::extract(timing[1], 0x0000_001f) as i32,
            wr: bits::extract(timing[2], 0x007f_0000) as i32,
        }
    }
}

/// Returns an error for an unsupported timing table version.
pub(crate) const fn bad_timing(version: u8) -> CalcError {
    CalcError::UnsupportedFormat {
        table: "timing",
        version,
    }
}

/// Returns an error for an unsupported ramcfg table version.
pub(crate) const fn bad_ramcfg(version: u8) -> CalcError {
    CalcError::UnsupportedFormat {
        table: "ramcfg",
        version,
    }
}
