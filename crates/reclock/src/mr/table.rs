//! Parsed memory configuration tables.
//!
//! The vendor tables are parsed elsewhere; entries arrive here as plain data, one per
//! frequency range. A [`RamTable`] also records which fields differ between entries: a field
//! identical in every entry is treated as "do not touch".

use serde::Deserialize;

/// Number of raw timing words kept per entry.
pub const TIMING_WORDS: usize = 11;

/// One rammap/ramcfg/timing entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RamCfg {
    /// Lowest frequency covered, in kHz.
    pub rammap_min: u32,
    /// Highest frequency covered, in kHz.
    pub rammap_max: u32,
    /// Ramcfg table version (0x10 or 0x11).
    pub ramcfg_ver: u8,
    /// Timing table version (0x10 or 0x20).
    pub timing_ver: u8,
    /// Timing table header length.
    pub timing_hdr: u8,
    /// Timing entry index; 0xff when the entry has no timings.
    pub ramcfg_timing: u8,
    /// DLL disabled.
    pub ramcfg_dll_off: bool,
    /// Output driver impedance.
    pub ramcfg_ron: u8,
    /// Ramcfg 0x10 byte 2 bit 5 (GF104 partition hook).
    pub ramcfg_10_02_20: bool,
    /// Ramcfg 0x11 byte 1 bit 7.
    pub ramcfg_11_01_80: bool,
    /// Ramcfg 0x11 byte 1 bit 6.
    pub ramcfg_11_01_40: bool,
    /// Ramcfg 0x11 byte 2 bit 4.
    pub ramcfg_11_02_10: bool,
    /// Ramcfg 0x11 byte 2 bit 2.
    pub ramcfg_11_02_04: bool,
    /// Ramcfg 0x11 byte 6.
    pub ramcfg_11_06: u8,
    /// Ramcfg 0x11 byte 7 bit 1.
    pub ramcfg_11_07_02: bool,
    /// Timing 0x10 CAS write latency.
    pub timing_10_cwl: u8,
    /// Timing 0x10 CAS latency.
    pub timing_10_cl: u8,
    /// Timing 0x10 write recovery.
    pub timing_10_wr: u8,
    /// Timing 0x10 on-die termination.
    pub timing_10_odt: u8,
    /// Timing 0x20 byte 0x2e bits 7:6.
    pub timing_20_2e_c0: u8,
    /// Timing 0x20 byte 0x2e bits 5:4.
    pub timing_20_2e_30: u8,
    /// Timing 0x20 byte 0x2e bits 1:0.
    pub timing_20_2e_03: u8,
    /// Timing 0x20 byte 0x2f bits 1:0.
    pub timing_20_2f_03: u8,
    /// Raw timing words.
    pub timing: [u32; TIMING_WORDS],
}

impl Default for RamCfg {
    fn default() -> Self {
        Self {
            rammap_min: 0,
            rammap_max: 0,
            ramcfg_ver: 0x10,
            timing_ver: 0x20,
            timing_hdr: 0,
            ramcfg_timing: 0xff,
            ramcfg_dll_off: false,
            ramcfg_ron: 0,
            ramcfg_10_02_20: false,
            ramcfg_11_01_80: false,
            ramcfg_11_01_40: false,
            ramcfg_11_02_10: false,
            ramcfg_11_02_04: false,
            ramcfg_11_06: 0,
            ramcfg_11_07_02: false,
            timing_10_cwl: 0,
            timing_10_cl: 0,
            timing_10_wr: 0,
            timing_10_odt: 0,
            timing_20_2e_c0: 0,
            timing_20_2e_30: 0,
            timing_20_2e_03: 0,
            timing_20_2f_03: 0,
            timing: [0; TIMING_WORDS],
        }
    }
}

impl RamCfg {
    /// Returns `true` if `khz` lies within the entry's frequency range.
    pub const fn covers(&self, khz: u32) -> bool {
        khz >= self.rammap_min && khz <= self.rammap_max
    }

    /// Returns `true` for the all-zero range terminating vendor tables.
    pub const fn is_empty_range(&self) -> bool {
        self.rammap_min == 0 && self.rammap_max == 0
    }
}

/// Fields that differ between at least two entries of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RamCfgDiff {
    /// `ramcfg_10_02_20` differs.
    pub ramcfg_10_02_20: bool,
}

impl RamCfgDiff {
    /// Compares every entry against the first.
    pub fn of(entries: &[RamCfg]) -> Self {
        let mut diff = Self::default();
        if let Some((first, rest)) = entries.split_first() {
            for cfg in rest {
                diff.ramcfg_10_02_20 |= cfg.ramcfg_10_02_20 != first.ramcfg_10_02_20;
            }
        }
        diff
    }
}

/// The entry selected for a target frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamData {
    /// Target frequency in kHz.
    pub freq: u32,
    /// Table entry covering `freq`.
    pub bios: RamCfg,
}

/// Every usable entry of a device's memory configuration table.
///
/// # Examples
///
/// ```
/// use reclock_core::mr::{RamCfg, RamTable};
///
/// let table = RamTable::new(vec![
///     RamCfg { rammap_min: 100_000, rammap_max: 400_000, ..RamCfg::default() },
///     RamCfg { rammap_min: 400_001, rammap_max: 900_000, ..RamCfg::default() },
/// ]);
/// assert_eq!(table.lookup(405_000).map(|d| d.bios.rammap_max), Some(900_000));
/// assert!(table.lookup(950_000).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<RamCfg>")]
pub struct RamTable {
    entries: Vec<RamCfg>,
    diff: RamCfgDiff,
}

impl RamTable {
    /// Builds a table, dropping entries with an empty frequency range.
    pub fn new(entries: Vec<RamCfg>) -> Self {
        let entries: Vec<RamCfg> = entries
            .into_iter()
            .filter(|cfg| !cfg.is_empty_range())
            .collect();
        let diff = RamCfgDiff::of(&entries);
        Self { entries, diff }
    }

    /// Returns the data for the first entry covering `khz`.
    pub fn lookup(&self, khz: u32) -> Option<RamData> {
        self.entries
            .iter()
            .find(|cfg| cfg.covers(khz))
            .map(|cfg| RamData {
                freq: khz,
                bios: cfg.clone(),
            })
    }

    /// Returns the entries.
    pub fn entries(&self) -> &[RamCfg] {
        &self.entries
    }

    /// Returns which fields differ between entries.
    pub const fn diff(&self) -> RamCfgDiff {
        self.diff
    }
}

impl From<Vec<RamCfg>> for RamTable {
    fn from(entries: Vec<RamCfg>) -> Self {
        Self::new(entries)
    }
}
