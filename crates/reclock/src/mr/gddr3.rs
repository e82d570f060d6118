//! GDDR3 mode registers.

use super::{MrArgs, ModeRegisterSet, RamCfg, TimingFields, Xlat, bad_timing, xlat};
use crate::common::CalcError;

const CL_LO: [Xlat; 9] = [
    xlat(5, 5),
    xlat(7, 7),
    xlat(8, 0),
    xlat(9, 1),
    xlat(10, 2),
    xlat(11, 3),
    xlat(12, 8),
    xlat(13, 9),
    xlat(14, 6),
];

const WR_LO: [Xlat; 10] = [
    xlat(5, 2),
    xlat(7, 4),
    xlat(8, 5),
    xlat(9, 6),
    xlat(10, 7),
    xlat(11, 0),
    xlat(13, 1),
    xlat(4, 0),
    xlat(6, 3),
    xlat(12, 1),
];

/// Computes GDDR3 mode registers for `cfg`.
///
/// # Errors
///
/// Returns [`CalcError::UnsupportedFormat`] for timing versions other than 0x10/0x20 and
/// [`CalcError::InvalidTimingValue`] if CL or WR has no encoding.
pub fn calc(cfg: &RamCfg) -> Result<ModeRegisterSet, CalcError> {
    let mut a = MrArgs::new();

    match cfg.timing_ver {
        0x10 => {
            a.load("CWL", i32::from(cfg.timing_10_cwl));
            a.load("CL", i32::from(cfg.timing_10_cl));
            a.load("WR", i32::from(cfg.timing_10_wr));
            a.load("DLLoff", i32::from(cfg.ramcfg_dll_off));
            a.cond("ODT", i32::from(cfg.timing_10_odt), cfg.ramcfg_timing != 0xff);
            a.load("RON", i32::from(cfg.ramcfg_ron));
        }
        0x20 => {
            let t = TimingFields::v20(&cfg.timing);
            a.load("CWL", t.cwl);
            a.load("CL", t.cl);
            a.load("WR", t.wr);
        }
        v => return Err(bad_timing(v)),
    }

    a.translate("CL", &CL_LO)?;
    a.translate("WR", &WR_LO)?;

    a.mask(0, 0xe00, "CWL");
    a.bits(0, 0x070, "CL", 0x7);
    a.bits(0, 0x004, "CL", 0x8);

    a.bits(1, 0x300, "RON", 0x3);
    a.bits(1, 0x080, "WR", 0x4);
    a.mask(1, 0x040, "DLLoff");
    a.bits(1, 0x030, "WR", 0x3);
    a.bits(1, 0x00c, "ODT", 0x3);
    Ok(a.finish())
}
