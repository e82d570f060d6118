//! DDR2 mode registers.

use super::{MrArgs, ModeRegisterSet, RamCfg, TimingFields, Xlat, bad_timing, xlat};
use crate::common::CalcError;

const CL: [Xlat; 6] = [
    xlat(2, 2),
    xlat(3, 3),
    xlat(4, 4),
    xlat(5, 5),
    xlat(6, 6),
    xlat(7, 7),
];

const WR: [Xlat; 6] = [
    xlat(2, 1),
    xlat(3, 2),
    xlat(4, 3),
    xlat(5, 4),
    xlat(6, 5),
    xlat(7, 6),
];

/// Computes DDR2 mode registers for `cfg`.
///
/// # Errors
///
/// Returns [`CalcError::UnsupportedFormat`] for timing versions other than 0x10/0x20 and
/// [`CalcError::InvalidTimingValue`] if CL or WR has no encoding.
pub fn calc(cfg: &RamCfg) -> Result<ModeRegisterSet, CalcError> {
    let mut a = MrArgs::new();

    match cfg.timing_ver {
        0x10 => {
            a.load("CL", i32::from(cfg.timing_10_cl));
            a.load("WR", i32::from(cfg.timing_10_wr));
            a.load("DLLoff", i32::from(cfg.ramcfg_dll_off));
            a.cond("ODT", i32::from(cfg.timing_10_odt), cfg.ramcfg_timing != 0xff);
        }
        0x20 => {
            let t = TimingFields::v20(&cfg.timing);
            a.load("CL", t.cl);
            a.load("WR", t.wr);
        }
        v => return Err(bad_timing(v)),
    }

    a.translate("CL", &CL)?;
    a.translate("WR", &WR)?;

    a.mask(0, 0xe00, "WR");
    a.mask(0, 0x070, "CL");

    a.mask(1, 0x001, "DLLoff");
    a.bits(1, 0x040, "ODT", 0x2);
    a.bits(1, 0x004, "ODT", 0x1);
    Ok(a.finish())
}
