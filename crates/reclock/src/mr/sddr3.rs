//! DDR3 mode registers.

use super::{MrArgs, ModeRegisterSet, RamCfg, TimingFields, Xlat, bad_timing, xlat};
use crate::common::CalcError;

/// Smallest version 0x10 timing header that carries CWL.
const V10_MIN_HDR: u8 = 0x17;

const CL: [Xlat; 10] = [
    xlat(5, 2),
    xlat(6, 4),
    xlat(7, 6),
    xlat(8, 8),
    xlat(9, 10),
    xlat(10, 12),
    xlat(11, 14),
    xlat(12, 1),
    xlat(13, 3),
    xlat(14, 5),
];

const WR: [Xlat; 9] = [
    xlat(5, 1),
    xlat(6, 2),
    xlat(7, 3),
    xlat(8, 4),
    xlat(10, 5),
    xlat(12, 6),
    xlat(14, 7),
    xlat(15, 7),
    xlat(16, 0),
];

const CWL: [Xlat; 6] = [
    xlat(5, 0),
    xlat(6, 1),
    xlat(7, 2),
    xlat(8, 3),
    xlat(9, 4),
    xlat(10, 5),
];

/// Computes DDR3 mode registers for `cfg`.
///
/// # Errors
///
/// Returns [`CalcError::UnsupportedFormat`] for timing versions other than 0x10/0x20, and for
/// version 0x10 entries whose header is too short to carry CWL. Returns
/// [`CalcError::InvalidTimingValue`] if CWL, CL or WR has no encoding.
pub fn calc(cfg: &RamCfg) -> Result<ModeRegisterSet, CalcError> {
    let mut a = MrArgs::new();
    a.load("DLLoff", i32::from(cfg.ramcfg_dll_off));

    match cfg.timing_ver {
        0x10 => {
            // TODO: derive CWL from the timing register for headers shorter than 0x17.
            if cfg.timing_hdr < V10_MIN_HDR {
                return Err(bad_timing(cfg.timing_ver));
            }
            a.load("CWL", i32::from(cfg.timing_10_cwl));
            a.load("CL", i32::from(cfg.timing_10_cl));
            a.load("WR", i32::from(cfg.timing_10_wr));
            a.load("ODT", i32::from(cfg.timing_10_odt));
        }
        0x20 => {
            let t = TimingFields::v20(&cfg.timing);
            a.load("CWL", t.cwl);
            a.load("CL", t.cl);
            a.load("WR", t.wr);
        }
        v => return Err(bad_timing(v)),
    }

    a.translate("CWL", &CWL)?;
    a.translate("CL", &CL)?;
    a.translate("WR", &WR)?;

    a.mask(0, 0xe00, "WR");
    a.bits(0, 0x070, "CL", 0xe);
    a.bits(0, 0x004, "CL", 0x1);

    a.mask(1, 0x001, "DLLoff");
    a.bits(1, 0x200, "ODT", 0x1);
    a.bits(1, 0x040, "ODT", 0x2);
    a.bits(1, 0x004, "ODT", 0x4);

    a.mask(2, 0x038, "CWL");
    Ok(a.finish())
}
