//! GDDR5 mode registers.

use super::{MrArgs, ModeRegisterSet, RamCfg, TimingFields, bad_ramcfg, bad_timing};
use crate::common::CalcError;

/// Caller-supplied GDDR5 parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gddr5Options {
    /// Use the alternate termination field in MR1.
    pub nuts: bool,
    /// RDQS mode; negative leaves MR3 untouched.
    pub rq: i32,
    /// LP3 override for ramcfg 0x10; zero leaves it unset.
    pub l3: i32,
}

/// Computes GDDR5 mode registers for `cfg`.
///
/// # Errors
///
/// Returns [`CalcError::UnsupportedFormat`] for ramcfg versions other than 0x10/0x11 or timing
/// versions other than 0x10/0x20.
///
/// # Examples
///
/// ```
/// use reclock_core::mr::{RamCfg, gddr5};
///
/// let mut cfg = RamCfg { ramcfg_ver: 0x10, timing_ver: 0x20, ..RamCfg::default() };
/// cfg.timing[1] = 0x0000_0585;
/// let set = gddr5::calc(&cfg, gddr5::Gddr5Options::default()).unwrap();
/// assert_eq!(set.mr[0].data & 0x007, 0x3);
/// ```
pub fn calc(cfg: &RamCfg, opts: Gddr5Options) -> Result<ModeRegisterSet, CalcError> {
    let mut a = MrArgs::new();
    a.load("rq", opts.rq);
    a.load("xd", i32::from(!cfg.ramcfg_dll_off));

    match cfg.ramcfg_ver {
        0x10 => a.cond("l3", i32::from(opts.l3 > 1), opts.l3 != 0),
        0x11 => {
            a.load("pd", i32::from(cfg.ramcfg_11_01_80));
            a.load("lf", i32::from(cfg.ramcfg_11_01_40));
            a.load("vh", i32::from(cfg.ramcfg_11_02_10));
            // Loaded regardless of reachability across the table.
            a.load("vr", i32::from(cfg.ramcfg_11_02_04));
            a.cond("vo", i32::from(cfg.ramcfg_11_06), cfg.ramcfg_11_06 != 0);
            a.load("l3", i32::from(!cfg.ramcfg_11_07_02));
        }
        v => return Err(bad_ramcfg(v)),
    }

    match cfg.timing_ver {
        0x10 => {}
        0x20 => {
            let t = TimingFields::v20(&cfg.timing);
            a.load("WL", t.cwl);
            a.load("CL", t.cl - 5);
            a.load("WR", t.wr - 4);
            a.load("at0", i32::from(cfg.timing_20_2e_c0));
            a.load("at1", i32::from(cfg.timing_20_2e_30));
            a.load("dt", i32::from(cfg.timing_20_2e_03));
            a.load("ds", i32::from(cfg.timing_20_2f_03));
        }
        v => return Err(bad_timing(v)),
    }

    a.bits(0, 0xf00, "WR", 0x0f);
    a.bits(0, 0x078, "CL", 0x0f);
    a.bits(0, 0x007, "WL", 0x07);

    a.mask(1, 0x080, "xd");
    a.mask(1, 0x030, "at0");
    a.mask(1, 0x00c, "dt");
    a.mask(1, 0x003, "ds");

    // Broadcast value is captured before the alternate termination field is applied.
    let nuts = a.set().mr[1].data;
    a.set_mr1_nuts(nuts);
    if opts.nuts {
        a.mask(1, 0x030, "at1");
    }

    a.mask(3, 0x020, "rq");

    a.mask(5, 0x004, "l3");

    a.mask(6, 0xff0, "vo");
    a.mask(6, 0x001, "pd");

    a.mask(7, 0x300, "vr");
    a.mask(7, 0x080, "vh");
    a.mask(7, 0x008, "lf");

    a.bits(8, 0x002, "WR", 0x10);
    a.bits(8, 0x001, "CL", 0x10);
    Ok(a.finish())
}
