//! PLL coefficient search.
//!
//! The output of a PLL is `ref * n / (m * p)`, with the input `ref / m` and the VCO `ref * n / m`
//! both constrained. The search walks every post divider and input divider and keeps the first
//! candidate with the smallest error.

use serde::Deserialize;

/// Operating limits of one PLL, frequencies in kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PllLimits {
    /// Lowest VCO frequency.
    pub vco_min_khz: u32,
    /// Highest VCO frequency.
    pub vco_max_khz: u32,
    /// Lowest phase-detector input frequency.
    pub in_min_khz: u32,
    /// Highest phase-detector input frequency.
    pub in_max_khz: u32,
    /// Feedback divider range.
    pub n_min: u32,
    /// Feedback divider range.
    pub n_max: u32,
    /// Input divider range.
    pub m_min: u32,
    /// Input divider range.
    pub m_max: u32,
    /// Post divider range.
    pub p_min: u32,
    /// Post divider range.
    pub p_max: u32,
}

impl PllLimits {
    /// Memory PLL limits of the GF100 family.
    pub const MPLL: Self = Self {
        vco_min_khz: 500_000,
        vco_max_khz: 2_200_000,
        in_min_khz: 13_500,
        in_max_khz: 108_000,
        n_min: 1,
        n_max: 255,
        m_min: 1,
        m_max: 63,
        p_min: 1,
        p_max: 31,
    };

    /// Reference PLL limits of the GF100 family.
    pub const REFPLL: Self = Self {
        vco_min_khz: 500_000,
        vco_max_khz: 1_600_000,
        in_min_khz: 13_500,
        in_max_khz: 108_000,
        n_min: 1,
        n_max: 255,
        m_min: 1,
        m_max: 63,
        p_min: 1,
        p_max: 31,
    };
}

/// Coefficients found by [`calc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllCoefs {
    /// Feedback divider.
    pub n: u32,
    /// Input divider.
    pub m: u32,
    /// Post divider.
    pub p: u32,
    /// Resulting output frequency in kHz.
    pub khz: u32,
}

impl PllCoefs {
    /// Encodes the coefficients as `(p << 16) | (n << 8) | m`.
    pub const fn encode(&self) -> u32 {
        ((self.p & 0xff) << 16) | ((self.n & 0xff) << 8) | (self.m & 0xff)
    }
}

/// Searches coefficients bringing `ref_khz` closest to `target_khz`.
///
/// Returns `None` if no combination satisfies the limits.
///
/// # Examples
///
/// ```
/// use reclock_core::clock::pll::{PllLimits, calc};
///
/// let coefs = calc(&PllLimits::MPLL, 27_000, 1_080_000).unwrap();
/// assert_eq!(coefs.khz, 1_080_000);
/// ```
pub fn calc(limits: &PllLimits, ref_khz: u32, target_khz: u32) -> Option<PllCoefs> {
    if ref_khz == 0 || target_khz == 0 {
        return None;
    }
    let ref_khz = u64::from(ref_khz);
    let target = u64::from(target_khz);
    let mut best: Option<(u64, PllCoefs)> = None;

    for p in limits.p_min.max(1)..=limits.p_max {
        for m in limits.m_min.max(1)..=limits.m_max {
            let input = ref_khz / u64::from(m);
            if input < u64::from(limits.in_min_khz) || input > u64::from(limits.in_max_khz) {
                continue;
            }
            let mp = u64::from(m) * u64::from(p);
            let n = (target * mp + ref_khz / 2) / ref_khz;
            if n < u64::from(limits.n_min) || n > u64::from(limits.n_max) {
                continue;
            }
            let vco = ref_khz * n / u64::from(m);
            if vco < u64::from(limits.vco_min_khz) || vco > u64::from(limits.vco_max_khz) {
                continue;
            }
            let khz = ref_khz * n / mp;
            let err = khz.abs_diff(target);
            if best.is_none_or(|(e, _)| err < e) {
                best = Some((
                    err,
                    PllCoefs {
                        n: n as u32,
                        m,
                        p,
                        khz: khz as u32,
                    },
                ));
                if err == 0 {
                    return best.map(|(_, c)| c);
                }
            }
        }
    }
    best.map(|(_, c)| c)
}
