//! Framebuffer partition probe.

use tracing::debug;

use super::generation::{FbpaSource, Generation};
use crate::common::constants::topo;
use crate::soc::RegisterSpace;

/// Present framebuffer partitions and partition address units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Partitions {
    /// Number of FBPs the chip was built with.
    pub fbp_count: u32,
    /// FBPs present.
    pub fbp_mask: u32,
    /// Number of FBPAs the chip was built with.
    pub fbpa_count: u32,
    /// FBPAs present.
    pub fbpa_mask: u32,
}

const fn present(count: u32, disabled: u32) -> u32 {
    let all = if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    };
    all & !disabled
}

impl Partitions {
    /// Builds a topology from counts and disable masks.
    pub const fn new(fbp_count: u32, fbp_disabled: u32, fbpa_count: u32, fbpa_disabled: u32) -> Self {
        Self {
            fbp_count,
            fbp_mask: present(fbp_count, fbp_disabled),
            fbpa_count,
            fbpa_mask: present(fbpa_count, fbpa_disabled),
        }
    }

    /// Reads the topology registers.
    pub fn probe(regs: &mut dyn RegisterSpace, generation: Generation) -> Self {
        let fbp_count = regs.rd32(topo::FBP_COUNT);
        let fbp_disabled = regs.rd32(topo::FBP_DISABLE);
        let (fbpa_count, fbpa_disabled) = match generation.caps().fbpa_source {
            FbpaSource::Fbp => (fbp_count, fbp_disabled),
            FbpaSource::Fbpa => (regs.rd32(topo::FBPA_COUNT), 0),
        };
        let parts = Self::new(fbp_count, fbp_disabled, fbpa_count, fbpa_disabled);
        debug!(
            "{} FBP(s): {} present ({:x})",
            parts.fbp_count,
            parts.fbps(),
            parts.fbp_mask
        );
        debug!(
            "{} FBPA(s): {} present ({:x})",
            parts.fbpa_count,
            parts.fbpas(),
            parts.fbpa_mask
        );
        parts
    }

    /// Returns the number of FBPs present.
    pub const fn fbps(&self) -> u32 {
        self.fbp_mask.count_ones()
    }

    /// Returns the number of FBPAs present.
    pub const fn fbpas(&self) -> u32 {
        self.fbpa_mask.count_ones()
    }

    /// Iterates the indices of present FBPAs.
    pub fn fbpa_indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.fbpa_count.min(32)).filter(|i| self.fbpa_mask & (1 << i) != 0)
    }
}
