//! Generation profiles.
//!
//! The GF100 family shares one reclocking flow; members differ in how partitions are counted,
//! whether the vblank heuristic can read the display engine, and one partition hook.

use serde::Deserialize;

/// Where the FB partition address unit count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbpaSource {
    /// One unit per FBP; count and disable mask come from the FBP registers.
    Fbp,
    /// Dedicated FBPA count register, no disable mask.
    Fbpa,
}

/// Capabilities that vary between generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationCaps {
    /// Partition address unit probe.
    pub fbpa_source: FbpaSource,
    /// Whether the vblank heuristic can be used to hide the FB-off window.
    pub vblank_heuristic: bool,
    /// Whether the `0x100c00` partition configuration hook is emitted.
    pub partition_hook: bool,
}

/// Supported GPU generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Generation {
    /// GF100.
    Gf100,
    /// GF104/GF106.
    Gf104,
    /// GF108.
    Gf108,
    /// GF119.
    Gf119,
}

impl Generation {
    /// Returns the capability profile.
    pub const fn caps(self) -> GenerationCaps {
        match self {
            Self::Gf100 => GenerationCaps {
                fbpa_source: FbpaSource::Fbp,
                vblank_heuristic: true,
                partition_hook: false,
            },
            Self::Gf104 => GenerationCaps {
                fbpa_source: FbpaSource::Fbp,
                vblank_heuristic: true,
                partition_hook: true,
            },
            Self::Gf108 => GenerationCaps {
                fbpa_source: FbpaSource::Fbpa,
                vblank_heuristic: true,
                partition_hook: false,
            },
            Self::Gf119 => GenerationCaps {
                fbpa_source: FbpaSource::Fbpa,
                vblank_heuristic: false,
                partition_hook: false,
            },
        }
    }
}
