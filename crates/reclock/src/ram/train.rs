//! Link training.
//!
//! Two pieces: the training control writes recorded inside a reconfiguration, and the one-time
//! upload of training patterns at init.

use serde::Deserialize;
use tracing::debug;

use super::ReclockContext;
use crate::common::constants::fb;
use crate::soc::RegisterSpace;

/// Training control bit that starts training and requires waiting for completion.
const TRAIN_START: u32 = 0x8000_0000;

/// Training mask bits that indicate a complete set of vendor patterns.
const PATTERN_MASK: u16 = 0x03c3;

/// Training mask bit that indicates a type-04 table.
const TYPE04_MASK: u16 = 0x0010;

/// Pattern entries uploaded per port.
const PATTERN_ENTRIES: u32 = 0x30;

/// Type-04 entries uploaded per port.
const TYPE04_ENTRIES: u32 = 0x100;

/// Default select-port pattern bytes.
const DEFAULT_SELECT: [u32; 12] = [
    0x00, 0xff, 0x55, 0xaa, 0x33, 0xcc, 0x00, 0xff, 0xff, 0x00, 0xff, 0x00,
];

/// Default data-port pattern words.
const DEFAULT_DATA: [u32; 12] = [
    0x00000000, 0xffffffff, 0x55555555, 0xaaaaaaaa, 0x33333333, 0xcccccccc, 0xf0f0f0f0,
    0x0f0f0f0f, 0x00ff00ff, 0xff00ff00, 0x0000ffff, 0xffff0000,
];

/// Training tables parsed from the vendor BIOS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrainingData {
    /// Bit `n` set when table type `n` was found.
    pub mask: u16,
    /// Type 0x00 data-port words, rank 0.
    pub type00: Vec<u32>,
    /// Type 0x01 data-port words, rank 1.
    pub type01: Vec<u32>,
    /// Type 0x04 table.
    pub type04: Vec<u32>,
    /// Type 0x06 select low nibble, rank 0.
    pub type06: Vec<u32>,
    /// Type 0x07 select low nibble, rank 1.
    pub type07: Vec<u32>,
    /// Type 0x08 select high nibble, rank 0.
    pub type08: Vec<u32>,
    /// Type 0x09 select high nibble, rank 1.
    pub type09: Vec<u32>,
}

fn at(table: &[u32], i: u32) -> u32 {
    table.get(i as usize).copied().unwrap_or(0)
}

/// Records training control `data` on both halves and, when it starts training, a completion
/// wait per present partition address unit.
pub(crate) fn calc_train(ctx: &mut ReclockContext<'_>, mask: u32, data: u32) {
    ctx.sink.mask(fb::TRAIN_CTRL0, mask, data);
    ctx.sink.mask(fb::TRAIN_CTRL1, mask, data);

    if data & TRAIN_START != 0 {
        let timeout = ctx.config.timeouts.train_ns;
        for fbpa in ctx.partitions.fbpa_indices() {
            let addr = fb::TRAIN_STATUS + fbpa * fb::PART_STRIDE;
            ctx.sink.wait(addr, 0x0000_000f, 0x0000_0000, timeout);
        }
    }
}

/// Uploads link-training patterns directly to the hardware.
///
/// Uses the vendor patterns when every table they need is present, the built-in defaults
/// otherwise, and the type-04 table when available.
pub fn upload_patterns(regs: &mut dyn RegisterSpace, train: &TrainingData) {
    if train.mask & PATTERN_MASK == PATTERN_MASK {
        for i in 0..PATTERN_ENTRIES {
            for j in [0, 4] {
                regs.wr32(fb::TRAIN_INDEX + j, i << 8);
                regs.wr32(
                    fb::TRAIN_SELECT + j,
                    (at(&train.type08, i) << 4) | at(&train.type06, i),
                );
                regs.wr32(fb::TRAIN_DATA + j, at(&train.type00, i));
                regs.wr32(
                    fb::TRAIN_SELECT + j,
                    0x100 | (at(&train.type09, i) << 4) | at(&train.type07, i),
                );
                regs.wr32(fb::TRAIN_DATA + j, at(&train.type01, i));
            }
        }
    } else {
        debug!("missing link training data, using defaults");
        for i in 0..PATTERN_ENTRIES {
            let k = (i % 12) as usize;
            for j in [0, 4] {
                regs.wr32(fb::TRAIN_INDEX + j, i << 8);
                regs.wr32(fb::TRAIN_SELECT + j, 0x100 | DEFAULT_SELECT[k]);
                regs.wr32(fb::TRAIN_DATA + j, DEFAULT_DATA[k]);
                regs.wr32(fb::TRAIN_SELECT + j, DEFAULT_SELECT[k]);
                regs.wr32(fb::TRAIN_DATA + j, DEFAULT_DATA[k]);
            }
        }
    }

    if train.mask & TYPE04_MASK != 0 {
        for j in [0, 4] {
            for i in 0..TYPE04_ENTRIES {
                regs.wr32(fb::TRAIN_INDEX + j, i);
                regs.wr32(fb::TRAIN_TYPE04 + j, at(&train.type04, i));
            }
        }
    }
}
