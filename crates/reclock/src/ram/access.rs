//! Host framebuffer access window.
//!
//! Disabling swaps the low byte of the FB notify register, waits for a vblank so the display
//! does not underflow, notifies the display heads and blocks the host. Re-enabling undoes it in
//! reverse order.

use tracing::debug;

use super::ReclockContext;
use crate::common::constants::{disp, fb};
use crate::script::MaskOpts;

/// Low byte of the notify register.
const NOTIFY_MASK: u32 = 0x0000_00ff;

/// Shuts host access off (`access == false`) or restores it.
///
/// Writes `r100b0c` into the notify register's low byte and returns the byte it replaced.
pub(crate) fn fb_access(ctx: &mut ReclockContext<'_>, access: bool, r100b0c: u8) -> u8 {
    let heads = ctx
        .display
        .map_or(0, |d| d.heads().iter().fold(0u32, |acc, h| acc | (1 << (h.id & 31))));

    let prev = if access {
        ctx.sink.unblock();
        let prev = ctx
            .sink
            .mask_opts(fb::NOTIFY, NOTIFY_MASK, u32::from(r100b0c), MaskOpts::default());
        if heads != 0 {
            ctx.sink
                .wr32(disp::HEAD_NOTIFY, disp::HEAD_RESTORED.wrapping_mul(heads));
        }
        prev
    } else {
        let prev = ctx
            .sink
            .mask_opts(fb::NOTIFY, NOTIFY_MASK, u32::from(r100b0c), MaskOpts::default());
        if heads != 0 {
            match ctx.display {
                Some(display) if ctx.caps.vblank_heuristic => {
                    let _ = ctx.sink.wait_vblank(display);
                }
                _ => debug!("WAIT VBLANK !NO ACTIVE HEAD"),
            }
            ctx.sink
                .wr32(disp::HEAD_NOTIFY, disp::HEAD_BLOCKED.wrapping_mul(heads));
        }
        ctx.sink.block();
        prev
    };
    (prev & NOTIFY_MASK) as u8
}
