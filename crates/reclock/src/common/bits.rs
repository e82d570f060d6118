//! Bit-field helpers.
//!
//! Register layouts are described by masks; these helpers move values in and out of the
//! masked positions so callers never hard-code shift amounts.

/// Returns the shift of the lowest set bit in `mask` (`__ffs`).
///
/// An empty mask has no field; it yields 0 so callers degrade to a no-op insert.
#[inline]
pub const fn shift_of(mask: u32) -> u32 {
    if mask == 0 { 0 } else { mask.trailing_zeros() }
}

/// Extracts the field selected by `mask` from `value`, right-aligned.
#[inline]
pub const fn extract(value: u32, mask: u32) -> u32 {
    (value & mask) >> shift_of(mask)
}

/// Places `field` into the position selected by `mask`, discarding bits that do not fit.
#[inline]
pub const fn insert(field: u32, mask: u32) -> u32 {
    (field << shift_of(mask)) & mask
}

/// Replaces the bits selected by `mask` in `value` with `field`.
#[inline]
pub const fn replace(value: u32, mask: u32, field: u32) -> u32 {
    (value & !mask) | insert(field, mask)
}
