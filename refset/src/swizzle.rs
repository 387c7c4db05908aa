//! The tile swizzle that maps a logical item id to its physical bit position.
//!
//! Items are grouped into 128-wide tiles. Within a tile, 32 rows (the
//! low 5 bits of the id) are interleaved with 4 columns (the next 2
//! bits), so that a work-group of 32 lanes reading 4 consecutive
//! 32-bit words covers a whole tile with coalesced accesses:
//!
//! ```text
//!   0   32  64  96
//!   1   33  65  97
//!   ...
//!   31  63  95 127
//! ```

/// Rounds `n` up to the next multiple of 128 (the tile width).
#[inline]
pub const fn padded_len(n: usize) -> usize {
    (n + 127) & !127
}

/// Maps a logical item id to its physical bit position within the tile layout.
#[inline(always)]
pub const fn swizzle(i: usize) -> usize {
    let local_row = i & 31;
    let local_column = (i >> 5) & 3;
    let vertical_group = i & !127;
    (local_row << 2) | local_column | vertical_group
}

/// The inverse of [`swizzle`]: maps a physical bit position back to the logical item id.
#[inline(always)]
pub const fn unswizzle(p: usize) -> usize {
    let vertical_group = p & !127;
    let remainder = p & 127;
    let local_column = remainder & 3;
    let local_row = remainder >> 2;
    vertical_group | (local_column << 5) | local_row
}
