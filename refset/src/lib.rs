#![doc = include_str!("../README.md")]

mod swizzle;
pub use swizzle::{padded_len, swizzle, unswizzle};

mod bitops;
pub use bitops::{and_into, count_ones, xor_into, BitOnesIterator};

mod table;
pub use table::RefSetTable;
