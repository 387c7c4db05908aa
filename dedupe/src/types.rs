//! The bucket arena. Bitsets live in a [`refset::RefSetTable`] alongside
//! this metadata, indexed by the same bucket index — buckets reference
//! each other by that stable index, never by pointer, so the arena can
//! grow by simple `Vec` push without disturbing existing links.

use dyn_size_of::GetSize;

/// Metadata for one bucket. The bitset itself lives in the matching slot
/// of a [`refset::RefSetTable`]; `ref_count`/`ref_size` are cached here
/// and kept in lock-step with it by every mutating operation.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub name: String,
    pub level: u32,
    pub ref_count: u32,
    pub ref_size: u64,
    pub split_count: u32,
    pub split_links: Vec<u32>,
}

impl Bucket {
    pub(crate) fn input(name: String, ref_count: u32, ref_size: u64) -> Self {
        Self { name, level: 0, ref_count, ref_size, split_count: 0, split_links: Vec::new() }
    }

    pub(crate) fn derived(name: String, level: u32) -> Self {
        Self { name, level, ref_count: 0, ref_size: 0, split_count: 0, split_links: Vec::new() }
    }
}

impl GetSize for Bucket {
    fn size_bytes_dyn(&self) -> usize {
        self.name.capacity() + self.split_links.capacity() * std::mem::size_of::<u32>()
    }

    const USES_DYN_MEM: bool = true;
}
