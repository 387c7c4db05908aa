use aligned_vec::{AVec, ConstAlign};
use bitm::ceiling_div;
use dyn_size_of::GetSize;

use crate::bitops::{and_into, count_ones, xor_into, BitOnesIterator};
use crate::swizzle::{padded_len, swizzle, unswizzle};

/// How many buckets worth of storage to reserve each time [`RefSetTable::append_bucket`]
/// runs out of room. Matches the source implementation's `bucket_capacity + 64` scheme.
const BUCKET_GROWTH: usize = 64;

/// Alignment (in bytes) used for the bitset and size storage, so that the
/// host-side scalar scoring path can use SIMD-width loads.
const ALIGN: usize = 16;

/// Owns every bucket's reference bitset plus the (swizzled) item-size
/// vector they are scored against.
///
/// Bit positions are resolved through the [`crate::swizzle`] layout;
/// every public method that takes or returns an item id uses the
/// natural `0..item_count` numbering, never the swizzled one.
pub struct RefSetTable {
    item_count: usize,
    padded_item_count: usize,
    word_count: usize,
    sizes: AVec<u32, ConstAlign<ALIGN>>,
    bucket_refs: AVec<u32, ConstAlign<ALIGN>>,
    bucket_count: usize,
    bucket_capacity: usize,
}

impl RefSetTable {
    /// Builds a table with no buckets yet, for `item_sizes.len()` items.
    pub fn new(item_sizes: &[u32]) -> Self {
        let item_count = item_sizes.len();
        let padded_item_count = padded_len(item_count);
        let word_count = ceiling_div(padded_item_count, 32);

        let mut sizes = AVec::<u32, ConstAlign<ALIGN>>::new(ALIGN);
        sizes.resize(padded_item_count, 0);
        for (i, &size) in item_sizes.iter().enumerate() {
            sizes[swizzle(i)] = size;
        }

        Self {
            item_count,
            padded_item_count,
            word_count,
            sizes,
            bucket_refs: AVec::new(ALIGN),
            bucket_count: 0,
            bucket_capacity: 0,
        }
    }

    /// Number of items this table was built for.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// `item_count` rounded up to a multiple of the 128-item tile.
    #[inline]
    pub fn padded_item_count(&self) -> usize {
        self.padded_item_count
    }

    /// Number of 32-bit words per bucket's bitset.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Number of buckets currently stored.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Size, in bytes, of the item at natural index `item`.
    #[inline]
    pub fn item_size(&self, item: usize) -> u32 {
        self.sizes[swizzle(item)]
    }

    #[inline]
    fn bucket_range(&self, bucket: usize) -> std::ops::Range<usize> {
        let start = bucket * self.word_count;
        start..start + self.word_count
    }

    /// Read-only view of a bucket's bitset words, in swizzled physical order.
    #[inline]
    pub fn bucket_words(&self, bucket: usize) -> &[u32] {
        &self.bucket_refs[self.bucket_range(bucket)]
    }

    /// Mutable view of a bucket's bitset words, in swizzled physical order.
    #[inline]
    pub fn bucket_words_mut(&mut self, bucket: usize) -> &mut [u32] {
        let range = self.bucket_range(bucket);
        &mut self.bucket_refs[range]
    }

    /// Sets the bit for `item` in `bucket`.
    #[inline]
    pub fn set_ref(&mut self, bucket: usize, item: usize) {
        let p = swizzle(item);
        let (word, bit) = (p / 32, p % 32);
        self.bucket_words_mut(bucket)[word] |= 1 << bit;
    }

    /// Returns whether `item` is a member of `bucket`.
    #[inline]
    pub fn get_ref(&self, bucket: usize, item: usize) -> bool {
        let p = swizzle(item);
        let (word, bit) = (p / 32, p % 32);
        self.bucket_words(bucket)[word] & (1 << bit) != 0
    }

    /// Number of items referenced by `bucket` (`popcount` of its bitset).
    #[inline]
    pub fn ref_count(&self, bucket: usize) -> usize {
        count_ones(self.bucket_words(bucket))
    }

    /// Summed byte size of the items referenced by `bucket`.
    pub fn ref_size(&self, bucket: usize) -> u64 {
        self.sum_sizes(self.bucket_words(bucket))
    }

    /// Sums the sizes of the set bits in an arbitrary (swizzled) word slice
    /// of length `word_count()`, e.g. a scratch intersection buffer not
    /// (yet) attached to any bucket. Word `w` of any such slice always
    /// holds the same swizzled positions `[w*32, w*32+32)` as word `w` of
    /// a bucket's own bitset, so the bit position within the slice is
    /// already the swizzled position to look the size up at.
    pub fn sum_sizes(&self, words: &[u32]) -> u64 {
        debug_assert_eq!(words.len(), self.word_count);
        BitOnesIterator::new(words).map(|p| self.sizes[p] as u64).sum()
    }

    /// Natural item ids currently referenced by `bucket`, in ascending order.
    pub fn items_ascending(&self, bucket: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = BitOnesIterator::new(self.bucket_words(bucket))
            .map(|p| unswizzle(p) as u32)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Appends a new, all-zero bucket and returns its index.
    pub fn append_bucket(&mut self) -> usize {
        if self.bucket_count == self.bucket_capacity {
            self.bucket_capacity += BUCKET_GROWTH;
            self.bucket_refs.resize(self.bucket_capacity * self.word_count, 0);
        }
        let index = self.bucket_count;
        self.bucket_count += 1;
        index
    }

    /// Computes the intersection of the given buckets' bitsets into `scratch`
    /// (which must be `word_count()` words long): `scratch = AND of all sources`.
    pub fn intersection_into(&self, buckets: &[usize], scratch: &mut [u32]) {
        debug_assert_eq!(scratch.len(), self.word_count);
        scratch.fill(u32::MAX);
        for &b in buckets {
            and_into(scratch, self.bucket_words(b));
        }
        // Bits beyond `item_count` (tile padding) are never set by callers,
        // so no separate mask-off step is required here.
    }

    /// Subtracts `mask` (assumed to be a subset of `bucket`'s bitset) from `bucket`.
    pub fn subtract(&mut self, bucket: usize, mask: &[u32]) {
        xor_into(self.bucket_words_mut(bucket), mask);
    }

    /// Copies `words` into `bucket`'s storage, replacing its previous contents.
    pub fn set_bucket_words(&mut self, bucket: usize, words: &[u32]) {
        self.bucket_words_mut(bucket).copy_from_slice(words);
    }
}

impl GetSize for RefSetTable {
    fn size_bytes_dyn(&self) -> usize {
        self.sizes.capacity() * std::mem::size_of::<u32>()
            + self.bucket_refs.capacity() * std::mem::size_of::<u32>()
    }

    const USES_DYN_MEM: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RefSetTable {
        RefSetTable::new(&[10, 20, 30, 40, 50])
    }

    #[test]
    fn new_table_has_expected_geometry() {
        let t = sample();
        assert_eq!(t.item_count(), 5);
        assert_eq!(t.padded_item_count(), 128);
        assert_eq!(t.word_count(), 4);
        assert_eq!(t.bucket_count(), 0);
    }

    #[test]
    fn append_bucket_starts_empty() {
        let mut t = sample();
        let b = t.append_bucket();
        assert_eq!(t.ref_count(b), 0);
        assert_eq!(t.ref_size(b), 0);
        assert!(t.bucket_words(b).iter().all(|&w| w == 0));
    }

    #[test]
    fn set_ref_round_trips_through_get_ref() {
        let mut t = sample();
        let b = t.append_bucket();
        t.set_ref(b, 0);
        t.set_ref(b, 4);
        for i in 0..5 {
            assert_eq!(t.get_ref(b, i), i == 0 || i == 4);
        }
    }

    #[test]
    fn ref_count_and_ref_size_track_membership() {
        let mut t = sample();
        let b = t.append_bucket();
        t.set_ref(b, 1);
        t.set_ref(b, 3);
        assert_eq!(t.ref_count(b), 2);
        assert_eq!(t.ref_size(b), 20 + 40);
    }

    #[test]
    fn items_ascending_is_sorted_and_natural() {
        let mut t = sample();
        let b = t.append_bucket();
        for i in [4, 0, 2] {
            t.set_ref(b, i);
        }
        assert_eq!(t.items_ascending(b), vec![0, 2, 4]);
    }

    #[test]
    fn intersection_into_computes_and_of_sources() {
        let mut t = sample();
        let a = t.append_bucket();
        let b = t.append_bucket();
        for i in [0, 1, 2] {
            t.set_ref(a, i);
        }
        for i in [1, 2, 3] {
            t.set_ref(b, i);
        }
        let mut scratch = vec![0u32; t.word_count()];
        t.intersection_into(&[a, b], &mut scratch);
        let ids: Vec<u32> = BitOnesIterator::new(&scratch).map(|p| unswizzle(p) as u32).collect();
        let mut ids = ids;
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn subtract_removes_mask_bits_only() {
        let mut t = sample();
        let a = t.append_bucket();
        for i in [0, 1, 2] {
            t.set_ref(a, i);
        }
        let mut mask = vec![0u32; t.word_count()];
        {
            let p = swizzle(1);
            mask[p / 32] |= 1 << (p % 32);
        }
        t.subtract(a, &mask);
        assert_eq!(t.items_ascending(a), vec![0, 2]);
    }

    #[test]
    fn appending_past_growth_chunk_preserves_existing_buckets() {
        let mut t = RefSetTable::new(&vec![1u32; 10]);
        let first = t.append_bucket();
        t.set_ref(first, 0);
        for _ in 0..BUCKET_GROWTH {
            t.append_bucket();
        }
        assert_eq!(t.items_ascending(first), vec![0]);
    }
}
