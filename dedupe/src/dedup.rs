//! Applies a winning [`Candidate`](crate::search::Candidate): carves its
//! intersection out into a new derived bucket and subtracts that content
//! from every source bucket it came from.

use refset::RefSetTable;

use crate::search::Candidate;
use crate::types::Bucket;

/// Derived bucket names follow the source tool's `dedupeNNNNN` scheme,
/// numbered by the bucket count *after* the new bucket has been appended
/// (so the first derived bucket in an otherwise-empty arena is
/// `dedupe00001`, matching the reference implementation's
/// `snprintf(..., "dedupe%05u", state->bucket_count)` called after
/// `alloc_bucket` has already bumped the count).
fn derived_name(post_append_count: usize) -> String {
    format!("dedupe{post_append_count:05}")
}

/// Carves out `candidate`'s intersection as a new bucket at `new_level`,
/// subtracts it from every source bucket in `candidate.buckets`, and
/// returns the new bucket's index.
///
/// Source buckets keep their own index and level; only their bitset,
/// `ref_count`, `ref_size`, `split_count`, and `split_links` change.
/// Nothing is ever removed from `buckets` or `table` — the arena only
/// grows, so every earlier index stays valid.
pub fn apply_candidate(
    table: &mut RefSetTable,
    buckets: &mut Vec<Bucket>,
    candidate: &Candidate,
    new_level: u32,
) -> usize {
    let mut mask = vec![0u32; table.word_count()];
    table.intersection_into(&candidate.buckets, &mut mask);

    let new_index = table.append_bucket();
    table.set_bucket_words(new_index, &mask);

    let derived = Bucket::derived(derived_name(new_index + 1), new_level);
    buckets.push(derived);
    debug_assert_eq!(buckets.len() - 1, new_index);

    buckets[new_index].ref_count = table.ref_count(new_index) as u32;
    buckets[new_index].ref_size = table.ref_size(new_index);

    for &src in &candidate.buckets {
        table.subtract(src, &mask);
        let b = &mut buckets[src];
        b.ref_count = table.ref_count(src) as u32;
        b.ref_size = table.ref_size(src);
        b.split_count += 1;
        b.split_links.push(new_index as u32);
    }

    new_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carves_shared_items_into_a_new_bucket_and_empties_sources_of_them() {
        let mut table = RefSetTable::new(&[10, 10, 10, 10]);
        let a = table.append_bucket();
        let b = table.append_bucket();
        for i in [0, 1, 2] {
            table.set_ref(a, i);
        }
        for i in [1, 2, 3] {
            table.set_ref(b, i);
        }

        let mut buckets = vec![Bucket::input("a".into(), 3, 30), Bucket::input("b".into(), 3, 30)];
        let candidate =
            Candidate { buckets: vec![a, b], k: 2, score: 20, weighted_score: 20 };

        let derived = apply_candidate(&mut table, &mut buckets, &candidate, 1);

        assert_eq!(table.items_ascending(derived), vec![1, 2]);
        assert_eq!(table.items_ascending(a), vec![0]);
        assert_eq!(table.items_ascending(b), vec![3]);

        assert_eq!(buckets[derived].ref_size, 20);
        assert_eq!(buckets[a].ref_size, 10);
        assert_eq!(buckets[a].split_count, 1);
        assert_eq!(buckets[a].split_links, vec![derived as u32]);
        assert_eq!(buckets[b].split_links, vec![derived as u32]);
        assert_eq!(buckets[derived].level, 1);
        assert_eq!(buckets[derived].name, "dedupe00003");
    }
}
