//! Property-based tests for run-encoded seqno lists.

use proptest::prelude::*;
use starling_core::list::SeqnoList;

/// Builds a list from a strictly ascending set of seqnos.
fn from_set(seqnos: &std::collections::BTreeSet<u64>) -> SeqnoList {
    let mut list = SeqnoList::new();
    for s in seqnos {
        list.add(*s);
    }
    list
}

proptest! {
    // run compression never changes the covered set
    #[test]
    fn compression_is_lossless(seqnos in proptest::collection::btree_set(0u64..10_000, 0..200)) {
        let list = from_set(&seqnos);
        prop_assert_eq!(list.len() as usize, seqnos.len());
        let expanded: Vec<u64> = list.iter().collect();
        prop_assert_eq!(expanded, seqnos.iter().copied().collect::<Vec<_>>());
    }

    // runs are maximal: no two adjacent runs could have been merged
    #[test]
    fn runs_are_maximal(seqnos in proptest::collection::btree_set(0u64..1_000, 0..200)) {
        let list = from_set(&seqnos);
        let runs: Vec<_> = list.runs().copied().collect();
        for pair in runs.windows(2) {
            prop_assert!(pair[0].last() + 1 < pair[1].first());
        }
    }

    // size accounting matches a run-by-run recount
    #[test]
    fn serialized_size_is_sum_of_runs(seqnos in proptest::collection::btree_set(0u64..100_000, 0..100)) {
        let list = from_set(&seqnos);
        let recount: usize = list
            .runs()
            .map(|r| SeqnoList::encoded_run_size(r.first(), r.last()))
            .sum::<usize>();
        // header byte + 2-byte run count (always < 256 runs here)
        prop_assert_eq!(list.serialized_size(), 3 + recount);
    }

    // clipping below a cut behaves like filtering the expanded set
    #[test]
    fn remove_below_matches_naive_filter(
        seqnos in proptest::collection::btree_set(0u64..2_000, 0..150),
        cut in 0u64..2_500,
    ) {
        let mut list = from_set(&seqnos);
        list.remove_seqnos_below(cut);
        let expected: Vec<u64> = seqnos.iter().copied().filter(|s| *s >= cut).collect();
        prop_assert_eq!(list.iter().collect::<Vec<_>>(), expected);
        prop_assert_eq!(list.len() as usize, seqnos.iter().filter(|s| **s >= cut).count());
    }
}
