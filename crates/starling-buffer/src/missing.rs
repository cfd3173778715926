//! Missing-seqno collection.
//!
//! Builds the `SeqnoList` a retransmission request carries. The
//! buffer keeps an O(1) missing count (`high - hd - size`), so
//! callers only pay for a scan when a request is actually built; the
//! scan itself starts at the first gap (everything up to the highest
//! deliverable seqno is known-present) and folds empty slots into
//! runs.
//!
//! A budget caps the result so the request fits its transport: either
//! a maximum number of seqnos (oldest first) or a byte limit on the
//! worst-case encoded size of the list.

use starling_core::list::SeqnoList;
use starling_core::seqno::{seqno_gt, Seqno};

/// Limits how much of the gap set a single request may carry.
#[derive(Clone, Copy, Debug)]
pub enum Budget {
    /// Everything missing.
    Unlimited,
    /// At most this many seqnos, oldest first.
    Count(usize),
    /// Stop before the encoded list would exceed this many bytes.
    Bytes(usize),
}

/// Scans `[from ..= to]`, treating `occupied(s) == false` as a gap,
/// and returns the run-compressed gap list, or `None` when no gap was
/// collected.
pub(crate) fn collect_gaps<F>(from: Seqno, to: Seqno, mut occupied: F, budget: Budget) -> Option<SeqnoList>
where
    F: FnMut(Seqno) -> bool,
{
    if seqno_gt(from, to) {
        return None;
    }
    let mut list = SeqnoList::new();
    let mut gap_start: Option<Seqno> = None;
    let mut s = from;
    loop {
        let past_end = seqno_gt(s, to);
        if !past_end && !occupied(s) {
            gap_start.get_or_insert(s);
        } else if let Some(start) = gap_start.take() {
            if !push_run(&mut list, start, s.wrapping_sub(1), budget) {
                break;
            }
        }
        if past_end {
            break;
        }
        s = s.wrapping_add(1);
    }
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

/// Appends the gap run `from..=to`, clipped to the budget. Returns
/// false once the budget is exhausted.
fn push_run(list: &mut SeqnoList, from: Seqno, to: Seqno, budget: Budget) -> bool {
    match budget {
        Budget::Unlimited => {
            list.add_range(from, to);
            true
        }
        Budget::Count(max) => {
            let remaining = (max as u64).saturating_sub(list.len());
            if remaining == 0 {
                return false;
            }
            let run_len = to.wrapping_sub(from).wrapping_add(1);
            if run_len > remaining {
                list.add_range(from, from.wrapping_add(remaining - 1));
                return false;
            }
            list.add_range(from, to);
            list.len() < max as u64
        }
        Budget::Bytes(max) => {
            if list.serialized_size() + SeqnoList::encoded_run_size(from, to) > max {
                return false;
            }
            list.add_range(from, to);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_core::seqno::seqno_le;

    fn occupied_in(present: &[Seqno]) -> impl FnMut(Seqno) -> bool + '_ {
        move |s| present.contains(&s)
    }

    #[test]
    fn test_collects_runs() {
        // present: 2, 5, 6, 10 -> missing in [2..=10]: 3-4, 7-9
        let list = collect_gaps(2, 10, occupied_in(&[2, 5, 6, 10]), Budget::Unlimited).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![3, 4, 7, 8, 9]);
        assert_eq!(list.num_runs(), 2);
    }

    #[test]
    fn test_none_when_no_gaps() {
        assert!(collect_gaps(1, 3, occupied_in(&[1, 2, 3]), Budget::Unlimited).is_none());
        assert!(collect_gaps(5, 4, |_| false, Budget::Unlimited).is_none());
    }

    #[test]
    fn test_trailing_gap_reaches_end() {
        let list = collect_gaps(1, 5, occupied_in(&[1]), Budget::Unlimited).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_count_budget_clips_oldest_first() {
        let list = collect_gaps(1, 100, occupied_in(&[50]), Budget::Count(5)).unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_byte_budget_stops_between_runs() {
        // two runs; budget admits the first but not the second
        let present: Vec<Seqno> = vec![1, 5, 9];
        let unlimited = collect_gaps(1, 9, occupied_in(&present), Budget::Unlimited).unwrap();
        assert_eq!(unlimited.num_runs(), 2);
        let first_run_only = unlimited.serialized_size()
            - SeqnoList::encoded_run_size(6, 8);
        let list = collect_gaps(1, 9, occupied_in(&present), Budget::Bytes(first_run_only)).unwrap();
        assert_eq!(list.num_runs(), 1);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(list.serialized_size() <= first_run_only);
    }

    #[test]
    fn test_byte_budget_too_small_for_anything() {
        assert!(collect_gaps(1, 9, occupied_in(&[1]), Budget::Bytes(2)).is_none());
    }

    #[test]
    fn test_seqno_le_guard() {
        // single-seqno window with a gap
        let list = collect_gaps(7, 7, |_| false, Budget::Unlimited).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![7]);
        assert!(seqno_le(list.first().unwrap(), list.last().unwrap()));
    }
}
