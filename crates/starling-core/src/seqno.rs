//! Sequence-number arithmetic.
//!
//! A seqno is a per-sender monotonically increasing `u64`. All
//! comparisons between live seqnos go through the signed-difference
//! helpers below rather than `<`/`>`, so orderings stay correct even
//! if a seqno domain wraps: two seqnos are compared by where they sit
//! relative to each other, not by their absolute value.
//!
//! The helpers assume the distance between any two live seqnos fits
//! in an `i64`, which holds as long as a buffer never spans more than
//! 2^63 outstanding entries.

/// Per-sender monotonically increasing sequence number.
pub type Seqno = u64;

/// Signed distance from `b` to `a` (`a - b`), wraparound-safe.
#[inline]
pub fn seqno_delta(a: Seqno, b: Seqno) -> i64 {
    a.wrapping_sub(b) as i64
}

/// True if `a > b` in seqno order.
#[inline]
pub fn seqno_gt(a: Seqno, b: Seqno) -> bool {
    seqno_delta(a, b) > 0
}

/// True if `a >= b` in seqno order.
#[inline]
pub fn seqno_ge(a: Seqno, b: Seqno) -> bool {
    seqno_delta(a, b) >= 0
}

/// True if `a < b` in seqno order.
#[inline]
pub fn seqno_lt(a: Seqno, b: Seqno) -> bool {
    seqno_delta(a, b) < 0
}

/// True if `a <= b` in seqno order.
#[inline]
pub fn seqno_le(a: Seqno, b: Seqno) -> bool {
    seqno_delta(a, b) <= 0
}

/// The larger of two seqnos in seqno order.
#[inline]
pub fn seqno_max(a: Seqno, b: Seqno) -> Seqno {
    if seqno_ge(a, b) {
        a
    } else {
        b
    }
}

/// The smaller of two seqnos in seqno order.
#[inline]
pub fn seqno_min(a: Seqno, b: Seqno) -> Seqno {
    if seqno_le(a, b) {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ordering() {
        assert!(seqno_gt(5, 3));
        assert!(!seqno_gt(3, 5));
        assert!(!seqno_gt(4, 4));
        assert!(seqno_ge(4, 4));
        assert!(seqno_lt(3, 5));
        assert!(seqno_le(5, 5));
    }

    #[test]
    fn test_ordering_across_wraparound() {
        let before = u64::MAX - 2;
        let after = 3u64; // 6 steps past `before`, wrapped
        assert!(seqno_gt(after, before));
        assert!(seqno_lt(before, after));
        assert_eq!(seqno_delta(after, before), 6);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(seqno_max(7, 9), 9);
        assert_eq!(seqno_min(7, 9), 7);
        let before = u64::MAX - 1;
        assert_eq!(seqno_max(before, 1), 1);
        assert_eq!(seqno_min(before, 1), before);
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(seqno_delta(10, 4), 6);
        assert_eq!(seqno_delta(4, 10), -6);
        assert_eq!(seqno_delta(4, 4), 0);
    }
}
