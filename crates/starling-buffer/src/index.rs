//! Pure seqno-to-slot arithmetic.
//!
//! Both storage variants address slots relative to an `offset`, the
//! seqno just before the first seqno ever expected. The index types
//! here hold only the geometry (capacity, row width); the offset is
//! owned by the buffer and passed in, so the math is stateless and
//! trivially testable.

use starling_core::seqno::{seqno_delta, Seqno};

/// Maps a seqno onto a fixed circular array.
///
/// `slot(s) = (s - offset - 1) mod capacity`. The capacity is exact
/// (not rounded), so a buffer created with capacity 10 holds exactly
/// 10 in-flight seqnos.
#[derive(Clone, Copy, Debug)]
pub struct RingIndex {
    capacity: usize,
}

impl RingIndex {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        RingIndex { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot for `seqno`, or `None` if `seqno <= offset`.
    pub fn slot(&self, seqno: Seqno, offset: Seqno) -> Option<usize> {
        let d = seqno_delta(seqno, offset);
        if d <= 0 {
            return None;
        }
        Some((d as u64 as usize - 1) % self.capacity)
    }
}

/// Maps a seqno onto a (row, column) pair in a row matrix.
///
/// `row = (s - offset) / row_size`, `col = (s - offset) mod row_size`.
/// The row size is rounded up to a power of two so the mod is a mask.
#[derive(Clone, Copy, Debug)]
pub struct MatrixIndex {
    row_size: usize,
}

impl MatrixIndex {
    pub fn new(row_size: usize) -> Self {
        debug_assert!(row_size > 0);
        MatrixIndex {
            row_size: row_size.next_power_of_two(),
        }
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Row holding `seqno`, or `None` if `seqno < offset`.
    pub fn row(&self, seqno: Seqno, offset: Seqno) -> Option<usize> {
        let d = seqno_delta(seqno, offset);
        if d < 0 {
            return None;
        }
        Some(d as u64 as usize / self.row_size)
    }

    /// Column within the row holding `seqno`, or `None` if below offset.
    pub fn col(&self, seqno: Seqno, offset: Seqno) -> Option<usize> {
        let d = seqno_delta(seqno, offset);
        if d < 0 {
            return None;
        }
        Some(d as u64 as usize & (self.row_size - 1))
    }

    /// `(row, col)` for `seqno`, or `None` if below offset.
    pub fn position(&self, seqno: Seqno, offset: Seqno) -> Option<(usize, usize)> {
        Some((self.row(seqno, offset)?, self.col(seqno, offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_slot_mapping() {
        let idx = RingIndex::new(10);
        // offset 5: first valid seqno is 6, landing in slot 0
        assert_eq!(idx.slot(6, 5), Some(0));
        assert_eq!(idx.slot(15, 5), Some(9));
        assert_eq!(idx.slot(16, 5), Some(0)); // wraps
        assert_eq!(idx.slot(5, 5), None);
        assert_eq!(idx.slot(3, 5), None);
    }

    #[test]
    fn test_ring_capacity_is_exact() {
        let idx = RingIndex::new(10);
        assert_eq!(idx.capacity(), 10);
        // ten consecutive seqnos occupy ten distinct slots
        let slots: std::collections::HashSet<_> =
            (6..=15).map(|s| idx.slot(s, 5).unwrap()).collect();
        assert_eq!(slots.len(), 10);
    }

    #[test]
    fn test_matrix_row_size_rounds_to_power_of_two() {
        let idx = MatrixIndex::new(1000);
        assert_eq!(idx.row_size(), 1024);
        let idx = MatrixIndex::new(8192);
        assert_eq!(idx.row_size(), 8192);
    }

    #[test]
    fn test_matrix_position() {
        let idx = MatrixIndex::new(8); // power of two already
        assert_eq!(idx.position(0, 0), Some((0, 0)));
        assert_eq!(idx.position(7, 0), Some((0, 7)));
        assert_eq!(idx.position(8, 0), Some((1, 0)));
        assert_eq!(idx.position(20, 0), Some((2, 4)));
        // offset shifts everything
        assert_eq!(idx.position(3000, 3000), Some((0, 0)));
        assert_eq!(idx.position(3009, 3000), Some((1, 1)));
        assert_eq!(idx.position(2999, 3000), None);
    }

    #[test]
    fn test_mapping_survives_wraparound() {
        let idx = MatrixIndex::new(8);
        let offset = u64::MAX - 3;
        // 4 steps past offset, wrapped to seqno 0
        assert_eq!(idx.position(0, offset), Some((0, 4)));
    }
}
