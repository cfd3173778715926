//! Slot storage behind the buffer.
//!
//! Two variants share one interface (a tagged enum, not a class
//! hierarchy): a bounded circular array that never grows, and a
//! growable list of fixed-size rows. Rows are allocated lazily on
//! first write and dropped wholesale once every slot in them falls
//! below the low watermark, which is what keeps a long-lived growable
//! buffer's memory proportional to its live window rather than its
//! history.
//!
//! All methods are called with the owning buffer's lock held; growth,
//! row moves and compaction relocate physical storage and are
//! therefore mutually exclusive with in-flight adds by construction.

use crate::buffer::BufferStats;
use crate::index::{MatrixIndex, RingIndex};
use starling_core::seqno::{seqno_le, Seqno};

type Row<T> = Box<[Option<T>]>;

fn empty_row<T>(row_size: usize) -> Row<T> {
    std::iter::repeat_with(|| None)
        .take(row_size)
        .collect::<Vec<_>>()
        .into_boxed_slice()
}

pub(crate) enum Storage<T> {
    Bounded {
        slots: Box<[Option<T>]>,
        index: RingIndex,
    },
    Growable {
        rows: Vec<Option<Row<T>>>,
        index: MatrixIndex,
        /// Row count the matrix never shrinks below.
        base_rows: usize,
    },
}

impl<T> Storage<T> {
    pub fn bounded(capacity: usize) -> Self {
        Storage::Bounded {
            slots: empty_row(capacity),
            index: RingIndex::new(capacity),
        }
    }

    pub fn growable(num_rows: usize, row_size: usize) -> Self {
        let index = MatrixIndex::new(row_size);
        let mut rows = Vec::with_capacity(num_rows);
        rows.resize_with(num_rows, || None);
        Storage::Growable {
            rows,
            index,
            base_rows: num_rows,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Storage::Bounded { .. })
    }

    /// Number of slots currently addressable.
    pub fn capacity(&self) -> usize {
        match self {
            Storage::Bounded { slots, .. } => slots.len(),
            Storage::Growable { rows, index, .. } => rows.len() * index.row_size(),
        }
    }

    /// Number of rows (growable only; 1 for bounded).
    pub fn num_rows(&self) -> usize {
        match self {
            Storage::Bounded { .. } => 1,
            Storage::Growable { rows, .. } => rows.len(),
        }
    }

    /// True if `seqno` maps into currently-allocated coverage.
    pub fn covers(&self, seqno: Seqno, offset: Seqno) -> bool {
        match self {
            Storage::Bounded { .. } => true, // window check is the buffer's job
            Storage::Growable { rows, index, .. } => match index.row(seqno, offset) {
                Some(row) => row < rows.len(),
                None => false,
            },
        }
    }

    /// Read-only view of the slot for `seqno`.
    pub fn get(&self, seqno: Seqno, offset: Seqno) -> Option<&T> {
        match self {
            Storage::Bounded { slots, index } => {
                slots[index.slot(seqno, offset)?].as_ref()
            }
            Storage::Growable { rows, index, .. } => {
                let (row, col) = index.position(seqno, offset)?;
                rows.get(row)?.as_ref()?[col].as_ref()
            }
        }
    }

    /// Mutable slot for `seqno`, allocating the backing row if needed.
    /// Returns `None` when `seqno` is below the offset or (growable)
    /// beyond current coverage — callers grow first.
    pub fn slot_mut(&mut self, seqno: Seqno, offset: Seqno) -> Option<&mut Option<T>> {
        match self {
            Storage::Bounded { slots, index } => {
                let slot = index.slot(seqno, offset)?;
                Some(&mut slots[slot])
            }
            Storage::Growable { rows, index, .. } => {
                let (row, col) = index.position(seqno, offset)?;
                let row = rows.get_mut(row)?;
                let row = row.get_or_insert_with(|| empty_row(index.row_size()));
                Some(&mut row[col])
            }
        }
    }

    /// Removes and returns the element at `seqno`, if present. Never
    /// allocates a row.
    pub fn take(&mut self, seqno: Seqno, offset: Seqno) -> Option<T> {
        match self {
            Storage::Bounded { slots, index } => slots[index.slot(seqno, offset)?].take(),
            Storage::Growable { rows, index, .. } => {
                let (row, col) = index.position(seqno, offset)?;
                rows.get_mut(row)?.as_mut()?[col].take()
            }
        }
    }

    /// Extends coverage so `seqno` is addressable, first reclaiming
    /// rows that lie entirely below `low`. Returns the new offset.
    /// Bounded storage never grows and returns `offset` unchanged.
    pub fn grow(
        &mut self,
        seqno: Seqno,
        low: Seqno,
        offset: Seqno,
        stats: &mut BufferStats,
    ) -> Seqno {
        match self {
            Storage::Bounded { .. } => offset,
            Storage::Growable { rows, index, .. } => {
                let rows_to_purge = index.row(low, offset).unwrap_or(0);
                let target_row = match index.row(seqno, offset) {
                    Some(r) => r,
                    None => return offset,
                };
                if target_row < rows_to_purge {
                    return offset;
                }
                let needed = target_row - rows_to_purge + 1;
                if needed > rows.len() {
                    rows.drain(..rows_to_purge);
                    rows.resize_with(needed, || None);
                    stats.num_resizes += 1;
                } else if rows_to_purge > 0 {
                    // enough total rows; slide the live suffix down
                    let len = rows.len();
                    rows.drain(..rows_to_purge);
                    rows.resize_with(len, || None);
                    stats.num_moves += 1;
                } else {
                    return offset;
                }
                offset.wrapping_add((rows_to_purge * index.row_size()) as u64)
            }
        }
    }

    /// Shrinks the row list when a large purged prefix exists,
    /// keeping `[low .. high]` plus headroom of `resize_factor`.
    /// Returns the new offset (unchanged if no compaction happened).
    pub fn compact(
        &mut self,
        low: Seqno,
        high: Seqno,
        offset: Seqno,
        resize_factor: f64,
        stats: &mut BufferStats,
    ) -> Seqno {
        match self {
            Storage::Bounded { .. } => offset,
            Storage::Growable {
                rows,
                index,
                base_rows,
            } => {
                let from = index.row(low, offset).unwrap_or(0);
                let to = index.row(high, offset).unwrap_or(0);
                if to < from {
                    return offset;
                }
                let range = to - from + 1;
                let new_size = ((range as f64 * resize_factor).max(range as f64 + 1.0)) as usize;
                let new_size = new_size.max(*base_rows);
                if new_size >= rows.len() {
                    return offset;
                }
                rows.drain(..from);
                rows.resize_with(new_size, || None);
                stats.num_compactions += 1;
                offset.wrapping_add((from * index.row_size()) as u64)
            }
        }
    }

    /// Clears every slot in `(low, target]`, dropping growable rows
    /// that fall entirely below `target`. Returns the number of
    /// occupied slots cleared.
    pub fn purge_clear(&mut self, low: Seqno, target: Seqno, offset: Seqno) -> usize {
        let mut purged = 0;
        match self {
            Storage::Bounded { slots, index } => {
                let mut s = low.wrapping_add(1);
                while seqno_le(s, target) {
                    if let Some(slot) = index.slot(s, offset) {
                        if slots[slot].take().is_some() {
                            purged += 1;
                        }
                    }
                    s = s.wrapping_add(1);
                }
            }
            Storage::Growable { rows, index, .. } => {
                let start_row = index.row(low, offset).unwrap_or(0);
                let end_row = match index.row(target, offset) {
                    Some(r) => r.min(rows.len().saturating_sub(1)),
                    None => return 0,
                };
                // drop rows that are fully below target
                for slot in rows.iter_mut().take(end_row).skip(start_row) {
                    if let Some(row) = slot.take() {
                        purged += row.iter().filter(|e| e.is_some()).count();
                    }
                }
                // clear the leading part of target's own row
                if let Some(Some(row)) = rows.get_mut(end_row) {
                    if let Some(last_col) = index.col(target, offset) {
                        for entry in row.iter_mut().take(last_col + 1) {
                            if entry.take().is_some() {
                                purged += 1;
                            }
                        }
                    }
                }
            }
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> BufferStats {
        BufferStats::default()
    }

    #[test]
    fn test_bounded_put_get_take() {
        let mut st: Storage<u32> = Storage::bounded(8);
        *st.slot_mut(3, 0).unwrap() = Some(30);
        assert_eq!(st.get(3, 0), Some(&30));
        assert_eq!(st.take(3, 0), Some(30));
        assert_eq!(st.get(3, 0), None);
        assert!(st.slot_mut(0, 0).is_none()); // at offset
    }

    #[test]
    fn test_growable_allocates_rows_lazily() {
        let mut st: Storage<u32> = Storage::growable(3, 4);
        assert_eq!(st.capacity(), 12);
        assert_eq!(st.get(5, 0), None); // row exists but unallocated
        *st.slot_mut(5, 0).unwrap() = Some(50);
        assert_eq!(st.get(5, 0), Some(&50));
        // seqno beyond coverage needs a grow first
        assert!(!st.covers(12, 0));
        assert!(st.slot_mut(12, 0).is_none());
    }

    #[test]
    fn test_grow_extends_coverage() {
        let mut st: Storage<u32> = Storage::growable(2, 4);
        let mut s = stats();
        let offset = st.grow(20, 0, 0, &mut s);
        assert_eq!(offset, 0); // nothing purged, offset unchanged
        assert!(st.covers(20, 0));
        assert_eq!(s.num_resizes, 1);
    }

    #[test]
    fn test_grow_reclaims_purged_rows() {
        let mut st: Storage<u32> = Storage::growable(2, 4);
        let mut s = stats();
        *st.slot_mut(1, 0).unwrap() = Some(1);
        *st.slot_mut(5, 0).unwrap() = Some(5);
        st.purge_clear(0, 5, 0);
        // low=5: row 0 is fully purged and can be reclaimed
        let offset = st.grow(13, 5, 0, &mut s);
        assert_eq!(offset, 4);
        assert!(st.covers(13, offset));
        // either moved or resized, depending on geometry
        assert_eq!(s.num_resizes + s.num_moves, 1);
    }

    #[test]
    fn test_purge_clear_counts_occupied_only() {
        let mut st: Storage<u32> = Storage::growable(4, 4);
        for s in [1u64, 2, 6, 9] {
            *st.slot_mut(s, 0).unwrap() = Some(s as u32);
        }
        let purged = st.purge_clear(0, 7, 0);
        assert_eq!(purged, 3); // 1, 2, 6; seqno 9 survives
        assert_eq!(st.get(9, 0), Some(&9));
        assert_eq!(st.get(6, 0), None);
    }

    #[test]
    fn test_compact_shrinks_row_list() {
        let mut st: Storage<u32> = Storage::growable(2, 4);
        let mut s = stats();
        let offset = st.grow(40, 0, 0, &mut s);
        assert!(st.num_rows() >= 11);
        *st.slot_mut(39, offset).unwrap() = Some(39);
        *st.slot_mut(40, offset).unwrap() = Some(40);
        st.purge_clear(0, 38, offset);
        // live window is [38 .. 40]; most rows are dead prefix
        let new_offset = st.compact(38, 40, offset, 1.2, &mut s);
        assert!(new_offset > offset);
        assert!(st.num_rows() < 11);
        assert_eq!(s.num_compactions, 1);
        assert_eq!(st.get(39, new_offset), Some(&39));
        assert_eq!(st.get(40, new_offset), Some(&40));
    }
}
