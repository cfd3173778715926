//! The seqno-indexed reliable-delivery buffer.
//!
//! A `SeqnoBuffer` stores elements (typically messages) tagged with a
//! per-sender monotonically increasing seqno, arriving concurrently
//! and out of order. It tracks three watermarks:
//!
//! - `low`: seqnos at or below this are purged and no longer retained
//! - `hd`: highest seqno delivered (removed) in contiguous order
//! - `high`: highest seqno ever inserted
//!
//! with `low <= hd <= high` at all times. Consumption is strictly
//! in-order from `hd + 1`; gaps are never skipped. The set of missing
//! seqnos feeds retransmission requests, and `purge` reclaims the
//! prefix the group has agreed is stable.
//!
//! Two storage variants sit behind one type, chosen at construction:
//! a bounded ring (which can block or drop producers when full) and a
//! growable row matrix (which extends and compacts itself).
//!
//! # Concurrency
//!
//! Any number of threads may call `add`/`add_batch`; one logical
//! consumer calls `remove`/`remove_many`; an independent stability
//! thread calls `purge` at any time. One mutex guards storage and
//! bookkeeping, and the blocking gate's condition variable shares it,
//! so growth, compaction and purge are mutually exclusive with
//! in-flight adds, and a producer blocked on a full buffer can never
//! miss the wakeup from the remove that frees its slot.

use crate::gate::Gate;
use crate::missing::{collect_gaps, Budget};
use crate::storage::Storage;
use starling_core::error::ConfigError;
use starling_core::list::SeqnoList;
use starling_core::seqno::{seqno_delta, seqno_gt, seqno_le, seqno_min, Seqno};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Options for the growable variant.
#[derive(Clone, Debug)]
pub struct GrowableOptions {
    /// Initial number of rows; also the floor compaction never
    /// shrinks below.
    pub num_rows: usize,
    /// Slots per row; rounded up to a power of two.
    pub row_size: usize,
    /// Headroom factor compaction keeps above the live window.
    pub resize_factor: f64,
    /// Minimum interval between purge-triggered compactions.
    /// `None` disables automatic compaction.
    pub max_compaction_interval: Option<Duration>,
}

impl Default for GrowableOptions {
    fn default() -> Self {
        GrowableOptions {
            num_rows: 5,
            row_size: 8192,
            resize_factor: 1.2,
            max_compaction_interval: Some(Duration::from_secs(10)),
        }
    }
}

/// Per-add controls. The default is a non-blocking, non-replacing
/// add with no filter.
pub struct AddOptions<'a, T> {
    /// Overwrite an occupied slot instead of rejecting.
    pub replace: bool,
    /// Bounded variant only: block while the buffer is full instead
    /// of failing fast. Unblocked by `close()`.
    pub blocking: bool,
    /// Evaluated under the same critical section as the insertion:
    /// after a successful insert, consecutive elements from `hd + 1`
    /// that pass the filter are marked delivered without being
    /// handed out (loop-back suppression).
    pub deliver_filter: Option<&'a dyn Fn(&T) -> bool>,
}

impl<'a, T> Default for AddOptions<'a, T> {
    fn default() -> Self {
        AddOptions {
            replace: false,
            blocking: false,
            deliver_filter: None,
        }
    }
}

/// Operational counters, all maintained under the buffer lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub num_purges: u64,
    pub num_resizes: u64,
    pub num_moves: u64,
    pub num_compactions: u64,
    /// Times a producer blocked on a full bounded buffer.
    pub num_blockings: u64,
    /// Adds dropped because the buffer was full or closed.
    pub num_dropped: u64,
}

struct Inner<T> {
    storage: Storage<T>,
    /// Seqno just before the first slot of storage.
    offset: Seqno,
    low: Seqno,
    hd: Seqno,
    high: Seqno,
    /// Occupied slots in `(low, high]`.
    size: usize,
    /// When false, every add is rejected immediately.
    open: bool,
    resize_factor: f64,
    max_compaction_interval: Option<Duration>,
    last_compaction: Option<Instant>,
    stats: BufferStats,
}

/// Seqno-indexed buffer for reliable in-order delivery.
pub struct SeqnoBuffer<T> {
    inner: Mutex<Inner<T>>,
    gate: Gate,
}

impl<T> SeqnoBuffer<T> {
    /// Creates a bounded buffer of exactly `capacity` in-flight slots.
    /// `offset` is the seqno before the first expected seqno.
    pub fn bounded(capacity: usize, offset: Seqno) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self::with_storage(Storage::bounded(capacity), offset, GrowableOptions::default()))
    }

    /// Creates a growable buffer with default options.
    pub fn growable(offset: Seqno) -> Self {
        let opts = GrowableOptions::default();
        Self::with_storage(Storage::growable(opts.num_rows, opts.row_size), offset, opts)
    }

    /// Creates a growable buffer with explicit options.
    pub fn growable_with(opts: GrowableOptions, offset: Seqno) -> Result<Self, ConfigError> {
        if opts.num_rows == 0 {
            return Err(ConfigError::ZeroRows);
        }
        if opts.row_size == 0 {
            return Err(ConfigError::ZeroRowSize);
        }
        if opts.resize_factor <= 1.0 {
            return Err(ConfigError::InvalidResizeFactor(opts.resize_factor));
        }
        let storage = Storage::growable(opts.num_rows, opts.row_size);
        Ok(Self::with_storage(storage, offset, opts))
    }

    fn with_storage(storage: Storage<T>, offset: Seqno, opts: GrowableOptions) -> Self {
        SeqnoBuffer {
            inner: Mutex::new(Inner {
                storage,
                offset,
                low: offset,
                hd: offset,
                high: offset,
                size: 0,
                open: true,
                resize_factor: opts.resize_factor,
                max_compaction_interval: opts.max_compaction_interval,
                last_compaction: None,
                stats: BufferStats::default(),
            }),
            gate: Gate::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- insertion -----------------------------------------------------

    /// Adds `element` at `seqno`. Rejects late seqnos (`<= hd`),
    /// occupied slots, a full bounded buffer, and a closed buffer;
    /// every rejection returns `false` and changes nothing.
    pub fn add(&self, seqno: Seqno, element: T) -> bool {
        self.add_with(seqno, element, AddOptions::default())
    }

    /// Like `add`, but an occupied slot is overwritten.
    pub fn add_or_replace(&self, seqno: Seqno, element: T) -> bool {
        self.add_with(
            seqno,
            element,
            AddOptions {
                replace: true,
                ..AddOptions::default()
            },
        )
    }

    /// Like `add`, but blocks while a bounded buffer is full. Returns
    /// `false` if the buffer was closed while blocked.
    pub fn add_blocking(&self, seqno: Seqno, element: T) -> bool {
        self.add_with(
            seqno,
            element,
            AddOptions {
                blocking: true,
                ..AddOptions::default()
            },
        )
    }

    /// Full-control add; see [`AddOptions`].
    pub fn add_with(&self, seqno: Seqno, element: T, opts: AddOptions<'_, T>) -> bool {
        let mut inner = self.lock();
        if !inner.open {
            inner.stats.num_dropped += 1;
            return false;
        }
        if seqno_le(seqno, inner.hd) {
            return false;
        }
        if opts.blocking && inner.storage.is_bounded() {
            let capacity = inner.storage.capacity() as i64;
            if seqno_delta(seqno, inner.low) > capacity {
                inner.stats.num_blockings += 1;
                inner = self
                    .gate
                    .wait_while(inner, |g| g.open && seqno_delta(seqno, g.low) > capacity);
                if !inner.open {
                    inner.stats.num_dropped += 1;
                    return false;
                }
                // the purger may have moved past us while we slept
                if seqno_le(seqno, inner.hd) {
                    return false;
                }
            }
        }
        let added = inner.insert(seqno, element, opts.replace);
        if added {
            if let Some(filter) = opts.deliver_filter {
                inner.mark_delivered_while(filter);
            }
        }
        added
    }

    /// Bulk insert under a single lock acquisition.
    ///
    /// `seqno_of` extracts each element's seqno; elements mapping to
    /// `None` are skipped and stay in the batch. With
    /// `remove_absorbed`, elements the buffer accepted are stripped
    /// from the batch in place, leaving exactly the rejected and
    /// skipped items for the caller. `const_value`, when given, is
    /// stored instead of the element itself (sender-side mode that
    /// retains a marker rather than the payload).
    ///
    /// Returns `true` if at least one element was accepted.
    pub fn add_batch<F>(
        &self,
        batch: &mut Vec<T>,
        seqno_of: F,
        remove_absorbed: bool,
        const_value: Option<&T>,
    ) -> bool
    where
        T: Clone,
        F: Fn(&T) -> Option<Seqno>,
    {
        if batch.is_empty() {
            return false;
        }
        let mut absorbed = vec![false; batch.len()];
        {
            let mut inner = self.lock();
            if !inner.open {
                inner.stats.num_dropped += batch.len() as u64;
                return false;
            }
            // one up-front grow to the batch's highest seqno
            let highest = batch.iter().filter_map(&seqno_of).fold(None, |acc, s| match acc {
                Some(best) if seqno_gt(best, s) => Some(best),
                _ => Some(s),
            });
            if let Some(highest) = highest {
                if seqno_gt(highest, inner.hd) && !inner.storage.covers(highest, inner.offset) {
                    inner.grow_to(highest);
                }
            }
            for (i, element) in batch.iter().enumerate() {
                let seqno = match seqno_of(element) {
                    Some(s) => s,
                    None => continue,
                };
                let value = const_value.unwrap_or(element).clone();
                absorbed[i] = inner.insert(seqno, value, false);
            }
        }
        let any = absorbed.iter().any(|a| *a);
        if remove_absorbed {
            let mut i = 0;
            batch.retain(|_| {
                let keep = !absorbed[i];
                i += 1;
                keep
            });
        }
        any
    }

    // ---- removal -------------------------------------------------------

    /// Removes and returns the element at `hd + 1`, if present.
    /// Strictly in order: a gap at `hd + 1` yields `None` even when
    /// later seqnos are present. The freed slot is cleared and `low`
    /// advances with `hd`.
    pub fn remove(&self) -> Option<T> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let next = inner.hd.wrapping_add(1);
        if seqno_gt(next, inner.high) {
            return None;
        }
        let element = inner.storage.take(next, inner.offset)?;
        inner.hd = next;
        inner.size = inner.size.saturating_sub(1);
        if seqno_gt(inner.hd, inner.low) {
            inner.low = inner.hd;
        }
        drop(guard);
        self.gate.notify_all();
        Some(element)
    }

    /// Like `remove`, but the slot stays populated (later `get` calls
    /// still see the element) and `low` does not advance, so no
    /// memory is reclaimed. Diagnostic affordance, not an application
    /// contract.
    pub fn remove_keep(&self) -> Option<T>
    where
        T: Clone,
    {
        let mut inner = self.lock();
        let next = inner.hd.wrapping_add(1);
        if seqno_gt(next, inner.high) {
            return None;
        }
        let element = inner.storage.get(next, inner.offset)?.clone();
        inner.hd = next;
        inner.size = inner.size.saturating_sub(1);
        Some(element)
    }

    /// Drains the contiguous run starting at `hd + 1` into a `Vec`,
    /// stopping at the first gap or after `max` elements (0 = no
    /// limit). Returns `None` — not an empty vec — when nothing was
    /// drained.
    pub fn remove_many(&self, max: usize) -> Option<Vec<T>> {
        self.remove_many_into(max, None, Vec::new, |v, e| v.push(e))
    }

    /// `remove_many` with explicit nullify mode and an accept filter:
    /// draining additionally stops at the first element the filter
    /// rejects. `nullify = false` keeps slots populated (see
    /// [`SeqnoBuffer::remove_keep`]).
    pub fn remove_many_with(
        &self,
        nullify: bool,
        max: usize,
        filter: Option<&dyn Fn(&T) -> bool>,
    ) -> Option<Vec<T>>
    where
        T: Clone,
    {
        if nullify {
            return self.remove_many_into(max, filter, Vec::new, |v, e| v.push(e));
        }
        let mut inner = self.lock();
        let mut result: Option<Vec<T>> = None;
        loop {
            if max != 0 && result.as_ref().map_or(0, Vec::len) >= max {
                break;
            }
            let next = inner.hd.wrapping_add(1);
            if seqno_gt(next, inner.high) {
                break;
            }
            let element = match inner.storage.get(next, inner.offset) {
                Some(e) if filter.map_or(true, |f| f(e)) => e.clone(),
                _ => break,
            };
            inner.hd = next;
            inner.size = inner.size.saturating_sub(1);
            result.get_or_insert_with(Vec::new).push(element);
        }
        result
    }

    /// Generic accumulator form of `remove_many` (always nullifying):
    /// `init` lazily creates the result the first time an element is
    /// drained, `accumulate` folds each element in.
    pub fn remove_many_into<R, I, A>(
        &self,
        max: usize,
        filter: Option<&dyn Fn(&T) -> bool>,
        init: I,
        mut accumulate: A,
    ) -> Option<R>
    where
        I: Fn() -> R,
        A: FnMut(&mut R, T),
    {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let mut result: Option<R> = None;
        let mut drained = 0usize;
        loop {
            if max != 0 && drained >= max {
                break;
            }
            let next = inner.hd.wrapping_add(1);
            if seqno_gt(next, inner.high) {
                break;
            }
            match inner.storage.get(next, inner.offset) {
                Some(e) if filter.map_or(true, |f| f(e)) => {}
                _ => break,
            }
            let element = match inner.storage.take(next, inner.offset) {
                Some(e) => e,
                None => break,
            };
            inner.hd = next;
            inner.size = inner.size.saturating_sub(1);
            accumulate(result.get_or_insert_with(&init), element);
            drained += 1;
        }
        if drained > 0 {
            if seqno_gt(inner.hd, inner.low) {
                inner.low = inner.hd;
            }
            drop(guard);
            self.gate.notify_all();
        }
        result
    }

    // ---- reads ---------------------------------------------------------

    /// Element at `seqno`, if within `(low, high]` and present. Does
    /// not advance `hd`.
    pub fn get(&self, seqno: Seqno) -> Option<T>
    where
        T: Clone,
    {
        let inner = self.lock();
        if seqno_le(seqno, inner.low) || seqno_gt(seqno, inner.high) {
            return None;
        }
        inner.storage.get(seqno, inner.offset).cloned()
    }

    /// Raw slot read with no range check; testing and diagnostics.
    pub fn raw_get(&self, seqno: Seqno) -> Option<T>
    where
        T: Clone,
    {
        let inner = self.lock();
        inner.storage.get(seqno, inner.offset).cloned()
    }

    /// Highest seqno removable right now: the end of the contiguous
    /// populated run from `hd + 1`. Equals `hd` when nothing is
    /// deliverable. Does not consume anything.
    pub fn highest_deliverable(&self) -> Seqno {
        let inner = self.lock();
        inner.highest_deliverable()
    }

    /// Number of elements removable right now without hitting a gap.
    pub fn num_deliverable(&self) -> usize {
        let inner = self.lock();
        seqno_delta(inner.highest_deliverable(), inner.hd) as usize
    }

    // ---- purging -------------------------------------------------------

    /// Reclaims everything up to `min(seqno, hd)`: clears the slots
    /// and advances `low`. Idempotent and monotonic; `low` never
    /// moves backward and never passes `hd`. Returns the number of
    /// occupied slots cleared. Wakes blocked producers when space was
    /// freed.
    pub fn purge(&self, seqno: Seqno) -> usize {
        self.purge_internal(seqno, false)
    }

    /// Like `purge`, but advances up to `min(seqno, high)` even past
    /// never-received seqnos, raising `hd` as well — the skipped
    /// seqnos are declared permanently lost and will no longer be
    /// reported missing.
    pub fn purge_force(&self, seqno: Seqno) -> usize {
        self.purge_internal(seqno, true)
    }

    fn purge_internal(&self, seqno: Seqno, force: bool) -> usize {
        let mut inner = self.lock();
        if seqno_le(seqno, inner.low) {
            return 0;
        }
        let bound = if force { inner.high } else { inner.hd };
        let target = seqno_min(seqno, bound);
        if seqno_le(target, inner.low) {
            return 0;
        }
        let purged = {
            let inner = &mut *inner;
            inner.storage.purge_clear(inner.low, target, inner.offset)
        };
        inner.low = target;
        if force {
            if seqno_gt(target, inner.hd) {
                inner.hd = target;
            }
            inner.size = inner.compute_size();
        }
        inner.stats.num_purges += 1;
        inner.maybe_compact();
        drop(inner);
        self.gate.notify_all();
        purged
    }

    /// Compacts the growable row list now, regardless of the
    /// automatic compaction interval. No-op for bounded buffers.
    pub fn compact(&self) {
        let mut inner = self.lock();
        inner.compact_now();
    }

    // ---- missing seqnos ------------------------------------------------

    /// Run-compressed list of missing seqnos, or `None` when nothing
    /// is missing. `missing().len()` always equals `num_missing()`.
    pub fn missing(&self) -> Option<SeqnoList> {
        self.missing_with(Budget::Unlimited)
    }

    /// `missing`, truncated so the encoded request fits `max_bytes`.
    pub fn missing_bounded(&self, max_bytes: usize) -> Option<SeqnoList> {
        self.missing_with(Budget::Bytes(max_bytes))
    }

    /// `missing`, truncated to at most `max_seqnos` entries, oldest
    /// first.
    pub fn missing_limited(&self, max_seqnos: usize) -> Option<SeqnoList> {
        self.missing_with(Budget::Count(max_seqnos))
    }

    fn missing_with(&self, budget: Budget) -> Option<SeqnoList> {
        let inner = self.lock();
        if inner.num_missing() == 0 {
            return None;
        }
        let from = inner.highest_deliverable().wrapping_add(1);
        collect_gaps(
            from,
            inner.high,
            |s| inner.storage.get(s, inner.offset).is_some(),
            budget,
        )
    }

    /// Number of missing seqnos, maintained incrementally — O(1), no
    /// scan.
    pub fn num_missing(&self) -> u64 {
        self.lock().num_missing()
    }

    // ---- traversal -----------------------------------------------------

    /// Visits every seqno in `[from ..= to]` under the buffer lock,
    /// passing the slot contents; returning `false` stops early.
    /// Structural mutation cannot run concurrently with the visit.
    pub fn for_each<F>(&self, from: Seqno, to: Seqno, mut visit: F)
    where
        F: FnMut(Seqno, Option<&T>) -> bool,
    {
        let inner = self.lock();
        let mut s = from;
        while seqno_le(s, to) {
            if !visit(s, inner.storage.get(s, inner.offset)) {
                break;
            }
            s = s.wrapping_add(1);
        }
    }

    /// Clones the occupied `(low, high]` window for iteration
    /// decoupled from the lock.
    pub fn snapshot(&self) -> Vec<(Seqno, T)>
    where
        T: Clone,
    {
        let inner = self.lock();
        let mut out = Vec::with_capacity(inner.size);
        let mut s = inner.low.wrapping_add(1);
        while seqno_le(s, inner.high) {
            if let Some(e) = inner.storage.get(s, inner.offset) {
                out.push((s, e.clone()));
            }
            s = s.wrapping_add(1);
        }
        out
    }

    // ---- lifecycle -----------------------------------------------------

    /// Rejects all further adds and wakes every blocked producer,
    /// which then return `false`. Removal still drains existing
    /// content.
    pub fn close(&self) {
        self.open(false);
    }

    /// Toggles whether the buffer accepts adds. Existing content is
    /// never discarded.
    pub fn open(&self, open: bool) {
        let mut inner = self.lock();
        if inner.open != open {
            debug!(open, "seqno buffer open state changed");
        }
        inner.open = open;
        drop(inner);
        self.gate.notify_all();
    }

    /// True if the buffer currently accepts adds.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    // ---- accessors -----------------------------------------------------

    pub fn low(&self) -> Seqno {
        self.lock().low
    }

    pub fn high(&self) -> Seqno {
        self.lock().high
    }

    pub fn highest_delivered(&self) -> Seqno {
        self.lock().hd
    }

    /// State-transfer hook: overwrites the delivery cursor. The
    /// caller is responsible for passing a seqno consistent with the
    /// digest it installed.
    pub fn set_highest_delivered(&self, seqno: Seqno) {
        let mut inner = self.lock();
        inner.hd = seqno;
        if seqno_gt(inner.hd, inner.high) {
            inner.high = inner.hd;
        }
    }

    pub fn offset(&self) -> Seqno {
        self.lock().offset
    }

    /// `(highest delivered, highest received)`.
    pub fn digest(&self) -> (Seqno, Seqno) {
        let inner = self.lock();
        (inner.hd, inner.high)
    }

    pub fn capacity(&self) -> usize {
        self.lock().storage.capacity()
    }

    /// Number of occupied slots in `(low, high]`.
    pub fn size(&self) -> usize {
        self.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_bounded(&self) -> bool {
        self.lock().storage.is_bounded()
    }

    /// Recounts occupancy by scanning; agrees with `size()` in every
    /// reachable state. Testing and diagnostics.
    pub fn compute_size(&self) -> usize {
        self.lock().compute_size()
    }

    pub fn stats(&self) -> BufferStats {
        self.lock().stats
    }

    pub fn reset_stats(&self) {
        self.lock().stats = BufferStats::default();
    }
}

impl<T> Inner<T> {
    /// Core insert; the caller holds the lock and has already dealt
    /// with blocking and the open flag.
    fn insert(&mut self, seqno: Seqno, element: T, replace: bool) -> bool {
        if seqno_le(seqno, self.hd) {
            return false;
        }
        if self.storage.is_bounded() {
            if seqno_delta(seqno, self.low) > self.storage.capacity() as i64 {
                self.stats.num_dropped += 1;
                return false;
            }
        } else if !self.storage.covers(seqno, self.offset) {
            self.grow_to(seqno);
        }
        let slot = match self.storage.slot_mut(seqno, self.offset) {
            Some(slot) => slot,
            None => return false,
        };
        if slot.is_some() {
            if !replace {
                return false;
            }
            *slot = Some(element);
        } else {
            *slot = Some(element);
            self.size += 1;
        }
        if seqno_gt(seqno, self.high) {
            self.high = seqno;
        }
        true
    }

    fn grow_to(&mut self, seqno: Seqno) {
        let new_offset = self
            .storage
            .grow(seqno, self.low, self.offset, &mut self.stats);
        if new_offset != self.offset {
            debug!(
                seqno,
                old_offset = self.offset,
                new_offset,
                rows = self.storage.num_rows(),
                "storage grew past purged prefix"
            );
        }
        self.offset = new_offset;
    }

    /// Advances `hd` over consecutive present elements passing the
    /// filter, marking them delivered without handing them out. Slots
    /// stay populated; `low` is untouched.
    fn mark_delivered_while(&mut self, filter: &dyn Fn(&T) -> bool) {
        loop {
            let next = self.hd.wrapping_add(1);
            if seqno_gt(next, self.high) {
                return;
            }
            match self.storage.get(next, self.offset) {
                Some(e) if filter(e) => {
                    self.hd = next;
                    self.size = self.size.saturating_sub(1);
                }
                _ => return,
            }
        }
    }

    fn highest_deliverable(&self) -> Seqno {
        let mut s = self.hd;
        loop {
            let next = s.wrapping_add(1);
            if seqno_gt(next, self.high) || self.storage.get(next, self.offset).is_none() {
                return s;
            }
            s = next;
        }
    }

    fn num_missing(&self) -> u64 {
        self.high.wrapping_sub(self.hd) - self.size as u64
    }

    fn compute_size(&self) -> usize {
        let mut count = 0;
        let mut s = self.low.wrapping_add(1);
        while seqno_le(s, self.high) {
            if self.storage.get(s, self.offset).is_some() {
                count += 1;
            }
            s = s.wrapping_add(1);
        }
        count
    }

    /// Purge-triggered compaction, rate-limited by the configured
    /// interval. The first purge only arms the timer.
    fn maybe_compact(&mut self) {
        let interval = match self.max_compaction_interval {
            Some(i) => i,
            None => return,
        };
        let now = Instant::now();
        match self.last_compaction {
            None => self.last_compaction = Some(now),
            Some(last) if now.duration_since(last) >= interval => {
                self.compact_now();
                self.last_compaction = Some(now);
            }
            Some(_) => {}
        }
    }

    fn compact_now(&mut self) {
        let new_offset = self.storage.compact(
            self.low,
            self.high,
            self.offset,
            self.resize_factor,
            &mut self.stats,
        );
        if new_offset != self.offset {
            debug!(
                old_offset = self.offset,
                new_offset,
                rows = self.storage.num_rows(),
                "compacted row matrix"
            );
            self.offset = new_offset;
        }
    }
}

impl<T> fmt::Display for SeqnoBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        write!(
            f,
            "[{} | {} | {}] ({} elements, {} missing)",
            inner.low,
            inner.hd,
            inner.high,
            inner.size,
            inner.num_missing()
        )
    }
}
