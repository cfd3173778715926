//! Run-encoded lists of sequence numbers.
//!
//! A `SeqnoList` is the payload of a retransmission request: the
//! receiver collects the seqnos it is missing, run-compressed as
//! single seqnos and inclusive ranges, and sends the list back to the
//! original sender. The list is ephemeral and derived; it is
//! recomputed from the buffer whenever a request is built, never
//! persisted.
//!
//! Because the resulting message must fit a transport size limit, the
//! list exposes its worst-case encoded size (`serialized_size`), and
//! the size of any candidate run (`encoded_run_size`) so a collector
//! can stop before a run would exceed its byte budget.

use crate::seqno::{seqno_ge, seqno_gt, Seqno};
use serde::{Deserialize, Serialize};

/// A maximal run of consecutive seqnos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeqnoRun {
    /// A single seqno.
    Single(Seqno),
    /// An inclusive range `from..=to`, with `from < to`.
    Range { from: Seqno, to: Seqno },
}

impl SeqnoRun {
    /// First seqno covered by this run.
    pub fn first(&self) -> Seqno {
        match *self {
            SeqnoRun::Single(s) => s,
            SeqnoRun::Range { from, .. } => from,
        }
    }

    /// Last seqno covered by this run.
    pub fn last(&self) -> Seqno {
        match *self {
            SeqnoRun::Single(s) => s,
            SeqnoRun::Range { to, .. } => to,
        }
    }

    /// Number of seqnos covered.
    pub fn len(&self) -> u64 {
        self.last().wrapping_sub(self.first()).wrapping_add(1)
    }
}

/// A sorted, run-compressed list of seqnos.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqnoList {
    runs: Vec<SeqnoRun>,
    len: u64,
}

/// Encoded size of one u64: a count byte plus the minimal number of
/// payload bytes (at least one, so zero still occupies a byte).
fn encoded_u64_size(v: u64) -> usize {
    let payload = ((64 - v.leading_zeros() as usize) + 7) / 8;
    1 + payload.max(1)
}

impl SeqnoList {
    /// Creates an empty list.
    pub fn new() -> Self {
        SeqnoList::default()
    }

    /// Total number of seqnos covered (not the number of runs).
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if no seqno is covered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of runs.
    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    /// Lowest seqno in the list, if any.
    pub fn first(&self) -> Option<Seqno> {
        self.runs.first().map(SeqnoRun::first)
    }

    /// Highest seqno in the list, if any.
    pub fn last(&self) -> Option<Seqno> {
        self.runs.last().map(SeqnoRun::last)
    }

    /// Appends a single seqno. Seqnos must be appended in ascending
    /// order; a seqno adjacent to the last run extends that run.
    pub fn add(&mut self, seqno: Seqno) {
        self.add_range(seqno, seqno);
    }

    /// Appends the inclusive range `from..=to`, merging with the last
    /// run when adjacent. `from` must be greater than the current
    /// `last()`; out-of-order input is ignored.
    pub fn add_range(&mut self, from: Seqno, to: Seqno) {
        if seqno_gt(from, to) {
            return;
        }
        if let Some(last) = self.last() {
            if !seqno_gt(from, last) {
                return;
            }
        }
        let count = to.wrapping_sub(from).wrapping_add(1);
        match self.runs.last_mut() {
            Some(run) if run.last().wrapping_add(1) == from => {
                *run = SeqnoRun::Range {
                    from: run.first(),
                    to,
                };
            }
            _ if from == to => self.runs.push(SeqnoRun::Single(from)),
            _ => self.runs.push(SeqnoRun::Range { from, to }),
        }
        self.len += count;
    }

    /// Worst-case encoded size in bytes of the run `from..=to`,
    /// were it appended to a list: a tag byte plus the encoded bounds.
    pub fn encoded_run_size(from: Seqno, to: Seqno) -> usize {
        if from == to {
            1 + encoded_u64_size(from)
        } else {
            1 + encoded_u64_size(from) + encoded_u64_size(to)
        }
    }

    /// Worst-case encoded size of the whole list in bytes: a header
    /// byte, the run count, then each run. Monotone in the number of
    /// runs, so byte budgets can be enforced run by run.
    pub fn serialized_size(&self) -> usize {
        let mut total = 1 + encoded_u64_size(self.runs.len() as u64);
        for run in &self.runs {
            total += Self::encoded_run_size(run.first(), run.last());
        }
        total
    }

    /// Drops every covered seqno below `seqno`, trimming or removing
    /// runs. Used to re-clip a pending retransmit request after a
    /// purge made part of it obsolete.
    pub fn remove_seqnos_below(&mut self, seqno: Seqno) {
        let mut removed = 0u64;
        self.runs.retain_mut(|run| {
            if seqno_ge(run.first(), seqno) {
                return true;
            }
            if seqno_gt(seqno, run.last()) {
                removed += run.len();
                return false;
            }
            // run straddles the cut
            removed += seqno.wrapping_sub(run.first());
            *run = if run.last() == seqno {
                SeqnoRun::Single(seqno)
            } else {
                SeqnoRun::Range {
                    from: seqno,
                    to: run.last(),
                }
            };
            true
        });
        self.len -= removed;
    }

    /// Iterates over every covered seqno in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Seqno> + '_ {
        self.runs.iter().flat_map(|run| run.first()..=run.last())
    }

    /// Iterates over the runs.
    pub fn runs(&self) -> impl Iterator<Item = &SeqnoRun> {
        self.runs.iter()
    }
}

impl std::fmt::Display for SeqnoList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for run in &self.runs {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match *run {
                SeqnoRun::Single(s) => write!(f, "{s}")?,
                SeqnoRun::Range { from, to } => write!(f, "{from}-{to}")?,
            }
        }
        Ok(())
    }
}
