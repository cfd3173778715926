//! # starling-core
//!
//! Leaf crate of the starling reliable-delivery toolkit.
//!
//! This crate provides:
//! - Sequence-number (`Seqno`) arithmetic that stays correct across
//!   wraparound, used by every buffer variant
//! - `SeqnoList`: the run-encoded list of missing seqnos that forms
//!   the payload of a retransmission request
//! - Construction-time configuration errors
//!
//! Everything here is pure data; the concurrent buffer lives in
//! `starling-buffer`.

pub mod error;
pub mod list;
pub mod seqno;

// Re-export main types for convenience
pub use error::ConfigError;
pub use list::{SeqnoList, SeqnoRun};
pub use seqno::{seqno_delta, seqno_ge, seqno_gt, seqno_le, seqno_lt, Seqno};
