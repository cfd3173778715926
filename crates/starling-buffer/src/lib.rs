//! Seqno-indexed buffers for reliable, in-order message delivery.
//!
//! The centerpiece is [`SeqnoBuffer`], which a reliability protocol
//! keeps per sender: producers add elements under arbitrary
//! interleaving, a consumer drains the contiguous prefix in seqno
//! order, a retransmission layer asks for the [`missing`] gap list,
//! and a stability layer [`purge`]s the prefix the whole group has
//! received.
//!
//! Pick the variant at construction: [`SeqnoBuffer::bounded`] for a
//! fixed window with backpressure (unicast-style flow control),
//! [`SeqnoBuffer::growable`] for an elastic row matrix that compacts
//! itself (multicast-style receive windows).
//!
//! [`missing`]: SeqnoBuffer::missing
//! [`purge`]: SeqnoBuffer::purge

mod buffer;
mod gate;
mod index;
mod missing;
mod storage;

pub use buffer::{AddOptions, BufferStats, GrowableOptions, SeqnoBuffer};
pub use missing::Budget;
