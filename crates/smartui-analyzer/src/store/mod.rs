//! Interaction storage
//!
//! Fixed-capacity ring buffers per user plus session grouping.

mod interaction_store;
mod ring_buffer;

pub use interaction_store::{InteractionStore, RealtimeStats, SessionSummary};
pub use ring_buffer::RingBuffer;
