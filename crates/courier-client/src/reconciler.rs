//! Merges raw inbound events into the canonical per-chat log.
//!
//! The reconciler is the only producer for the store's real-time path.
//! It processes one event at a time (`&mut self` encodes the
//! single-consumer discipline), so the dedup-then-prepend sequence is
//! never interleaved for a chat.

use tracing::{debug, trace, warn};

use courier_shared::protocol::{self, InboundEvent, WireMessage};
use courier_shared::UserId;
use courier_store::ChatStore;

/// Converts raw frames into canonical messages and merges them without
/// duplication.
pub struct Reconciler {
    store: ChatStore,
    viewer: UserId,
}

impl Reconciler {
    pub fn new(store: ChatStore, viewer: UserId) -> Self {
        Self { store, viewer }
    }

    /// Apply one inbound text frame.
    ///
    /// Malformed frames are dropped with a diagnostic; unrecognized event
    /// types are ignored silently.  Neither reaches the store or affects
    /// subsequent merges.
    pub fn apply(&mut self, frame: &str) {
        match protocol::parse_inbound(frame) {
            Ok(InboundEvent::Message(wire)) => self.merge(wire),
            Ok(InboundEvent::Unknown) => {
                trace!("ignoring event of unrecognized type");
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed inbound frame");
            }
        }
    }

    /// Merge one wire message: normalize, dedup by id, tag provenance,
    /// prepend.  Arrival order wins; an embedded timestamp never reorders
    /// previously merged entries.
    fn merge(&mut self, wire: WireMessage) {
        let message = wire.into_message(&self.viewer);
        if self.store.contains_message(&message.chat_id, &message.id) {
            debug!(chat = %message.chat_id, message = %message.id, "discarding duplicate");
            return;
        }
        let chat_id = message.chat_id.clone();
        self.store.add_message(&chat_id, message);
    }
}
