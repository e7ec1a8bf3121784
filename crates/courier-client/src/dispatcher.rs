//! Packages user-composed messages into wire events.

use tracing::trace;

use courier_net::ConnectionHandle;
use courier_shared::protocol::OutboundEvent;

/// Outbound dispatcher for one chat session.
///
/// Deliberately does not insert into the local store: the sent message
/// becomes visible only when the server echoes it back through the
/// inbound path and the reconciler merges it.
pub struct Dispatcher {
    handle: ConnectionHandle,
}

impl Dispatcher {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self { handle }
    }

    /// Send a composed message on this session's chat.
    ///
    /// Empty or whitespace-only content is a no-op.  Delivery follows the
    /// handle's contract: buffered while connecting, dropped silently on
    /// a dead handle.
    pub async fn send(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            trace!(chat = %self.handle.chat_id(), "ignoring empty composition");
            return;
        }
        let event = OutboundEvent::Message {
            chat_id: self.handle.chat_id().clone(),
            content: content.to_string(),
        };
        self.handle.send(event).await;
    }
}
