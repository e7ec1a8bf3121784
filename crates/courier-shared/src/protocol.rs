//! Wire protocol for the per-chat WebSocket.
//!
//! Events are JSON text frames discriminated by a `"type"` field.  The
//! server currently emits only `"message"`; anything else deserializes
//! into [`InboundEvent::Unknown`] and is ignored by the reconciler, so a
//! newer server can add event types without breaking older clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{ChatId, Message, MessageId, Provenance, UserId};

/// Events received from the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A chat message, either freshly posted by a peer or our own send
    /// echoed back.
    Message(WireMessage),

    /// Any event type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// The payload of an inbound `"message"` event, before reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    /// Server-assigned id.  Omitted for messages fanned out live (the
    /// backend only assigns ids on persistence), carried as a number or a
    /// string depending on the server version.
    #[serde(default)]
    pub id: Option<WireId>,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl WireMessage {
    /// Canonicalize into a [`Message`] for the viewing user: normalize
    /// the id (synthesizing one when the server omitted it) and tag
    /// provenance by comparing the sender against the viewer.
    pub fn into_message(self, viewer: &UserId) -> Message {
        let id = self
            .id
            .map(WireId::into_message_id)
            .unwrap_or_else(MessageId::synthesize);
        let provenance = if &self.sender_id == viewer {
            Provenance::Mine
        } else {
            Provenance::Other
        };
        Message {
            id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            content: self.content,
            created_at: self.created_at,
            provenance,
        }
    }
}

/// A wire-level message id: `number|string` on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Num(i64),
    Str(String),
}

impl WireId {
    /// Normalize to the canonical string form used for dedup.
    pub fn into_message_id(self) -> MessageId {
        match self {
            WireId::Num(n) => MessageId::new(n.to_string()),
            WireId::Str(s) => MessageId::new(s),
        }
    }
}

/// Events sent to the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    Message { chat_id: ChatId, content: String },
}

/// Parse one inbound text frame.
///
/// An unparsable frame is a [`ProtocolError::Parse`]; callers drop it
/// with a diagnostic and nothing else.  A frame with an unrecognized
/// `"type"` parses successfully into [`InboundEvent::Unknown`].
pub fn parse_inbound(frame: &str) -> Result<InboundEvent, ProtocolError> {
    Ok(serde_json::from_str(frame)?)
}

/// Encode an outbound event as a JSON text frame.
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}
