//! # courier-shared
//!
//! Domain types and the JSON wire protocol shared by every Courier crate:
//! chat/user/message identifiers, the canonical [`Message`] record, and the
//! inbound/outbound event encoding used over the per-chat WebSocket.

pub mod constants;
pub mod protocol;
pub mod types;

mod error;

pub use error::ProtocolError;
pub use protocol::{InboundEvent, OutboundEvent, WireMessage};
pub use types::{Chat, ChatId, Message, MessageId, Provenance, UserId};
