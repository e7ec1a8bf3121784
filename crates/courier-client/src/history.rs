//! REST collaborator: chat list and message history.
//!
//! `GET {api}/chats` feeds the store's chat collection; `GET
//! {api}/chats/{id}/messages` replaces a chat's log wholesale.  Records
//! are Message-shaped (the same fields the WebSocket carries) and are
//! provenance-tagged for the viewing user before they land in the store.

use serde::Deserialize;
use tracing::debug;

use courier_shared::protocol::WireMessage;
use courier_shared::{Chat, ChatId, UserId};

use crate::error::ClientError;
use crate::session::ChatClient;

/// A chat-list record as served by the REST API.
#[derive(Debug, Deserialize)]
struct ChatRecord {
    id: ChatId,
    name: String,
    #[serde(default, alias = "lastMessage")]
    last_message: String,
    #[serde(default)]
    unread: u32,
}

impl From<ChatRecord> for Chat {
    fn from(record: ChatRecord) -> Self {
        Chat {
            id: record.id,
            name: record.name,
            last_message: record.last_message,
            unread: record.unread,
        }
    }
}

impl ChatClient {
    /// Fetch the chat list and replace the store's chat collection.
    pub async fn load_chats(&self) -> Result<usize, ClientError> {
        let url = format!("{}/chats", self.config().api_url);
        let records: Vec<ChatRecord> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let chats: Vec<Chat> = records.into_iter().map(Chat::from).collect();
        let count = chats.len();
        debug!(count, "chat list loaded");
        self.store().set_chats(chats);
        Ok(count)
    }

    /// Fetch one page of a chat's history and replace its log.
    ///
    /// Errors never touch the store: a failed fetch leaves whatever log
    /// the chat already had.
    pub async fn load_history(
        &self,
        chat_id: &ChatId,
        viewer: &UserId,
        page: u32,
    ) -> Result<usize, ClientError> {
        let url = format!("{}/chats/{}/messages", self.config().api_url, chat_id);
        let records: Vec<WireMessage> = self
            .http
            .get(&url)
            .query(&[
                ("page", page.to_string()),
                ("pageSize", self.config().history_page_size.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let messages: Vec<_> = records
            .into_iter()
            .map(|wire| wire.into_message(viewer))
            .collect();
        let count = messages.len();
        debug!(chat = %chat_id, count, "history loaded");
        self.store().set_messages(chat_id, messages);
        Ok(count)
    }
}
