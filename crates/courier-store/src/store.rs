//! The authoritative in-memory representation of chats and message logs.
//!
//! Many readers, one writer path per chat: the reconciler merges inbound
//! messages through [`ChatStore::add_message`], the history loader
//! replaces whole logs through [`ChatStore::set_messages`], and nothing
//! else mutates.  Every read returns a snapshot taken under the lock, so
//! a partially applied update is never observable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use courier_shared::constants::STORE_UPDATE_BUFFER;
use courier_shared::{Chat, ChatId, Message, MessageId, Provenance};

/// Updates published on the reactive feed after each mutation.
///
/// The feed is a render-invalidation signal, not a data channel: slow
/// subscribers may observe `Lagged` and should re-read the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    /// The chat collection was replaced wholesale.
    ChatsReplaced { count: usize },
    /// One message was merged into a chat's log.
    MessageAdded {
        chat_id: ChatId,
        message_id: MessageId,
    },
    /// A chat's log was replaced wholesale (history load).
    MessagesReplaced { chat_id: ChatId, count: usize },
}

#[derive(Default)]
struct StoreInner {
    chats: Vec<Chat>,
    messages: HashMap<ChatId, Vec<Message>>,
}

/// The local chat store.  Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<RwLock<StoreInner>>,
    updates: broadcast::Sender<StoreUpdate>,
}

impl ChatStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(STORE_UPDATE_BUFFER);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            updates,
        }
    }

    /// Subscribe to the reactive update feed.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.updates.subscribe()
    }

    /// Replace the chat collection (chat-list load).
    pub fn set_chats(&self, chats: Vec<Chat>) {
        let count = chats.len();
        {
            let mut inner = self.write();
            inner.chats = chats;
        }
        debug!(count, "chat list replaced");
        let _ = self.updates.send(StoreUpdate::ChatsReplaced { count });
    }

    /// Prepend a message to its chat's log, creating the log (and a
    /// placeholder chat record) if this is the first message observed for
    /// that chat.  This is the only entry point the reconciler uses.
    pub fn add_message(&self, chat_id: &ChatId, message: Message) {
        let message_id = message.id.clone();
        {
            let mut inner = self.write();

            if !inner.chats.iter().any(|c| &c.id == chat_id) {
                inner.chats.push(Chat::placeholder(chat_id.clone()));
            }
            if let Some(chat) = inner.chats.iter_mut().find(|c| &c.id == chat_id) {
                chat.last_message = message.content.clone();
                if message.provenance == Provenance::Other {
                    chat.unread += 1;
                }
            }

            inner
                .messages
                .entry(chat_id.clone())
                .or_default()
                .insert(0, message);
        }
        debug!(chat = %chat_id, message = %message_id, "message merged");
        let _ = self.updates.send(StoreUpdate::MessageAdded {
            chat_id: chat_id.clone(),
            message_id,
        });
    }

    /// Replace a chat's full log (history load).  Resets the chat's
    /// unread counter: reloading history implies the chat is on screen.
    pub fn set_messages(&self, chat_id: &ChatId, messages: Vec<Message>) {
        let count = messages.len();
        {
            let mut inner = self.write();
            if let Some(chat) = inner.chats.iter_mut().find(|c| &c.id == chat_id) {
                chat.unread = 0;
                if let Some(newest) = messages.first() {
                    chat.last_message = newest.content.clone();
                }
            }
            inner.messages.insert(chat_id.clone(), messages);
        }
        debug!(chat = %chat_id, count, "message log replaced");
        let _ = self.updates.send(StoreUpdate::MessagesReplaced {
            chat_id: chat_id.clone(),
            count,
        });
    }

    /// Snapshot of the chat collection.
    pub fn chats(&self) -> Vec<Chat> {
        self.read().chats.clone()
    }

    /// Snapshot of one chat record.
    pub fn chat(&self, chat_id: &ChatId) -> Option<Chat> {
        self.read().chats.iter().find(|c| &c.id == chat_id).cloned()
    }

    /// Snapshot of a chat's log, newest first.  Empty if the chat has no
    /// log yet.
    pub fn messages(&self, chat_id: &ChatId) -> Vec<Message> {
        self.read()
            .messages
            .get(chat_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether a message id is already present in a chat's log.  The
    /// reconciler's dedup check.
    pub fn contains_message(&self, chat_id: &ChatId, id: &MessageId) -> bool {
        self.read()
            .messages
            .get(chat_id)
            .is_some_and(|log| log.iter().any(|m| &m.id == id))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}
