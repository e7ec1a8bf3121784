//! Chat client and per-chat session glue.
//!
//! [`ChatClient`] owns the store and configuration.  [`ChatClient::open_chat`]
//! wires one connection to one reconciler: a pump task forwards inbound
//! frames, in receipt order, from the session's notification channel into
//! the reconciler.  Tearing the session down drops the notification
//! sender before anything else, so a late frame can never reach a
//! reconciler whose session is gone.

use tokio::task::JoinHandle;
use tracing::debug;

use courier_net::{ConnState, Connection, ConnectionHandle, SessionNotification};
use courier_shared::{ChatId, UserId};
use courier_store::ChatStore;

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::reconciler::Reconciler;

/// Entry point for the synchronization core.
///
/// Cheap to clone per view; clones share the store.
#[derive(Clone)]
pub struct ChatClient {
    config: ClientConfig,
    store: ChatStore,
    pub(crate) http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: ChatStore::new(),
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A handle to the shared store, for reactive readers.
    pub fn store(&self) -> ChatStore {
        self.store.clone()
    }

    /// Open a live session for one chat viewed by one user.
    ///
    /// Always creates a fresh connection handle; reopening after a
    /// failure is exactly this call again.
    pub fn open_chat(&self, chat_id: ChatId, viewer: UserId) -> ChatSession {
        let (handle, mut notif_rx) =
            Connection::open(self.config.connect_config(), chat_id.clone(), viewer.clone());

        let mut reconciler = Reconciler::new(self.store.clone(), viewer);
        let pump_chat = chat_id.clone();
        let pump: JoinHandle<()> = tokio::spawn(async move {
            while let Some(notification) = notif_rx.recv().await {
                match notification {
                    SessionNotification::Frame(frame) => reconciler.apply(&frame),
                    SessionNotification::StateChanged(state) => {
                        debug!(chat = %pump_chat, state = %state, "session state (bridge)");
                    }
                }
            }
            debug!(chat = %pump_chat, "session pump ended");
        });

        ChatSession {
            chat_id,
            dispatcher: Dispatcher::new(handle.clone()),
            handle,
            pump,
        }
    }
}

/// One active chat view: a connection plus its reconciler pump.
pub struct ChatSession {
    chat_id: ChatId,
    handle: ConnectionHandle,
    dispatcher: Dispatcher,
    pump: JoinHandle<()>,
}

impl ChatSession {
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Current connection state.
    pub fn state(&self) -> ConnState {
        self.handle.state()
    }

    /// Wait until the connection leaves `Connecting`.
    pub async fn settle(&self) -> ConnState {
        self.handle.settle().await
    }

    /// Send a composed message (empty content is a no-op).
    pub async fn send(&self, content: &str) {
        self.dispatcher.send(content).await;
    }

    /// Tear the session down deterministically.  Idempotent.
    ///
    /// The connection transitions through `Closing` to `Closed` and the
    /// notification channel is dropped, ending the pump; frames still in
    /// flight are discarded, never merged.
    pub async fn close(&self) {
        self.handle.close().await;
    }

    /// Whether the pump task has finished (teardown complete).
    pub fn is_finished(&self) -> bool {
        self.pump.is_finished()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        // View teardown must close the connection even if close() was
        // never awaited.
        self.handle.close_now();
    }
}
