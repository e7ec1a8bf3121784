//! WebSocket session orchestration with the tokio mpsc command/notification
//! pattern.
//!
//! Each [`Connection::open`] spawns one session task owning one socket for
//! one chat.  External code talks to the task through a typed command
//! channel and receives inbound frames, in receipt order, through a typed
//! notification channel.  The lifecycle state is published on a `watch`
//! channel so callers can poll or await it without touching the task.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, trace, warn};
use url::Url;

use courier_shared::constants::{COMMAND_BUFFER, CONNECT_TIMEOUT_SECS, NOTIFICATION_BUFFER};
use courier_shared::protocol::{self, OutboundEvent};
use courier_shared::{ChatId, UserId};

use crate::error::NetError;
use crate::retry::RetryPolicy;
use crate::state::ConnState;

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Transmit an outbound event.  Buffered while `Connecting`, written
    /// immediately while `Open`.
    Send(OutboundEvent),
    /// Gracefully close the session.
    Close,
}

/// Notifications sent *from* the session task.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    /// A text frame arrived.  Frames are forwarded in receipt order.
    Frame(String),
    /// The lifecycle state changed.
    StateChanged(ConnState),
}

/// Configuration for opening a session.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// WebSocket endpoint; `user_id` and `chat_id` are appended as query
    /// parameters.
    pub ws_url: String,
    /// Bound on each establishment attempt.  A stuck handshake counts as
    /// a failed attempt rather than pinning the handle in `Connecting`.
    pub connect_timeout: Duration,
    /// Retry policy consulted between failed establishment attempts.
    pub retry: RetryPolicy,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            ws_url: courier_shared::constants::DEFAULT_WS_URL.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Build the per-chat session URL.
pub fn session_url(base: &str, chat_id: &ChatId, user_id: &UserId) -> Result<Url, NetError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("user_id", user_id.as_str())
        .append_pair("chat_id", chat_id.as_str());
    Ok(url)
}

/// Factory for per-chat connection sessions.
pub struct Connection;

impl Connection {
    /// Spawn a session for `(chat_id, user_id)`.
    ///
    /// Returns immediately with a handle and the notification receiver;
    /// establishment proceeds in the background.  Network failures never
    /// surface as errors — the handle degrades to [`ConnState::Failed`]
    /// and subsequent sends are dropped silently.
    pub fn open(
        config: ConnectConfig,
        chat_id: ChatId,
        user_id: UserId,
    ) -> (ConnectionHandle, mpsc::Receiver<SessionNotification>) {
        let (cmd_tx, cmd_rx) = mpsc::channel::<SessionCommand>(COMMAND_BUFFER);
        let (notif_tx, notif_rx) = mpsc::channel::<SessionNotification>(NOTIFICATION_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnState::Connecting);

        let task_chat = chat_id.clone();
        tokio::spawn(async move {
            run_session(config, task_chat, user_id, state_tx, notif_tx, cmd_rx).await;
        });

        let handle = ConnectionHandle {
            chat_id,
            cmd_tx,
            state_rx,
        };
        (handle, notif_rx)
    }
}

/// Opaque reference to one live (or once-live) session.
///
/// Cheap to clone; all clones drive the same session task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    chat_id: ChatId,
    cmd_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<ConnState>,
}

impl ConnectionHandle {
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnState {
        *self.state_rx.borrow()
    }

    /// Wait until the session leaves `Connecting`, returning the state it
    /// settled in (`Open` or a terminal state).
    pub async fn settle(&self) -> ConnState {
        let mut rx = self.state_rx.clone();
        loop {
            let state = *rx.borrow_and_update();
            if state != ConnState::Connecting {
                return state;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    /// Hand an outbound event to the session.
    ///
    /// Fire-and-forget: while `Connecting` the event is buffered and
    /// flushed on open; in any other non-`Open` state it is dropped
    /// without error.
    pub async fn send(&self, event: OutboundEvent) {
        if !self.state().is_live() {
            trace!(chat = %self.chat_id, state = %self.state(), "dropping send on dead handle");
            return;
        }
        // A send racing session teardown lands in a closed channel; that
        // is the same silent drop.
        let _ = self.cmd_tx.send(SessionCommand::Send(event)).await;
    }

    /// Request a graceful close.  Idempotent; a no-op on terminal handles.
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Close).await;
    }

    /// Synchronous close for drop paths.
    pub fn close_now(&self) {
        let _ = self.cmd_tx.try_send(SessionCommand::Close);
    }
}

fn set_state(
    chat_id: &ChatId,
    state_tx: &watch::Sender<ConnState>,
    state: ConnState,
) {
    debug!(chat = %chat_id, state = %state, "connection state changed");
    let _ = state_tx.send(state);
}

async fn notify_state(
    notif_tx: &mpsc::Sender<SessionNotification>,
    state: ConnState,
) {
    let _ = notif_tx
        .send(SessionNotification::StateChanged(state))
        .await;
}

async fn run_session(
    config: ConnectConfig,
    chat_id: ChatId,
    user_id: UserId,
    state_tx: watch::Sender<ConnState>,
    notif_tx: mpsc::Sender<SessionNotification>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    let url = match session_url(&config.ws_url, &chat_id, &user_id) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!(chat = %chat_id, error = %e, "cannot build session URL");
            set_state(&chat_id, &state_tx, ConnState::Failed);
            notify_state(&notif_tx, ConnState::Failed).await;
            return;
        }
    };

    debug!(chat = %chat_id, url = %url, "opening chat session");

    // Events composed before the socket is up, flushed on open.
    let mut pending: Vec<OutboundEvent> = Vec::new();
    let mut attempt = 0u32;

    let ws_stream = 'connect: loop {
        let attempt_fut = timeout(config.connect_timeout, connect_async(url.as_str()));
        tokio::pin!(attempt_fut);

        loop {
            tokio::select! {
                res = &mut attempt_fut => {
                    match res {
                        Ok(Ok((ws_stream, _response))) => break 'connect ws_stream,
                        Ok(Err(e)) => {
                            warn!(chat = %chat_id, error = %e, "WebSocket connect failed");
                        }
                        Err(_) => {
                            warn!(chat = %chat_id, timeout = ?config.connect_timeout, "WebSocket connect timed out");
                        }
                    }
                    attempt += 1;
                    match config.retry.delay_for(attempt) {
                        Some(delay) => {
                            debug!(chat = %chat_id, attempt, delay = ?delay, "retrying connect");
                            tokio::time::sleep(delay).await;
                            continue 'connect;
                        }
                        None => {
                            set_state(&chat_id, &state_tx, ConnState::Failed);
                            notify_state(&notif_tx, ConnState::Failed).await;
                            return;
                        }
                    }
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Send(event)) => pending.push(event),
                        Some(SessionCommand::Close) | None => {
                            set_state(&chat_id, &state_tx, ConnState::Closing);
                            set_state(&chat_id, &state_tx, ConnState::Closed);
                            notify_state(&notif_tx, ConnState::Closed).await;
                            return;
                        }
                    }
                }
            }
        }
    };

    set_state(&chat_id, &state_tx, ConnState::Open);
    notify_state(&notif_tx, ConnState::Open).await;

    let (mut write, mut read) = ws_stream.split();

    // Flush anything buffered during establishment, preserving compose order.
    for event in pending.drain(..) {
        if let Err(e) = write_event(&mut write, &event).await {
            warn!(chat = %chat_id, error = %e, "flush failed, session lost");
            set_state(&chat_id, &state_tx, ConnState::Failed);
            notify_state(&notif_tx, ConnState::Failed).await;
            return;
        }
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Send(event)) => {
                        if let Err(e) = write_event(&mut write, &event).await {
                            warn!(chat = %chat_id, error = %e, "WebSocket send failed, session lost");
                            set_state(&chat_id, &state_tx, ConnState::Failed);
                            notify_state(&notif_tx, ConnState::Failed).await;
                            return;
                        }
                    }
                    Some(SessionCommand::Close) | None => {
                        set_state(&chat_id, &state_tx, ConnState::Closing);
                        let _ = write.send(WsMessage::Close(None)).await;
                        set_state(&chat_id, &state_tx, ConnState::Closed);
                        notify_state(&notif_tx, ConnState::Closed).await;
                        return;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(frame))) => {
                        trace!(chat = %chat_id, len = frame.len(), "frame received");
                        // Receipt order is the merge order; the receiver is
                        // the single consumer for this chat.
                        let _ = notif_tx.send(SessionNotification::Frame(frame)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        debug!(chat = %chat_id, "server closed the session");
                        set_state(&chat_id, &state_tx, ConnState::Closed);
                        notify_state(&notif_tx, ConnState::Closed).await;
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong handled by tungstenite, binary ignored.
                    }
                    Some(Err(e)) => {
                        warn!(chat = %chat_id, error = %e, "WebSocket read error");
                        set_state(&chat_id, &state_tx, ConnState::Failed);
                        notify_state(&notif_tx, ConnState::Failed).await;
                        return;
                    }
                    None => {
                        debug!(chat = %chat_id, "transport stream ended");
                        set_state(&chat_id, &state_tx, ConnState::Closed);
                        notify_state(&notif_tx, ConnState::Closed).await;
                        return;
                    }
                }
            }
        }
    }
}

async fn write_event<S>(
    write: &mut S,
    event: &OutboundEvent,
) -> Result<(), tokio_tungstenite::tungstenite::Error>
where
    S: futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    // Encoding a fully-typed event cannot fail in practice; treat it as a
    // dropped frame rather than a session failure if it ever does.
    match protocol::encode_outbound(event) {
        Ok(frame) => write.send(WsMessage::Text(frame)).await,
        Err(e) => {
            warn!(error = %e, "failed to encode outbound event, dropping");
            Ok(())
        }
    }
}
