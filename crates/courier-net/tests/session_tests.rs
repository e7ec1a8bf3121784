//! Live session tests against a loopback WebSocket server.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use courier_net::{ConnState, ConnectConfig, Connection, RetryPolicy, SessionNotification};
use courier_shared::protocol::OutboundEvent;
use courier_shared::{ChatId, UserId};

const WAIT: Duration = Duration::from_secs(5);

fn config_for(addr: SocketAddr) -> ConnectConfig {
    ConnectConfig {
        ws_url: format!("ws://{addr}"),
        connect_timeout: Duration::from_secs(2),
        retry: RetryPolicy::None,
    }
}

fn outbound(chat: &str, content: &str) -> OutboundEvent {
    OutboundEvent::Message {
        chat_id: ChatId::new(chat),
        content: content.to_string(),
    }
}

/// Accept one session; push every text frame it sends us into `received`,
/// and write every frame from `to_send` to the client first.
async fn serve_one(
    listener: TcpListener,
    to_send: Vec<String>,
    received: mpsc::Sender<String>,
) {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut ws = accept_async(stream).await.expect("handshake");

    for frame in to_send {
        ws.send(WsMessage::Text(frame)).await.expect("server send");
    }

    while let Some(Ok(msg)) = ws.next().await {
        if let WsMessage::Text(text) = msg {
            if received.send(text).await.is_err() {
                break;
            }
        }
    }
}

async fn next_frame(rx: &mut mpsc::Receiver<SessionNotification>) -> Option<String> {
    loop {
        match timeout(WAIT, rx.recv()).await.ok()?? {
            SessionNotification::Frame(frame) => return Some(frame),
            SessionNotification::StateChanged(_) => continue,
        }
    }
}

async fn wait_for_state(rx: &mut mpsc::Receiver<SessionNotification>, wanted: ConnState) {
    loop {
        match timeout(WAIT, rx.recv()).await.expect("notification").expect("channel open") {
            SessionNotification::StateChanged(state) if state == wanted => return,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn opens_and_forwards_frames_in_receipt_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, _received_rx) = mpsc::channel(8);
    tokio::spawn(serve_one(
        listener,
        vec!["frame-one".into(), "frame-two".into()],
        received_tx,
    ));

    let (handle, mut notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));

    assert_eq!(handle.settle().await, ConnState::Open);
    assert_eq!(next_frame(&mut notif_rx).await.as_deref(), Some("frame-one"));
    assert_eq!(next_frame(&mut notif_rx).await.as_deref(), Some("frame-two"));
}

#[tokio::test]
async fn send_reaches_the_server_as_json() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, mut received_rx) = mpsc::channel(8);
    tokio::spawn(serve_one(listener, vec![], received_tx));

    let (handle, _notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Open);

    handle.send(outbound("c1", "hello")).await;

    let frame = timeout(WAIT, received_rx.recv()).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "message");
    assert_eq!(value["chat_id"], "c1");
    assert_eq!(value["content"], "hello");
}

#[tokio::test]
async fn sends_buffered_while_connecting_flush_on_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, mut received_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        // Hold the handshake open long enough for the client to compose
        // a message while still Connecting.
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let WsMessage::Text(text) = msg {
                let _ = received_tx.send(text).await;
            }
        }
    });

    let (handle, _notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));

    // Composed before the socket is up.
    handle.send(outbound("c1", "early")).await;
    assert_eq!(handle.settle().await, ConnState::Open);

    let frame = timeout(WAIT, received_rx.recv()).await.unwrap().unwrap();
    assert!(frame.contains("early"));
}

#[tokio::test]
async fn connect_failure_settles_failed_and_sends_are_silent() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (handle, _notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));

    assert_eq!(handle.settle().await, ConnState::Failed);

    // Dropped without error or transmission.
    handle.send(outbound("c1", "lost")).await;
    assert_eq!(handle.state(), ConnState::Failed);

    // Close on a failed handle is a no-op, not a revival.
    handle.close().await;
    assert_eq!(handle.state(), ConnState::Failed);
}

#[tokio::test]
async fn stalled_handshake_times_out_into_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept TCP but never answer the WebSocket upgrade.
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let config = ConnectConfig {
        connect_timeout: Duration::from_millis(200),
        ..config_for(addr)
    };
    let (handle, _notif_rx) = Connection::open(config, ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Failed);
}

#[tokio::test]
async fn retry_policy_recovers_from_a_failed_first_attempt() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // First attempt: sever the TCP stream before the upgrade.
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
        // Second attempt: complete the handshake.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let config = ConnectConfig {
        retry: RetryPolicy::Fixed {
            delay: Duration::from_millis(50),
            max_attempts: 3,
        },
        ..config_for(addr)
    };
    let (handle, _notif_rx) = Connection::open(config, ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Open);
}

#[tokio::test]
async fn close_is_idempotent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, _received_rx) = mpsc::channel(8);
    tokio::spawn(serve_one(listener, vec![], received_tx));

    let (handle, mut notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Open);

    handle.close().await;
    wait_for_state(&mut notif_rx, ConnState::Closed).await;
    assert_eq!(handle.state(), ConnState::Closed);

    // A second close must not error or change anything.
    handle.close().await;
    assert_eq!(handle.state(), ConnState::Closed);

    // Sends after close are silent drops.
    handle.send(outbound("c1", "too late")).await;
    assert_eq!(handle.state(), ConnState::Closed);
}

#[tokio::test]
async fn server_initiated_close_ends_in_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let (handle, mut notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Open);
    wait_for_state(&mut notif_rx, ConnState::Closed).await;
    assert_eq!(handle.state(), ConnState::Closed);
}

#[tokio::test]
async fn dropped_transport_ends_in_failed_or_closed_without_panicking() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        // Kill the TCP stream without a close frame.
        drop(ws);
    });

    let (handle, mut notif_rx) =
        Connection::open(config_for(addr), ChatId::new("c1"), UserId::new("u1"));
    assert_eq!(handle.settle().await, ConnState::Open);

    // The session must settle in a terminal state either way.
    loop {
        match timeout(WAIT, notif_rx.recv()).await.expect("notification") {
            Some(SessionNotification::StateChanged(state)) if state.is_terminal() => break,
            Some(_) => continue,
            None => break,
        }
    }
    assert!(handle.state().is_terminal());
}

#[tokio::test]
async fn session_url_targets_the_configured_endpoint() {
    let url = courier_net::session_url(
        "ws://example.test/api/v1/ws/connect",
        &ChatId::new("chat-7"),
        &UserId::new("user 1"),
    )
    .unwrap();
    assert_eq!(
        url.as_str(),
        "ws://example.test/api/v1/ws/connect?user_id=user+1&chat_id=chat-7"
    );
}
