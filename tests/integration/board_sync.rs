// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::needless_continue,
    clippy::missing_panics_doc,
    clippy::missing_docs_in_private_items
)]

//! Integration tests for the live board channel.
//!
//! Each test stands up a minimal in-process WebSocket server and drives
//! a [`BoardSync`] client against it:
//! - opening a board reaches `Open` and uses the `/boards/{id}/` path
//! - inbound `task_update` frames reach subscribers in order
//! - malformed and unrecognized frames are discarded without closing
//! - outbound status changes carry the documented JSON shape
//! - opening a second board tears the first connection down first

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use termboard::sync::{BoardSync, ConnState, SyncNotification};
use termboard_proto::board::BoardId;
use termboard_proto::sync::{decode_command, ClientCommand};
use termboard_proto::task::{TaskId, TaskStatus};

/// What the test server should do with each accepted connection.
#[derive(Debug, Clone)]
enum ServerScript {
    /// Accept and hold the connection open, sending the given frames.
    SendFrames(Vec<String>),
    /// Accept, forward every received text frame to the test, hold open.
    Echo,
}

/// Events the test server reports back to the test body.
#[derive(Debug)]
enum ServerSeen {
    /// A connection was accepted.
    Accepted,
    /// A previously accepted connection ended.
    ConnectionEnded,
    /// A text frame arrived from the client.
    Frame(String),
}

/// Start a scripted WebSocket server on an OS-assigned port.
///
/// Returns the base channel URL (`ws://addr/ws`) and a receiver of
/// [`ServerSeen`] events.
async fn start_server(script: ServerScript) -> (String, mpsc::UnboundedReceiver<ServerSeen>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let _ = seen_tx.send(ServerSeen::Accepted);

            let script = script.clone();
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                match script {
                    ServerScript::SendFrames(frames) => {
                        for frame in frames {
                            if ws.send(Message::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                        // Hold the connection until the client goes away.
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                    ServerScript::Echo => {
                        while let Some(Ok(msg)) = ws.next().await {
                            if let Message::Text(text) = msg {
                                let _ = seen_tx.send(ServerSeen::Frame(text.to_string()));
                            }
                        }
                    }
                }
                let _ = seen_tx.send(ServerSeen::ConnectionEnded);
            });
        }
    });

    (format!("ws://{addr}/ws"), seen_rx)
}

/// Pump the client until `pred` holds or the timeout expires.
async fn wait_for<F>(sync: &mut BoardSync, timeout: Duration, description: &str, pred: F)
where
    F: Fn(&BoardSync) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        sync.pump();
        if pred(sync) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timeout waiting for {description}");
}

/// Wait for the next server event matching a predicate.
async fn wait_for_seen<F>(
    rx: &mut mpsc::UnboundedReceiver<ServerSeen>,
    timeout: Duration,
    description: &str,
    pred: F,
) -> ServerSeen
where
    F: Fn(&ServerSeen) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(seen)) if pred(&seen) => return seen,
            Ok(Some(_other)) => continue,
            Ok(None) => panic!("server channel closed while waiting for {description}"),
            Err(_) => break,
        }
    }
    panic!("timeout waiting for {description}");
}

/// Drain every pending notification from a subscription, pumping first.
fn drain(sync: &mut BoardSync, sub: &mut termboard::sync::SyncSubscription) -> Vec<SyncNotification> {
    sync.pump();
    let mut out = Vec::new();
    while let Some(n) = sub.try_next() {
        out.push(n);
    }
    out
}

#[tokio::test]
async fn open_reaches_open_state() {
    let (url, _seen) = start_server(ServerScript::SendFrames(Vec::new())).await;
    let mut sync = BoardSync::new(url);

    sync.open(BoardId::new(7));
    assert_eq!(sync.state(), ConnState::Connecting);

    wait_for(&mut sync, Duration::from_secs(5), "Open state", |s| {
        s.state() == ConnState::Open
    })
    .await;
    assert_eq!(sync.board(), Some(BoardId::new(7)));
}

#[tokio::test]
async fn channel_path_carries_the_board_id() {
    // A dedicated server that records the request path during the
    // handshake, then keeps the connection open.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, mut path_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = |req: &tokio_tungstenite::tungstenite::handshake::server::Request,
                        resp: tokio_tungstenite::tungstenite::handshake::server::Response| {
            let _ = path_tx.send(req.uri().path().to_string());
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut sync = BoardSync::new(format!("ws://{addr}/ws"));
    sync.open(BoardId::new(7));
    wait_for(&mut sync, Duration::from_secs(5), "Open state", |s| {
        s.state() == ConnState::Open
    })
    .await;

    let path = tokio::time::timeout(Duration::from_secs(5), path_rx.recv())
        .await
        .expect("handshake path")
        .unwrap();
    assert_eq!(path, "/ws/boards/7/");
}

#[tokio::test]
async fn task_update_notification_reaches_subscribers() {
    let frame = r#"{"type": "task_update", "task_id": 42, "status": "DONE"}"#.to_string();
    let (url, _seen) = start_server(ServerScript::SendFrames(vec![frame])).await;

    let mut sync = BoardSync::new(url);
    let mut sub = sync.subscribe();
    sync.open(BoardId::new(7));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let updates: Vec<_> = drain(&mut sync, &mut sub)
            .into_iter()
            .filter(|n| matches!(n, SyncNotification::TaskUpdated { .. }))
            .collect();
        if !updates.is_empty() {
            assert_eq!(
                updates,
                vec![SyncNotification::TaskUpdated {
                    task_id: TaskId::new(42),
                    status: TaskStatus::Done,
                }]
            );
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timeout waiting for task update"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn updates_apply_in_delivery_order() {
    let frames = vec![
        r#"{"type": "task_update", "task_id": 1, "status": "IN_PROGRESS"}"#.to_string(),
        r#"{"type": "task_update", "task_id": 2, "status": "REVIEW"}"#.to_string(),
        r#"{"type": "task_update", "task_id": 1, "status": "DONE"}"#.to_string(),
    ];
    let (url, _seen) = start_server(ServerScript::SendFrames(frames)).await;

    let mut sync = BoardSync::new(url);
    let mut sub = sync.subscribe();
    sync.open(BoardId::new(7));

    let mut updates = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while updates.len() < 3 {
        updates.extend(
            drain(&mut sync, &mut sub)
                .into_iter()
                .filter(|n| matches!(n, SyncNotification::TaskUpdated { .. })),
        );
        assert!(
            tokio::time::Instant::now() < deadline,
            "timeout collecting updates"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        updates,
        vec![
            SyncNotification::TaskUpdated {
                task_id: TaskId::new(1),
                status: TaskStatus::InProgress,
            },
            SyncNotification::TaskUpdated {
                task_id: TaskId::new(2),
                status: TaskStatus::Review,
            },
            SyncNotification::TaskUpdated {
                task_id: TaskId::new(1),
                status: TaskStatus::Done,
            },
        ]
    );
}

#[tokio::test]
async fn malformed_and_unknown_frames_are_survived() {
    let frames = vec![
        "{definitely not json".to_string(),
        r#"{"type": "member_joined", "user": "alice"}"#.to_string(),
        r#"{"type": "task_update", "task_id": 3, "status": "REVIEW"}"#.to_string(),
    ];
    let (url, _seen) = start_server(ServerScript::SendFrames(frames)).await;

    let mut sync = BoardSync::new(url);
    let mut sub = sync.subscribe();
    sync.open(BoardId::new(7));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut updates = Vec::new();
    while updates.is_empty() {
        updates.extend(
            drain(&mut sync, &mut sub)
                .into_iter()
                .filter(|n| matches!(n, SyncNotification::TaskUpdated { .. })),
        );
        assert!(
            tokio::time::Instant::now() < deadline,
            "timeout waiting for the valid update"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Only the valid frame produced a notification, and the connection
    // survived the garbage before it.
    assert_eq!(
        updates,
        vec![SyncNotification::TaskUpdated {
            task_id: TaskId::new(3),
            status: TaskStatus::Review,
        }]
    );
    assert_eq!(sync.state(), ConnState::Open);
}

#[tokio::test]
async fn send_status_change_transmits_documented_json() {
    let (url, mut seen) = start_server(ServerScript::Echo).await;

    let mut sync = BoardSync::new(url);
    sync.open(BoardId::new(7));
    wait_for(&mut sync, Duration::from_secs(5), "Open state", |s| {
        s.state() == ConnState::Open
    })
    .await;

    sync.send_status_change(TaskId::new(42), TaskStatus::Done)
        .unwrap();

    let frame = wait_for_seen(&mut seen, Duration::from_secs(5), "outbound frame", |s| {
        matches!(s, ServerSeen::Frame(_))
    })
    .await;
    let ServerSeen::Frame(text) = frame else {
        unreachable!();
    };

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["action"], "update_status");
    assert_eq!(value["task_id"], 42);
    assert_eq!(value["status"], "DONE");

    // And it parses as the typed request.
    assert_eq!(
        decode_command(&text).unwrap(),
        ClientCommand::UpdateStatus {
            task_id: TaskId::new(42),
            status: TaskStatus::Done,
        }
    );
}

#[tokio::test]
async fn send_while_disconnected_produces_no_frame() {
    let (url, mut seen) = start_server(ServerScript::Echo).await;

    let mut sync = BoardSync::new(url);
    let result = sync.send_status_change(TaskId::new(1), TaskStatus::Done);
    assert!(result.is_err());

    // No connection was ever made, so the server saw nothing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(seen.try_recv().is_err());
}

#[tokio::test]
async fn opening_a_second_board_tears_down_the_first() {
    let (url, mut seen) = start_server(ServerScript::Echo).await;

    let mut sync = BoardSync::new(url);
    sync.open(BoardId::new(1));
    wait_for(&mut sync, Duration::from_secs(5), "first board open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    wait_for_seen(&mut seen, Duration::from_secs(5), "first accept", |s| {
        matches!(s, ServerSeen::Accepted)
    })
    .await;

    sync.open(BoardId::new(2));

    // The old connection is torn down and a single new one is accepted;
    // the client never holds two live connections.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let (mut ended, mut accepted) = (0u32, 0u32);
    while (ended < 1 || accepted < 1) && tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        match tokio::time::timeout(remaining, seen.recv()).await {
            Ok(Some(ServerSeen::ConnectionEnded)) => ended += 1,
            Ok(Some(ServerSeen::Accepted)) => accepted += 1,
            Ok(Some(ServerSeen::Frame(_))) => {}
            Ok(None) | Err(_) => break,
        }
    }
    assert_eq!(ended, 1, "old connection should have been closed");
    assert_eq!(accepted, 1, "exactly one new connection expected");

    wait_for(&mut sync, Duration::from_secs(5), "second board open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    assert_eq!(sync.board(), Some(BoardId::new(2)));
}

#[tokio::test]
async fn connect_to_nonexistent_server_schedules_retry_not_panic() {
    // Port 1 is almost certainly not listening.
    let mut sync = BoardSync::new("ws://127.0.0.1:1/ws")
        .with_reconnect_delay(Duration::from_millis(100));
    sync.open(BoardId::new(7));

    wait_for(
        &mut sync,
        Duration::from_secs(5),
        "Disconnected after failed connect",
        |s| s.state() == ConnState::Disconnected,
    )
    .await;

    // The retry flips the state back to Connecting after the delay.
    wait_for(
        &mut sync,
        Duration::from_secs(5),
        "retry enters Connecting",
        |s| s.state() == ConnState::Connecting,
    )
    .await;
}
