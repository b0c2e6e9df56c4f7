// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_docs_in_private_items
)]

//! Integration tests for the board channel reconnect policy.
//!
//! The contract under test:
//! - an unexpected closure schedules exactly one reconnect attempt
//!   after the fixed delay
//! - `close()` before the delay elapses cancels the attempt
//! - an explicit close never reconnects
//! - retries continue indefinitely while the server keeps dropping us

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;

use termboard::sync::{BoardSync, ConnState};
use termboard_proto::board::BoardId;

/// How each accepted connection is treated.
#[derive(Debug, Clone, Copy)]
enum ConnBehavior {
    /// Close the connection right after the handshake.
    DropImmediately,
    /// Drop only the first connection; keep later ones open.
    DropFirstThenHold,
}

/// Start a server that records an accept timestamp per connection.
async fn start_server(
    behavior: ConnBehavior,
) -> (String, mpsc::UnboundedReceiver<Instant>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut accepted: u32 = 0;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            accepted += 1;
            let _ = accept_tx.send(Instant::now());

            let drop_now = match behavior {
                ConnBehavior::DropImmediately => true,
                ConnBehavior::DropFirstThenHold => accepted == 1,
            };
            tokio::spawn(async move {
                if drop_now {
                    // Brief pause so the client observes Open first.
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    let _ = ws.close(None).await;
                } else {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    (format!("ws://{addr}/ws"), accept_rx)
}

/// Pump the client until `pred` holds or the timeout expires.
async fn wait_for<F>(sync: &mut BoardSync, timeout: Duration, description: &str, pred: F)
where
    F: Fn(&BoardSync) -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        sync.pump();
        if pred(sync) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timeout waiting for {description}");
}

/// Keep pumping for a fixed window (to give wrong behavior a chance to
/// show up) without asserting anything.
async fn pump_for(sync: &mut BoardSync, window: Duration) {
    let deadline = Instant::now() + window;
    while Instant::now() < deadline {
        sync.pump();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn unexpected_close_reconnects_after_the_fixed_delay() {
    let delay = Duration::from_millis(200);
    let (url, mut accepts) = start_server(ConnBehavior::DropFirstThenHold).await;

    let mut sync = BoardSync::new(url).with_reconnect_delay(delay);
    sync.open(BoardId::new(7));
    wait_for(&mut sync, Duration::from_secs(5), "initial Open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    accepts.recv().await.unwrap();

    // Server drops us; the client notices and schedules one attempt.
    wait_for(&mut sync, Duration::from_secs(5), "Disconnected", |s| {
        s.state() == ConnState::Disconnected
    })
    .await;
    let disconnected_at = Instant::now();

    // The retry succeeds against the now-holding server.
    wait_for(&mut sync, Duration::from_secs(5), "reconnected Open", |s| {
        s.state() == ConnState::Open
    })
    .await;

    let second_accept = accepts.recv().await.unwrap();
    let waited = second_accept.duration_since(disconnected_at);
    assert!(
        waited >= delay.mul_f64(0.7),
        "reconnect came too early: {waited:?} (delay {delay:?})"
    );
    assert_eq!(sync.board(), Some(BoardId::new(7)));
}

#[tokio::test]
async fn exactly_one_attempt_is_scheduled_per_closure() {
    let delay = Duration::from_millis(150);
    let (url, mut accepts) = start_server(ConnBehavior::DropFirstThenHold).await;

    let mut sync = BoardSync::new(url).with_reconnect_delay(delay);
    sync.open(BoardId::new(7));
    wait_for(&mut sync, Duration::from_secs(5), "initial Open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    accepts.recv().await.unwrap();

    wait_for(&mut sync, Duration::from_secs(5), "Disconnected", |s| {
        s.state() == ConnState::Disconnected
    })
    .await;
    wait_for(&mut sync, Duration::from_secs(5), "reconnected Open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    accepts.recv().await.unwrap();

    // The second connection holds, so no further attempts may arrive.
    pump_for(&mut sync, delay * 4).await;
    assert!(
        accepts.try_recv().is_err(),
        "unexpected extra connection attempt"
    );
}

#[tokio::test]
async fn close_before_the_delay_cancels_the_attempt() {
    let delay = Duration::from_millis(300);
    let (url, mut accepts) = start_server(ConnBehavior::DropImmediately).await;

    let mut sync = BoardSync::new(url).with_reconnect_delay(delay);
    sync.open(BoardId::new(7));
    accepts.recv().await.unwrap();

    wait_for(&mut sync, Duration::from_secs(5), "Disconnected", |s| {
        s.state() == ConnState::Disconnected
    })
    .await;

    // Close while the reconnect timer is pending.
    sync.close();

    pump_for(&mut sync, delay * 3).await;
    assert_eq!(sync.state(), ConnState::Disconnected);
    assert!(
        accepts.try_recv().is_err(),
        "reconnect attempt happened despite close()"
    );
}

#[tokio::test]
async fn explicit_close_of_an_open_channel_does_not_reconnect() {
    let delay = Duration::from_millis(100);
    let (url, mut accepts) = start_server(ConnBehavior::DropFirstThenHold).await;

    let mut sync = BoardSync::new(url).with_reconnect_delay(delay);
    sync.open(BoardId::new(7));
    wait_for(&mut sync, Duration::from_secs(5), "Open", |s| {
        s.state() == ConnState::Open
    })
    .await;
    accepts.recv().await.unwrap();

    sync.close();
    assert_eq!(sync.state(), ConnState::Disconnected);

    pump_for(&mut sync, delay * 4).await;
    assert_eq!(sync.state(), ConnState::Disconnected);
    assert!(
        accepts.try_recv().is_err(),
        "close() must be terminal — no reconnect"
    );
}

#[tokio::test]
async fn retries_continue_until_explicitly_closed() {
    let delay = Duration::from_millis(50);
    let (url, mut accepts) = start_server(ConnBehavior::DropImmediately).await;

    let mut sync = BoardSync::new(url).with_reconnect_delay(delay);
    sync.open(BoardId::new(7));

    // With the server dropping every connection, the client keeps
    // cycling connect → drop → wait → connect. Expect several rounds.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut rounds = 0u32;
    while rounds < 3 && Instant::now() < deadline {
        sync.pump();
        while accepts.try_recv().is_ok() {
            rounds += 1;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(rounds >= 3, "expected at least 3 attempts, saw {rounds}");

    sync.close();
    // Drain anything in flight, then verify the cycle is broken.
    tokio::time::sleep(Duration::from_millis(100)).await;
    while accepts.try_recv().is_ok() {}
    pump_for(&mut sync, delay * 4).await;
    assert!(accepts.try_recv().is_err(), "still connecting after close()");
}
