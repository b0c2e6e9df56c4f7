//! Per-attempt WebSocket I/O task for the board channel.
//!
//! Each connection attempt runs on its own tokio task: connect, report
//! the outcome, then pump inbound text frames and outbound commands
//! until either side closes. Every event carries the attempt's epoch so
//! the owning [`super::BoardSync`] can discard callbacks from a
//! superseded attempt.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::ConnEvent;

/// Timeout for establishing the WebSocket connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands from the owning `BoardSync` to the connection task.
#[derive(Debug)]
pub(crate) enum ConnCommand {
    /// Transmit a text frame.
    Send(String),
    /// Perform a graceful close handshake and exit.
    Close,
}

/// Handle to a spawned connection task.
///
/// Dropping the handle does not stop the task; the owner either asks for
/// a graceful close or aborts, and relies on epoch checks to ignore
/// anything the task reports afterwards.
#[derive(Debug)]
pub(crate) struct ConnHandle {
    outbound: mpsc::UnboundedSender<ConnCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl ConnHandle {
    /// Queues a text frame for transmission.
    pub(crate) fn send_text(&self, text: String) -> Result<(), ()> {
        self.outbound.send(ConnCommand::Send(text)).map_err(|_| ())
    }

    /// Requests a graceful close handshake.
    pub(crate) fn request_close(&self) -> Result<(), ()> {
        self.outbound.send(ConnCommand::Close).map_err(|_| ())
    }

    /// Aborts the task outright, dropping the socket.
    pub(crate) fn abort(&self) {
        self.task.abort();
    }
}

/// Spawns a connection attempt for `url`, stamped with `epoch`.
pub(crate) fn spawn(
    url: String,
    epoch: u64,
    events: mpsc::UnboundedSender<ConnEvent>,
) -> ConnHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(url, epoch, events, outbound_rx));
    ConnHandle {
        outbound: outbound_tx,
        task,
    }
}

/// Connection task body: connect, then pump frames and commands.
async fn run(
    url: String,
    epoch: u64,
    events: mpsc::UnboundedSender<ConnEvent>,
    mut outbound: mpsc::UnboundedReceiver<ConnCommand>,
) {
    let connect = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(&url));
    let ws = match connect.await {
        Ok(Ok((ws, _response))) => ws,
        Ok(Err(e)) => {
            tracing::warn!(url = %url, err = %e, "board channel connect failed");
            let _ = events.send(ConnEvent::ConnectFailed { epoch });
            return;
        }
        Err(_) => {
            tracing::warn!(url = %url, "board channel connect timed out");
            let _ = events.send(ConnEvent::ConnectFailed { epoch });
            return;
        }
    };

    tracing::info!(url = %url, epoch, "board channel established");
    let _ = events.send(ConnEvent::Opened { epoch });

    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let frame = ConnEvent::Frame { epoch, text: text.to_string() };
                    if events.send(frame).is_err() {
                        // Owner dropped; nothing left to deliver to.
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!(epoch, "board channel closed by server");
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/pong and binary frames are not part of the protocol.
                }
                Some(Err(e)) => {
                    tracing::warn!(epoch, err = %e, "board channel read error");
                    break;
                }
                None => break,
            },
            command = outbound.recv() => match command {
                Some(ConnCommand::Send(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        tracing::warn!(epoch, err = %e, "board channel send failed");
                        break;
                    }
                }
                Some(ConnCommand::Close) => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                None => break,
            },
        }
    }

    let _ = events.send(ConnEvent::Closed { epoch });
}
