//! Live board sync client.
//!
//! Maintains one WebSocket connection for the currently-viewed board,
//! reconciles inbound task-status notifications into local state via
//! subscriber notifications, and reconnects automatically on unexpected
//! closure.
//!
//! # Architecture
//!
//! [`BoardSync`] is a single-owner state machine driven from the TUI
//! event loop. Socket I/O runs on a background task per connection
//! attempt ([`conn`]); attempts report back over an internal event queue
//! that the owner drains with [`BoardSync::pump`] on each tick, so all
//! state transitions happen on one logical event queue.
//!
//! Every attempt is stamped with a monotonically increasing **epoch**.
//! Opening a new connection or closing the current one bumps the epoch,
//! which invalidates every outstanding callback and reconnect timer from
//! the superseded attempt: `pump` drops events whose epoch is stale, so
//! a late `Closed` from an abandoned socket can never resurrect a
//! connection for a board the user has left.
//!
//! # Reconnection
//!
//! An unexpected closure (anything other than an explicit [`close`])
//! schedules exactly one reconnect attempt after a fixed delay. There is
//! no backoff growth and no retry cap: each failed attempt schedules the
//! next, indefinitely, until `close` is called.
//!
//! [`close`]: BoardSync::close

mod conn;

use std::time::Duration;

use tokio::sync::mpsc;

use termboard_proto::board::BoardId;
use termboard_proto::sync::{self, ClientCommand, ServerEvent};
use termboard_proto::task::{TaskId, TaskStatus};

/// Default delay before the single scheduled reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Connection lifecycle state for the board channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No connection and nothing in flight.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The channel is established; sends are possible.
    Open,
    /// A graceful close handshake is in progress.
    Closing,
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Errors surfaced to callers of the sync client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The channel is not open; the caller may surface this and trigger
    /// a manual `open`.
    #[error("board channel unavailable")]
    NotConnected,
    /// Encoding an outbound request failed.
    #[error(transparent)]
    Codec(#[from] termboard_proto::sync::CodecError),
}

/// Notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotification {
    /// The connection state changed.
    StateChanged(ConnState),
    /// A task's status changed remotely; replace the status of the
    /// matching task and nothing else.
    TaskUpdated {
        /// Which task changed.
        task_id: TaskId,
        /// Its new status.
        status: TaskStatus,
    },
}

/// An active subscription to sync notifications.
///
/// Acts as the disposer: dropping the subscription unsubscribes, and the
/// client prunes the dead sender on its next notification.
#[derive(Debug)]
pub struct SyncSubscription {
    rx: mpsc::UnboundedReceiver<SyncNotification>,
}

impl SyncSubscription {
    /// Takes the next pending notification without blocking.
    pub fn try_next(&mut self) -> Option<SyncNotification> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next notification; `None` once the client is gone.
    pub async fn next(&mut self) -> Option<SyncNotification> {
        self.rx.recv().await
    }
}

/// Internal events from connection tasks and the reconnect timer.
///
/// Every variant is stamped with the epoch of the attempt that produced
/// it; [`BoardSync::pump`] drops stale epochs.
#[derive(Debug)]
enum ConnEvent {
    /// The attempt completed its handshake.
    Opened { epoch: u64 },
    /// An inbound text frame arrived.
    Frame { epoch: u64, text: String },
    /// The socket closed or errored after opening.
    Closed { epoch: u64 },
    /// The attempt failed before opening.
    ConnectFailed { epoch: u64 },
    /// The reconnect delay elapsed.
    ReconnectDue { epoch: u64 },
}

impl ConnEvent {
    const fn epoch(&self) -> u64 {
        match self {
            Self::Opened { epoch }
            | Self::Frame { epoch, .. }
            | Self::Closed { epoch }
            | Self::ConnectFailed { epoch }
            | Self::ReconnectDue { epoch } => *epoch,
        }
    }
}

/// Live sync client for one board view.
///
/// Owns at most one connection at a time. Entering a board view calls
/// [`open`](Self::open); leaving it calls [`close`](Self::close). The
/// owner must call [`pump`](Self::pump) regularly (once per UI tick) to
/// drive the state machine.
#[derive(Debug)]
pub struct BoardSync {
    /// Base channel URL, e.g. `ws://host:8000/ws`.
    ws_base: String,
    /// Fixed delay before the scheduled reconnect attempt.
    reconnect_delay: Duration,
    state: ConnState,
    /// Board the client is (re)connecting to, while the view is active.
    board: Option<BoardId>,
    /// Identity token of the current connection attempt.
    epoch: u64,
    events_tx: mpsc::UnboundedSender<ConnEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnEvent>,
    conn: Option<conn::ConnHandle>,
    /// Pending reconnect timer, if any.
    reconnect: Option<tokio::task::JoinHandle<()>>,
    subscribers: Vec<mpsc::UnboundedSender<SyncNotification>>,
}

impl BoardSync {
    /// Creates a disconnected sync client for the given channel base URL.
    #[must_use]
    pub fn new(ws_base: impl Into<String>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            ws_base: ws_base.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state: ConnState::Disconnected,
            board: None,
            epoch: 0,
            events_tx,
            events_rx,
            conn: None,
            reconnect: None,
            subscribers: Vec::new(),
        }
    }

    /// Overrides the reconnect delay (tests use short delays).
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnState {
        self.state
    }

    /// Board this client is currently serving, if any.
    #[must_use]
    pub const fn board(&self) -> Option<BoardId> {
        self.board
    }

    /// Registers a subscriber and returns its disposer handle.
    pub fn subscribe(&mut self) -> SyncSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        SyncSubscription { rx }
    }

    /// Opens the channel for `board`.
    ///
    /// Any existing connection (for the same board or a different one)
    /// is closed first, along with any pending reconnect timer, so no
    /// two connections ever coexist. Transitions to `Connecting`
    /// immediately; `pump` later reports `Open` or schedules a
    /// reconnect on failure.
    pub fn open(&mut self, board: BoardId) {
        self.close();
        self.board = Some(board);
        self.set_state(ConnState::Connecting);
        let url = channel_url(&self.ws_base, board);
        tracing::info!(%board, url = %url, epoch = self.epoch, "opening board channel");
        self.conn = Some(conn::spawn(url, self.epoch, self.events_tx.clone()));
    }

    /// Closes the channel and cancels any pending reconnect.
    ///
    /// Idempotent: closing an already-closed client is a no-op. An open
    /// connection gets a graceful close handshake (observable as a
    /// `Closing` notification); the epoch bump discards whatever the old
    /// socket reports afterwards, so an explicit close never triggers a
    /// reconnect.
    pub fn close(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
        self.board = None;
        // Bump unconditionally: a reconnect timer that already fired may
        // have queued a ReconnectDue we have not pumped yet.
        self.epoch += 1;
        match self.state {
            ConnState::Disconnected => return,
            ConnState::Connecting => {
                if let Some(c) = self.conn.take() {
                    c.abort();
                }
            }
            ConnState::Open | ConnState::Closing => {
                self.set_state(ConnState::Closing);
                if let Some(c) = self.conn.take()
                    && c.request_close().is_err()
                {
                    c.abort();
                }
            }
        }
        self.set_state(ConnState::Disconnected);
    }

    /// Sends a status change for `task_id` upstream, fire-and-forget.
    ///
    /// The authoritative state update arrives later as an inbound
    /// notification (the service broadcasts to all board members,
    /// including the sender).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConnected`] if the channel is not open;
    /// nothing is sent in that case.
    pub fn send_status_change(
        &mut self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> Result<(), SyncError> {
        if self.state != ConnState::Open {
            return Err(SyncError::NotConnected);
        }
        let text = sync::encode_command(&ClientCommand::UpdateStatus { task_id, status })?;
        let Some(c) = self.conn.as_ref() else {
            return Err(SyncError::NotConnected);
        };
        c.send_text(text).map_err(|()| SyncError::NotConnected)?;
        tracing::debug!(%task_id, %status, "status change sent");
        Ok(())
    }

    /// Drains pending connection events and applies them in arrival
    /// order. Call once per UI tick.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.process(event);
        }
    }

    /// Applies one connection event to the state machine.
    fn process(&mut self, event: ConnEvent) {
        if event.epoch() != self.epoch {
            tracing::debug!(
                stale = event.epoch(),
                current = self.epoch,
                "ignoring event from superseded connection"
            );
            return;
        }
        match event {
            ConnEvent::Opened { .. } => {
                if self.state == ConnState::Connecting {
                    self.set_state(ConnState::Open);
                }
            }
            ConnEvent::ConnectFailed { .. } => {
                self.conn = None;
                self.set_state(ConnState::Disconnected);
                self.schedule_reconnect();
            }
            ConnEvent::Closed { .. } => {
                if matches!(self.state, ConnState::Open | ConnState::Connecting) {
                    tracing::warn!(epoch = self.epoch, "board channel closed unexpectedly");
                    self.conn = None;
                    self.set_state(ConnState::Disconnected);
                    self.schedule_reconnect();
                }
            }
            ConnEvent::Frame { text, .. } => self.handle_frame(&text),
            ConnEvent::ReconnectDue { .. } => {
                self.reconnect = None;
                if self.state == ConnState::Disconnected
                    && let Some(board) = self.board
                {
                    tracing::info!(%board, "reconnecting board channel");
                    self.open(board);
                }
            }
        }
    }

    /// Decodes and dispatches one inbound frame.
    ///
    /// Malformed payloads are logged and discarded; they never close the
    /// connection. Recognized-but-unknown message types are ignored
    /// silently per the protocol.
    fn handle_frame(&mut self, text: &str) {
        match sync::decode_event(text) {
            Ok(Some(ServerEvent::TaskUpdate { task_id, status })) => {
                tracing::debug!(%task_id, %status, "task update received");
                self.notify(SyncNotification::TaskUpdated { task_id, status });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(err = %e, "discarding malformed board channel frame");
            }
        }
    }

    /// Schedules the single reconnect attempt for the current epoch.
    fn schedule_reconnect(&mut self) {
        let Some(board) = self.board else {
            return;
        };
        let epoch = self.epoch;
        let delay = self.reconnect_delay;
        let tx = self.events_tx.clone();
        tracing::info!(%board, ?delay, "scheduling reconnect");
        self.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ConnEvent::ReconnectDue { epoch });
        }));
    }

    fn set_state(&mut self, state: ConnState) {
        if self.state != state {
            self.state = state;
            self.notify(SyncNotification::StateChanged(state));
        }
    }

    /// Fans a notification out to live subscribers, pruning dropped ones.
    fn notify(&mut self, notification: SyncNotification) {
        self.subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }
}

impl Drop for BoardSync {
    fn drop(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
        if let Some(c) = self.conn.take() {
            c.abort();
        }
    }
}

/// Builds the channel address for a board: `{base}/boards/{id}/`.
#[must_use]
pub fn channel_url(ws_base: &str, board: BoardId) -> String {
    let base = ws_base.trim_end_matches('/');
    format!("{base}/boards/{board}/")
}
