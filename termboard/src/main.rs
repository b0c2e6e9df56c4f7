//! `TermBoard` — terminal-native kanban board client.
//!
//! Launches the TUI, authenticates against the tracker's REST API, and
//! keeps the currently-viewed board live over its WebSocket channel.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/termboard/config.toml`).
//!
//! ```bash
//! # Local tracker with default ports
//! cargo run --bin termboard
//!
//! # Explicit endpoints
//! cargo run --bin termboard -- --api-url http://tracker:8000/api \
//!     --ws-url ws://tracker:8000/ws
//!
//! # Or via environment variables
//! TERMBOARD_API_URL=http://tracker:8000/api cargo run
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use termboard::app::{Action, App};
use termboard::config::{CliArgs, ClientConfig};
use termboard::net::{self, ApiCommand};
use termboard::session::Session;
use termboard::sync::BoardSync;
use termboard::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("termboard starting");

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &config).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("termboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown
/// to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("termboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> io::Result<()> {
    // Restore a persisted session, if any (a corrupt file is non-fatal).
    let restored = match Session::restore() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(err = %e, "failed to restore session");
            None
        }
    };

    let mut app = App::new(restored.clone());

    let (api_tx, mut api_rx) =
        net::spawn_api(&config.api_url, restored.as_ref()).map_err(io::Error::other)?;

    let mut sync =
        BoardSync::new(config.ws_url.clone()).with_reconnect_delay(config.reconnect_delay);
    let mut sync_sub = sync.subscribe();

    if restored.is_some() {
        let _ = api_tx.try_send(ApiCommand::LoadProjects);
    }

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drive the board channel state machine.
        sync.pump();
        while let Some(notification) = sync_sub.try_next() {
            app.apply_sync(notification);
        }

        // Step 3: Drain API events (non-blocking).
        while let Ok(event) = api_rx.try_recv() {
            if let Some(action) = app.apply_api_event(event) {
                dispatch(&mut app, &mut sync, &api_tx, action);
            }
        }

        // Step 4: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = app.handle_key_event(key) {
                dispatch(&mut app, &mut sync, &api_tx, action);
            }
        }

        if app.should_quit {
            sync.close();
            let _ = api_tx.try_send(ApiCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Dispatch a UI action to the API task or the board channel.
fn dispatch(
    app: &mut App,
    sync: &mut BoardSync,
    api_tx: &mpsc::Sender<ApiCommand>,
    action: Action,
) {
    match action {
        Action::Api(command) => send_api(app, api_tx, command),
        Action::OpenBoard(board) => {
            sync.open(board);
            send_api(app, api_tx, ApiCommand::LoadBoard(board));
        }
        Action::CloseBoard => sync.close(),
        Action::SendStatus { task_id, status } => {
            if let Err(e) = sync.send_status_change(task_id, status) {
                tracing::warn!(err = %e, "status change not sent");
                app.set_notice("Live channel unavailable — reconnecting");
                // A failed send kicks off a manual reconnect for the
                // current board; the change itself is not retried.
                if let Some(board) = app.board_state.board() {
                    sync.open(board);
                }
            }
        }
    }
}

/// Queue an API command, surfacing backpressure in the status bar.
fn send_api(app: &mut App, api_tx: &mpsc::Sender<ApiCommand>, command: ApiCommand) {
    match api_tx.try_send(command) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            app.set_notice("Busy — request dropped, try again");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            app.set_notice("API worker stopped");
        }
    }
}
