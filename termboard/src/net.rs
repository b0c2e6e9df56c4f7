//! Bridge between the TUI event loop and the async REST client.
//!
//! The poll-based TUI never blocks on HTTP: it sends [`ApiCommand`]s to
//! a background command-handler task and drains [`ApiEvent`]s on each
//! tick.
//!
//! ```text
//! TUI (main thread)  ←── ApiEvent ───  tokio background task
//!                     ─── ApiCommand →
//! ```
//!
//! The live board channel is wired separately (see [`crate::sync`]);
//! this module only covers authentication and CRUD.

use tokio::sync::mpsc;

use termboard_proto::board::{Board, BoardId, NewBoard};
use termboard_proto::project::{NewProject, Project, ProjectId};
use termboard_proto::task::{NewTask, Task};
use termboard_proto::user::Registration;

use crate::api::{ApiClient, ApiError};
use crate::session::Session;

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent from the TUI main loop to the API task.
#[derive(Debug)]
pub enum ApiCommand {
    /// Authenticate and persist the resulting session.
    Login {
        /// Login name.
        username: String,
        /// Plaintext password.
        password: String,
    },
    /// Create an account and persist the resulting session.
    Register(Registration),
    /// Drop the token and clear the persisted session.
    Logout,
    /// Fetch the project list.
    LoadProjects,
    /// Create a project.
    CreateProject(NewProject),
    /// Fetch the boards of a project.
    LoadBoards(ProjectId),
    /// Create a board.
    CreateBoard(NewBoard),
    /// Fetch one board with its tasks.
    LoadBoard(BoardId),
    /// Create a task.
    CreateTask(NewTask),
    /// Stop the API task.
    Shutdown,
}

/// Events sent from the API task back to the TUI main loop.
#[derive(Debug)]
pub enum ApiEvent {
    /// Authentication succeeded; the session is already persisted.
    LoggedIn(Session),
    /// Logout completed; the persisted session is gone.
    LoggedOut,
    /// Project list fetched.
    Projects(Vec<Project>),
    /// A project was created.
    ProjectCreated(Project),
    /// Board list fetched for a project.
    Boards {
        /// The project the boards belong to.
        project: ProjectId,
        /// Its boards.
        boards: Vec<Board>,
    },
    /// A board was created.
    BoardCreated(Board),
    /// Board detail (including tasks) fetched.
    BoardLoaded(Board),
    /// A task was created.
    TaskCreated(Task),
    /// The server rejected our token or credentials; the UI should
    /// return to the login screen.
    Unauthorized,
    /// Any other API failure, already formatted for display.
    Error(String),
}

/// Spawns the API command-handler task and returns the channel handles.
///
/// `restored` carries a session recovered from disk at startup, if any;
/// its token is installed before the first command runs.
///
/// # Errors
///
/// Returns [`ApiError`] if the HTTP client cannot be constructed.
pub fn spawn_api(
    api_url: &str,
    restored: Option<&Session>,
) -> Result<(mpsc::Sender<ApiCommand>, mpsc::Receiver<ApiEvent>), ApiError> {
    let mut client = ApiClient::new(api_url)?;
    if let Some(session) = restored {
        client.set_token(&session.token);
    }

    let (cmd_tx, cmd_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let (evt_tx, evt_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

    tokio::spawn(command_handler(client, cmd_rx, evt_tx));

    Ok((cmd_tx, evt_rx))
}

/// Background task: execute commands against the REST API in order.
async fn command_handler(
    mut client: ApiClient,
    mut cmd_rx: mpsc::Receiver<ApiCommand>,
    evt_tx: mpsc::Sender<ApiEvent>,
) {
    while let Some(command) = cmd_rx.recv().await {
        let event = match command {
            ApiCommand::Login { username, password } => {
                handle_login(&mut client, username, password.as_str()).await
            }
            ApiCommand::Register(registration) => {
                handle_register(&mut client, &registration).await
            }
            ApiCommand::Logout => handle_logout(&mut client),
            ApiCommand::LoadProjects => client.projects().await.map(ApiEvent::Projects).into_event(),
            ApiCommand::CreateProject(body) => client
                .create_project(&body)
                .await
                .map(ApiEvent::ProjectCreated)
                .into_event(),
            ApiCommand::LoadBoards(project) => client
                .boards(project)
                .await
                .map(|boards| ApiEvent::Boards { project, boards })
                .into_event(),
            ApiCommand::CreateBoard(body) => client
                .create_board(&body)
                .await
                .map(ApiEvent::BoardCreated)
                .into_event(),
            ApiCommand::LoadBoard(board) => client
                .board(board)
                .await
                .map(ApiEvent::BoardLoaded)
                .into_event(),
            ApiCommand::CreateTask(body) => client
                .create_task(&body)
                .await
                .map(ApiEvent::TaskCreated)
                .into_event(),
            ApiCommand::Shutdown => {
                tracing::info!("api command handler shutting down");
                break;
            }
        };
        if evt_tx.send(event).await.is_err() {
            // TUI dropped; exit.
            break;
        }
    }
}

/// Login, persist the session, and report it.
async fn handle_login(client: &mut ApiClient, username: String, password: &str) -> ApiEvent {
    match client.login(&username, password).await {
        Ok(response) => {
            let session = Session::new(username, response.token);
            if let Err(e) = session.persist() {
                tracing::warn!(err = %e, "failed to persist session");
            }
            ApiEvent::LoggedIn(session)
        }
        Err(e) => error_event(&e),
    }
}

/// Register, persist the session, and report it.
async fn handle_register(client: &mut ApiClient, registration: &Registration) -> ApiEvent {
    match client.register(registration).await {
        Ok(response) => {
            let session = Session::new(response.user.username, response.token);
            if let Err(e) = session.persist() {
                tracing::warn!(err = %e, "failed to persist session");
            }
            ApiEvent::LoggedIn(session)
        }
        Err(e) => error_event(&e),
    }
}

/// Drop the token and clear the persisted session.
fn handle_logout(client: &mut ApiClient) -> ApiEvent {
    client.clear_token();
    if let Err(e) = Session::clear() {
        tracing::warn!(err = %e, "failed to clear persisted session");
    }
    ApiEvent::LoggedOut
}

/// Maps an [`ApiError`] to the event the UI should see.
fn error_event(error: &ApiError) -> ApiEvent {
    match error {
        ApiError::Unauthorized => ApiEvent::Unauthorized,
        other => ApiEvent::Error(other.to_string()),
    }
}

/// Collapses `Result<ApiEvent, ApiError>` into a single event.
trait IntoEvent {
    fn into_event(self) -> ApiEvent;
}

impl IntoEvent for Result<ApiEvent, ApiError> {
    fn into_event(self) -> ApiEvent {
        match self {
            Ok(event) => event,
            Err(e) => error_event(&e),
        }
    }
}
