//! Application state and event handling.
//!
//! [`App`] owns everything the UI renders: the current screen, fetched
//! resources, selections, and the active input form. Key events produce
//! [`Action`]s that the main loop dispatches to the API task or the
//! board sync client; API events and sync notifications are applied
//! back here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use termboard_proto::board::{Board, BoardId, NewBoard};
use termboard_proto::project::{NewProject, Project, ProjectId};
use termboard_proto::task::{NewTask, Priority, TaskId, TaskStatus};
use termboard_proto::user::Registration;

use crate::net::{ApiCommand, ApiEvent};
use crate::session::Session;
use crate::sync::{ConnState, SyncNotification};
use crate::tasks::BoardState;

/// Which screen is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Login / registration form.
    Login,
    /// Project list.
    Projects,
    /// Board list for the selected project.
    Boards,
    /// Task board with live sync.
    Tasks,
}

/// An action the main loop must dispatch on behalf of the UI.
#[derive(Debug)]
pub enum Action {
    /// Send a command to the API task.
    Api(ApiCommand),
    /// Enter a board view: fetch the board and open its live channel.
    OpenBoard(BoardId),
    /// Leave the board view: close the live channel.
    CloseBoard,
    /// Send a task status change over the live channel.
    SendStatus {
        /// Which task to change.
        task_id: TaskId,
        /// The requested status.
        status: TaskStatus,
    },
}

/// Which login form field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    /// Username entry.
    Username,
    /// Password entry.
    Password,
    /// Email entry (registration only).
    Email,
}

/// Login / registration form state.
#[derive(Debug, Default)]
pub struct LoginForm {
    /// Username entry.
    pub username: String,
    /// Password entry (rendered masked).
    pub password: String,
    /// Email entry, used only when registering.
    pub email: String,
    /// Focused field.
    pub field: LoginField,
    /// Whether the form is in registration mode.
    pub registering: bool,
}

impl Default for LoginField {
    fn default() -> Self {
        Self::Username
    }
}

/// Which new-task form field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    /// Title entry.
    Title,
    /// Description entry.
    Description,
    /// Priority entry (1–4).
    Priority,
    /// Due date entry (`YYYY-MM-DD HH:MM`, optional).
    Due,
}

/// New-task form state.
#[derive(Debug)]
pub struct TaskForm {
    /// Title entry.
    pub title: String,
    /// Description entry.
    pub description: String,
    /// Priority entry, parsed on submit.
    pub priority: String,
    /// Due date entry, parsed on submit; empty means no due date.
    pub due: String,
    /// Focused field.
    pub field: TaskField,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: "1".to_string(),
            due: String::new(),
            field: TaskField::Title,
        }
    }
}

/// The active inline editor, if any.
#[derive(Debug)]
pub enum Editor {
    /// Creating a project (title entry).
    NewProject {
        /// Title entry.
        title: String,
    },
    /// Creating a board (name entry).
    NewBoard {
        /// Name entry.
        name: String,
    },
    /// Creating a task.
    NewTask(TaskForm),
}

/// Main application state.
pub struct App {
    /// Current screen.
    pub screen: Screen,
    /// Authenticated session, if any.
    pub session: Option<Session>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Connection state of the board channel, for the status bar.
    pub connection: ConnState,
    /// One-line notice shown in the status bar (errors, hints).
    pub notice: Option<String>,
    /// Login form state.
    pub login: LoginForm,
    /// Fetched projects.
    pub projects: Vec<Project>,
    /// Selected project index.
    pub selected_project: usize,
    /// Fetched boards for the current project.
    pub boards: Vec<Board>,
    /// Selected board index.
    pub selected_board: usize,
    /// Project whose boards are shown.
    pub current_project: Option<ProjectId>,
    /// Task state for the board view.
    pub board_state: BoardState,
    /// Display name of the viewed board.
    pub board_name: String,
    /// Selected column index into [`TaskStatus::ALL`].
    pub selected_column: usize,
    /// Selected task index within the column.
    pub selected_task: usize,
    /// Active inline editor, if any.
    pub editor: Option<Editor>,
}

impl App {
    /// Creates the app, starting on the projects screen when a session
    /// was restored and on the login screen otherwise.
    #[must_use]
    pub fn new(restored: Option<Session>) -> Self {
        let screen = if restored.is_some() {
            Screen::Projects
        } else {
            Screen::Login
        };
        Self {
            screen,
            session: restored,
            should_quit: false,
            connection: ConnState::Disconnected,
            notice: None,
            login: LoginForm::default(),
            projects: Vec::new(),
            selected_project: 0,
            boards: Vec::new(),
            selected_board: 0,
            current_project: None,
            board_state: BoardState::new(),
            board_name: String::new(),
            selected_column: 0,
            selected_task: 0,
            editor: None,
        }
    }

    /// Sets the one-line status notice.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Handles a key event, returning an action for the main loop to
    /// dispatch if the input requires one.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        if self.editor.is_some() {
            return self.handle_editor_key(key);
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Projects => self.handle_projects_key(key),
            Screen::Boards => self.handle_boards_key(key),
            Screen::Tasks => self.handle_tasks_key(key),
        }
    }

    // -- Login screen -------------------------------------------------------

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.login.field = next_login_field(self.login.field, self.login.registering);
                None
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.registering = !self.login.registering;
                if !self.login.registering && self.login.field == LoginField::Email {
                    self.login.field = LoginField::Username;
                }
                None
            }
            KeyCode::Backspace => {
                self.login_field_mut().pop();
                None
            }
            KeyCode::Char(c) => {
                self.login_field_mut().push(c);
                None
            }
            KeyCode::Enter => self.submit_login(),
            _ => None,
        }
    }

    fn login_field_mut(&mut self) -> &mut String {
        match self.login.field {
            LoginField::Username => &mut self.login.username,
            LoginField::Password => &mut self.login.password,
            LoginField::Email => &mut self.login.email,
        }
    }

    fn submit_login(&mut self) -> Option<Action> {
        if self.login.username.is_empty() || self.login.password.is_empty() {
            self.set_notice("Username and password are required");
            return None;
        }
        let command = if self.login.registering {
            ApiCommand::Register(Registration {
                username: self.login.username.clone(),
                password: self.login.password.clone(),
                email: if self.login.email.is_empty() {
                    None
                } else {
                    Some(self.login.email.clone())
                },
            })
        } else {
            ApiCommand::Login {
                username: self.login.username.clone(),
                password: self.login.password.clone(),
            }
        };
        self.set_notice("Signing in…");
        Some(Action::Api(command))
    }

    // -- Projects screen ----------------------------------------------------

    fn handle_projects_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_project = self.selected_project.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_project + 1 < self.projects.len() {
                    self.selected_project += 1;
                }
                None
            }
            KeyCode::Char('n') => {
                self.editor = Some(Editor::NewProject {
                    title: String::new(),
                });
                None
            }
            KeyCode::Char('r') => Some(Action::Api(ApiCommand::LoadProjects)),
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Api(ApiCommand::Logout))
            }
            KeyCode::Enter => {
                let project = self.projects.get(self.selected_project)?;
                self.current_project = Some(project.id);
                Some(Action::Api(ApiCommand::LoadBoards(project.id)))
            }
            _ => None,
        }
    }

    // -- Boards screen ------------------------------------------------------

    fn handle_boards_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Projects;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_board = self.selected_board.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_board + 1 < self.boards.len() {
                    self.selected_board += 1;
                }
                None
            }
            KeyCode::Char('n') => {
                self.editor = Some(Editor::NewBoard {
                    name: String::new(),
                });
                None
            }
            KeyCode::Enter => {
                let board = self.boards.get(self.selected_board)?;
                self.board_name = board.name.clone();
                Some(Action::OpenBoard(board.id))
            }
            _ => None,
        }
    }

    // -- Tasks screen -------------------------------------------------------

    fn handle_tasks_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Boards;
                self.board_state.clear();
                self.connection = ConnState::Disconnected;
                Some(Action::CloseBoard)
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_column = self.selected_column.saturating_sub(1);
                self.clamp_task_selection();
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_column + 1 < TaskStatus::ALL.len() {
                    self.selected_column += 1;
                }
                self.clamp_task_selection();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.selected_column_tasks();
                if self.selected_task + 1 < len {
                    self.selected_task += 1;
                }
                None
            }
            KeyCode::Char('n') => {
                self.editor = Some(Editor::NewTask(TaskForm::default()));
                None
            }
            KeyCode::Char('r') => {
                let board = self.board_state.board()?;
                Some(Action::Api(ApiCommand::LoadBoard(board)))
            }
            KeyCode::Enter | KeyCode::Char('s') => {
                let column = TaskStatus::ALL[self.selected_column];
                let task = self
                    .board_state
                    .column(column)
                    .get(self.selected_task)
                    .copied()?;
                Some(Action::SendStatus {
                    task_id: task.id,
                    status: task.status.next(),
                })
            }
            _ => None,
        }
    }

    fn selected_column_tasks(&self) -> usize {
        self.board_state
            .column(TaskStatus::ALL[self.selected_column])
            .len()
    }

    /// Keeps the task selection inside the current column.
    fn clamp_task_selection(&mut self) {
        let len = self.selected_column_tasks();
        if self.selected_task >= len {
            self.selected_task = len.saturating_sub(1);
        }
    }

    // -- Editors ------------------------------------------------------------

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.editor = None;
                None
            }
            KeyCode::Enter => self.submit_editor(),
            KeyCode::Tab => {
                if let Some(Editor::NewTask(form)) = self.editor.as_mut() {
                    form.field = next_task_field(form.field);
                }
                None
            }
            KeyCode::Backspace => {
                if let Some(field) = self.editor_field_mut() {
                    field.pop();
                }
                None
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.editor_field_mut() {
                    field.push(c);
                }
                None
            }
            _ => None,
        }
    }

    fn editor_field_mut(&mut self) -> Option<&mut String> {
        match self.editor.as_mut()? {
            Editor::NewProject { title } => Some(title),
            Editor::NewBoard { name } => Some(name),
            Editor::NewTask(form) => Some(match form.field {
                TaskField::Title => &mut form.title,
                TaskField::Description => &mut form.description,
                TaskField::Priority => &mut form.priority,
                TaskField::Due => &mut form.due,
            }),
        }
    }

    fn submit_editor(&mut self) -> Option<Action> {
        let editor = self.editor.take()?;
        match editor {
            Editor::NewProject { title } => {
                if title.is_empty() {
                    self.set_notice("Project title cannot be empty");
                    self.editor = Some(Editor::NewProject { title });
                    return None;
                }
                Some(Action::Api(ApiCommand::CreateProject(NewProject {
                    title,
                    description: None,
                })))
            }
            Editor::NewBoard { name } => {
                if name.is_empty() {
                    self.set_notice("Board name cannot be empty");
                    self.editor = Some(Editor::NewBoard { name });
                    return None;
                }
                let project = self.current_project?;
                Some(Action::Api(ApiCommand::CreateBoard(NewBoard {
                    name,
                    project,
                })))
            }
            Editor::NewTask(form) => match self.build_new_task(&form) {
                Ok(body) => Some(Action::Api(ApiCommand::CreateTask(body))),
                Err(notice) => {
                    self.set_notice(notice);
                    self.editor = Some(Editor::NewTask(form));
                    None
                }
            },
        }
    }

    /// Validates the new-task form into a request body.
    fn build_new_task(&self, form: &TaskForm) -> Result<NewTask, String> {
        if form.title.is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        let board = self
            .board_state
            .board()
            .ok_or_else(|| "No board loaded".to_string())?;
        let priority = form
            .priority
            .parse::<u8>()
            .ok()
            .and_then(|p| Priority::new(p).ok())
            .ok_or_else(|| "Priority must be a number from 1 to 4".to_string())?;
        let due_date = if form.due.is_empty() {
            None
        } else {
            let parsed = chrono::NaiveDateTime::parse_from_str(&form.due, "%Y-%m-%d %H:%M")
                .map_err(|_| "Due date must look like 2024-06-01 17:00".to_string())?;
            Some(parsed.and_utc())
        };
        Ok(NewTask {
            title: form.title.clone(),
            description: if form.description.is_empty() {
                None
            } else {
                Some(form.description.clone())
            },
            status: TaskStatus::Todo,
            priority,
            due_date,
            board,
        })
    }

    // -- Applying events ----------------------------------------------------

    /// Applies an API event; may return a follow-up action.
    pub fn apply_api_event(&mut self, event: ApiEvent) -> Option<Action> {
        match event {
            ApiEvent::LoggedIn(session) => {
                self.set_notice(format!("Signed in as {}", session.username));
                self.session = Some(session);
                self.login.password.clear();
                self.screen = Screen::Projects;
                Some(Action::Api(ApiCommand::LoadProjects))
            }
            ApiEvent::LoggedOut => {
                self.session = None;
                self.projects.clear();
                self.boards.clear();
                self.board_state.clear();
                self.screen = Screen::Login;
                self.set_notice("Signed out");
                None
            }
            ApiEvent::Unauthorized => {
                self.session = None;
                self.screen = Screen::Login;
                self.set_notice("Session expired — please sign in again");
                None
            }
            ApiEvent::Projects(projects) => {
                self.projects = projects;
                if self.selected_project >= self.projects.len() {
                    self.selected_project = self.projects.len().saturating_sub(1);
                }
                None
            }
            ApiEvent::ProjectCreated(project) => {
                self.set_notice(format!("Project '{}' created", project.title));
                self.projects.push(project);
                None
            }
            ApiEvent::Boards { project, boards } => {
                if self.current_project == Some(project) {
                    self.boards = boards;
                    self.selected_board = 0;
                    self.screen = Screen::Boards;
                }
                None
            }
            ApiEvent::BoardCreated(board) => {
                self.set_notice(format!("Board '{}' created", board.name));
                self.boards.push(board);
                None
            }
            ApiEvent::BoardLoaded(board) => {
                self.board_name = board.name.clone();
                self.board_state.set_tasks(board.id, board.tasks);
                self.selected_column = 0;
                self.selected_task = 0;
                self.screen = Screen::Tasks;
                None
            }
            ApiEvent::TaskCreated(task) => {
                if self.board_state.board() == Some(task.board) {
                    self.board_state.push(task);
                }
                None
            }
            ApiEvent::Error(message) => {
                self.set_notice(message);
                None
            }
        }
    }

    /// Applies a sync notification from the board channel.
    pub fn apply_sync(&mut self, notification: SyncNotification) {
        match notification {
            SyncNotification::StateChanged(state) => {
                self.connection = state;
            }
            SyncNotification::TaskUpdated { task_id, status } => {
                self.board_state.apply_status(task_id, status);
                self.clamp_task_selection();
            }
        }
    }
}

/// Cycles the login form focus, skipping email outside registration.
const fn next_login_field(field: LoginField, registering: bool) -> LoginField {
    match field {
        LoginField::Username => LoginField::Password,
        LoginField::Password => {
            if registering {
                LoginField::Email
            } else {
                LoginField::Username
            }
        }
        LoginField::Email => LoginField::Username,
    }
}

/// Cycles the new-task form focus.
const fn next_task_field(field: TaskField) -> TaskField {
    match field {
        TaskField::Title => TaskField::Description,
        TaskField::Description => TaskField::Priority,
        TaskField::Priority => TaskField::Due,
        TaskField::Due => TaskField::Title,
    }
}
