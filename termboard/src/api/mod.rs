//! REST client for the project/board/task API.
//!
//! Thin typed wrapper over `reqwest`: authentication returns an opaque
//! token which is then sent as `Authorization: Token <token>` on every
//! request. All list/create operations are plain fetch-and-decode; the
//! live path for task status goes over the board channel instead
//! (see [`crate::sync`]).

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use termboard_proto::board::{Board, BoardId, NewBoard};
use termboard_proto::project::{NewProject, Project, ProjectId};
use termboard_proto::task::{NewTask, Task};
use termboard_proto::user::{Credentials, Registration, RegistrationResponse, TokenResponse};

/// Errors from the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout, or response-decoding failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server rejected the credentials or token (401/403); the UI
    /// should drop back to the login screen.
    #[error("not authorized")]
    Unauthorized,
    /// Any other non-success response.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, for diagnostics.
        body: String,
    },
}

/// Typed client for the task-tracking REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the given API base URL (e.g.
    /// `http://127.0.0.1:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("termboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Installs an authentication token (e.g. from a restored session).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Discards the authentication token (logout).
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Whether a token is installed.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Authenticates and installs the returned token.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] on bad credentials, otherwise transport
    /// or status errors.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: TokenResponse = self
            .execute(self.http.post(self.url("token-auth/")).json(&body))
            .await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    /// Registers a new account and installs its token.
    ///
    /// # Errors
    ///
    /// Status errors carry the server's validation message.
    pub async fn register(
        &mut self,
        registration: &Registration,
    ) -> Result<RegistrationResponse, ApiError> {
        let response: RegistrationResponse = self
            .execute(self.http.post(self.url("register/")).json(registration))
            .await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    /// Lists the projects visible to the authenticated user.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.execute(self.http.get(self.url("projects/"))).await
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn create_project(&self, body: &NewProject) -> Result<Project, ApiError> {
        self.execute(self.http.post(self.url("projects/")).json(body))
            .await
    }

    /// Lists the boards of a project.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn boards(&self, project: ProjectId) -> Result<Vec<Board>, ApiError> {
        self.execute(
            self.http
                .get(self.url("boards/"))
                .query(&[("project", project.value())]),
        )
        .await
    }

    /// Fetches one board including its task collection.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn board(&self, board: BoardId) -> Result<Board, ApiError> {
        self.execute(self.http.get(self.url(&format!("boards/{board}/"))))
            .await
    }

    /// Creates a board within a project.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn create_board(&self, body: &NewBoard) -> Result<Board, ApiError> {
        self.execute(self.http.post(self.url("boards/")).json(body))
            .await
    }

    /// Lists the tasks of a board.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn tasks(&self, board: BoardId) -> Result<Vec<Task>, ApiError> {
        self.execute(
            self.http
                .get(self.url("tasks/"))
                .query(&[("board", board.value())]),
        )
        .await
    }

    /// Creates a task on a board.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn create_task(&self, body: &NewTask) -> Result<Task, ApiError> {
        self.execute(self.http.post(self.url("tasks/")).json(body))
            .await
    }

    /// Joins a path onto the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Attaches the token header, sends, and decodes the response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}
