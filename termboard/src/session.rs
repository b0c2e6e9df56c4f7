//! Authenticated session state.
//!
//! An explicit session object replaces ambient global state: it is
//! created by the login flow, handed to the collaborators that need it,
//! and has a defined lifecycle — restored from disk on startup if
//! present, persisted on login, cleared on logout.
//!
//! Stored at `~/.config/termboard/session.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors from session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to read the session file.
    #[error("failed to read session file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to write or remove the session file.
    #[error("failed to write session file {path}: {source}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The stored session is not valid TOML.
    #[error("failed to parse session file: {0}")]
    ParseToml(#[from] toml::de::Error),
    /// Serializing the session failed.
    #[error("failed to serialize session: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    /// Could not determine the user's config directory.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
}

/// An authenticated session: who is logged in and their API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Login name of the authenticated user.
    pub username: String,
    /// Opaque API token.
    pub token: String,
}

impl Session {
    /// Creates a session from a fresh login.
    #[must_use]
    pub const fn new(username: String, token: String) -> Self {
        Self { username, token }
    }

    /// Restores the persisted session, if one exists.
    ///
    /// A missing file is not an error; it just means nobody is logged
    /// in. A corrupt file is reported so the caller can surface it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for unreadable or unparsable files.
    pub fn restore() -> Result<Option<Self>, SessionError> {
        Self::load_from(&default_path()?)
    }

    /// Restores a session from an explicit path (see [`Self::restore`]).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for unreadable or unparsable files.
    pub fn load_from(path: &Path) -> Result<Option<Self>, SessionError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(toml::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Persists this session for future startups.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be written.
    pub fn persist(&self) -> Result<(), SessionError> {
        self.save_to(&default_path()?)
    }

    /// Persists this session at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| SessionError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Removes the persisted session (logout teardown). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if an existing file cannot be removed.
    pub fn clear() -> Result<(), SessionError> {
        Self::clear_at(&default_path()?)
    }

    /// Removes a persisted session at an explicit path. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if an existing file cannot be removed.
    pub fn clear_at(path: &Path) -> Result<(), SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Default session file location.
fn default_path() -> Result<PathBuf, SessionError> {
    let config_dir = dirs::config_dir().ok_or(SessionError::NoConfigDir)?;
    Ok(config_dir.join("termboard").join("session.toml"))
}
