//! User and authentication types for the REST surface.

use serde::{Deserialize, Serialize};

/// A registered account, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Optional email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plaintext password (sent over the transport, never stored).
    pub password: String,
}

/// Successful authentication response carrying the opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer-style token for subsequent requests.
    pub token: String,
}

/// Registration request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Desired login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Optional email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Registration response: the created account plus its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// The created account.
    pub user: User,
    /// Opaque token, already valid.
    pub token: String,
}
