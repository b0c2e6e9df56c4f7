//! Board-channel wire format: live task-update messages and their JSON codec.
//!
//! The board channel carries JSON text frames in both directions. Inbound
//! frames are server notifications ([`ServerEvent`]); outbound frames are
//! client requests ([`ClientCommand`]). Frames whose `type` is not
//! recognized are ignored silently per the protocol contract, which
//! [`decode_event`] models as `Ok(None)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{TaskId, TaskStatus};

/// Error type for board-channel encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload was not valid JSON, or a recognized message had
    /// missing or invalid fields.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload was valid JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,
    /// The payload object has no `type` field.
    #[error("payload has no \"type\" field")]
    MissingType,
}

/// Server-to-client notification on the board channel.
///
/// Tagged by the `type` field, e.g.
/// `{"type": "task_update", "task_id": 42, "status": "DONE"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A task's status changed; replace the status of the matching task.
    TaskUpdate {
        /// Which task changed.
        task_id: TaskId,
        /// Its new status.
        status: TaskStatus,
    },
}

/// Client-to-server request on the board channel.
///
/// Tagged by the `action` field, e.g.
/// `{"task_id": 42, "action": "update_status", "status": "DONE"}`.
/// Fire-and-forget: no acknowledgement is awaited; the authoritative
/// update arrives later as a [`ServerEvent::TaskUpdate`] broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Request a status change for a task.
    UpdateStatus {
        /// Which task to change.
        task_id: TaskId,
        /// The requested status.
        status: TaskStatus,
    },
}

/// Decodes an inbound board-channel frame.
///
/// Returns `Ok(Some(event))` for a recognized notification, `Ok(None)`
/// for well-formed JSON with an unrecognized `type` (ignored silently
/// per the protocol), and `Err` for malformed payloads: bad JSON, a
/// non-object, a missing `type`, or invalid fields on a recognized type.
///
/// # Errors
///
/// Returns [`CodecError`] as described above. Callers log and discard;
/// a decode failure never tears down the connection.
pub fn decode_event(text: &str) -> Result<Option<ServerEvent>, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };
    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Err(CodecError::MissingType);
    };
    if kind != "task_update" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

/// Encodes an outbound board-channel request as a JSON text frame.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if serialization fails.
pub fn encode_command(command: &ClientCommand) -> Result<String, CodecError> {
    Ok(serde_json::to_string(command)?)
}

/// Decodes a client request frame (used by test stand-in servers).
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if the frame is not a valid request.
pub fn decode_command(text: &str) -> Result<ClientCommand, CodecError> {
    Ok(serde_json::from_str(text)?)
}
