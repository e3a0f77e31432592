//! Messages the server sends to clients.
//!
//! Requests come in as [`ClientRequest`](codeword_protocol::ClientRequest).
//! Everything going out is a [`ServerMessage`], tagged by `"type"`.

use codeword_protocol::{Notification, ProtocolError, RoomCode, Username};
use codeword_room::{ErrorKind, RoomError};
use serde::{Deserialize, Serialize};

use crate::view::RoomView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// This connection now holds a seat in `code`.
    Joined { code: RoomCode, username: Username },

    /// This connection gave up its seat in `code`.
    Left { code: RoomCode },

    /// The room as this seat may see it, sent after joining, on request,
    /// and when the connection fell too far behind the room's
    /// notifications.
    Snapshot { room: RoomView },

    /// A room notification, in the order the room produced it.
    Event { notification: Notification },

    /// The last request was rejected. Nothing changed.
    Error {
        code: u16,
        kind: ErrorKind,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            code: kind.status_code(),
            kind,
            message: message.into(),
        }
    }

    pub fn event(notification: Notification) -> Self {
        Self::Event { notification }
    }
}

impl From<&RoomError> for ServerMessage {
    fn from(err: &RoomError) -> Self {
        Self::error(err.kind(), err.to_string())
    }
}

impl From<&ProtocolError> for ServerMessage {
    fn from(err: &ProtocolError) -> Self {
        Self::error(ErrorKind::BadRequest, err.to_string())
    }
}
