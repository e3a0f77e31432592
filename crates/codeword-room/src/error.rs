//! Error types for the room layer.

use codeword_protocol::{RoomCode, Team, Username};
use serde::{Deserialize, Serialize};

use crate::RoomState;

/// Errors a room store can report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the write.
    #[error("room store unavailable: {0}")]
    Unavailable(String),

    /// A concurrent writer replaced the room first.
    #[error("conflicting write to room {0}")]
    Conflict(RoomCode),
}

/// Errors that can occur during room operations.
///
/// Every variant is a rejection local to the caller: the room is left
/// exactly as it was and nothing is published.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("player {0} is not in this room")]
    PlayerNotFound(Username),

    #[error("room {0} already exists")]
    DuplicateRoom(RoomCode),

    #[error("username {0} is already taken in this room")]
    DuplicateUsername(Username),

    /// A second Spymaster was requested for a team that has one.
    #[error("team {0} already has a Spymaster")]
    RoleConflict(Team),

    #[error("a hint was already given this turn")]
    HintAlreadySubmitted,

    /// Wrong role or wrong team for the current turn.
    #[error("not allowed: {0}")]
    Unauthorized(String),

    #[error("cannot {action} while the room is {state}")]
    InvalidState {
        action: &'static str,
        state: RoomState,
    },

    /// Each team needs a Spymaster and at least one Agent.
    #[error("both teams need a Spymaster and an Agent")]
    NotEnoughPlayers,

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("tile {index} is out of bounds (board has {len} cells)")]
    TileOutOfBounds { index: usize, len: usize },

    #[error("invalid hint: {0}")]
    InvalidHint(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The category of a rejection, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    InvalidState,
    PreconditionFailed,
    BadRequest,
    Unavailable,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::PreconditionFailed => 412,
            Self::InvalidState => 422,
            Self::Unavailable => 503,
        }
    }
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) | Self::PlayerNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateRoom(_)
            | Self::DuplicateUsername(_)
            | Self::RoleConflict(_)
            | Self::HintAlreadySubmitted => ErrorKind::Conflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::NotEnoughPlayers => ErrorKind::PreconditionFailed,
            Self::InvalidBoard(_) | Self::TileOutOfBounds { .. } | Self::InvalidHint(_) => {
                ErrorKind::BadRequest
            }
            Self::Store(StoreError::Unavailable(_)) => ErrorKind::Unavailable,
            Self::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
        }
    }
}
