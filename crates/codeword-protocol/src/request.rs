//! Client requests: what a connected browser can ask the server to do.
//!
//! A connection holds at most one seat, so requests after `CreateRoom` or
//! `JoinRoom` don't repeat the room code or username. The server fills
//! those in from the connection's seat.

use serde::{Deserialize, Serialize};

use crate::{Role, RoomCode, Team, Timestamp, Username};

/// A request sent by a client, internally tagged by `"type"`:
///
/// ```text
/// { "type": "JoinRoom", "code": "TEST111", "username": "ada", "role": "Agent", "team": "red" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Open a new room and take the first seat. When `code` is omitted the
    /// server picks a random one.
    CreateRoom {
        #[serde(default)]
        code: Option<RoomCode>,
        username: Username,
        role: Role,
        team: Team,
    },

    /// Take a seat in an existing room.
    JoinRoom {
        code: RoomCode,
        username: Username,
        role: Role,
        team: Team,
    },

    /// Give up the current seat.
    LeaveRoom,

    /// Start the game in the current room.
    StartGame,

    /// Spymaster only: the hint for this turn.
    SubmitHint { hint: String },

    /// Agent only: reveal the cell at `index`.
    RevealTile { index: usize },

    /// The client's countdown reached zero. `deadline` is the turn deadline
    /// the client was counting down to, if it knows it.
    TimerExpired {
        #[serde(default)]
        deadline: Option<Timestamp>,
    },

    /// Ask for a fresh snapshot of the room.
    SyncState,
}
