//! Game configuration and the room lifecycle state machine.

use std::time::Duration;

use codeword_clock::ClockConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a [`RoomManager`](crate::RoomManager) runs.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Number of cells on a board. Default: 25.
    pub board_size: usize,

    /// How long each turn lasts before it passes to the other team.
    /// Default: 60 seconds.
    pub turn_duration: Duration,

    /// Capacity of each room actor's command channel. When it is full,
    /// callers wait.
    pub command_buffer: usize,

    /// Turn clock settings.
    pub clock: ClockConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 25,
            turn_duration: Duration::from_secs(60),
            command_buffer: 64,
            clock: ClockConfig::default(),
        }
    }
}

impl GameConfig {
    pub const MIN_BOARD_SIZE: usize = 3;
    pub const MAX_BOARD_SIZE: usize = 100;
    pub const MIN_TURN_DURATION: Duration = Duration::from_secs(5);
    pub const MAX_TURN_DURATION: Duration = Duration::from_secs(600);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RoomManager::new`](crate::RoomManager::new).
    /// - `board_size` clamped to `3..=100` (a board needs one cell per
    ///   team plus the assassin).
    /// - `turn_duration` clamped to 5 seconds ..= 10 minutes.
    /// - `command_buffer` at least 1.
    pub fn validated(mut self) -> Self {
        let board_size = self
            .board_size
            .clamp(Self::MIN_BOARD_SIZE, Self::MAX_BOARD_SIZE);
        if board_size != self.board_size {
            warn!(
                requested = self.board_size,
                board_size, "board_size out of range, clamping"
            );
            self.board_size = board_size;
        }
        let turn = self
            .turn_duration
            .clamp(Self::MIN_TURN_DURATION, Self::MAX_TURN_DURATION);
        if turn != self.turn_duration {
            warn!(
                requested = ?self.turn_duration,
                turn_duration = ?turn,
                "turn_duration out of range, clamping"
            );
            self.turn_duration = turn;
        }
        self.command_buffer = self.command_buffer.max(1);
        self.clock = self.clock.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ───→ Active ───→ Ended
///     ↖ ↘     ↗ ↙
///      Paused
/// ```
///
/// - **Waiting**: the room exists and players gather. Nobody can act on
///   the board yet.
/// - **Active**: a turn is running. The turn team may hint and reveal.
/// - **Paused**: a team lost its Spymaster or its last Agent. The turn and
///   deadline are frozen until the teams are balanced again. A room that
///   paused before its first turn goes back to Waiting.
/// - **Ended**: the assassin was revealed or a team found all its cells.
///   Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Active,
    Paused,
    Ended,
}

impl RoomState {
    /// Returns `true` if transitioning to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Active)
                | (Self::Waiting, Self::Paused)
                | (Self::Paused, Self::Waiting)
                | (Self::Active, Self::Paused)
                | (Self::Active, Self::Ended)
                | (Self::Paused, Self::Active)
        )
    }

    /// Returns `true` once the game is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Ended => write!(f, "ended"),
        }
    }
}
