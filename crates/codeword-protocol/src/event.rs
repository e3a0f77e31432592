//! Notifications: what a room tells its subscribers after a transition.
//!
//! Every successful state-machine transition produces zero or more
//! [`Notification`]s. They carry the resulting values *by value*, so they
//! can be published after the room's lock is released without ever
//! pointing back at live state.

use serde::{Deserialize, Serialize};

use crate::{CellColor, Player, Team, Timestamp};

/// How a game ended.
///
/// `#[serde(tag = "result")]` yields
/// `{ "result": "assassin-revealed", "losing_team": "blue" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum EndOutcome {
    /// A team revealed the assassin and lost on the spot.
    AssassinRevealed { losing_team: Team },
    /// Every cell of one team's color has been revealed.
    AllAgentsFound { winning_team: Team },
}

impl EndOutcome {
    /// The team that won, whichever way the game ended.
    pub fn winner(self) -> Team {
        match self {
            Self::AssassinRevealed { losing_team } => losing_team.other(),
            Self::AllAgentsFound { winning_team } => winning_team,
        }
    }
}

/// An event published to every subscriber of a room.
///
/// Internally tagged by `"event"` with kebab-case names, so a turn switch
/// looks like:
///
/// ```text
/// { "event": "turn-switched", "turn_team": "blue", "turn_deadline": 1700000060000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Notification {
    /// The roster changed (join, leave, room created).
    RosterUpdated { players: Vec<Player> },

    /// The game left `waiting`; the first turn is running.
    GameStarted {
        turn_team: Team,
        turn_deadline: Timestamp,
    },

    /// Teams are balanced again after a pause. Turn and deadline are the
    /// ones that were running when the game paused.
    GameResumed,

    /// A departure left a team without a Spymaster or an Agent.
    GamePaused,

    /// The turn team's Spymaster gave the hint for this turn.
    HintPosted { team: Team, text: String },

    /// A hint was refused. Sent only to the Spymaster who tried, never
    /// broadcast to the room.
    HintRejected { reason: String },

    /// A cell was revealed; its true color is now public.
    TileUpdated { index: usize, color: CellColor },

    /// The turn passed to the other team, by guess or by timeout.
    TurnSwitched {
        turn_team: Team,
        turn_deadline: Timestamp,
    },

    /// The game is over. No transition leaves this state.
    GameEnded { outcome: EndOutcome },
}

impl Notification {
    /// The event name used on the wire (the `"event"` tag).
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RosterUpdated { .. } => "roster-updated",
            Self::GameStarted { .. } => "game-started",
            Self::GameResumed => "game-resumed",
            Self::GamePaused => "game-paused",
            Self::HintPosted { .. } => "hint-posted",
            Self::HintRejected { .. } => "hint-rejected",
            Self::TileUpdated { .. } => "tile-updated",
            Self::TurnSwitched { .. } => "turn-switched",
            Self::GameEnded { .. } => "game-ended",
        }
    }
}
