//! The room aggregate and its state machine.
//!
//! A [`Room`] is the unit of consistency: every rule of the game is
//! enforced by one of its transition methods. A transition either fails
//! and leaves the room untouched, or applies completely and returns the
//! [`Notification`]s describing what changed.
//!
//! Nothing here is async or shared. Serializing access to a room and
//! persisting the result is the room actor's job (see `actor.rs`).

use std::time::Duration;

use codeword_protocol::{
    CellColor, EndOutcome, GuessOutcome, GuessRecord, Notification, Player, Role, RoomCode, Team,
    Timestamp, Username,
};
use serde::{Deserialize, Serialize};

use crate::{Board, RoomError, RoomState};

/// Where a "turn is over" signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirySignal {
    /// The turn clock fired for the turn ending at this deadline. Accepted
    /// only if it is still the room's live deadline.
    Clock(Timestamp),

    /// A client reported that its countdown ran out. Accepted only once
    /// the live deadline has actually passed, and, if the client says
    /// which deadline it saw, only when that is the live one.
    External { observed: Option<Timestamp> },
}

/// A game room.
///
/// Fields are private; every change goes through a transition method so
/// the invariants hold at all times:
///
/// - at most one Spymaster per team,
/// - `revealed` only ever flips from `false` to `true`,
/// - a new turn deadline is always later than the one it replaces.
///
/// Deserializing validates the document first, so one whose
/// `revealed` list does not cover the board is rejected instead of loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRoom")]
pub struct Room {
    code: RoomCode,
    board: Board,
    revealed: Vec<bool>,
    players: Vec<Player>,
    state: RoomState,
    turn_team: Team,
    turn_deadline: Option<Timestamp>,
    current_hint: Option<String>,
    history: Vec<GuessRecord>,
    created_at: Timestamp,
}

/// The serialized shape of a [`Room`], before validation.
#[derive(Deserialize)]
struct StoredRoom {
    code: RoomCode,
    board: Board,
    revealed: Vec<bool>,
    players: Vec<Player>,
    state: RoomState,
    turn_team: Team,
    turn_deadline: Option<Timestamp>,
    current_hint: Option<String>,
    history: Vec<GuessRecord>,
    created_at: Timestamp,
}

impl TryFrom<StoredRoom> for Room {
    type Error = RoomError;

    fn try_from(stored: StoredRoom) -> Result<Self, Self::Error> {
        if stored.revealed.len() != stored.board.len() {
            return Err(RoomError::InvalidBoard(format!(
                "room {} has {} reveal flags for {} cells",
                stored.code,
                stored.revealed.len(),
                stored.board.len()
            )));
        }
        Ok(Self {
            code: stored.code,
            board: stored.board,
            revealed: stored.revealed,
            players: stored.players,
            state: stored.state,
            turn_team: stored.turn_team,
            turn_deadline: stored.turn_deadline,
            current_hint: stored.current_hint,
            history: stored.history,
            created_at: stored.created_at,
        })
    }
}

impl Room {
    /// Opens a `waiting` room with `creator` as its only player.
    pub fn create(
        code: RoomCode,
        board: Board,
        creator: Player,
        now: Timestamp,
    ) -> (Self, Vec<Notification>) {
        let room = Self {
            code,
            revealed: vec![false; board.len()],
            board,
            players: vec![creator],
            state: RoomState::Waiting,
            turn_team: Team::STARTING,
            turn_deadline: None,
            current_hint: None,
            history: Vec::new(),
            created_at: now,
        };
        let notifications = vec![room.roster()];
        (room, notifications)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn revealed(&self) -> &[bool] {
        &self.revealed
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, username: &Username) -> Option<&Player> {
        self.players.iter().find(|p| &p.username == username)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    /// The team allowed to act. Only meaningful while active or paused.
    pub fn turn_team(&self) -> Team {
        self.turn_team
    }

    pub fn turn_deadline(&self) -> Option<Timestamp> {
        self.turn_deadline
    }

    pub fn current_hint(&self) -> Option<&str> {
        self.current_hint.as_deref()
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn has_spymaster(&self, team: Team) -> bool {
        self.players
            .iter()
            .any(|p| p.team == team && p.role == Role::Spymaster)
    }

    pub fn has_agent(&self, team: Team) -> bool {
        self.players
            .iter()
            .any(|p| p.team == team && p.role == Role::Agent)
    }

    /// Both teams have a Spymaster and at least one Agent.
    pub fn is_balanced(&self) -> bool {
        Team::ALL
            .into_iter()
            .all(|t| self.has_spymaster(t) && self.has_agent(t))
    }

    /// Unrevealed cells of `team`'s color.
    pub fn remaining(&self, team: Team) -> usize {
        self.board
            .cells()
            .iter()
            .zip(&self.revealed)
            .filter(|(cell, revealed)| cell.color == team.color() && !**revealed)
            .count()
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Seats a new player.
    ///
    /// Allowed in every state. A join that balances a paused game
    /// resumes it with the turn and deadline it had when it paused. A
    /// room that paused before its first turn goes back to `waiting`.
    pub fn join(&mut self, player: Player) -> Result<Vec<Notification>, RoomError> {
        if self.player(&player.username).is_some() {
            return Err(RoomError::DuplicateUsername(player.username));
        }
        if player.role == Role::Spymaster && self.has_spymaster(player.team) {
            return Err(RoomError::RoleConflict(player.team));
        }

        self.players.push(player);
        let mut notifications = vec![self.roster()];
        if self.state == RoomState::Paused && self.is_balanced() {
            if self.turn_deadline.is_some() {
                self.transition(RoomState::Active);
                notifications.push(Notification::GameResumed);
            } else {
                self.transition(RoomState::Waiting);
            }
        }
        Ok(notifications)
    }

    /// Removes a player.
    ///
    /// When the last player leaves the room is left empty and nothing is
    /// emitted; the caller deletes it. A waiting or active room that
    /// loses balance pauses.
    pub fn leave(&mut self, username: &Username) -> Result<Vec<Notification>, RoomError> {
        let position = self
            .players
            .iter()
            .position(|p| &p.username == username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.clone()))?;
        self.players.remove(position);

        if self.players.is_empty() {
            return Ok(Vec::new());
        }
        let mut notifications = vec![self.roster()];
        let pausable = matches!(self.state, RoomState::Waiting | RoomState::Active);
        if pausable && !self.is_balanced() {
            self.transition(RoomState::Paused);
            notifications.push(Notification::GamePaused);
        }
        Ok(notifications)
    }

    // -----------------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------------

    /// Starts the game. The starting team gets the first turn.
    pub fn start(
        &mut self,
        now: Timestamp,
        turn_duration: Duration,
    ) -> Result<Vec<Notification>, RoomError> {
        self.require(RoomState::Waiting, "start the game")?;
        if !self.is_balanced() {
            return Err(RoomError::NotEnoughPlayers);
        }

        self.transition(RoomState::Active);
        let turn_deadline = self.begin_turn(Team::STARTING, now, turn_duration);
        Ok(vec![Notification::GameStarted {
            turn_team: self.turn_team,
            turn_deadline,
        }])
    }

    /// Records the hint for the current turn. Only the turn team's
    /// Spymaster may give it, once per turn.
    pub fn submit_hint(
        &mut self,
        username: &Username,
        hint: &str,
    ) -> Result<Vec<Notification>, RoomError> {
        self.require(RoomState::Active, "give a hint")?;
        let player = self
            .player(username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.clone()))?;
        if player.role != Role::Spymaster {
            return Err(RoomError::Unauthorized(
                "only a Spymaster can give a hint".into(),
            ));
        }
        if player.team != self.turn_team {
            return Err(RoomError::Unauthorized(format!(
                "it is team {}'s turn",
                self.turn_team
            )));
        }
        if self.current_hint.is_some() {
            return Err(RoomError::HintAlreadySubmitted);
        }
        let text = hint.trim();
        if text.is_empty() {
            return Err(RoomError::InvalidHint("hint must not be empty".into()));
        }

        self.current_hint = Some(text.to_string());
        Ok(vec![Notification::HintPosted {
            team: self.turn_team,
            text: text.to_string(),
        }])
    }

    /// Reveals the cell at `index` on behalf of the turn team.
    ///
    /// Revealing an already revealed cell changes nothing and emits
    /// nothing. Otherwise the order of checks is: assassin, then the
    /// starting team's board complete, then the other team's, then the
    /// turn passes.
    pub fn reveal_tile(
        &mut self,
        index: usize,
        now: Timestamp,
        turn_duration: Duration,
    ) -> Result<Vec<Notification>, RoomError> {
        self.require(RoomState::Active, "reveal a tile")?;
        let cell = self
            .board
            .cell(index)
            .ok_or(RoomError::TileOutOfBounds {
                index,
                len: self.board.len(),
            })?
            .clone();
        let flag = self
            .revealed
            .get_mut(index)
            .ok_or(RoomError::TileOutOfBounds {
                index,
                len: self.board.len(),
            })?;
        if *flag {
            return Ok(Vec::new());
        }
        *flag = true;

        let team = self.turn_team;
        self.history.push(GuessRecord {
            team,
            label: cell.label,
            outcome: GuessOutcome::classify(team, cell.color),
            at: now,
        });

        let mut notifications = vec![Notification::TileUpdated {
            index,
            color: cell.color,
        }];

        let outcome = if cell.color == CellColor::Assassin {
            Some(EndOutcome::AssassinRevealed { losing_team: team })
        } else {
            Team::ALL
                .into_iter()
                .find(|&t| self.remaining(t) == 0)
                .map(|winning_team| EndOutcome::AllAgentsFound { winning_team })
        };

        match outcome {
            Some(outcome) => {
                self.transition(RoomState::Ended);
                self.current_hint = None;
                notifications.push(Notification::GameEnded { outcome });
            }
            None => notifications.push(self.switch_turn(now, turn_duration)),
        }
        Ok(notifications)
    }

    /// [`reveal_tile`](Self::reveal_tile), but only for an Agent of the
    /// turn team.
    pub fn reveal_tile_as(
        &mut self,
        username: &Username,
        index: usize,
        now: Timestamp,
        turn_duration: Duration,
    ) -> Result<Vec<Notification>, RoomError> {
        self.require(RoomState::Active, "reveal a tile")?;
        let player = self
            .player(username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.clone()))?;
        if player.role != Role::Agent {
            return Err(RoomError::Unauthorized(
                "only an Agent can reveal a tile".into(),
            ));
        }
        if player.team != self.turn_team {
            return Err(RoomError::Unauthorized(format!(
                "it is team {}'s turn",
                self.turn_team
            )));
        }
        self.reveal_tile(index, now, turn_duration)
    }

    /// Ends the current turn because time ran out.
    ///
    /// Never fails. A signal for a turn that is already over, or a room
    /// that is not active, is ignored and yields no notifications.
    pub fn expire_turn(
        &mut self,
        signal: ExpirySignal,
        now: Timestamp,
        turn_duration: Duration,
    ) -> Vec<Notification> {
        if self.state != RoomState::Active {
            return Vec::new();
        }
        let Some(live) = self.turn_deadline else {
            return Vec::new();
        };
        let current = match signal {
            ExpirySignal::Clock(deadline) => deadline == live,
            ExpirySignal::External { observed } => {
                now >= live && observed.is_none_or(|seen| seen == live)
            }
        };
        if !current {
            return Vec::new();
        }
        vec![self.switch_turn(now, turn_duration)]
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require(&self, state: RoomState, action: &'static str) -> Result<(), RoomError> {
        if self.state == state {
            Ok(())
        } else {
            Err(RoomError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: RoomState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        self.state = next;
    }

    fn roster(&self) -> Notification {
        Notification::RosterUpdated {
            players: self.players.clone(),
        }
    }

    fn switch_turn(&mut self, now: Timestamp, turn_duration: Duration) -> Notification {
        let turn_deadline = self.begin_turn(self.turn_team.other(), now, turn_duration);
        Notification::TurnSwitched {
            turn_team: self.turn_team,
            turn_deadline,
        }
    }

    /// Hands the turn to `team` with a fresh deadline.
    ///
    /// The deadline identifies the turn, so it must differ from the
    /// previous one even when two turns begin in the same millisecond.
    fn begin_turn(&mut self, team: Team, now: Timestamp, turn_duration: Duration) -> Timestamp {
        let mut deadline = now.after(turn_duration);
        if let Some(previous) = self.turn_deadline {
            if deadline <= previous {
                deadline = Timestamp(previous.as_millis() + 1);
            }
        }
        self.turn_team = team;
        self.turn_deadline = Some(deadline);
        self.current_hint = None;
        deadline
    }
}

// =========================================================================
// Tests
// =========================================================================
