//! Core game vocabulary shared by every layer.
//!
//! These are the nouns of the game: who is playing (`Username`, `Team`,
//! `Role`, `Player`), what is on the board (`Cell`, `CellColor`), when a
//! turn ends (`Timestamp`), and what happened (`GuessRecord`). They all
//! travel on the wire and into the room store, so every type here derives
//! `Serialize` and `Deserialize`.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Longest room code or username we accept, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The unique, human-shareable identifier of a room (e.g. `"TEST111"`).
///
/// A newtype over `String` so a room code can never be passed where a
/// username is expected. Construction goes through [`RoomCode::parse`],
/// and `#[serde(try_from = "String")]` routes deserialization through the
/// same check, so an invalid code can't sneak in from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates and wraps a room code.
    ///
    /// Surrounding whitespace is trimmed. The rest must be 1 to
    /// [`MAX_IDENTIFIER_LEN`] characters from `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim();
        let invalid = |reason: &str| ProtocolError::InvalidIdentifier {
            field: "room code",
            reason: reason.to_string(),
        };
        if code.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if code.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(invalid("is too long"));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("may only contain letters, digits, '_' and '-'"));
        }
        Ok(Self(code.to_string()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's display name, unique within one room.
///
/// Display names are the only identity the game has.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validates and wraps a display name.
    ///
    /// Surrounding whitespace is trimmed; the result must be 1 to
    /// [`MAX_IDENTIFIER_LEN`] characters with no control characters.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let name = raw.trim();
        let invalid = |reason: &str| ProtocolError::InvalidIdentifier {
            field: "username",
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if name.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(invalid("is too long"));
        }
        if name.chars().any(char::is_control) {
            return Err(invalid("must not contain control characters"));
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Teams, roles, colors
// ---------------------------------------------------------------------------

/// One of the two competing teams.
///
/// `Red` always takes the first turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// The team that opens every game.
    pub const STARTING: Team = Team::Red;

    /// Both teams, in turn order.
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// Returns the opposing team.
    pub fn other(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// The board color that belongs to this team.
    pub fn color(self) -> CellColor {
        match self {
            Self::Red => CellColor::Red,
            Self::Blue => CellColor::Blue,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Blue => write!(f, "Blue"),
        }
    }
}

/// What a player is allowed to do.
///
/// - **Spymaster**: gives the hint for their team's turn. At most one per team.
/// - **Agent**: reveals tiles during their team's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Spymaster,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spymaster => write!(f, "Spymaster"),
            Self::Agent => write!(f, "Agent"),
        }
    }
}

/// The hidden color behind a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Red,
    Blue,
    Neutral,
    /// Revealing this cell loses the game for the team that revealed it.
    Assassin,
}

impl CellColor {
    /// The team that owns this color, if any.
    pub fn team(self) -> Option<Team> {
        match self {
            Self::Red => Some(Team::Red),
            Self::Blue => Some(Team::Blue),
            Self::Neutral | Self::Assassin => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Board and roster entries
// ---------------------------------------------------------------------------

/// One cell of the board: a word and its hidden color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub label: String,
    pub color: CellColor,
}

impl Cell {
    pub fn new(label: impl Into<String>, color: CellColor) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

/// A seat in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub username: Username,
    pub role: Role,
    pub team: Team,
}

impl Player {
    pub fn new(username: Username, role: Role, team: Team) -> Self {
        Self {
            username,
            role,
            team,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Wall-clock time in milliseconds since the UNIX epoch.
///
/// Turn deadlines are `Timestamp`s. They are persisted with the room and
/// compared for exact equality, which is how a stale timer recognizes that
/// its turn is already over. `#[serde(transparent)]` keeps it a plain
/// number on the wire so browsers can feed it straight into `new Date()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The current wall-clock time.
    ///
    /// A clock set before 1970 reads as the epoch rather than failing.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Returns this instant shifted forward by `duration`.
    pub fn after(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Milliseconds since the UNIX epoch.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// How a revealed cell turned out for the team that revealed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessOutcome {
    /// The cell was the guessing team's own color.
    Correct,
    /// The cell was neutral or the other team's color.
    Wrong,
    /// The cell was the assassin.
    Assassin,
}

impl GuessOutcome {
    /// Classifies a revealed `color` from the point of view of `team`.
    pub fn classify(team: Team, color: CellColor) -> Self {
        match color {
            CellColor::Assassin => Self::Assassin,
            c if c == team.color() => Self::Correct,
            _ => Self::Wrong,
        }
    }
}

/// One resolved guess, appended to the room history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub team: Team,
    pub label: String,
    pub outcome: GuessOutcome,
    pub at: Timestamp,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // RoomCode / Username
    // =====================================================================

    #[test]
    fn test_room_code_trims_and_accepts_valid() {
        let code = RoomCode::parse("  TEST111 ").unwrap();
        assert_eq!(code.as_str(), "TEST111");
        assert_eq!(code.to_string(), "TEST111");
    }

    #[test]
    fn test_room_code_rejects_empty_and_bad_chars() {
        assert!(RoomCode::parse("   ").is_err());
        assert!(RoomCode::parse("room 1").is_err());
        assert!(RoomCode::parse("room/1").is_err());
        assert!(RoomCode::parse(&"A".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomCode::parse("ABC").unwrap()).unwrap();
        assert_eq!(json, "\"ABC\"");
    }

    #[test]
    fn test_room_code_deserialize_validates() {
        let bad: Result<RoomCode, _> = serde_json::from_str("\"has space\"");
        assert!(bad.is_err());
        let good: RoomCode = serde_json::from_str("\"ok-1\"").unwrap();
        assert_eq!(good.as_str(), "ok-1");
    }

    #[test]
    fn test_username_allows_spaces_but_not_control_chars() {
        assert_eq!(Username::parse(" Ada Lovelace ").unwrap().as_str(), "Ada Lovelace");
        assert!(Username::parse("bad\nname").is_err());
        assert!(Username::parse("").is_err());
    }

    // =====================================================================
    // Team / CellColor
    // =====================================================================

    #[test]
    fn test_team_other_flips() {
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::Blue.other(), Team::Red);
    }

    #[test]
    fn test_team_color_and_back() {
        for team in Team::ALL {
            assert_eq!(team.color().team(), Some(team));
        }
        assert_eq!(CellColor::Neutral.team(), None);
        assert_eq!(CellColor::Assassin.team(), None);
    }

    #[test]
    fn test_team_and_color_wire_names() {
        assert_eq!(serde_json::to_string(&Team::Red).unwrap(), "\"red\"");
        assert_eq!(serde_json::to_string(&CellColor::Assassin).unwrap(), "\"assassin\"");
        assert_eq!(serde_json::to_string(&Role::Spymaster).unwrap(), "\"Spymaster\"");
    }

    // =====================================================================
    // Timestamp
    // =====================================================================

    #[test]
    fn test_timestamp_after_and_since() {
        let t = Timestamp(1_000);
        let later = t.after(Duration::from_secs(60));
        assert_eq!(later, Timestamp(61_000));
        assert_eq!(later.saturating_duration_since(t), Duration::from_secs(60));
        assert_eq!(t.saturating_duration_since(later), Duration::ZERO);
    }

    #[test]
    fn test_timestamp_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Timestamp(42)).unwrap(), "42");
    }

    // =====================================================================
    // GuessOutcome
    // =====================================================================

    #[test]
    fn test_guess_outcome_classify() {
        assert_eq!(GuessOutcome::classify(Team::Red, CellColor::Red), GuessOutcome::Correct);
        assert_eq!(GuessOutcome::classify(Team::Red, CellColor::Blue), GuessOutcome::Wrong);
        assert_eq!(GuessOutcome::classify(Team::Blue, CellColor::Neutral), GuessOutcome::Wrong);
        assert_eq!(
            GuessOutcome::classify(Team::Blue, CellColor::Assassin),
            GuessOutcome::Assassin
        );
    }
}
